// ==========================================
// 提货单流转系统 - 领域类型定义
// ==========================================
// 状态、角色、操作均为封闭枚举，数据库以字符串存储
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 提货单状态 (DO Status)
// ==========================================
// 顺序: created → at_area_office → at_project_office
//       → {received_at_project_office | project_approved | cisf_approved | both_approved}
//       → at_road_sale (终态)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoStatus {
    Created,
    AtAreaOffice,
    AtProjectOffice,
    ReceivedAtProjectOffice,
    ProjectApproved,
    CisfApproved,
    BothApproved,
    AtRoadSale,
}

impl DoStatus {
    pub const ALL: [DoStatus; 8] = [
        DoStatus::Created,
        DoStatus::AtAreaOffice,
        DoStatus::AtProjectOffice,
        DoStatus::ReceivedAtProjectOffice,
        DoStatus::ProjectApproved,
        DoStatus::CisfApproved,
        DoStatus::BothApproved,
        DoStatus::AtRoadSale,
    ];

    /// 转换为数据库存储的字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            DoStatus::Created => "created",
            DoStatus::AtAreaOffice => "at_area_office",
            DoStatus::AtProjectOffice => "at_project_office",
            DoStatus::ReceivedAtProjectOffice => "received_at_project_office",
            DoStatus::ProjectApproved => "project_approved",
            DoStatus::CisfApproved => "cisf_approved",
            DoStatus::BothApproved => "both_approved",
            DoStatus::AtRoadSale => "at_road_sale",
        }
    }

    /// 从字符串解析（未知值返回 None）
    pub fn parse(s: &str) -> Option<Self> {
        DoStatus::ALL.iter().copied().find(|st| st.as_str() == s)
    }

    /// 流转阶段序号（只增不减）
    ///
    /// project_approved 与 cisf_approved 同级。
    pub fn rank(&self) -> u8 {
        match self {
            DoStatus::Created => 0,
            DoStatus::AtAreaOffice => 1,
            DoStatus::AtProjectOffice => 2,
            DoStatus::ReceivedAtProjectOffice => 3,
            DoStatus::ProjectApproved | DoStatus::CisfApproved => 4,
            DoStatus::BothApproved => 5,
            DoStatus::AtRoadSale => 6,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DoStatus::AtRoadSale)
    }

    /// 是否已进入项目办阶段（含之后）
    pub fn is_at_or_after_project_office(&self) -> bool {
        self.rank() >= DoStatus::AtProjectOffice.rank()
    }

    /// 是否仍处于可删除的早期状态
    pub fn is_deletable(&self) -> bool {
        matches!(self, DoStatus::Created | DoStatus::AtAreaOffice)
    }
}

impl fmt::Display for DoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 用户角色 (Role)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    AreaOffice,
    ProjectOffice,
    Cisf,
    RoadSale,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::AreaOffice,
        Role::ProjectOffice,
        Role::Cisf,
        Role::RoadSale,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::AreaOffice => "AREA_OFFICE",
            Role::ProjectOffice => "PROJECT_OFFICE",
            Role::Cisf => "CISF",
            Role::RoadSale => "ROAD_SALE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.trim().to_uppercase();
        Role::ALL.iter().copied().find(|r| r.as_str() == upper)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 审批方 (Approval Party)
// ==========================================
// 双审批: 项目办 + CISF 各自独立
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalParty {
    ProjectOffice,
    Cisf,
}

impl ApprovalParty {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalParty::ProjectOffice => "PROJECT_OFFICE",
            ApprovalParty::Cisf => "CISF",
        }
    }

    /// 审批方对应的角色
    pub fn role(&self) -> Role {
        match self {
            ApprovalParty::ProjectOffice => Role::ProjectOffice,
            ApprovalParty::Cisf => Role::Cisf,
        }
    }

    /// 从角色推导审批方（其他角色没有审批权）
    pub fn from_role(role: Role) -> Option<Self> {
        match role {
            Role::ProjectOffice => Some(ApprovalParty::ProjectOffice),
            Role::Cisf => Some(ApprovalParty::Cisf),
            _ => None,
        }
    }
}

impl fmt::Display for ApprovalParty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 工作流操作 (Operation)
// ==========================================
// 权限表与流转历史共用同一套操作标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Create,
    ForwardToProjectOffice,
    Receive,
    ApproveAsProjectOffice,
    ApproveAsCisf,
    ForwardToRoadSale,
    ReportIssue,
    ResolveIssue,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::Create,
        Operation::ForwardToProjectOffice,
        Operation::Receive,
        Operation::ApproveAsProjectOffice,
        Operation::ApproveAsCisf,
        Operation::ForwardToRoadSale,
        Operation::ReportIssue,
        Operation::ResolveIssue,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "CREATE",
            Operation::ForwardToProjectOffice => "FORWARD_TO_PROJECT_OFFICE",
            Operation::Receive => "RECEIVE",
            Operation::ApproveAsProjectOffice => "APPROVE_AS_PROJECT_OFFICE",
            Operation::ApproveAsCisf => "APPROVE_AS_CISF",
            Operation::ForwardToRoadSale => "FORWARD_TO_ROAD_SALE",
            Operation::ReportIssue => "REPORT_ISSUE",
            Operation::ResolveIssue => "RESOLVE_ISSUE",
            Operation::Delete => "DELETE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Operation::ALL.iter().copied().find(|op| op.as_str() == s)
    }

    /// 审批类操作
    pub fn approval(party: ApprovalParty) -> Self {
        match party {
            ApprovalParty::ProjectOffice => Operation::ApproveAsProjectOffice,
            ApprovalParty::Cisf => Operation::ApproveAsCisf,
        }
    }

    /// 是否为推进类操作（受问题闸门约束）
    pub fn is_forward_moving(&self) -> bool {
        matches!(
            self,
            Operation::ForwardToProjectOffice
                | Operation::Receive
                | Operation::ApproveAsProjectOffice
                | Operation::ApproveAsCisf
                | Operation::ForwardToRoadSale
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 问题类别 (Issue Category)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCategory {
    Quality,
    Quantity,
    Documentation,
    Damage,
    Delay,
    Security,
    Verification,
    Other,
}

impl IssueCategory {
    pub const ALL: [IssueCategory; 8] = [
        IssueCategory::Quality,
        IssueCategory::Quantity,
        IssueCategory::Documentation,
        IssueCategory::Damage,
        IssueCategory::Delay,
        IssueCategory::Security,
        IssueCategory::Verification,
        IssueCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::Quality => "QUALITY",
            IssueCategory::Quantity => "QUANTITY",
            IssueCategory::Documentation => "DOCUMENTATION",
            IssueCategory::Damage => "DAMAGE",
            IssueCategory::Delay => "DELAY",
            IssueCategory::Security => "SECURITY",
            IssueCategory::Verification => "VERIFICATION",
            IssueCategory::Other => "OTHER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.trim().to_uppercase();
        IssueCategory::ALL.iter().copied().find(|c| c.as_str() == upper)
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 问题状态 (Issue Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueStatus {
    Open,
    Resolved,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Open => "OPEN",
            IssueStatus::Resolved => "RESOLVED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(IssueStatus::Open),
            "RESOLVED" => Some(IssueStatus::Resolved),
            _ => None,
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
