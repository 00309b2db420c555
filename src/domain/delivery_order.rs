// ==========================================
// 提货单流转系统 - 提货单领域模型
// ==========================================
// 对齐: delivery_order 表
// 红线: status 只沿合法流转图前进
// ==========================================

use crate::domain::types::{ApprovalParty, DoStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// DeliveryOrder - 提货单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryOrder {
    pub do_id: String,
    pub do_number: String,           // 全局唯一的提货单号
    pub party_id: String,            // 收货单位
    pub authorized_person: String,   // 提货授权人
    pub valid_from: NaiveDateTime,
    pub valid_to: NaiveDateTime,
    pub status: DoStatus,
    pub project_approved: bool,
    pub cisf_approved: bool,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,

    // ===== 并发控制 =====
    pub revision: i64,               // 乐观锁版本号，每次写入 +1
}

impl DeliveryOrder {
    pub fn approval(&self) -> ApprovalState {
        ApprovalState {
            project_approved: self.project_approved,
            cisf_approved: self.cisf_approved,
        }
    }

    pub fn set_approval(&mut self, approval: ApprovalState) {
        self.project_approved = approval.project_approved;
        self.cisf_approved = approval.cisf_approved;
    }
}

// ==========================================
// ApprovalState - 双审批标志
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApprovalState {
    pub project_approved: bool,
    pub cisf_approved: bool,
}

impl ApprovalState {
    pub fn is_approved_by(&self, party: ApprovalParty) -> bool {
        match party {
            ApprovalParty::ProjectOffice => self.project_approved,
            ApprovalParty::Cisf => self.cisf_approved,
        }
    }

    /// 置位某一方（幂等）
    pub fn with(self, party: ApprovalParty) -> Self {
        match party {
            ApprovalParty::ProjectOffice => Self {
                project_approved: true,
                ..self
            },
            ApprovalParty::Cisf => Self {
                cisf_approved: true,
                ..self
            },
        }
    }

    pub fn both_approved(&self) -> bool {
        self.project_approved && self.cisf_approved
    }
}

// ==========================================
// NewDeliveryOrder - 创建参数
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDeliveryOrder {
    pub do_number: String,
    pub party_id: String,
    pub authorized_person: String,
    pub valid_to: Option<NaiveDateTime>, // 为空时按配置的默认有效天数
    pub notes: Option<String>,
}
