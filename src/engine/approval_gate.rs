// ==========================================
// 提货单流转系统 - 双审批闸门
// ==========================================
// 项目办与 CISF 各自独立审批
// 审批标志只置位不清除；状态由标志推导
// 进入路销前两方都必须已审批
// ==========================================

use crate::domain::delivery_order::ApprovalState;
use crate::domain::types::{ApprovalParty, DoStatus};
use crate::engine::error::{WorkflowError, WorkflowResult};

/// 一次审批的判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalDecision {
    pub approval: ApprovalState,
    pub next_status: DoStatus,
    /// false 表示重复审批，状态与标志均不变
    pub changed: bool,
}

/// 审批后的推导状态
///
/// 两方都未审批时返回 None。
pub fn derived_status(approval: ApprovalState) -> Option<DoStatus> {
    match (approval.project_approved, approval.cisf_approved) {
        (true, true) => Some(DoStatus::BothApproved),
        (true, false) => Some(DoStatus::ProjectApproved),
        (false, true) => Some(DoStatus::CisfApproved),
        (false, false) => None,
    }
}

/// 判定一次审批
pub fn apply(
    status: DoStatus,
    approval: ApprovalState,
    party: ApprovalParty,
) -> WorkflowResult<ApprovalDecision> {
    if status.is_terminal() {
        return Err(WorkflowError::InvalidState {
            status,
            message: "已转入路销，不能再审批".to_string(),
        });
    }
    if !status.is_at_or_after_project_office() {
        return Err(WorkflowError::InvalidState {
            status,
            message: "尚未转至项目办，不能审批".to_string(),
        });
    }

    if approval.is_approved_by(party) {
        return Ok(ApprovalDecision {
            approval,
            next_status: status,
            changed: false,
        });
    }

    let next = approval.with(party);
    let next_status = derived_status(next).ok_or_else(|| WorkflowError::InvalidState {
        status,
        message: "审批标志异常".to_string(),
    })?;

    Ok(ApprovalDecision {
        approval: next,
        next_status,
        changed: true,
    })
}

/// 转入路销前校验双审批
pub fn ensure_both_approved(approval: ApprovalState) -> WorkflowResult<()> {
    if approval.both_approved() {
        return Ok(());
    }
    Err(WorkflowError::ApprovalIncomplete {
        project_approved: approval.project_approved,
        cisf_approved: approval.cisf_approved,
    })
}
