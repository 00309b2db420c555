// ==========================================
// 提货单流转系统 - 状态流转校验
// ==========================================
// 唯一的流转白名单：(from, to) → 触发操作
// 红线: 白名单不含回退边
// ==========================================

use crate::domain::types::{DoStatus, Operation};
use crate::engine::error::{WorkflowError, WorkflowResult};

/// 一条合法流转
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: DoStatus,
    pub to: DoStatus,
    pub operation: Operation,
}

const fn edge(from: DoStatus, to: DoStatus, operation: Operation) -> Transition {
    Transition { from, to, operation }
}

/// 流转白名单
pub const TRANSITIONS: &[Transition] = &[
    edge(DoStatus::Created, DoStatus::AtAreaOffice, Operation::Create),
    edge(DoStatus::AtAreaOffice, DoStatus::AtProjectOffice, Operation::ForwardToProjectOffice),
    edge(DoStatus::AtProjectOffice, DoStatus::ReceivedAtProjectOffice, Operation::Receive),
    edge(DoStatus::AtProjectOffice, DoStatus::ProjectApproved, Operation::ApproveAsProjectOffice),
    edge(DoStatus::AtProjectOffice, DoStatus::CisfApproved, Operation::ApproveAsCisf),
    edge(DoStatus::ReceivedAtProjectOffice, DoStatus::ProjectApproved, Operation::ApproveAsProjectOffice),
    edge(DoStatus::ReceivedAtProjectOffice, DoStatus::CisfApproved, Operation::ApproveAsCisf),
    edge(DoStatus::ProjectApproved, DoStatus::BothApproved, Operation::ApproveAsCisf),
    edge(DoStatus::CisfApproved, DoStatus::BothApproved, Operation::ApproveAsProjectOffice),
    edge(DoStatus::BothApproved, DoStatus::AtRoadSale, Operation::ForwardToRoadSale),
];

/// 查找流转
pub fn find(from: DoStatus, to: DoStatus) -> Option<&'static Transition> {
    TRANSITIONS.iter().find(|t| t.from == from && t.to == to)
}

/// 校验 (from, to) 在白名单内且由指定操作触发
pub fn validate(from: DoStatus, to: DoStatus, operation: Operation) -> WorkflowResult<()> {
    match find(from, to) {
        Some(t) if t.operation == operation => Ok(()),
        _ => Err(WorkflowError::InvalidTransition { from, to }),
    }
}

/// 从某状态出发的全部合法目标
pub fn targets_from(from: DoStatus) -> impl Iterator<Item = &'static Transition> {
    TRANSITIONS.iter().filter(move |t| t.from == from)
}

/// 通用 forward 可直达的目标状态及其操作
///
/// 审批状态只能通过 approve 进入。
pub fn forward_operation_for(to: DoStatus) -> Option<Operation> {
    match to {
        DoStatus::AtProjectOffice => Some(Operation::ForwardToProjectOffice),
        DoStatus::ReceivedAtProjectOffice => Some(Operation::Receive),
        DoStatus::AtRoadSale => Some(Operation::ForwardToRoadSale),
        _ => None,
    }
}

/// 进入某状态的全部触发操作（去重，按白名单顺序）
pub fn operations_into(to: DoStatus) -> Vec<Operation> {
    let mut ops = Vec::new();
    for t in TRANSITIONS.iter().filter(|t| t.to == to) {
        if !ops.contains(&t.operation) {
            ops.push(t.operation);
        }
    }
    ops
}

/// 历史序列是否符合白名单
///
/// `entries` 按时间正序，元素为 (from, to)；from == to 的记录（重复审批）视为合法。
pub fn is_legal_sequence(entries: &[(DoStatus, DoStatus)]) -> bool {
    let mut current: Option<DoStatus> = None;
    for &(from, to) in entries {
        if let Some(cur) = current {
            if cur != from {
                return false;
            }
        }
        if from != to && find(from, to).is_none() {
            return false;
        }
        current = Some(to);
    }
    true
}
