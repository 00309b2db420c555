// ==========================================
// 提货单流转系统 - 角色权限表
// ==========================================
// 单一权限表 (操作 → 允许角色)，所有写操作入口统一在此校验
// ==========================================

use crate::domain::types::{Operation, Role};
use crate::domain::user::Actor;
use crate::engine::error::{WorkflowError, WorkflowResult};

/// 权限表
pub const CAPABILITIES: &[(Operation, &[Role])] = &[
    (Operation::Create, &[Role::Admin, Role::AreaOffice]),
    (Operation::ForwardToProjectOffice, &[Role::Admin, Role::AreaOffice]),
    (Operation::Receive, &[Role::Admin, Role::ProjectOffice]),
    (Operation::ApproveAsProjectOffice, &[Role::Admin, Role::ProjectOffice]),
    (Operation::ApproveAsCisf, &[Role::Admin, Role::Cisf]),
    (
        Operation::ForwardToRoadSale,
        &[Role::Admin, Role::ProjectOffice, Role::Cisf],
    ),
    // 路销只可见终态记录，终态不再登记问题
    (
        Operation::ReportIssue,
        &[Role::Admin, Role::AreaOffice, Role::ProjectOffice, Role::Cisf],
    ),
    (
        Operation::ResolveIssue,
        &[Role::Admin, Role::AreaOffice, Role::ProjectOffice, Role::Cisf],
    ),
    (Operation::Delete, &[Role::Admin, Role::AreaOffice]),
];

/// 角色是否有权执行操作
pub fn is_allowed(operation: Operation, role: Role) -> bool {
    CAPABILITIES
        .iter()
        .find(|(op, _)| *op == operation)
        .map(|(_, roles)| roles.contains(&role))
        .unwrap_or(false)
}

/// 停用用户一律拒绝
pub fn ensure_active(actor: &Actor) -> WorkflowResult<()> {
    if !actor.is_active {
        return Err(WorkflowError::InactiveActor {
            user_id: actor.user_id.clone(),
        });
    }
    Ok(())
}

/// 校验操作人
pub fn authorize(actor: &Actor, operation: Operation) -> WorkflowResult<()> {
    ensure_active(actor)?;
    if !is_allowed(operation, actor.role) {
        tracing::debug!(
            user_id = %actor.user_id,
            role = %actor.role,
            operation = %operation,
            "权限校验未通过"
        );
        return Err(WorkflowError::Unauthorized {
            role: actor.role,
            operation,
        });
    }
    Ok(())
}

/// 校验操作人至少拥有其中一项操作的权限
///
/// `operations` 为空时只校验启用状态。
pub fn authorize_any(actor: &Actor, operations: &[Operation]) -> WorkflowResult<()> {
    ensure_active(actor)?;
    match operations.first() {
        Some(&first) if !operations.iter().any(|op| is_allowed(*op, actor.role)) => {
            authorize(actor, first)
        }
        _ => Ok(()),
    }
}
