// ==========================================
// 提货单流转系统 - 角色可见范围
// ==========================================
// 列表、单条查询与写操作共用同一套可见性规则
// 不可见的记录对调用方表现为不存在
// ==========================================

use crate::domain::delivery_order::DeliveryOrder;
use crate::domain::types::{DoStatus, Role};
use crate::domain::user::Actor;
use crate::repository::delivery_order_repo::DeliveryOrderFilter;

/// 角色可见的状态集合（None 表示不按状态限制）
pub fn visible_statuses(role: Role) -> Option<Vec<DoStatus>> {
    match role {
        Role::Admin | Role::AreaOffice => None,
        Role::ProjectOffice | Role::Cisf => Some(
            DoStatus::ALL
                .iter()
                .copied()
                .filter(|s| s.is_at_or_after_project_office())
                .collect(),
        ),
        Role::RoadSale => Some(vec![DoStatus::AtRoadSale]),
    }
}

/// 操作人能否看到该提货单
pub fn can_view(actor: &Actor, order: &DeliveryOrder) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::AreaOffice => order.created_by == actor.user_id,
        Role::ProjectOffice | Role::Cisf => order.status.is_at_or_after_project_office(),
        Role::RoadSale => order.status == DoStatus::AtRoadSale,
    }
}

/// 构造带角色限制的过滤条件
///
/// `requested` 为调用方请求的状态；与角色可见集合取交集。
pub fn scoped_filter(
    actor: &Actor,
    requested: Option<&[DoStatus]>,
    number_contains: Option<String>,
    limit: Option<u32>,
) -> DeliveryOrderFilter {
    let created_by = match actor.role {
        Role::AreaOffice => Some(actor.user_id.clone()),
        _ => None,
    };

    let statuses = match (visible_statuses(actor.role), requested) {
        (None, None) => None,
        (None, Some(req)) => Some(req.to_vec()),
        (Some(allowed), None) => Some(allowed),
        (Some(allowed), Some(req)) => Some(
            req.iter()
                .copied()
                .filter(|s| allowed.contains(s))
                .collect(),
        ),
    };

    DeliveryOrderFilter {
        created_by,
        statuses,
        number_contains,
        limit,
    }
}
