// ==========================================
// 提货单流转系统 - 查询层
// ==========================================
// 职责: 角色范围过滤与读侧视图组装
// ==========================================

pub mod delivery_order_query;
pub mod role_scope;
pub mod views;

pub use delivery_order_query::{DeliveryOrderQuery, ListFilter, DEFAULT_LIST_LIMIT};
pub use views::{DeliveryOrderSummary, DeliveryOrderView};
