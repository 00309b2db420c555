// ==========================================
// 提货单流转系统 - API 层
// ==========================================
// 职责: 请求边界：凭据解析、参数解析、错误渲染
// ==========================================

pub mod auth;
pub mod delivery_order_api;
pub mod error;

// 重导出核心类型
pub use auth::{ActorResolver, Credentials, UserTableResolver};
pub use delivery_order_api::{CreateDeliveryOrderRequest, DeliveryOrderApi, ListDeliveryOrdersRequest};
pub use error::{ApiError, ApiResult, ErrorResponse};
