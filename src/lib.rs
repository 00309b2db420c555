// ==========================================
// 提货单流转系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 提货单多部门流转与双审批
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 流转规则与事务编排
pub mod engine;

// 查询层 - 角色范围查询与读侧视图
pub mod query;

// 通知层 - 发件箱与投递
pub mod notification;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 请求边界
pub mod api;

// 应用层 - 组件装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ApprovalParty, DoStatus, IssueCategory, IssueStatus, Operation, Role};

// 领域实体
pub use domain::{Actor, ApprovalState, DeliveryOrder, Issue, NewDeliveryOrder, Party, User, WorkflowHistoryEntry};

// 引擎
pub use engine::{ErrorKind, WorkflowEngine, WorkflowError, WorkflowResult};

// 查询
pub use query::{DeliveryOrderQuery, DeliveryOrderSummary, DeliveryOrderView, ListFilter};

// API
pub use api::{ApiError, Credentials, DeliveryOrderApi, ErrorResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "提货单流转系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
