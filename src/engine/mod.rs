// ==========================================
// 提货单流转系统 - 引擎层
// ==========================================
// 职责: 实现流转规则与事务编排，不拼 SQL
// 红线: 规则表（流转白名单、权限表）是唯一事实来源
// ==========================================

pub mod approval_gate;
pub mod capability;
pub mod error;
pub mod events;
pub mod issue_gate;
pub mod transition;
pub mod workflow;

// 重导出核心引擎
pub use approval_gate::ApprovalDecision;
pub use capability::{authorize, is_allowed, CAPABILITIES};
pub use error::{ErrorKind, WorkflowError, WorkflowResult};
pub use events::{
    NoOpPublisher, NotificationEvent, NotificationEventType, NotificationPublisher,
    OptionalPublisher,
};
pub use transition::{Transition, TRANSITIONS};
pub use workflow::WorkflowEngine;
