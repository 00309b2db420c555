// ==========================================
// 提货单流转系统 - 通知层
// ==========================================
// 职责: 发件箱入队、异步投递与重试
// 说明: 写操作只负责入队，投递失败不影响工作流
// ==========================================

pub mod dispatcher;
pub mod notifier;
pub mod outbox;

pub use dispatcher::{DispatchReport, NotificationDispatcher};
pub use notifier::{LoggingNotifier, Notifier, NotifyError};
pub use outbox::OutboxPublisher;
