// ==========================================
// 提货单流转系统 - 通知投递接口
// ==========================================

use crate::engine::events::NotificationEvent;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("通知投递失败: {0}")]
    Delivery(String),

    #[error("通知载荷无效: {0}")]
    InvalidPayload(String),
}

/// 通知投递方（邮件、消息等外部通道）
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError>;
}

/// 仅写日志的投递方
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        tracing::info!(
            event_id = %event.event_id,
            event_type = event.event_type.as_str(),
            do_id = %event.do_id,
            do_number = %event.do_number,
            actor = %event.actor_id,
            from = ?event.from_status,
            to = ?event.to_status,
            "提货单通知"
        );
        Ok(())
    }
}
