// ==========================================
// 提货单流转系统 - 发件箱发布适配器
// ==========================================
// 职责: 实现 Engine 层定义的 NotificationPublisher trait
// 说明: 把 NotificationEvent 写入 notification_outbox (PENDING)
// ==========================================

use crate::config::NotificationSettings;
use crate::db::SharedConnection;
use crate::engine::events::{NotificationEvent, NotificationPublisher};
use crate::repository::notification_repo::{NotificationOutboxRepository, OutboxRecord, OutboxStatus};
use std::error::Error;

pub struct OutboxPublisher {
    conn: SharedConnection,
    settings: NotificationSettings,
}

impl OutboxPublisher {
    pub fn new(conn: SharedConnection, settings: NotificationSettings) -> Self {
        Self { conn, settings }
    }

    fn to_record(&self, event: &NotificationEvent) -> Result<OutboxRecord, serde_json::Error> {
        Ok(OutboxRecord {
            event_id: event.event_id.clone(),
            event_type: event.event_type.as_str().to_string(),
            do_id: event.do_id.clone(),
            payload_json: serde_json::to_value(event)?,
            status: OutboxStatus::Pending,
            retry_count: 0,
            max_retries: self.settings.max_retries,
            created_at: event.occurred_at,
            dispatched_at: None,
            error_message: None,
        })
    }
}

impl NotificationPublisher for OutboxPublisher {
    fn publish(&self, event: &NotificationEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        if !self.settings.enabled {
            tracing::debug!(
                do_id = %event.do_id,
                event_type = event.event_type.as_str(),
                "通知已关闭，跳过入队"
            );
            return Ok(String::new());
        }

        let record = self.to_record(event)?;
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("锁获取失败: {}", e))?;
        NotificationOutboxRepository::new(&conn).enqueue(&record)?;

        tracing::debug!(
            event_id = %record.event_id,
            do_id = %record.do_id,
            event_type = %record.event_type,
            "通知事件已入队"
        );
        Ok(record.event_id)
    }
}
