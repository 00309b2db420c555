// ==========================================
// 提货单流转系统 - 引擎层事件发布
// ==========================================
// 职责: 定义通知事件与发布 trait，实现依赖倒置
// 说明: Engine 层定义 trait，notification 层实现发件箱适配器
// 约束: 事件只在事务提交后发布；发布失败不影响已提交的写入
// ==========================================

use crate::domain::types::DoStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 通知事件类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationEventType {
    DeliveryOrderCreated,
    Forwarded,
    Received,
    Approved,
    ForwardedToRoadSale,
    IssueReported,
    IssueResolved,
    Deleted,
}

impl NotificationEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationEventType::DeliveryOrderCreated => "DELIVERY_ORDER_CREATED",
            NotificationEventType::Forwarded => "FORWARDED",
            NotificationEventType::Received => "RECEIVED",
            NotificationEventType::Approved => "APPROVED",
            NotificationEventType::ForwardedToRoadSale => "FORWARDED_TO_ROAD_SALE",
            NotificationEventType::IssueReported => "ISSUE_REPORTED",
            NotificationEventType::IssueResolved => "ISSUE_RESOLVED",
            NotificationEventType::Deleted => "DELETED",
        }
    }
}

/// 通知事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub event_id: String,
    pub event_type: NotificationEventType,
    pub do_id: String,
    pub do_number: String,
    pub actor_id: String,
    pub from_status: Option<DoStatus>,
    pub to_status: Option<DoStatus>,
    pub issue_id: Option<String>,
    pub note: Option<String>,
    pub occurred_at: NaiveDateTime,
}

impl NotificationEvent {
    pub fn new(
        event_type: NotificationEventType,
        do_id: &str,
        do_number: &str,
        actor_id: &str,
        occurred_at: NaiveDateTime,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            event_type,
            do_id: do_id.to_string(),
            do_number: do_number.to_string(),
            actor_id: actor_id.to_string(),
            from_status: None,
            to_status: None,
            issue_id: None,
            note: None,
            occurred_at,
        }
    }

    pub fn with_transition(mut self, from: DoStatus, to: DoStatus) -> Self {
        self.from_status = Some(from);
        self.to_status = Some(to);
        self
    }

    pub fn with_issue(mut self, issue_id: &str) -> Self {
        self.issue_id = Some(issue_id.to_string());
        self
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 通知事件发布者
///
/// 返回值为发布后的事件 ID（不支持时为空字符串）。
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, event: &NotificationEvent) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者（单元测试或关闭通知时使用）
#[derive(Debug, Clone, Default)]
pub struct NoOpPublisher;

impl NotificationPublisher for NoOpPublisher {
    fn publish(&self, event: &NotificationEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            do_id = %event.do_id,
            event_type = event.event_type.as_str(),
            "NoOpPublisher: 跳过事件发布"
        );
        Ok(String::new())
    }
}

/// 可选的事件发布者包装
pub struct OptionalPublisher {
    inner: Option<Arc<dyn NotificationPublisher>>,
}

impl OptionalPublisher {
    pub fn with_publisher(publisher: Arc<dyn NotificationPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件；失败只记录告警
    pub fn publish_logged(&self, event: &NotificationEvent) {
        let Some(publisher) = &self.inner else {
            return;
        };
        if let Err(e) = publisher.publish(event) {
            tracing::warn!(
                do_id = %event.do_id,
                event_type = event.event_type.as_str(),
                error = %e,
                "通知事件发布失败，已提交的写入不受影响"
            );
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalPublisher {
    fn default() -> Self {
        Self::none()
    }
}
