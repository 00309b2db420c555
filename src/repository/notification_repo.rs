// ==========================================
// 提货单流转系统 - 通知发件箱数据仓储
// ==========================================
// 表: notification_outbox
// 状态: PENDING → DISPATCHING → SENT | PENDING(重试) | FAILED
// ==========================================

use crate::db::{format_ts, opt_ts_column, ts_column};
use crate::repository::enum_column;
use crate::repository::error::RepositoryResult;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// 发件箱记录状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboxStatus {
    Pending,
    Dispatching,
    Sent,
    Failed,
}

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Pending => "PENDING",
            OutboxStatus::Dispatching => "DISPATCHING",
            OutboxStatus::Sent => "SENT",
            OutboxStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(OutboxStatus::Pending),
            "DISPATCHING" => Some(OutboxStatus::Dispatching),
            "SENT" => Some(OutboxStatus::Sent),
            "FAILED" => Some(OutboxStatus::Failed),
            _ => None,
        }
    }
}

/// 发件箱记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxRecord {
    pub event_id: String,
    pub event_type: String,
    pub do_id: String,
    pub payload_json: JsonValue,
    pub status: OutboxStatus,
    pub retry_count: i32,
    pub max_retries: i32,
    pub created_at: NaiveDateTime,
    pub dispatched_at: Option<NaiveDateTime>,
    pub error_message: Option<String>,
}

impl OutboxRecord {
    /// 失败后是否还可重试
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }
}

/// 各状态计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxCounts {
    pub pending: i64,
    pub dispatching: i64,
    pub sent: i64,
    pub failed: i64,
}

const SELECT_COLUMNS: &str = r#"
    event_id, event_type, do_id, payload_json, status, retry_count,
    max_retries, created_at, dispatched_at, error_message
"#;

pub struct NotificationOutboxRepository<'c> {
    conn: &'c Connection,
}

impl<'c> NotificationOutboxRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 入队
    pub fn enqueue(&self, record: &OutboxRecord) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO notification_outbox (
                event_id, event_type, do_id, payload_json, status, retry_count,
                max_retries, created_at, dispatched_at, error_message
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                record.event_id,
                record.event_type,
                record.do_id,
                record.payload_json.to_string(),
                record.status.as_str(),
                record.retry_count,
                record.max_retries,
                format_ts(&record.created_at),
                record.dispatched_at.as_ref().map(format_ts),
                record.error_message,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, event_id: &str) -> RepositoryResult<Option<OutboxRecord>> {
        let sql = format!("SELECT {} FROM notification_outbox WHERE event_id = ?1", SELECT_COLUMNS);
        let record = self
            .conn
            .query_row(&sql, params![event_id], map_row)
            .optional()?;
        Ok(record)
    }

    /// 认领最早的一批待投递记录并标记为 DISPATCHING
    pub fn claim_pending(&self, limit: usize) -> RepositoryResult<Vec<OutboxRecord>> {
        let sql = format!(
            "SELECT {} FROM notification_outbox WHERE status = 'PENDING' ORDER BY created_at ASC, rowid ASC LIMIT ?1",
            SELECT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut records = stmt
            .query_map(params![limit as i64], map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        for record in records.iter_mut() {
            self.conn.execute(
                "UPDATE notification_outbox SET status = 'DISPATCHING' WHERE event_id = ?1",
                params![record.event_id],
            )?;
            record.status = OutboxStatus::Dispatching;
        }

        Ok(records)
    }

    pub fn mark_sent(&self, event_id: &str, dispatched_at: NaiveDateTime) -> RepositoryResult<()> {
        self.conn.execute(
            "UPDATE notification_outbox SET status = 'SENT', dispatched_at = ?1, error_message = NULL WHERE event_id = ?2",
            params![format_ts(&dispatched_at), event_id],
        )?;
        Ok(())
    }

    /// 投递失败，放回队列等待重试
    pub fn mark_for_retry(&self, event_id: &str, error: &str, retry_count: i32) -> RepositoryResult<()> {
        self.conn.execute(
            "UPDATE notification_outbox SET status = 'PENDING', error_message = ?1, retry_count = ?2 WHERE event_id = ?3",
            params![error, retry_count, event_id],
        )?;
        Ok(())
    }

    /// 投递失败且达到最大重试次数
    pub fn mark_failed(&self, event_id: &str, error: &str, retry_count: i32) -> RepositoryResult<()> {
        self.conn.execute(
            "UPDATE notification_outbox SET status = 'FAILED', error_message = ?1, retry_count = ?2 WHERE event_id = ?3",
            params![error, retry_count, event_id],
        )?;
        Ok(())
    }

    /// 把中断遗留的 DISPATCHING 记录放回队列（进程重启时调用）
    pub fn requeue_stale_dispatching(&self) -> RepositoryResult<usize> {
        let rows = self.conn.execute(
            "UPDATE notification_outbox SET status = 'PENDING' WHERE status = 'DISPATCHING'",
            [],
        )?;
        Ok(rows)
    }

    pub fn list_by_do(&self, do_id: &str) -> RepositoryResult<Vec<OutboxRecord>> {
        let sql = format!(
            "SELECT {} FROM notification_outbox WHERE do_id = ?1 ORDER BY created_at ASC, rowid ASC",
            SELECT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![do_id], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn counts(&self) -> RepositoryResult<OutboxCounts> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM notification_outbox GROUP BY status")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

        let mut counts = OutboxCounts::default();
        for row in rows {
            let (status, n) = row?;
            match OutboxStatus::parse(&status) {
                Some(OutboxStatus::Pending) => counts.pending = n,
                Some(OutboxStatus::Dispatching) => counts.dispatching = n,
                Some(OutboxStatus::Sent) => counts.sent = n,
                Some(OutboxStatus::Failed) => counts.failed = n,
                None => tracing::warn!(status = %status, "发件箱存在未知状态"),
            }
        }
        Ok(counts)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<OutboxRecord> {
    let payload_raw: String = row.get(3)?;
    let status_raw: String = row.get(4)?;
    let payload_json = serde_json::from_str(&payload_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(OutboxRecord {
        event_id: row.get(0)?,
        event_type: row.get(1)?,
        do_id: row.get(2)?,
        payload_json,
        status: enum_column(4, &status_raw, OutboxStatus::parse)?,
        retry_count: row.get(5)?,
        max_retries: row.get(6)?,
        created_at: ts_column(row, 7)?,
        dispatched_at: opt_ts_column(row, 8)?,
        error_message: row.get(9)?,
    })
}
