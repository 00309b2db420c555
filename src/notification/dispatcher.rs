// ==========================================
// 提货单流转系统 - 通知投递器
// ==========================================
// 按创建顺序批量认领 PENDING 记录并投递
// 失败: retry_count + 1，未达上限放回 PENDING，否则 FAILED
// 约束: 不跨 await 持有数据库锁
// ==========================================

use crate::config::NotificationSettings;
use crate::db::SharedConnection;
use crate::engine::events::NotificationEvent;
use crate::notification::notifier::{Notifier, NotifyError};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::notification_repo::{NotificationOutboxRepository, OutboxRecord};
use rusqlite::Connection;
use std::sync::{Arc, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;

/// 单批投递结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub claimed: usize,
    pub sent: usize,
    pub retried: usize,
    pub failed: usize,
    /// 结果写回失败的记录数
    pub errors: usize,
}

pub struct NotificationDispatcher {
    conn: SharedConnection,
    notifier: Arc<dyn Notifier>,
    settings: NotificationSettings,
}

impl NotificationDispatcher {
    pub fn new(
        conn: SharedConnection,
        notifier: Arc<dyn Notifier>,
        settings: NotificationSettings,
    ) -> Self {
        Self {
            conn,
            notifier,
            settings,
        }
    }

    /// 进程启动时把中断遗留的 DISPATCHING 记录放回队列
    pub fn recover_stale(&self) -> RepositoryResult<usize> {
        let conn = self.lock_conn()?;
        let rows = NotificationOutboxRepository::new(&conn).requeue_stale_dispatching()?;
        if rows > 0 {
            tracing::warn!(rows, "发件箱存在中断的投递记录，已放回队列");
        }
        Ok(rows)
    }

    /// 投递一批
    ///
    /// 单条记录写回失败不中断本批；批末把遗留的 DISPATCHING 记录放回队列。
    pub async fn dispatch_batch(&self) -> RepositoryResult<DispatchReport> {
        let records = {
            let conn = self.lock_conn()?;
            NotificationOutboxRepository::new(&conn).claim_pending(self.settings.batch_size)?
        };

        let mut report = DispatchReport {
            claimed: records.len(),
            ..DispatchReport::default()
        };

        for record in records {
            let outcome = match serde_json::from_value::<NotificationEvent>(record.payload_json.clone()) {
                Ok(event) => self.notifier.notify(&event).await,
                Err(e) => Err(NotifyError::InvalidPayload(e.to_string())),
            };

            if let Err(e) = self.settle(&record, outcome, &mut report) {
                tracing::error!(event_id = %record.event_id, error = %e, "通知投递结果写回失败");
                report.errors += 1;
            }
        }

        if report.errors > 0 {
            if let Err(e) = self.recover_stale() {
                tracing::error!(error = %e, "发件箱记录放回队列失败");
            }
        }

        Ok(report)
    }

    /// 写回单条投递结果
    fn settle(
        &self,
        record: &OutboxRecord,
        outcome: Result<(), NotifyError>,
        report: &mut DispatchReport,
    ) -> RepositoryResult<()> {
        let conn = self.lock_conn()?;
        let repo = NotificationOutboxRepository::new(&conn);
        match outcome {
            Ok(()) => {
                repo.mark_sent(&record.event_id, chrono::Local::now().naive_local())?;
                report.sent += 1;
            }
            Err(NotifyError::InvalidPayload(msg)) => {
                repo.mark_failed(&record.event_id, &msg, record.retry_count)?;
                tracing::error!(event_id = %record.event_id, error = %msg, "通知载荷无法解析，不再重试");
                report.failed += 1;
            }
            Err(e) => {
                let retry_count = record.retry_count + 1;
                let message = e.to_string();
                if retry_count < record.max_retries {
                    repo.mark_for_retry(&record.event_id, &message, retry_count)?;
                    tracing::info!(
                        event_id = %record.event_id,
                        retry_count,
                        "通知投递失败，将重试"
                    );
                    report.retried += 1;
                } else {
                    repo.mark_failed(&record.event_id, &message, retry_count)?;
                    tracing::error!(
                        event_id = %record.event_id,
                        retry_count,
                        error = %message,
                        "通知投递失败，达到最大重试次数"
                    );
                    report.failed += 1;
                }
            }
        }
        Ok(())
    }

    /// 按配置间隔循环投递，直到收到停止信号
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let period = Duration::from_millis(self.settings.dispatch_interval_ms.max(1));
        let mut interval = tokio::time::interval(period);
        tracing::info!(interval_ms = self.settings.dispatch_interval_ms, "通知投递器已启动");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.dispatch_batch().await {
                        Ok(report) if report.claimed > 0 => {
                            tracing::info!(
                                claimed = report.claimed,
                                sent = report.sent,
                                retried = report.retried,
                                failed = report.failed,
                                errors = report.errors,
                                "通知批次已处理"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => tracing::error!(error = %e, "通知批次处理失败"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("通知投递器已停止");
    }

    fn lock_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}
