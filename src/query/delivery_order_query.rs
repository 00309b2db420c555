// ==========================================
// 提货单流转系统 - 角色范围查询服务
// ==========================================
// 列表与单条查询使用同一套角色可见规则
// ==========================================

use crate::db::SharedConnection;
use crate::domain::delivery_order::DeliveryOrder;
use crate::domain::history::WorkflowHistoryEntry;
use crate::domain::issue::Issue;
use crate::domain::types::DoStatus;
use crate::domain::user::Actor;
use crate::engine::capability;
use crate::engine::error::{WorkflowError, WorkflowResult};
use crate::query::role_scope;
use crate::query::views::{self, DeliveryOrderSummary, DeliveryOrderView};
use crate::repository::delivery_order_repo::DeliveryOrderRepository;
use crate::repository::error::RepositoryError;
use crate::repository::history_repo::WorkflowHistoryRepository;
use crate::repository::issue_repo::IssueRepository;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::MutexGuard;

/// 默认列表条数上限
pub const DEFAULT_LIST_LIMIT: u32 = 200;

/// 列表过滤条件（调用方请求）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListFilter {
    pub statuses: Option<Vec<DoStatus>>,
    pub number_contains: Option<String>,
    pub limit: Option<u32>,
}

pub struct DeliveryOrderQuery {
    conn: SharedConnection,
}

impl DeliveryOrderQuery {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// 单条查询；不可见视为不存在
    pub fn get(&self, actor: &Actor, do_id: &str) -> WorkflowResult<DeliveryOrderView> {
        capability::ensure_active(actor)?;
        let conn = self.lock_conn()?;
        let order = find_visible(&conn, actor, do_id)?;
        Ok(views::assemble_view(&conn, order)?)
    }

    /// 按角色范围列表查询，最新在前
    pub fn list(&self, actor: &Actor, filter: &ListFilter) -> WorkflowResult<Vec<DeliveryOrderSummary>> {
        capability::ensure_active(actor)?;

        let number_contains = filter
            .number_contains
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let scoped = role_scope::scoped_filter(
            actor,
            filter.statuses.as_deref(),
            number_contains,
            Some(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT)),
        );
        tracing::debug!(
            actor = %actor.user_id,
            role = %actor.role,
            filter = ?scoped,
            "按角色范围查询提货单"
        );

        let conn = self.lock_conn()?;
        let orders = DeliveryOrderRepository::new(&conn).list(&scoped)?;
        Ok(views::assemble_summaries(&conn, orders)?)
    }

    /// 流转历史，最新在前
    pub fn history(&self, actor: &Actor, do_id: &str) -> WorkflowResult<Vec<WorkflowHistoryEntry>> {
        capability::ensure_active(actor)?;
        let conn = self.lock_conn()?;
        find_visible(&conn, actor, do_id)?;
        Ok(WorkflowHistoryRepository::new(&conn).list_by_do(do_id)?)
    }

    pub fn issues(&self, actor: &Actor, do_id: &str, only_open: bool) -> WorkflowResult<Vec<Issue>> {
        capability::ensure_active(actor)?;
        let conn = self.lock_conn()?;
        find_visible(&conn, actor, do_id)?;
        Ok(IssueRepository::new(&conn).list_by_do(do_id, only_open)?)
    }

    fn lock_conn(&self) -> WorkflowResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| WorkflowError::from(RepositoryError::LockError(e.to_string())))
    }
}

fn find_visible(conn: &Connection, actor: &Actor, do_id: &str) -> WorkflowResult<DeliveryOrder> {
    let order = DeliveryOrderRepository::new(conn)
        .find_by_id(do_id)?
        .ok_or_else(|| WorkflowError::not_found("DeliveryOrder", do_id))?;
    if !role_scope::can_view(actor, &order) {
        return Err(WorkflowError::not_found("DeliveryOrder", do_id));
    }
    Ok(order)
}
