// ==========================================
// 提货单流转系统 - 流转历史数据仓储
// ==========================================
// 红线: 只追加；不提供更新接口
// ==========================================

use crate::db::{format_ts, ts_column};
use crate::domain::history::WorkflowHistoryEntry;
use crate::domain::types::{DoStatus, Operation};
use crate::repository::enum_column;
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Connection, Row};

pub struct WorkflowHistoryRepository<'c> {
    conn: &'c Connection,
}

impl<'c> WorkflowHistoryRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 追加历史记录
    pub fn append(&self, entry: &WorkflowHistoryEntry) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO workflow_history (
                history_id, do_id, from_status, to_status, action, actor_id, note, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                entry.history_id,
                entry.do_id,
                entry.from_status.as_str(),
                entry.to_status.as_str(),
                entry.action.as_str(),
                entry.actor_id,
                entry.note,
                format_ts(&entry.created_at),
            ],
        )?;
        Ok(())
    }

    /// 查询提货单历史（最新在前）
    pub fn list_by_do(&self, do_id: &str) -> RepositoryResult<Vec<WorkflowHistoryEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT history_id, do_id, from_status, to_status, action, actor_id, note, created_at
              FROM workflow_history
             WHERE do_id = ?1
             ORDER BY created_at DESC, rowid DESC
            "#,
        )?;

        let entries = stmt
            .query_map(params![do_id], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn count_by_do(&self, do_id: &str) -> RepositoryResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM workflow_history WHERE do_id = ?1",
            params![do_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 删除提货单全部历史（仅随早期提货单删除使用）
    pub fn delete_by_do(&self, do_id: &str) -> RepositoryResult<usize> {
        let rows = self
            .conn
            .execute("DELETE FROM workflow_history WHERE do_id = ?1", params![do_id])?;
        Ok(rows)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<WorkflowHistoryEntry> {
    let from_raw: String = row.get(2)?;
    let to_raw: String = row.get(3)?;
    let action_raw: String = row.get(4)?;
    Ok(WorkflowHistoryEntry {
        history_id: row.get(0)?,
        do_id: row.get(1)?,
        from_status: enum_column(2, &from_raw, DoStatus::parse)?,
        to_status: enum_column(3, &to_raw, DoStatus::parse)?,
        action: enum_column(4, &action_raw, Operation::parse)?,
        actor_id: row.get(5)?,
        note: row.get(6)?,
        created_at: ts_column(row, 7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::delivery_order_repo::DeliveryOrderRepository;
    use crate::repository::party_repo::PartyRepository;
    use crate::repository::test_support::{fixed_ts, sample_order, sample_party};

    fn entry(id: &str, from: DoStatus, to: DoStatus, action: Operation) -> WorkflowHistoryEntry {
        WorkflowHistoryEntry {
            history_id: id.to_string(),
            do_id: "d1".to_string(),
            from_status: from,
            to_status: to,
            action,
            actor_id: "u1".to_string(),
            note: None,
            // 同一时间戳，依赖 rowid 保证顺序
            created_at: fixed_ts(2, 10),
        }
    }

    #[test]
    fn test_append_list_most_recent_first() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        PartyRepository::new(&conn).insert(&sample_party("P1")).unwrap();
        DeliveryOrderRepository::new(&conn)
            .insert(&sample_order("d1", "DO-1", "P1", "u1"))
            .unwrap();

        let repo = WorkflowHistoryRepository::new(&conn);
        repo.append(&entry("h1", DoStatus::Created, DoStatus::AtAreaOffice, Operation::Create))
            .unwrap();
        repo.append(&entry(
            "h2",
            DoStatus::AtAreaOffice,
            DoStatus::AtProjectOffice,
            Operation::ForwardToProjectOffice,
        ))
        .unwrap();

        let entries = repo.list_by_do("d1").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].history_id, "h2");
        assert_eq!(entries[1].action, Operation::Create);
        assert_eq!(repo.count_by_do("d1").unwrap(), 2);

        assert_eq!(repo.delete_by_do("d1").unwrap(), 2);
        assert_eq!(repo.count_by_do("d1").unwrap(), 0);
    }
}
