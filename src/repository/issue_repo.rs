// ==========================================
// 提货单流转系统 - 问题数据仓储
// ==========================================
// 红线: RESOLVED 的问题不再更新
// ==========================================

use crate::db::{format_ts, opt_ts_column, ts_column};
use crate::domain::issue::Issue;
use crate::domain::types::{IssueCategory, IssueStatus};
use crate::repository::enum_column;
use crate::repository::error::RepositoryResult;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};

const SELECT_COLUMNS: &str = r#"
    issue_id, do_id, category, description, status, reported_by,
    resolution, resolved_by, created_at, resolved_at
"#;

pub struct IssueRepository<'c> {
    conn: &'c Connection,
}

impl<'c> IssueRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 插入问题
    pub fn insert(&self, issue: &Issue) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO issue (
                issue_id, do_id, category, description, status, reported_by,
                resolution, resolved_by, created_at, resolved_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                issue.issue_id,
                issue.do_id,
                issue.category.as_str(),
                issue.description,
                issue.status.as_str(),
                issue.reported_by,
                issue.resolution,
                issue.resolved_by,
                format_ts(&issue.created_at),
                issue.resolved_at.as_ref().map(format_ts),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, issue_id: &str) -> RepositoryResult<Option<Issue>> {
        let sql = format!("SELECT {} FROM issue WHERE issue_id = ?1", SELECT_COLUMNS);
        let issue = self
            .conn
            .query_row(&sql, params![issue_id], map_row)
            .optional()?;
        Ok(issue)
    }

    /// 查询提货单的问题，按上报时间倒序
    pub fn list_by_do(&self, do_id: &str, only_open: bool) -> RepositoryResult<Vec<Issue>> {
        let sql = if only_open {
            format!(
                "SELECT {} FROM issue WHERE do_id = ?1 AND status = 'OPEN' ORDER BY created_at DESC, rowid DESC",
                SELECT_COLUMNS
            )
        } else {
            format!(
                "SELECT {} FROM issue WHERE do_id = ?1 ORDER BY created_at DESC, rowid DESC",
                SELECT_COLUMNS
            )
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let issues = stmt
            .query_map(params![do_id], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(issues)
    }

    /// 未解决问题数量
    pub fn count_open(&self, do_id: &str) -> RepositoryResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM issue WHERE do_id = ?1 AND status = 'OPEN'",
            params![do_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 关闭问题
    ///
    /// 仅更新 OPEN 状态的记录；返回受影响行数（0 表示已被关闭或不存在）。
    pub fn resolve(
        &self,
        issue_id: &str,
        resolution: &str,
        resolved_by: &str,
        resolved_at: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        let rows = self.conn.execute(
            r#"
            UPDATE issue
               SET status = 'RESOLVED', resolution = ?1, resolved_by = ?2, resolved_at = ?3
             WHERE issue_id = ?4 AND status = 'OPEN'
            "#,
            params![resolution, resolved_by, format_ts(&resolved_at), issue_id],
        )?;
        Ok(rows)
    }

    /// 删除提货单下全部问题（仅随提货单删除使用）
    pub fn delete_by_do(&self, do_id: &str) -> RepositoryResult<usize> {
        let rows = self
            .conn
            .execute("DELETE FROM issue WHERE do_id = ?1", params![do_id])?;
        Ok(rows)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<Issue> {
    let category_raw: String = row.get(2)?;
    let status_raw: String = row.get(4)?;
    Ok(Issue {
        issue_id: row.get(0)?,
        do_id: row.get(1)?,
        category: enum_column(2, &category_raw, IssueCategory::parse)?,
        description: row.get(3)?,
        status: enum_column(4, &status_raw, IssueStatus::parse)?,
        reported_by: row.get(5)?,
        resolution: row.get(6)?,
        resolved_by: row.get(7)?,
        created_at: ts_column(row, 8)?,
        resolved_at: opt_ts_column(row, 9)?,
    })
}
