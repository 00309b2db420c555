// ==========================================
// 提货单流转系统 - 提货单数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 并发: 状态写入使用 revision 乐观锁 (compare-and-swap)
// ==========================================

use crate::db::{format_ts, ts_column};
use crate::domain::delivery_order::DeliveryOrder;
use crate::domain::types::DoStatus;
use crate::repository::enum_column;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const SELECT_COLUMNS: &str = r#"
    do_id, do_number, party_id, authorized_person, valid_from, valid_to,
    status, project_approved, cisf_approved, notes, created_by,
    created_at, updated_at, revision
"#;

// ==========================================
// 列表过滤条件
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct DeliveryOrderFilter {
    /// 仅创建人
    pub created_by: Option<String>,
    /// 状态集合（None 表示不限）
    pub statuses: Option<Vec<DoStatus>>,
    /// 提货单号包含匹配
    pub number_contains: Option<String>,
    pub limit: Option<u32>,
}

// ==========================================
// DeliveryOrderRepository - 提货单仓储
// ==========================================
// 绑定到一个连接或事务（Transaction 可解引用为 Connection）
pub struct DeliveryOrderRepository<'c> {
    conn: &'c Connection,
}

impl<'c> DeliveryOrderRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 插入提货单
    pub fn insert(&self, order: &DeliveryOrder) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO delivery_order (
                do_id, do_number, party_id, authorized_person, valid_from, valid_to,
                status, project_approved, cisf_approved, notes, created_by,
                created_at, updated_at, revision
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                order.do_id,
                order.do_number,
                order.party_id,
                order.authorized_person,
                format_ts(&order.valid_from),
                format_ts(&order.valid_to),
                order.status.as_str(),
                order.project_approved,
                order.cisf_approved,
                order.notes,
                order.created_by,
                format_ts(&order.created_at),
                format_ts(&order.updated_at),
                order.revision,
            ],
        )?;
        Ok(())
    }

    /// 按 do_id 查询
    pub fn find_by_id(&self, do_id: &str) -> RepositoryResult<Option<DeliveryOrder>> {
        let sql = format!("SELECT {} FROM delivery_order WHERE do_id = ?1", SELECT_COLUMNS);
        let order = self
            .conn
            .query_row(&sql, params![do_id], map_row)
            .optional()?;
        Ok(order)
    }

    /// 按提货单号查询
    pub fn find_by_number(&self, do_number: &str) -> RepositoryResult<Option<DeliveryOrder>> {
        let sql = format!("SELECT {} FROM delivery_order WHERE do_number = ?1", SELECT_COLUMNS);
        let order = self
            .conn
            .query_row(&sql, params![do_number], map_row)
            .optional()?;
        Ok(order)
    }

    /// 提货单号是否已被占用
    pub fn number_exists(&self, do_number: &str) -> RepositoryResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM delivery_order WHERE do_number = ?1",
            params![do_number],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// 写入状态与审批标志 (带乐观锁检查)
    ///
    /// `order.revision` 为读取时的版本号；成功后返回新版本号。
    ///
    /// # 错误
    /// - `RepositoryError::OptimisticLockFailure`: revision不匹配 (其他请求已更新)
    /// - `RepositoryError::NotFound`: do_id不存在
    pub fn update_state(
        &self,
        order: &DeliveryOrder,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<i64> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE delivery_order
               SET status = ?1, project_approved = ?2, cisf_approved = ?3,
                   updated_at = ?4, revision = revision + 1
             WHERE do_id = ?5 AND revision = ?6
            "#,
            params![
                order.status.as_str(),
                order.project_approved,
                order.cisf_approved,
                format_ts(&updated_at),
                order.do_id,
                order.revision,
            ],
        )?;

        if rows_affected == 0 {
            // 判断是记录不存在还是revision冲突
            let actual: Option<i64> = self
                .conn
                .query_row(
                    "SELECT revision FROM delivery_order WHERE do_id = ?1",
                    params![order.do_id],
                    |row| row.get(0),
                )
                .optional()?;

            return match actual {
                Some(actual) => Err(RepositoryError::OptimisticLockFailure {
                    entity: "DeliveryOrder".to_string(),
                    id: order.do_id.clone(),
                    expected: order.revision,
                    actual,
                }),
                None => Err(RepositoryError::not_found("DeliveryOrder", &order.do_id)),
            };
        }

        Ok(order.revision + 1)
    }

    /// 删除提货单（调用方负责先删除问题与历史）
    pub fn delete(&self, do_id: &str) -> RepositoryResult<usize> {
        let rows = self
            .conn
            .execute("DELETE FROM delivery_order WHERE do_id = ?1", params![do_id])?;
        Ok(rows)
    }

    /// 按过滤条件列表查询，按创建时间倒序
    pub fn list(&self, filter: &DeliveryOrderFilter) -> RepositoryResult<Vec<DeliveryOrder>> {
        let mut sql = format!("SELECT {} FROM delivery_order WHERE 1 = 1", SELECT_COLUMNS);
        let mut values: Vec<Value> = Vec::new();

        if let Some(created_by) = &filter.created_by {
            values.push(Value::Text(created_by.clone()));
            sql.push_str(&format!(" AND created_by = ?{}", values.len()));
        }

        if let Some(statuses) = &filter.statuses {
            if statuses.is_empty() {
                return Ok(Vec::new());
            }
            let mut placeholders = Vec::with_capacity(statuses.len());
            for status in statuses {
                values.push(Value::Text(status.as_str().to_string()));
                placeholders.push(format!("?{}", values.len()));
            }
            sql.push_str(&format!(" AND status IN ({})", placeholders.join(", ")));
        }

        if let Some(needle) = filter.number_contains.as_deref().map(str::trim) {
            if !needle.is_empty() {
                values.push(Value::Text(needle.to_string()));
                sql.push_str(&format!(" AND instr(do_number, ?{}) > 0", values.len()));
            }
        }

        sql.push_str(" ORDER BY created_at DESC, rowid DESC");

        if let Some(limit) = filter.limit {
            values.push(Value::Integer(i64::from(limit)));
            sql.push_str(&format!(" LIMIT ?{}", values.len()));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let orders = stmt
            .query_map(params_from_iter(values.iter()), map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(orders)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<DeliveryOrder> {
    let status_raw: String = row.get(6)?;
    Ok(DeliveryOrder {
        do_id: row.get(0)?,
        do_number: row.get(1)?,
        party_id: row.get(2)?,
        authorized_person: row.get(3)?,
        valid_from: ts_column(row, 4)?,
        valid_to: ts_column(row, 5)?,
        status: enum_column(6, &status_raw, DoStatus::parse)?,
        project_approved: row.get(7)?,
        cisf_approved: row.get(8)?,
        notes: row.get(9)?,
        created_by: row.get(10)?,
        created_at: ts_column(row, 11)?,
        updated_at: ts_column(row, 12)?,
        revision: row.get(13)?,
    })
}
