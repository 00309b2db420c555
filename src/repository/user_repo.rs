// ==========================================
// 提货单流转系统 - 用户数据仓储
// ==========================================
// 用户由外部管理模块维护；认证适配器据此解析操作人
// ==========================================

use crate::db::{format_ts, ts_column};
use crate::domain::types::Role;
use crate::domain::user::User;
use crate::repository::enum_column;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const SELECT_COLUMNS: &str = "user_id, username, display_name, role, is_active, created_at";

pub struct UserRepository<'c> {
    conn: &'c Connection,
}

impl<'c> UserRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, user: &User) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO app_user (user_id, username, display_name, role, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                user.user_id,
                user.username,
                user.display_name,
                user.role.as_str(),
                user.is_active,
                format_ts(&user.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, user_id: &str) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {} FROM app_user WHERE user_id = ?1", SELECT_COLUMNS);
        let user = self
            .conn
            .query_row(&sql, params![user_id], map_row)
            .optional()?;
        Ok(user)
    }

    pub fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {} FROM app_user WHERE username = ?1", SELECT_COLUMNS);
        let user = self
            .conn
            .query_row(&sql, params![username], map_row)
            .optional()?;
        Ok(user)
    }

    /// 启用/停用用户
    pub fn set_active(&self, user_id: &str, is_active: bool) -> RepositoryResult<()> {
        let rows = self.conn.execute(
            "UPDATE app_user SET is_active = ?1 WHERE user_id = ?2",
            params![is_active, user_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("User", user_id));
        }
        Ok(())
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role_raw: String = row.get(3)?;
    Ok(User {
        user_id: row.get(0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        role: enum_column(3, &role_raw, Role::parse)?,
        is_active: row.get(4)?,
        created_at: ts_column(row, 5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::fixed_ts;

    #[test]
    fn test_insert_find_and_deactivate() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        let repo = UserRepository::new(&conn);

        repo.insert(&User {
            user_id: "u1".to_string(),
            username: "cisf.guard".to_string(),
            display_name: None,
            role: Role::Cisf,
            is_active: true,
            created_at: fixed_ts(1, 8),
        })
        .unwrap();

        let user = repo.find_by_username("cisf.guard").unwrap().unwrap();
        assert_eq!(user.role, Role::Cisf);

        repo.set_active("u1", false).unwrap();
        assert!(!repo.find_by_id("u1").unwrap().unwrap().is_active);
        assert!(matches!(
            repo.set_active("nobody", true),
            Err(RepositoryError::NotFound { .. })
        ));
    }
}
