// ==========================================
// 提货单流转系统 - 收货单位数据仓储
// ==========================================
// 收货单位由外部管理模块维护；此处提供只读查询与初始化写入
// ==========================================

use crate::db::{format_ts, ts_column};
use crate::domain::party::Party;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// 收货单位查询接口
pub trait PartyDirectory {
    /// 查询收货单位；不存在时返回 NotFound
    fn get_party(&self, party_id: &str) -> RepositoryResult<Party>;
}

pub struct PartyRepository<'c> {
    conn: &'c Connection,
}

impl<'c> PartyRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, party: &Party) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO party (party_id, name, contact_person, phone, email, address, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                party.party_id,
                party.name,
                party.contact_person,
                party.phone,
                party.email,
                party.address,
                format_ts(&party.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, party_id: &str) -> RepositoryResult<Option<Party>> {
        let party = self
            .conn
            .query_row(
                r#"
                SELECT party_id, name, contact_person, phone, email, address, created_at
                  FROM party
                 WHERE party_id = ?1
                "#,
                params![party_id],
                map_row,
            )
            .optional()?;
        Ok(party)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Party>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT party_id, name, contact_person, phone, email, address, created_at
              FROM party
             ORDER BY name
            "#,
        )?;
        let parties = stmt
            .query_map([], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parties)
    }
}

impl PartyDirectory for PartyRepository<'_> {
    fn get_party(&self, party_id: &str) -> RepositoryResult<Party> {
        self.find_by_id(party_id)?
            .ok_or_else(|| RepositoryError::not_found("Party", party_id))
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<Party> {
    Ok(Party {
        party_id: row.get(0)?,
        name: row.get(1)?,
        contact_person: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        address: row.get(5)?,
        created_at: ts_column(row, 6)?,
    })
}
