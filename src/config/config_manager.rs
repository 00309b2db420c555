// ==========================================
// 提货单流转系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::{open_sqlite_connection, SharedConnection};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

const GLOBAL_SCOPE: &str = "global";

/// 默认有效天数上限（约 100 年）
pub const MAX_VALIDITY_DAYS: i64 = 36_500;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: SharedConnection,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: SharedConnection) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let key = key.trim();
        if key.is_empty() {
            return Err("配置键不能为空".into());
        }

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;

        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: std::str::FromStr + std::fmt::Display + Copy,
    {
        let raw = self.get_config_or_default(key, &default.to_string())?;
        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    "配置格式错误，使用默认值 {}",
                    default
                );
                Ok(default)
            }
        }
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key",
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    // ===== 业务配置 =====

    /// 在 [min, max] 范围内的数值配置；越界同格式错误一样回退默认值
    fn get_bounded_or_default<T>(
        &self,
        key: &str,
        default: T,
        min: T,
        max: T,
    ) -> Result<T, Box<dyn Error>>
    where
        T: std::str::FromStr + std::fmt::Display + Copy + PartialOrd,
    {
        let value = self.get_parsed_or_default(key, default)?;
        if value < min || value > max {
            tracing::warn!(
                config_key = key,
                value = %value,
                "配置超出范围 [{}, {}]，使用默认值 {}",
                min,
                max,
                default
            );
            return Ok(default);
        }
        Ok(value)
    }

    /// 工作流引擎配置
    pub fn workflow_settings(&self) -> Result<WorkflowSettings, Box<dyn Error>> {
        let defaults = WorkflowSettings::default();
        Ok(WorkflowSettings {
            number_max_len: self.get_bounded_or_default(
                config_keys::DO_NUMBER_MAX_LEN,
                defaults.number_max_len,
                1,
                usize::MAX,
            )?,
            default_validity_days: self.get_bounded_or_default(
                config_keys::DO_DEFAULT_VALIDITY_DAYS,
                defaults.default_validity_days,
                1,
                MAX_VALIDITY_DAYS,
            )?,
        })
    }

    /// 通知投递配置
    pub fn notification_settings(&self) -> Result<NotificationSettings, Box<dyn Error>> {
        let defaults = NotificationSettings::default();
        Ok(NotificationSettings {
            enabled: self.get_parsed_or_default(config_keys::NOTIFICATION_ENABLED, defaults.enabled)?,
            max_retries: self
                .get_parsed_or_default(config_keys::NOTIFICATION_MAX_RETRIES, defaults.max_retries)?,
            dispatch_interval_ms: self.get_parsed_or_default(
                config_keys::NOTIFICATION_DISPATCH_INTERVAL_MS,
                defaults.dispatch_interval_ms,
            )?,
            batch_size: self
                .get_parsed_or_default(config_keys::NOTIFICATION_BATCH_SIZE, defaults.batch_size)?,
        })
    }
}

// ==========================================
// 配置值对象
// ==========================================

/// 工作流引擎配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSettings {
    /// 提货单号最大长度
    pub number_max_len: usize,
    /// 未指定 valid_to 时的默认有效天数
    pub default_validity_days: i64,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            number_max_len: 64,
            default_validity_days: 30,
        }
    }
}

/// 通知投递配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub max_retries: i32,
    pub dispatch_interval_ms: u64,
    pub batch_size: usize,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 3,
            dispatch_interval_ms: 2_000,
            batch_size: 20,
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 提货单
    pub const DO_NUMBER_MAX_LEN: &str = "delivery_order.number_max_len";
    pub const DO_DEFAULT_VALIDITY_DAYS: &str = "delivery_order.default_validity_days";

    // 通知
    pub const NOTIFICATION_ENABLED: &str = "notification.enabled";
    pub const NOTIFICATION_MAX_RETRIES: &str = "notification.max_retries";
    pub const NOTIFICATION_DISPATCH_INTERVAL_MS: &str = "notification.dispatch_interval_ms";
    pub const NOTIFICATION_BATCH_SIZE: &str = "notification.batch_size";
}
