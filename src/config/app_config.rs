// ==========================================
// 提货单流转系统 - 启动配置
// ==========================================
// 来源: 环境变量
// - DO_WORKFLOW_DB_PATH: 数据库文件路径
// - DO_WORKFLOW_LOG_JSON: 1/true 时输出 JSON 日志
// ==========================================

use std::path::PathBuf;

/// 数据库路径环境变量
pub const ENV_DB_PATH: &str = "DO_WORKFLOW_DB_PATH";

/// JSON 日志开关环境变量
pub const ENV_LOG_JSON: &str = "DO_WORKFLOW_LOG_JSON";

/// 进程启动配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: String,
    pub log_json: bool,
}

impl AppConfig {
    /// 从环境变量加载
    pub fn from_env() -> Self {
        let log_json = std::env::var(ENV_LOG_JSON)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Self {
            db_path: default_db_path(),
            log_json,
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// 获取默认数据库路径
///
/// 优先使用 DO_WORKFLOW_DB_PATH；否则落在用户本地数据目录下。
pub fn default_db_path() -> String {
    if let Ok(path) = std::env::var(ENV_DB_PATH) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./do_workflow.db");

    if let Some(data_dir) = dirs::data_local_dir() {
        let dir = data_dir.join("do-workflow");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("do_workflow.db");
        }
    }

    path.to_string_lossy().to_string()
}
