// ==========================================
// 提货单流转系统 - 配置层
// ==========================================
// 职责: 进程启动配置（环境变量）与运行期配置（config_kv 表）
// ==========================================

pub mod app_config;
pub mod config_manager;

// 重导出核心配置类型
pub use app_config::{default_db_path, AppConfig};
pub use config_manager::{
    config_keys, ConfigManager, NotificationSettings, WorkflowSettings, MAX_VALIDITY_DAYS,
};
