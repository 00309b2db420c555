// ==========================================
// 提货单流转系统 - 应用状态
// ==========================================
// 职责: 组装共享连接、引擎、查询、API 与通知投递器
// ==========================================

use crate::api::{ActorResolver, DeliveryOrderApi, UserTableResolver};
use crate::config::config_manager::ConfigManager;
use crate::db::{self, SharedConnection};
use crate::engine::{NotificationPublisher, WorkflowEngine};
use crate::notification::{NotificationDispatcher, Notifier, OutboxPublisher};
use crate::query::DeliveryOrderQuery;
use std::sync::Arc;

/// 应用状态
///
/// 所有组件共享同一个数据库连接
pub struct AppState {
    /// 数据库路径（内存库为 ":memory:"）
    pub db_path: String,
    pub conn: SharedConnection,
    pub config_manager: Arc<ConfigManager>,
    pub engine: Arc<WorkflowEngine>,
    pub query: Arc<DeliveryOrderQuery>,
    /// 提货单API
    pub delivery_order_api: Arc<DeliveryOrderApi>,
    /// 通知投递器（由运行方驱动）
    pub dispatcher: Arc<NotificationDispatcher>,
}

impl AppState {
    /// 打开数据库文件并组装
    pub fn new(db_path: &str, notifier: Arc<dyn Notifier>) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("无法创建数据库目录: {}", e))?;
            }
        }

        let conn = db::open_shared_connection(db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        Self::from_connection(db_path.to_string(), conn, notifier)
    }

    /// 基于已初始化 schema 的连接组装
    pub fn from_connection(
        db_path: String,
        conn: SharedConnection,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, String> {
        let config_manager = ConfigManager::from_connection(conn.clone())
            .map_err(|e| format!("无法初始化ConfigManager: {}", e))?;
        let workflow_settings = config_manager
            .workflow_settings()
            .map_err(|e| format!("读取工作流配置失败: {}", e))?;
        let notification_settings = config_manager
            .notification_settings()
            .map_err(|e| format!("读取通知配置失败: {}", e))?;

        let publisher: Arc<dyn NotificationPublisher> =
            Arc::new(OutboxPublisher::new(conn.clone(), notification_settings));
        let engine = Arc::new(
            WorkflowEngine::new(conn.clone(), workflow_settings).with_publisher(publisher),
        );
        let query = Arc::new(DeliveryOrderQuery::new(conn.clone()));
        let resolver: Arc<dyn ActorResolver> = Arc::new(UserTableResolver::new(conn.clone()));
        let delivery_order_api = Arc::new(DeliveryOrderApi::new(
            engine.clone(),
            query.clone(),
            resolver,
        ));
        let dispatcher = Arc::new(NotificationDispatcher::new(
            conn.clone(),
            notifier,
            notification_settings,
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            conn,
            config_manager: Arc::new(config_manager),
            engine,
            query,
            delivery_order_api,
            dispatcher,
        })
    }

    /// 内存数据库（测试与演示）
    pub fn in_memory(notifier: Arc<dyn Notifier>) -> Result<Self, String> {
        let conn = db::open_in_memory().map_err(|e| format!("无法打开内存数据库: {}", e))?;
        Self::from_connection(":memory:".to_string(), conn, notifier)
    }
}
