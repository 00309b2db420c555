// ==========================================
// 提货单流转系统 - 服务入口
// ==========================================
// 初始化数据库与配置，驱动通知投递器直到收到 Ctrl-C
// ==========================================

use anyhow::Context;
use do_workflow::app::AppState;
use do_workflow::config::AppConfig;
use do_workflow::logging;
use do_workflow::notification::{LoggingNotifier, Notifier};
use std::sync::Arc;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    if config.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("==================================================");
    tracing::info!("{}", do_workflow::APP_NAME);
    tracing::info!("系统版本: {}", do_workflow::VERSION);
    tracing::info!("==================================================");
    tracing::info!("使用数据库: {}", config.db_path);

    let notifier: Arc<dyn Notifier> = Arc::new(LoggingNotifier);
    let state = AppState::new(&config.db_path, notifier)
        .map_err(anyhow::Error::msg)
        .context("无法初始化AppState")?;

    state
        .dispatcher
        .recover_stale()
        .context("发件箱恢复失败")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let dispatcher = state.dispatcher.clone();
    let handle = tokio::spawn(async move { dispatcher.run(shutdown_rx).await });

    tokio::signal::ctrl_c().await.context("等待退出信号失败")?;
    tracing::info!("收到退出信号，正在停止...");

    // 接收端已退出时发送失败可忽略
    let _ = shutdown_tx.send(true);
    handle.await.context("通知投递器异常退出")?;

    tracing::info!("服务已停止");
    Ok(())
}
