//! 主应用程序入口
//!
//! 加载配置并构建内存状态核心，运行到收到 Ctrl-C 为止。

use application::Services;
use config::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    // 初始化日志，RUST_LOG 优先于配置文件
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.filter))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(
        observer_capacity = config.state.observer_capacity,
        delivery_timeout_ms = config.state.delivery_timeout_ms,
        spam_chat_id = %config.state.spam_chat_id,
        "配置加载完成"
    );

    let services = Services::new(config.state)?;
    tracing::info!("状态核心已就绪，按 Ctrl-C 退出");

    tokio::signal::ctrl_c().await?;

    tracing::info!(
        users = services.directory.user_count(),
        chats = services.directory.chat_count(),
        "状态核心关闭"
    );
    Ok(())
}
