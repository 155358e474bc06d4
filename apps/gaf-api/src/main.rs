//! GitHub API Fetcher：`/start` 触发后台采集循环，定时拉取组织事件写入 InfluxDB。

mod handlers;
mod ingest;
mod middleware;
mod routes;

use gaf_config::AppConfig;
use gaf_telemetry::init_tracing;
use ingest::{IngestController, build_ingest_loop};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 退出时等待采集循环完成当前周期的最长时间。
const INGEST_STOP_GRACE: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<IngestController>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置（缺失或非法值回退默认值）
    let config = AppConfig::from_env();
    // 初始化结构化日志
    init_tracing();

    // 采集循环在收到 /start 之前保持空闲
    let controller = Arc::new(IngestController::new(build_ingest_loop(&config)));
    let state = AppState {
        controller: controller.clone(),
    };
    let app = routes::create_router(state);

    info!(
        target: "gaf.api",
        org = %config.target_org,
        interval_s = config.poll_interval.as_secs(),
        sink = %config.sink.address,
        database = %config.sink.database,
        "This is the GitHub API Fetcher in version {} listening on port {}",
        env!("CARGO_PKG_VERSION"),
        config.listen_port
    );

    // 监听失败直接返回错误，进程以非零码退出
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(controller.clone()))
        .await?;

    // HTTP 服务已停止：等待进行中的拉取/写入结束后再退出
    controller.stop(INGEST_STOP_GRACE).await;
    info!(target: "gaf.api", "shutdown_complete");
    Ok(())
}

/// ctrl-c 时停止 HTTP 服务并取消采集循环。
async fn shutdown_signal(controller: Arc<IngestController>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(target: "gaf.api", error = %err, "ctrl_c_listener_failed");
        std::future::pending::<()>().await;
    }
    info!(target: "gaf.api", "shutdown_requested");
    controller.shutdown();
}
