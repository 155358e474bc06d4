//! 路由定义
//!
//! 唯一的控制端点：`/start`（任意方法），启动后台采集循环并立即返回 200。

use super::AppState;
use super::handlers::start;
use super::middleware::request_context;
use axum::{Router, middleware, routing::any};
use tower_http::trace::TraceLayer;

/// 创建 HTTP 路由
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/start", any(start))
        .with_state(state)
        // 注入 request_id/trace_id
        .layer(middleware::from_fn(request_context))
        .layer(TraceLayer::new_for_http())
}
