//! 采集触发 handler
//!
//! - ANY /start：启动采集循环（已在运行时忽略），不等待任何采集周期，始终返回 200 空响应体

use crate::AppState;
use crate::ingest::StartOutcome;
use axum::{extract::State, http::StatusCode};
use tracing::info;

pub async fn start(State(state): State<AppState>) -> StatusCode {
    match state.controller.start() {
        StartOutcome::Started => {
            info!(target: "gaf.api", handle = "/start", "ingest_started");
        }
        StartOutcome::AlreadyRunning => {
            info!(target: "gaf.api", handle = "/start", "ingest_already_running");
        }
    }
    StatusCode::OK
}
