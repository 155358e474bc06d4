//! 追踪、请求 ID 与采集计数。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 采集计数快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cycles: u64,
    pub fetch_failures: u64,
    pub events_fetched: u64,
    pub events_skipped: u64,
    pub points_dropped: u64,
    pub points_written: u64,
    pub batches_written: u64,
    pub sink_connect_failures: u64,
    pub write_failures: u64,
}

/// 采集计数（进程级）。
pub struct TelemetryMetrics {
    cycles: AtomicU64,
    fetch_failures: AtomicU64,
    events_fetched: AtomicU64,
    events_skipped: AtomicU64,
    points_dropped: AtomicU64,
    points_written: AtomicU64,
    batches_written: AtomicU64,
    sink_connect_failures: AtomicU64,
    write_failures: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            cycles: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
            events_fetched: AtomicU64::new(0),
            events_skipped: AtomicU64::new(0),
            points_dropped: AtomicU64::new(0),
            points_written: AtomicU64::new(0),
            batches_written: AtomicU64::new(0),
            sink_connect_failures: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            events_fetched: self.events_fetched.load(Ordering::Relaxed),
            events_skipped: self.events_skipped.load(Ordering::Relaxed),
            points_dropped: self.points_dropped.load(Ordering::Relaxed),
            points_written: self.points_written.load(Ordering::Relaxed),
            batches_written: self.batches_written.load(Ordering::Relaxed),
            sink_connect_failures: self.sink_connect_failures.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局计数实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录采集周期次数。
pub fn record_cycle() {
    metrics().cycles.fetch_add(1, Ordering::Relaxed);
}

/// 记录事件拉取失败次数。
pub fn record_fetch_failure() {
    metrics().fetch_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录拉取到的事件数。
pub fn record_events_fetched(count: u64) {
    metrics().events_fetched.fetch_add(count, Ordering::Relaxed);
}

/// 记录因缺失字段被跳过的事件。
pub fn record_event_skipped() {
    metrics().events_skipped.fetch_add(1, Ordering::Relaxed);
}

/// 记录构造失败被丢弃的点位。
pub fn record_point_dropped() {
    metrics().points_dropped.fetch_add(1, Ordering::Relaxed);
}

/// 记录批次写入成功（含点位数）。
pub fn record_batch_written(points: u64) {
    let metrics = metrics();
    metrics.batches_written.fetch_add(1, Ordering::Relaxed);
    metrics.points_written.fetch_add(points, Ordering::Relaxed);
}

/// 记录存储连接失败次数。
pub fn record_sink_connect_failure() {
    metrics()
        .sink_connect_failures
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录批次写入失败次数。
pub fn record_write_failure() {
    metrics().write_failures.fetch_add(1, Ordering::Relaxed);
}
