use crate::writer::BatchWriter;
use crate::PipelineError;
use gaf_ingest::EventSource;
use gaf_normalize::map_events;
use gaf_telemetry::{metrics, record_cycle, record_events_fetched, record_fetch_failure};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 单个采集周期的结果。
#[derive(Debug, Default)]
pub struct CycleReport {
    pub fetched: usize,
    pub skipped: usize,
    pub written: usize,
    pub dropped: usize,
    pub error: Option<PipelineError>,
}

impl CycleReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// 采集循环：拉取 → 映射 → 批量写入 → 休眠，直到取消。
///
/// 任何错误都只记录日志，下一周期照常进行；没有重试、退避或失败上限。
#[derive(Clone)]
pub struct IngestLoop {
    org: String,
    interval: Duration,
    source: Arc<dyn EventSource>,
    writer: BatchWriter,
}

impl IngestLoop {
    pub fn new(
        org: impl Into<String>,
        interval: Duration,
        source: Arc<dyn EventSource>,
        writer: BatchWriter,
    ) -> Self {
        Self {
            org: org.into(),
            interval,
            source,
            writer,
        }
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 执行一个采集周期。拉取失败时跳过映射与写入。
    pub async fn run_cycle(&self) -> CycleReport {
        record_cycle();

        let events = match self.source.fetch(&self.org).await {
            Ok(events) => events,
            Err(err) => {
                record_fetch_failure();
                warn!(target: "gaf.ingest", func = "fetch", org = %self.org, error = %err, "fetch_failed");
                return CycleReport {
                    error: Some(err.into()),
                    ..CycleReport::default()
                };
            }
        };
        let fetched = events.len();
        record_events_fetched(fetched as u64);

        let mapped = map_events(events);
        let mut report = CycleReport {
            fetched,
            skipped: mapped.skipped.len(),
            ..CycleReport::default()
        };

        match self.writer.write(&mapped.points).await {
            Ok(write) => {
                report.written = write.written;
                report.dropped = write.dropped.len();
            }
            Err(err) => {
                report.dropped = mapped.points.len();
                report.error = Some(err);
            }
        }
        report
    }

    /// 循环执行采集周期，仅在休眠期间响应取消。
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            target: "gaf.ingest",
            org = %self.org,
            interval_s = self.interval.as_secs(),
            database = %self.writer.database(),
            "ingest_loop_started"
        );
        while !cancel.is_cancelled() {
            let report = self.run_cycle().await;
            let totals = metrics().snapshot();
            info!(
                target: "gaf.ingest",
                org = %self.org,
                fetched = report.fetched,
                skipped = report.skipped,
                written = report.written,
                dropped = report.dropped,
                ok = report.is_ok(),
                total_cycles = totals.cycles,
                total_points_written = totals.points_written,
                "cycle_finished"
            );

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        info!(target: "gaf.ingest", org = %self.org, "ingest_loop_stopped");
    }
}
