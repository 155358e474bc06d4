//! 采集链路装配与启动控制
//!
//! `build_ingest_loop` 将 GitHub 事件源、InfluxDB 写入器按配置组装成采集循环；
//! `IngestController` 维护 空闲/运行 两态：重复触发不会启动第二个循环。

use gaf_config::AppConfig;
use gaf_ingest::{GithubEventSource, GithubSourceConfig};
use gaf_pipeline::{BatchWriter, IngestLoop};
use gaf_storage::InfluxConnector;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 按配置组装采集循环。
pub fn build_ingest_loop(config: &AppConfig) -> IngestLoop {
    let source = GithubEventSource::new(GithubSourceConfig {
        api_url: config.github_api_url.clone(),
        token: config.github_token.clone(),
    });
    let connector = InfluxConnector::new(
        config.sink.address.clone(),
        config.sink.username.clone(),
        config.sink.password.clone(),
    );
    info!(
        target: "gaf.api",
        source = %source.config().api_url,
        sink = %config.sink.address,
        "ingest_loop_configured"
    );
    IngestLoop::new(
        config.target_org.clone(),
        config.poll_interval,
        Arc::new(source),
        BatchWriter::new(Arc::new(connector), config.sink.database.clone()),
    )
}

/// 触发结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

/// 采集循环启动控制器。
pub struct IngestController {
    ingest: IngestLoop,
    running: Arc<AtomicBool>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl IngestController {
    pub fn new(ingest: IngestLoop) -> Self {
        Self {
            ingest,
            running: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    /// 空闲时在后台启动采集循环并立即返回；运行中则忽略。
    pub fn start(&self) -> StartOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return StartOutcome::AlreadyRunning;
        }

        let ingest = self.ingest.clone();
        let cancel = self.cancel.clone();
        let guard = RunningGuard(self.running.clone());
        let handle = tokio::spawn(async move {
            let _guard = guard;
            ingest.run(cancel).await;
        });
        if let Ok(mut task) = self.task.lock() {
            *task = Some(handle);
        }
        StartOutcome::Started
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// 取消采集循环（在下一次休眠时退出）。取消后再次启动的循环会立即结束。
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// 取消并等待循环任务退出，最多等待 `grace`；进行中的拉取/写入会先完成。
    ///
    /// 返回 false 表示超时，任务随运行时一起被丢弃。
    pub async fn stop(&self, grace: Duration) -> bool {
        self.shutdown();
        let handle = match self.task.lock() {
            Ok(mut task) => task.take(),
            Err(_) => None,
        };
        let Some(handle) = handle else {
            return true;
        };
        match tokio::time::timeout(grace, handle).await {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                warn!(target: "gaf.api", error = %err, "ingest_task_failed");
                true
            }
            Err(_) => {
                warn!(target: "gaf.api", grace_ms = grace.as_millis() as u64, "ingest_stop_timed_out");
                false
            }
        }
    }
}

/// 循环任务结束（含 panic）时回到空闲态。
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use domain::RawEvent;
    use gaf_ingest::{EventSource, IngestError};
    use gaf_storage::InMemorySink;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingSource {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl EventSource for CountingSource {
        async fn fetch(&self, _org: &str) -> Result<Vec<RawEvent>, IngestError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(vec![RawEvent::new("PushEvent", "acme/x", "bob")])
        }
    }

    fn controller(source: Arc<CountingSource>, sink: &InMemorySink) -> IngestController {
        IngestController::new(IngestLoop::new(
            "acme",
            Duration::from_secs(1),
            source,
            BatchWriter::new(Arc::new(sink.clone()), "githuborgs"),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_a_no_op() {
        let source = Arc::new(CountingSource::default());
        let sink = InMemorySink::new();
        let controller = controller(source.clone(), &sink);

        assert!(!controller.is_running());
        assert_eq!(controller.start(), StartOutcome::Started);
        assert_eq!(controller.start(), StartOutcome::AlreadyRunning);
        assert!(controller.is_running());

        // 单个循环在 t=0,1,2 各执行一次
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 3);
        assert_eq!(sink.point_count(), 3);

        controller.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_returns_to_idle() {
        let source = Arc::new(CountingSource::default());
        let sink = InMemorySink::new();
        let controller = controller(source.clone(), &sink);

        assert_eq!(controller.start(), StartOutcome::Started);
        tokio::time::sleep(Duration::from_millis(100)).await;
        controller.shutdown();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!controller.is_running());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    /// 每次拉取挂起 `delay`，模拟进行中的慢请求。
    struct SlowSource {
        delay: Duration,
        finished: AtomicUsize,
    }

    #[async_trait]
    impl EventSource for SlowSource {
        async fn fetch(&self, _org: &str) -> Result<Vec<RawEvent>, IngestError> {
            tokio::time::sleep(self.delay).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(vec![RawEvent::new("PushEvent", "acme/x", "bob")])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stop_waits_for_the_in_flight_cycle() {
        let source = Arc::new(SlowSource {
            delay: Duration::from_secs(2),
            finished: AtomicUsize::new(0),
        });
        let sink = InMemorySink::new();
        let controller = IngestController::new(IngestLoop::new(
            "acme",
            Duration::from_secs(60),
            source.clone(),
            BatchWriter::new(Arc::new(sink.clone()), "githuborgs"),
        ));

        assert_eq!(controller.start(), StartOutcome::Started);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(controller.stop(Duration::from_secs(5)).await);
        assert!(!controller.is_running());
        assert_eq!(source.finished.load(Ordering::SeqCst), 1);
        assert_eq!(sink.point_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_gives_up_after_the_grace_period() {
        let source = Arc::new(SlowSource {
            delay: Duration::from_secs(30),
            finished: AtomicUsize::new(0),
        });
        let sink = InMemorySink::new();
        let controller = IngestController::new(IngestLoop::new(
            "acme",
            Duration::from_secs(60),
            source.clone(),
            BatchWriter::new(Arc::new(sink.clone()), "githuborgs"),
        ));

        assert_eq!(controller.start(), StartOutcome::Started);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!controller.stop(Duration::from_secs(1)).await);
        assert_eq!(source.finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stop_without_start_is_immediate() {
        let sink = InMemorySink::new();
        let controller = controller(Arc::new(CountingSource::default()), &sink);
        assert!(controller.stop(Duration::from_secs(1)).await);
    }

    #[test]
    fn build_ingest_loop_uses_config() {
        let config = AppConfig::from_lookup(|key| match key {
            "GITHUB_TARGET_ORG" => Some("acme".to_string()),
            "FETCH_WAIT_SEC" => Some("7".to_string()),
            "INFLUX_TARGET_DB" => Some("events".to_string()),
            _ => None,
        });
        let ingest = build_ingest_loop(&config);
        assert_eq!(ingest.org(), "acme");
        assert_eq!(ingest.interval(), Duration::from_secs(7));
    }
}
