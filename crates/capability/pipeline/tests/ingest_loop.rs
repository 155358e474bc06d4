use async_trait::async_trait;
use domain::RawEvent;
use gaf_ingest::{EventSource, IngestError};
use gaf_pipeline::{BatchWriter, IngestLoop, PipelineError};
use gaf_storage::InMemorySink;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 按脚本依次返回结果，脚本耗尽后返回 `fallback`。
struct ScriptedSource {
    script: Mutex<VecDeque<Result<Vec<RawEvent>, IngestError>>>,
    fallback: Vec<RawEvent>,
    fetches: AtomicUsize,
    orgs: Mutex<Vec<String>>,
}

impl ScriptedSource {
    fn new(
        script: Vec<Result<Vec<RawEvent>, IngestError>>,
        fallback: Vec<RawEvent>,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            fetches: AtomicUsize::new(0),
            orgs: Mutex::new(Vec::new()),
        })
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn fetch(&self, org: &str) -> Result<Vec<RawEvent>, IngestError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.orgs.lock().expect("orgs").push(org.to_string());
        let next = self.script.lock().expect("script").pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

fn ingest_loop(source: Arc<ScriptedSource>, sink: &InMemorySink, interval_s: u64) -> IngestLoop {
    IngestLoop::new(
        "acme",
        Duration::from_secs(interval_s),
        source,
        BatchWriter::new(Arc::new(sink.clone()), "githuborgs"),
    )
}

#[tokio::test(start_paused = true)]
async fn end_to_end_single_event_then_quiet() {
    let source = ScriptedSource::new(
        vec![Ok(vec![RawEvent::new("PushEvent", "acme/x", "bob")])],
        Vec::new(),
    );
    let sink = InMemorySink::new();
    let ingest = ingest_loop(source.clone(), &sink, 1);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { ingest.run(cancel).await }
    });

    // 第一个周期内写入恰好一个点位
    tokio::time::sleep(Duration::from_millis(500)).await;
    let batches = sink.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);
    assert!(
        batches[0].lines()[0].starts_with("event,action=PushEvent,actor=bob,repo=acme/x count=1i "),
        "{}",
        batches[0].lines()[0]
    );

    // 后续周期不再产生点位
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(source.fetches() >= 3);
    assert_eq!(sink.point_count(), 1);
    assert!(sink.batches().iter().skip(1).all(|batch| batch.is_empty()));
    assert!(
        source
            .orgs
            .lock()
            .expect("orgs")
            .iter()
            .all(|org| org == "acme")
    );

    cancel.cancel();
    handle.await.expect("loop task");
}

#[tokio::test(start_paused = true)]
async fn write_failure_does_not_stop_the_next_cycle() {
    let source = ScriptedSource::new(Vec::new(), vec![RawEvent::new("PushEvent", "acme/x", "bob")]);
    let sink = InMemorySink::new();
    sink.fail_next_writes(1);
    let ingest = ingest_loop(source.clone(), &sink, 1);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { ingest.run(cancel).await }
    });

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(source.fetches(), 1);
    assert_eq!(sink.write_attempts(), 1);
    assert_eq!(sink.point_count(), 0);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(source.fetches(), 2);
    assert_eq!(sink.write_attempts(), 2);
    assert_eq!(sink.point_count(), 1);

    cancel.cancel();
    handle.await.expect("loop task");
}

#[tokio::test(start_paused = true)]
async fn fetch_failure_skips_the_write_and_keeps_polling() {
    let source = ScriptedSource::new(
        vec![Err(IngestError::Transport("connection reset".to_string()))],
        vec![RawEvent::new("ForkEvent", "acme/y", "amy")],
    );
    let sink = InMemorySink::new();
    let ingest = ingest_loop(source.clone(), &sink, 1);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { ingest.run(cancel).await }
    });

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(source.fetches(), 1);
    assert_eq!(sink.connect_count(), 0);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(source.fetches(), 2);
    assert_eq!(sink.point_count(), 1);

    cancel.cancel();
    handle.await.expect("loop task");
}

#[tokio::test]
async fn cycle_skips_malformed_record_and_writes_the_rest() {
    let mut broken = RawEvent::new("IssuesEvent", "acme/y", "amy");
    broken.repo_name = None;
    let source = ScriptedSource::new(
        vec![Ok(vec![
            RawEvent::new("PushEvent", "acme/x", "bob"),
            broken,
            RawEvent::new("WatchEvent", "acme/z", "cat"),
        ])],
        Vec::new(),
    );
    let sink = InMemorySink::new();
    let report = ingest_loop(source, &sink, 10).run_cycle().await;

    assert!(report.is_ok());
    assert_eq!(report.fetched, 3);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.written, 2);
    assert_eq!(sink.point_count(), 2);
}

#[tokio::test]
async fn cycle_reports_sink_errors() {
    let source = ScriptedSource::new(Vec::new(), vec![RawEvent::new("PushEvent", "acme/x", "bob")]);
    let sink = InMemorySink::new();
    sink.fail_next_connects(1);
    let ingest = ingest_loop(source, &sink, 10);

    let report = ingest.run_cycle().await;
    assert!(matches!(report.error, Some(PipelineError::SinkConnect(_))));
    assert_eq!(report.written, 0);

    let report = ingest.run_cycle().await;
    assert!(report.is_ok());
    assert_eq!(report.written, 1);
}

#[tokio::test(start_paused = true)]
async fn cancelled_loop_stops_at_the_next_sleep() {
    let source = ScriptedSource::new(Vec::new(), Vec::new());
    let sink = InMemorySink::new();
    let ingest = ingest_loop(source.clone(), &sink, 3600);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { ingest.run(cancel).await }
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    cancel.cancel();
    handle.await.expect("loop task");
    assert_eq!(source.fetches(), 1);

    // 已取消的 token 不会再启动新周期
    let ingest = ingest_loop(source.clone(), &sink, 1);
    ingest.run(cancel).await;
    assert_eq!(source.fetches(), 1);
}
