//! 时序写入内存实现
//!
//! 记录每次提交的批次，并可预置连接/写入失败次数，用于模拟不可用的存储。

use crate::error::SinkError;
use crate::line_protocol::BatchPoints;
use crate::traits::{SinkClient, SinkConnector};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Default)]
struct SinkState {
    batches: RwLock<Vec<BatchPoints>>,
    connects: AtomicUsize,
    write_attempts: AtomicUsize,
    connect_failures_left: AtomicUsize,
    write_failures_left: AtomicUsize,
}

/// 内存时序存储
#[derive(Clone, Default)]
pub struct InMemorySink {
    state: Arc<SinkState>,
}

impl InMemorySink {
    /// 创建新的内存存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 接下来 `count` 次连接失败
    pub fn fail_next_connects(&self, count: usize) {
        self.state
            .connect_failures_left
            .store(count, Ordering::SeqCst);
    }

    /// 接下来 `count` 次写入失败
    pub fn fail_next_writes(&self, count: usize) {
        self.state
            .write_failures_left
            .store(count, Ordering::SeqCst);
    }

    /// 已成功写入的批次（用于测试）
    pub fn batches(&self) -> Vec<BatchPoints> {
        self.state
            .batches
            .read()
            .map(|batches| batches.clone())
            .unwrap_or_default()
    }

    /// 已成功写入的点位总数
    pub fn point_count(&self) -> usize {
        self.batches().iter().map(BatchPoints::len).sum()
    }

    pub fn connect_count(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    /// 写入尝试次数（含失败）
    pub fn write_attempts(&self) -> usize {
        self.state.write_attempts.load(Ordering::SeqCst)
    }
}

/// 原子地消耗一次预置失败。
fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl SinkConnector for InMemorySink {
    async fn connect(&self) -> Result<Box<dyn SinkClient>, SinkError> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.state.connect_failures_left) {
            return Err(SinkError::Transport("forced connect failure".to_string()));
        }
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl SinkClient for InMemorySink {
    async fn write(&self, batch: &BatchPoints) -> Result<(), SinkError> {
        self.state.write_attempts.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.state.write_failures_left) {
            return Err(SinkError::Rejected {
                status: 500,
                body: "forced write failure".to_string(),
            });
        }
        let mut batches = self
            .state
            .batches
            .write()
            .map_err(|_| SinkError::Client("lock failed".to_string()))?;
        batches.push(batch.clone());
        Ok(())
    }
}
