//! 采集流水线：批量写入（`BatchWriter`）与采集循环（`IngestLoop`）。

mod ingest_loop;
mod writer;

pub use ingest_loop::{CycleReport, IngestLoop};
pub use writer::{BatchWriter, WriteReport};

use gaf_ingest::IngestError;
use gaf_storage::SinkError;

/// 流水线错误（均不终止采集循环）。
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("source fetch failed: {0}")]
    SourceFetch(#[from] IngestError),
    #[error("sink connect failed: {0}")]
    SinkConnect(SinkError),
    #[error("sink write failed: {0}")]
    SinkWrite(SinkError),
}
