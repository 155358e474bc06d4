use crate::PipelineError;
use domain::Point;
use gaf_storage::{BatchPoints, PointError, Precision, SinkConnector};
use gaf_telemetry::{
    record_batch_written, record_point_dropped, record_sink_connect_failure, record_write_failure,
};
use std::sync::Arc;
use tracing::{info, warn};

/// 一次批量写入的结果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub written: usize,
    pub dropped: Vec<PointError>,
}

/// 批量写入器：连接 → 组批 → 逐点追加 → 整批提交。
#[derive(Clone)]
pub struct BatchWriter {
    connector: Arc<dyn SinkConnector>,
    database: String,
}

impl BatchWriter {
    pub fn new(connector: Arc<dyn SinkConnector>, database: impl Into<String>) -> Self {
        Self {
            connector,
            database: database.into(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// 写入一个周期的全部点位。
    ///
    /// 单点编码失败只丢弃该点；连接或提交失败则整批丢弃并返回错误。
    pub async fn write(&self, points: &[Point]) -> Result<WriteReport, PipelineError> {
        let client = match self.connector.connect().await {
            Ok(client) => client,
            Err(err) => {
                record_sink_connect_failure();
                warn!(target: "gaf.sink", func = "connect", error = %err, "sink_connect_failed");
                return Err(PipelineError::SinkConnect(err));
            }
        };

        let mut batch = BatchPoints::new(self.database.clone(), Precision::Seconds);
        let mut dropped = Vec::new();
        for point in points {
            if let Err(err) = batch.add_point(point) {
                record_point_dropped();
                warn!(
                    target: "gaf.sink",
                    func = "write",
                    error = %err,
                    tags = ?point.tags,
                    "point_dropped"
                );
                dropped.push(err);
            }
        }

        let written = batch.len();
        if let Err(err) = client.write(&batch).await {
            record_write_failure();
            warn!(
                target: "gaf.sink",
                func = "write",
                database = %self.database,
                points = written,
                error = %err,
                "batch_write_failed"
            );
            return Err(PipelineError::SinkWrite(err));
        }

        record_batch_written(written as u64);
        info!(
            target: "gaf.sink",
            func = "write",
            database = %self.database,
            points = written,
            dropped = dropped.len(),
            "batch_written"
        );
        Ok(WriteReport { written, dropped })
    }
}
