//! 存储接口 Trait 定义
//!
//! 每个采集周期先 `connect` 取得客户端，再以一个批次调用一次 `write`。

use crate::error::SinkError;
use crate::line_protocol::BatchPoints;
use async_trait::async_trait;

/// 时序存储连接器。
#[async_trait]
pub trait SinkConnector: Send + Sync {
    /// 建立并校验一个存储客户端
    async fn connect(&self) -> Result<Box<dyn SinkClient>, SinkError>;
}

/// 时序存储客户端。
#[async_trait]
pub trait SinkClient: Send + Sync {
    /// 整批提交（全部成功或全部失败）
    async fn write(&self, batch: &BatchPoints) -> Result<(), SinkError>;
}
