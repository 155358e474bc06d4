//! # GAF Storage 模块
//!
//! 时序存储（sink）抽象与实现：
//!
//! 1. **接口抽象层** (`traits.rs`)：`SinkConnector`（建立连接）与 `SinkClient`（提交批次）
//! 2. **错误处理层** (`error.rs`)：`SinkError`（连接/提交失败）与 `PointError`（单点构造失败）
//! 3. **批次编码层** (`line_protocol.rs`)：`BatchPoints`，按 InfluxDB Line Protocol 编码点位
//! 4. **实现层**：
//!    - `influx.rs`：InfluxDB 1.x HTTP 写入（`POST /write?db=..&precision=s`）
//!    - `in_memory/`：内存实现（用于测试和本地演示）
//!
//! 写入语义为整批提交：存储端不返回部分成功信息，一次 `write` 失败即整批丢失。

pub mod error;
pub mod in_memory;
pub mod influx;
pub mod line_protocol;
pub mod traits;

pub use error::{PointError, SinkError};
pub use in_memory::InMemorySink;
pub use influx::{InfluxClient, InfluxConnector};
pub use line_protocol::{BatchPoints, Precision};
pub use traits::{SinkClient, SinkConnector};
