//! 采集链路共享的领域模型。

pub mod data;

pub use data::{FieldValue, Point, RawEvent};

/// 事件点位的 measurement 名称。
pub const EVENT_MEASUREMENT: &str = "event";
