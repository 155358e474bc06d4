//! 存储层错误类型
//!
//! - `SinkError`：建立连接或提交批次失败，影响整批
//! - `PointError`：单个点位无法编码，只影响该点位

/// 时序存储错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("invalid sink address `{address}`: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("sink client error: {0}")]
    Client(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("sink rejected batch with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// 点位构造错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PointError {
    #[error("measurement name is empty")]
    EmptyMeasurement,
    #[error("point has no fields")]
    NoFields,
    #[error("tag key is empty")]
    EmptyTagKey,
    #[error("tag `{0}` has an empty value")]
    EmptyTagValue(String),
    #[error("field key is empty")]
    EmptyFieldKey,
    #[error("field `{0}` is not a finite number")]
    NonFiniteField(String),
    #[error("{0} contains a line break")]
    LineBreak(String),
}
