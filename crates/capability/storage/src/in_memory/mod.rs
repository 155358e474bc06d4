//! 内存存储实现
//!
//! 仅用于本地测试和占位。

mod sink;

pub use sink::InMemorySink;
