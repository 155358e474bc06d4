//! Handlers 模块

pub mod start;

pub use start::*;
