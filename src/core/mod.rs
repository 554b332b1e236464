//! 核心模块
//!
//! - `error` - 错误类型定义
//! - `macros` - 共享宏

pub mod error;
#[macro_use]
pub mod macros;

// 重新导出错误类型
pub use error::{AnimationError, AnimationResult};
