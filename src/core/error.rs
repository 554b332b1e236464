//! 统一错误处理模块
//!
//! 骨骼动画核心的错误类型定义。
//!
//! ## 错误分类
//!
//! - **初始化错误** (`NullInput`, `Configuration`): 对当前求值器不可恢复，`init` 全有或全无
//! - **每帧错误** (`IndexOutOfRange`, `InvalidHandle`, `DanglingClipReference`): 调用方误用，直接返回给调用方

use crate::animation::InstanceHandle;
use thiserror::Error;

/// 骨骼动画错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// 必需的输入缺失
    #[error("Required input is missing: {0}")]
    NullInput(&'static str),

    /// 输入在结构上可接受，但语义上无效（例如没有骨骼、没有根骨骼）
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// 句柄已销毁或从未有效
    #[error("Invalid animation instance handle: {0:?}")]
    InvalidHandle(InstanceHandle),

    /// 实例引用的动画片段已不存在
    #[error("Animation instance references clip {clip_id}, but only {clip_count} clips are registered")]
    DanglingClipReference { clip_id: usize, clip_count: usize },
}

impl AnimationError {
    pub(crate) fn out_of_range(what: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { what, index, len }
    }
}

/// 动画结果类型别名
pub type AnimationResult<T> = Result<T, AnimationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnimationError::out_of_range("joint", 7, 3);
        assert_eq!(err.to_string(), "joint index 7 out of range (len 3)");

        let err = AnimationError::Configuration("no bones".to_string());
        assert!(err.to_string().contains("no bones"));
    }

    #[test]
    fn test_dangling_clip_display() {
        let err = AnimationError::DanglingClipReference {
            clip_id: 2,
            clip_count: 0,
        };
        assert!(err.to_string().contains("clip 2"));
    }
}
