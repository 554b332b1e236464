//! # Skeletal Engine
//!
//! Skeletal animation and scene-transform evaluation for skinned meshes.
//!
//! ## Features
//!
//! - **Joint hierarchy**: flat, ID-indexed joint arena with index-based parent/child links
//! - **Keyframe tracks**: linear bracket search, lerp for position/scale, slerp for rotation
//! - **Animation instances**: pooled playback cursors with generation-checked handles
//! - **Skinning**: top-down matrix composition into a flat skinning-matrix buffer
//! - **Integration**: bevy_ecs frame system and wgpu upload of the skinning buffer
//!
//! ## Frame order
//!
//! `advance(dt)` on every evaluator, then `evaluate(handle, true)` for each skeleton
//! that needs a fresh pose, then the renderer reads `skinning_buffer()`.
//!
//! ## Modules
//!
//! - [`animation`]: joints, clips, instances and the evaluator
//! - [`render`]: shader configuration and GPU upload collaborators
//! - [`config`]: configuration loading
//! - [`core`]: error types and shared macros
//! - [`ecs`]: frame-time resource

/// Core error types and macros
#[macro_use]
pub mod core;
/// Configuration system
pub mod config;
/// Frame-loop resources
pub mod ecs;
/// Skeletal animation
pub mod animation;
/// Rendering collaborators
pub mod render;

pub use animation::{
    AnimationClip, InstanceHandle, JointTransform, KeyframeTrack, SkeletonDefinition,
    SkeletonEvaluator, SkinningMatrixBuffer,
};
pub use config::AnimationConfig;
pub use crate::core::{AnimationError, AnimationResult};
