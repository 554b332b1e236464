//! 骨骼动画模块
//!
//! 提供关节层级、关键帧插值、动画实例管理和蒙皮矩阵合成。
//!
//! ## 功能特性
//!
//! - 扁平关节数组，父子关系为下标引用
//! - 线性扫描查找关键帧区间，位置/缩放线性插值，旋转球面插值
//! - 带代数计数的实例池，销毁后的句柄不会误指向新实例
//! - 自顶向下的层级合成，结果写入蒙皮矩阵缓冲区
//!
//! ## 使用示例
//!
//! ```rust
//! use skeletal_engine::animation::{AnimationClip, KeyframeTrack, SkeletonDefinition, SkeletonEvaluator};
//! use skeletal_engine::render::HeadlessShaderConfigurator;
//! use glam::{Mat4, Quat, Vec3};
//!
//! let mut def = SkeletonDefinition::new();
//! let root = def.add_bone("root", None, Mat4::IDENTITY).unwrap();
//! def.add_bone("arm", Some(root), Mat4::IDENTITY).unwrap();
//!
//! let mut evaluator = SkeletonEvaluator::new();
//! evaluator.init(Some(&def), true, &mut HeadlessShaderConfigurator).unwrap();
//!
//! let mut track = KeyframeTrack::new();
//! track.push(0.0, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
//! track.push(1.0, Vec3::X, Quat::IDENTITY, Vec3::ONE);
//! let mut clip = AnimationClip::new("raise", 1.0, 1.0);
//! clip.set_track(1, track);
//! let clip_id = evaluator.add_clip(clip).unwrap();
//!
//! let handle = evaluator.create_instance(clip_id, 1.0, 0.0).unwrap();
//! evaluator.advance(0.5);
//! evaluator.evaluate(Some(handle), true).unwrap();
//!
//! let arm = evaluator.skinning_buffer().get(1).unwrap();
//! assert!((arm.w_axis.x - 0.5).abs() < 1e-6);
//! ```

pub mod clip;
pub mod evaluator;
pub mod instance;
pub mod keyframe;
pub mod skeleton;
pub mod skinning;
pub mod system;

pub use clip::{AnimationClip, BoneKeyframes, SkeletalAnimation};
pub use evaluator::SkeletonEvaluator;
pub use instance::{AnimationInstance, InstanceHandle, InstancePool};
pub use keyframe::KeyframeTrack;
pub use skeleton::{BoneRecord, Joint, JointSnapshot, JointTransform, SkeletonDefinition, SkeletonSource};
pub use skinning::SkinningMatrixBuffer;
pub use system::{skeletal_animation_system, SkeletalAnimator};
