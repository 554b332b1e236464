//! 骨骼动画 ECS 集成
//!
//! 每个蒙皮网格实例持有自己的求值器（共享骨架时也各自一份），
//! 系统每帧先推进再求值，结果留在组件的蒙皮矩阵缓冲区中供渲染端读取。

use bevy_ecs::prelude::*;

use super::evaluator::SkeletonEvaluator;
use super::instance::InstanceHandle;
use crate::core::AnimationResult;
use crate::ecs::Time;

/// 骨骼动画组件
#[derive(Component, Debug, Default)]
pub struct SkeletalAnimator {
    pub evaluator: SkeletonEvaluator,
    /// 当前驱动姿态的实例；None 表示绑定姿态
    pub active: Option<InstanceHandle>,
}

impl SkeletalAnimator {
    pub fn new(evaluator: SkeletonEvaluator) -> Self {
        Self {
            evaluator,
            active: None,
        }
    }

    /// 以片段默认速度开始播放，替换当前实例
    pub fn play(&mut self, clip_id: usize) -> AnimationResult<InstanceHandle> {
        let handle = self.evaluator.create_instance_default(clip_id)?;
        if let Some(previous) = self.active.replace(handle) {
            self.evaluator.destroy_instance(previous);
        }
        Ok(handle)
    }

    /// 停止播放并回到绑定姿态
    pub fn stop(&mut self) {
        if let Some(handle) = self.active.take() {
            self.evaluator.destroy_instance(handle);
        }
    }

    /// 推进并求值一帧
    pub fn update(&mut self, delta_seconds: f32) -> AnimationResult<()> {
        self.evaluator.advance(delta_seconds);
        self.evaluator.evaluate(self.active, true)
    }
}

/// 骨骼动画系统 - 更新所有骨骼动画组件
///
/// 单个实体的错误只记录日志，不影响其他实体。
pub fn skeletal_animation_system(
    time: Res<Time>,
    mut query: Query<(Entity, &mut SkeletalAnimator)>,
) {
    for (entity, mut animator) in query.iter_mut() {
        if let Err(e) = animator.update(time.delta_seconds) {
            tracing::warn!(target: "animation.ecs", "Skeletal animation update failed for {:?}: {}", entity, e);
        }
    }
}
