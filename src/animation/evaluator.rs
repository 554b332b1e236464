//! 骨骼动画求值器
//!
//! 拥有关节层级、动画片段表、实例池和蒙皮矩阵缓冲区。每帧的调用顺序为：
//!
//! 1. `advance(dt)` 推进所有存活实例的游标
//! 2. `evaluate(Some(handle), true)` 采样关键帧、自顶向下合成蒙皮矩阵并写入缓冲区
//! 3. 渲染端读取 `skinning_buffer()` 并上传
//!
//! 所有操作都在同一线程上同步执行；多个求值器之间互不依赖。

use glam::Mat4;

use super::clip::{AnimationClip, SkeletalAnimation};
use super::instance::{AnimationInstance, InstanceHandle, InstancePool};
use super::skeleton::{build_joints, Joint, JointSnapshot, JointTransform, SkeletonSource};
use super::skinning::SkinningMatrixBuffer;
use crate::config::{EndOfTrackPolicy, EvaluationConfig};
use crate::core::{AnimationError, AnimationResult};
use crate::render::{SkeletalShaderConfig, SkinningShaderConfigurator};

/// 骨骼动画求值器
#[derive(Debug, Default)]
pub struct SkeletonEvaluator {
    joints: Vec<Joint>,
    root: Option<usize>,
    clips: Vec<AnimationClip>,
    instances: InstancePool,
    buffer: SkinningMatrixBuffer,
    config: EvaluationConfig,
}

impl SkeletonEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EvaluationConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    // ==========================================
    // 初始化与清理
    // ==========================================

    /// 由骨骼定义初始化
    ///
    /// 先清空旧状态，新的关节数组与片段表在本地构建并验证，全部成功后才提交。
    /// 成功后把关节数通知给着色器配置端。
    ///
    /// # 错误
    ///
    /// - `NullInput`: 未提供骨骼定义
    /// - `Configuration`: 没有骨骼、层级无效、关节数超过 `max_joints`、片段数据无效
    pub fn init(
        &mut self,
        source: Option<&dyn SkeletonSource>,
        copy_animation_data: bool,
        shader: &mut dyn SkinningShaderConfigurator,
    ) -> AnimationResult<()> {
        self.clear();

        let source = source.ok_or(AnimationError::NullInput("skeleton definition"))?;
        let (joints, root) = build_joints(source)?;
        if joints.len() > self.config.max_joints {
            return Err(AnimationError::Configuration(format!(
                "skeleton has {} joints, the skinning block holds at most {}",
                joints.len(),
                self.config.max_joints
            )));
        }

        let mut clips = Vec::new();
        if copy_animation_data {
            for index in 0..source.animation_count() {
                let animation = source
                    .animation(index)
                    .ok_or(AnimationError::NullInput("skeletal animation"))?;
                clips.push(import_animation(&joints, animation)?);
            }
        }

        let joint_count = joints.len();
        self.joints = joints;
        self.root = Some(root);
        self.clips = clips;
        self.buffer.resize(joint_count);

        shader.configure(&SkeletalShaderConfig::new(joint_count));

        tracing::info!(
            target: "animation",
            "Skeleton initialized: {} joints, root '{}', {} clips",
            joint_count,
            self.joints[root].name,
            self.clips.len()
        );
        Ok(())
    }

    /// 使用配置中的 `copy_animation_data` 初始化
    pub fn load(
        &mut self,
        source: &dyn SkeletonSource,
        shader: &mut dyn SkinningShaderConfigurator,
    ) -> AnimationResult<()> {
        let copy = self.config.copy_animation_data;
        self.init(Some(source), copy, shader)
    }

    /// 清空关节、片段、实例和缓冲区
    pub fn clear(&mut self) {
        self.joints.clear();
        self.root = None;
        self.clips.clear();
        self.instances.clear();
        self.buffer.clear();
    }

    pub fn is_initialized(&self) -> bool {
        self.root.is_some()
    }

    // ==========================================
    // 动画片段
    // ==========================================

    /// 导入按骨骼名称组织的动画数据，返回新片段 ID
    ///
    /// 名称与任何关节都不匹配的轨道会被跳过。
    pub fn add_animation_data(&mut self, animation: &SkeletalAnimation) -> AnimationResult<usize> {
        let clip = import_animation(&self.joints, animation)?;
        Ok(self.push_clip(clip))
    }

    /// 注册已按关节 ID 对齐的片段，返回片段 ID
    pub fn add_clip(&mut self, clip: AnimationClip) -> AnimationResult<usize> {
        clip.validate(self.joints.len())?;
        Ok(self.push_clip(clip))
    }

    fn push_clip(&mut self, clip: AnimationClip) -> usize {
        tracing::debug!(
            target: "animation",
            "Registered clip '{}' ({:.3}s, {} animated joints)",
            clip.name,
            clip.duration,
            clip.animated_joint_count()
        );
        self.clips.push(clip);
        self.clips.len() - 1
    }

    pub fn clip(&self, clip_id: usize) -> AnimationResult<&AnimationClip> {
        self.clips
            .get(clip_id)
            .ok_or_else(|| AnimationError::out_of_range("clip", clip_id, self.clips.len()))
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// 按名称查找片段 ID
    pub fn clip_id(&self, name: &str) -> Option<usize> {
        self.clips.iter().position(|clip| clip.name == name)
    }

    /// 丢弃整个片段表；仍引用旧片段的实例在求值时返回 `DanglingClipReference`
    pub fn clear_clips(&mut self) {
        self.clips.clear();
    }

    // ==========================================
    // 实例管理
    // ==========================================

    /// 创建动画实例
    pub fn create_instance(
        &mut self,
        clip_id: usize,
        speed: f32,
        start_offset: f32,
    ) -> AnimationResult<InstanceHandle> {
        self.clip(clip_id)?;
        let handle = self
            .instances
            .insert(AnimationInstance::new(clip_id, speed, start_offset));
        tracing::debug!(
            target: "animation",
            "Created instance {:?} for clip {} (speed {}, offset {})",
            handle,
            clip_id,
            speed,
            start_offset
        );
        Ok(handle)
    }

    /// 以片段默认速度从头创建实例
    ///
    /// 片段速度为 0 或非有限值时使用配置中的 `default_speed`。
    pub fn create_instance_default(&mut self, clip_id: usize) -> AnimationResult<InstanceHandle> {
        let clip_speed = self.clip(clip_id)?.speed;
        let speed = if clip_speed.is_finite() && clip_speed != 0.0 {
            clip_speed
        } else {
            self.config.default_speed
        };
        self.create_instance(clip_id, speed, 0.0)
    }

    /// 销毁实例；句柄不对应存活实例时什么也不做，返回 false
    pub fn destroy_instance(&mut self, handle: InstanceHandle) -> bool {
        let removed = self.instances.remove(handle).is_some();
        if removed {
            tracing::debug!(target: "animation", "Destroyed instance {:?}", handle);
        }
        removed
    }

    pub fn instance(&self, handle: InstanceHandle) -> AnimationResult<&AnimationInstance> {
        self.instances
            .get(handle)
            .ok_or(AnimationError::InvalidHandle(handle))
    }

    fn instance_mut(&mut self, handle: InstanceHandle) -> AnimationResult<&mut AnimationInstance> {
        self.instances
            .get_mut(handle)
            .ok_or(AnimationError::InvalidHandle(handle))
    }

    pub fn live_instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn pause(&mut self, handle: InstanceHandle) -> AnimationResult<()> {
        self.instance_mut(handle)?.paused = true;
        Ok(())
    }

    pub fn resume(&mut self, handle: InstanceHandle) -> AnimationResult<()> {
        self.instance_mut(handle)?.paused = false;
        Ok(())
    }

    pub fn set_speed(&mut self, handle: InstanceHandle, speed: f32) -> AnimationResult<()> {
        self.instance_mut(handle)?.speed = speed;
        Ok(())
    }

    /// 跳转到指定时间并清除结束标记
    pub fn seek(&mut self, handle: InstanceHandle, time: f32) -> AnimationResult<()> {
        let instance = self.instance_mut(handle)?;
        instance.cursor = time;
        instance.finished = false;
        Ok(())
    }

    /// 回到片段开头
    pub fn reset(&mut self, handle: InstanceHandle) -> AnimationResult<()> {
        self.seek(handle, 0.0)
    }

    pub fn is_finished(&self, handle: InstanceHandle) -> AnimationResult<bool> {
        Ok(self.instance(handle)?.finished)
    }

    /// 推进所有未暂停实例的游标，不做钳制
    pub fn advance(&mut self, dt: f32) {
        for instance in self.instances.iter_mut() {
            instance.advance(dt);
        }
    }

    // ==========================================
    // 姿态求值
    // ==========================================

    /// 求值姿态
    ///
    /// `None` 时所有蒙皮矩阵重置为单位矩阵（绑定姿态）。否则把实例游标钳制到
    /// `[0, duration]`，对每个有轨道的关节采样局部变换，再从根关节开始合成蒙皮矩阵。
    /// `update_buffer` 为 true 时把结果写入蒙皮矩阵缓冲区。
    pub fn evaluate(
        &mut self,
        handle: Option<InstanceHandle>,
        update_buffer: bool,
    ) -> AnimationResult<()> {
        let Some(handle) = handle else {
            for joint in &mut self.joints {
                joint.skinning_matrix = Mat4::IDENTITY;
            }
            if update_buffer {
                self.buffer.fill_identity();
            }
            return Ok(());
        };

        let instance = self
            .instances
            .get_mut(handle)
            .ok_or(AnimationError::InvalidHandle(handle))?;
        let clip = self
            .clips
            .get(instance.clip_id)
            .ok_or(AnimationError::DanglingClipReference {
                clip_id: instance.clip_id,
                clip_count: self.clips.len(),
            })?;

        // 倒放或跳转回片段内时清除结束标记
        if instance.cursor >= clip.duration {
            instance.cursor = clip.duration;
            instance.finished = true;
        } else {
            instance.cursor = instance.cursor.max(0.0);
            instance.finished = false;
        }
        let cursor = instance.cursor;

        tracing::trace!(
            target: "animation",
            "Evaluating clip '{}' at {:.4}s for {:?}",
            clip.name,
            cursor,
            handle
        );

        sample_clip(&mut self.joints, clip, cursor, self.config.end_of_track);
        self.compose();

        if update_buffer {
            self.write_buffer()?;
        }
        Ok(())
    }

    /// 不采样片段，直接用当前局部变换合成蒙皮矩阵
    pub fn apply_pose(&mut self, update_buffer: bool) -> AnimationResult<()> {
        self.compose();
        if update_buffer {
            self.write_buffer()?;
        }
        Ok(())
    }

    /// 自顶向下（父先于子）合成：world = parent_world * T * R * S，skinning = world * offset
    fn compose(&mut self) {
        let Some(root) = self.root else {
            return;
        };

        let mut stack = vec![(root, Mat4::IDENTITY)];
        while let Some((id, parent_world)) = stack.pop() {
            let joint = &mut self.joints[id];
            let world = parent_world * joint.local.to_matrix();
            joint.skinning_matrix = world * joint.offset_matrix;
            stack.extend(joint.children.iter().rev().map(|&child| (child, world)));
        }
    }

    fn write_buffer(&mut self) -> AnimationResult<()> {
        for joint in &self.joints {
            self.buffer.set(joint.id, joint.skinning_matrix)?;
        }
        Ok(())
    }

    // ==========================================
    // 关节访问
    // ==========================================

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, joint_id: usize) -> AnimationResult<&Joint> {
        self.joints
            .get(joint_id)
            .ok_or_else(|| AnimationError::out_of_range("joint", joint_id, self.joints.len()))
    }

    /// 根关节 ID
    pub fn root(&self) -> Option<usize> {
        self.root
    }

    /// 按名称查找关节 ID；重名时返回最后一个
    pub fn joint_id(&self, name: &str) -> Option<usize> {
        joint_id_from_name(&self.joints, name)
    }

    pub fn local_transform(&self, joint_id: usize) -> AnimationResult<JointTransform> {
        Ok(self.joint(joint_id)?.local)
    }

    /// 手动设置关节局部变换
    pub fn set_local_transform(
        &mut self,
        joint_id: usize,
        transform: JointTransform,
    ) -> AnimationResult<()> {
        let len = self.joints.len();
        let joint = self
            .joints
            .get_mut(joint_id)
            .ok_or_else(|| AnimationError::out_of_range("joint", joint_id, len))?;
        joint.local = transform;
        Ok(())
    }

    /// 各关节当前的蒙皮矩阵
    pub fn skinning_matrices(&self) -> Vec<Mat4> {
        self.joints.iter().map(|j| j.skinning_matrix).collect()
    }

    /// 渲染端读取的蒙皮矩阵缓冲区
    pub fn skinning_buffer(&self) -> &SkinningMatrixBuffer {
        &self.buffer
    }

    /// 复制整个关节层级
    pub fn skeleton_snapshot(&self) -> Vec<JointSnapshot> {
        self.joints.iter().map(JointSnapshot::from).collect()
    }

    /// 按 ID 刷新快照中的变换与矩阵
    pub fn update_snapshot(&self, snapshot: &mut [JointSnapshot]) -> AnimationResult<()> {
        for entry in snapshot.iter_mut() {
            let joint = self.joint(entry.id)?;
            entry.offset_matrix = joint.offset_matrix;
            entry.local = joint.local;
            entry.skinning_matrix = joint.skinning_matrix;
        }
        Ok(())
    }
}

fn joint_id_from_name(joints: &[Joint], name: &str) -> Option<usize> {
    joints.iter().rposition(|joint| joint.name == name)
}

/// 把按骨骼名称组织的动画转换为按关节 ID 对齐的片段（深拷贝）
///
/// 较短的位置/旋转/缩放通道以其第一个采样补齐到时间戳数量。
fn import_animation(
    joints: &[Joint],
    animation: &SkeletalAnimation,
) -> AnimationResult<AnimationClip> {
    let mut clip = AnimationClip::new(animation.name.clone(), animation.duration, animation.speed);

    for keyframes in &animation.keyframes {
        let joint_id = if keyframes.bone_name.is_empty() {
            keyframes.bone_id.filter(|&id| id < joints.len())
        } else {
            joint_id_from_name(joints, &keyframes.bone_name)
        };

        match joint_id {
            Some(joint_id) => {
                let mut track = keyframes.track.clone();
                track.pad_channels();
                clip.set_track(joint_id, track);
            }
            None => tracing::debug!(
                target: "animation",
                "Clip '{}': no joint for bone '{}' ({:?}), track skipped",
                animation.name,
                keyframes.bone_name,
                keyframes.bone_id
            ),
        }
    }

    clip.validate(joints.len())?;
    Ok(clip)
}

/// 采样片段中的每条轨道，写入关节局部变换
///
/// 没有轨道的关节保持原值；没有区间包含游标时按策略处理。
fn sample_clip(joints: &mut [Joint], clip: &AnimationClip, cursor: f32, policy: EndOfTrackPolicy) {
    for (joint, track) in joints.iter_mut().zip(clip.tracks.iter()) {
        if track.is_empty() {
            continue;
        }

        if let Some(transform) = track.sample(cursor) {
            joint.local = transform;
        } else if policy == EndOfTrackPolicy::PinLastKeyframe
            && track.end_time().is_some_and(|end| cursor >= end)
        {
            if let Some(last) = track.last_keyframe() {
                joint.local = last;
            }
        }
    }
}
