//! 骨骼数据结构
//!
//! 定义关节层级、骨骼定义（资源加载器提供的只读视图）以及关节快照。
//! 关节层级以扁平数组保存，父子关系均为数组下标。

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::clip::SkeletalAnimation;
use crate::core::{AnimationError, AnimationResult};

// ============================================================================
// 关节变换
// ============================================================================

/// 关节局部变换
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for JointTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl JointTransform {
    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    /// 转换为 4x4 矩阵：T * R * S
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// 位置与缩放线性插值，旋转球面线性插值
    pub fn interpolate(&self, other: &Self, s: f32) -> Self {
        Self {
            translation: self.translation.lerp(other.translation, s),
            rotation: self.rotation.slerp(other.rotation, s),
            scale: self.scale.lerp(other.scale, s),
        }
    }
}

// ============================================================================
// 关节
// ============================================================================

/// 骨骼层级中的一个关节
#[derive(Clone, Debug)]
pub struct Joint {
    /// 关节 ID（同时也是在关节数组中的下标）
    pub id: usize,
    pub name: String,
    /// 父关节下标（None 表示根关节）
    pub parent: Option<usize>,
    /// 子关节下标，按骨骼定义中的顺序
    pub children: Vec<usize>,
    /// 局部变换（相对于父关节）
    pub local: JointTransform,
    /// 绑定姿态偏移矩阵（模型空间 -> 关节空间）
    pub offset_matrix: Mat4,
    /// 最近一次求值得到的蒙皮矩阵
    pub skinning_matrix: Mat4,
}

impl Joint {
    fn from_record(record: &BoneRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            parent: record.parent,
            children: Vec::with_capacity(record.children.len()),
            local: JointTransform::identity(),
            offset_matrix: record.offset_matrix,
            skinning_matrix: Mat4::IDENTITY,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

// ============================================================================
// 骨骼定义（资源加载器视图）
// ============================================================================

/// 单个骨骼记录
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneRecord {
    pub id: usize,
    pub name: String,
    pub parent: Option<usize>,
    #[serde(default)]
    pub children: Vec<usize>,
    pub offset_matrix: Mat4,
}

/// 资源加载器提供的骨骼与动画数据只读视图
pub trait SkeletonSource {
    fn bone_count(&self) -> usize;
    fn bone(&self, index: usize) -> Option<&BoneRecord>;
    fn animation_count(&self) -> usize;
    fn animation(&self, index: usize) -> Option<&SkeletalAnimation>;
}

/// 内存中的骨骼定义
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SkeletonDefinition {
    pub bones: Vec<BoneRecord>,
    #[serde(default)]
    pub animations: Vec<SkeletalAnimation>,
}

impl SkeletonDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加骨骼，自动分配 ID 并登记到父骨骼的子列表
    ///
    /// 父骨骼必须已经存在，否则返回 `IndexOutOfRange`。
    pub fn add_bone(
        &mut self,
        name: impl Into<String>,
        parent: Option<usize>,
        offset_matrix: Mat4,
    ) -> AnimationResult<usize> {
        let id = self.bones.len();
        if let Some(parent_id) = parent {
            let parent_bone = self
                .bones
                .get_mut(parent_id)
                .ok_or_else(|| AnimationError::out_of_range("parent bone", parent_id, id))?;
            parent_bone.children.push(id);
        }

        self.bones.push(BoneRecord {
            id,
            name: name.into(),
            parent,
            children: Vec::new(),
            offset_matrix,
        });
        Ok(id)
    }

    pub fn add_animation(&mut self, animation: SkeletalAnimation) {
        self.animations.push(animation);
    }
}

impl SkeletonSource for SkeletonDefinition {
    fn bone_count(&self) -> usize {
        self.bones.len()
    }

    fn bone(&self, index: usize) -> Option<&BoneRecord> {
        self.bones.get(index)
    }

    fn animation_count(&self) -> usize {
        self.animations.len()
    }

    fn animation(&self, index: usize) -> Option<&SkeletalAnimation> {
        self.animations.get(index)
    }
}

// ============================================================================
// 层级构建
// ============================================================================

/// 由骨骼记录构建关节数组，返回 (关节数组, 根关节下标)
///
/// 关节按 ID 放置；ID 必须恰好覆盖 `0..bone_count`。父链接是权威的：
/// 子列表中缺失的子关节会被补上，与父链接矛盾的子列表条目视为配置错误。
pub(crate) fn build_joints(source: &dyn SkeletonSource) -> AnimationResult<(Vec<Joint>, usize)> {
    let count = source.bone_count();
    if count == 0 {
        return Err(AnimationError::Configuration("no bones".to_string()));
    }

    let mut slots: Vec<Option<Joint>> = vec![None; count];
    let mut child_lists: Vec<Vec<usize>> = vec![Vec::new(); count];
    for index in 0..count {
        let record = source
            .bone(index)
            .ok_or(AnimationError::NullInput("bone record"))?;
        if record.id >= count {
            return Err(AnimationError::Configuration(format!(
                "bone '{}' has id {} outside 0..{}",
                record.name, record.id, count
            )));
        }
        if slots[record.id].is_some() {
            return Err(AnimationError::Configuration(format!(
                "duplicate bone id {}",
                record.id
            )));
        }
        if let Some(parent) = record.parent {
            if parent >= count {
                return Err(AnimationError::Configuration(format!(
                    "bone {} references missing parent {}",
                    record.id, parent
                )));
            }
        }
        slots[record.id] = Some(Joint::from_record(record));
        child_lists[record.id] = record.children.clone();
    }

    // 所有 ID 唯一且在范围内，因此每个槽位都已填充
    let mut joints: Vec<Joint> = slots.into_iter().flatten().collect();

    for (id, children) in child_lists.into_iter().enumerate() {
        for child in children {
            let child_parent = joints
                .get(child)
                .ok_or_else(|| {
                    AnimationError::Configuration(format!(
                        "bone {id} lists missing child {child}"
                    ))
                })?
                .parent;
            if child_parent != Some(id) {
                return Err(AnimationError::Configuration(format!(
                    "bone {id} lists child {child}, whose parent is {child_parent:?}"
                )));
            }
            if !joints[id].children.contains(&child) {
                joints[id].children.push(child);
            }
        }
    }
    for id in 0..count {
        if let Some(parent) = joints[id].parent {
            if !joints[parent].children.contains(&id) {
                joints[parent].children.push(id);
            }
        }
    }

    let mut roots = joints.iter().filter(|j| j.is_root()).map(|j| j.id);
    let root = roots
        .next()
        .ok_or_else(|| AnimationError::Configuration("missing root bone".to_string()))?;
    if let Some(second) = roots.next() {
        return Err(AnimationError::Configuration(format!(
            "multiple root bones ({root} and {second})"
        )));
    }

    // 单根且每个非根关节都有父关节时，不可达的关节必然处于环上
    let mut visited = vec![false; count];
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if visited[id] {
            return Err(AnimationError::Configuration(format!(
                "bone {id} reached twice while walking the hierarchy"
            )));
        }
        visited[id] = true;
        stack.extend(joints[id].children.iter().copied());
    }
    if let Some(orphan) = visited.iter().position(|v| !v) {
        return Err(AnimationError::Configuration(format!(
            "bone {orphan} is not reachable from the root (cycle in parent links)"
        )));
    }

    Ok((joints, root))
}

// ============================================================================
// 关节快照
// ============================================================================

/// 关节状态的独立拷贝，供编辑器或碰撞检测等外部代码读取
#[derive(Clone, Debug, PartialEq)]
pub struct JointSnapshot {
    pub id: usize,
    pub name: String,
    pub offset_matrix: Mat4,
    pub local: JointTransform,
    pub skinning_matrix: Mat4,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl From<&Joint> for JointSnapshot {
    fn from(joint: &Joint) -> Self {
        Self {
            id: joint.id,
            name: joint.name.clone(),
            offset_matrix: joint.offset_matrix,
            local: joint.local,
            skinning_matrix: joint.skinning_matrix,
            parent: joint.parent,
            children: joint.children.clone(),
        }
    }
}

// ============================================================================
// 测试
// ============================================================================
