//! 蒙皮矩阵缓冲区
//!
//! 按关节 ID 寻址的扁平 4x4 矩阵数组（列主序，平移位于最后一列），
//! 每次求值后刷新，交给渲染端上传到 GPU。

use glam::Mat4;

use crate::core::{AnimationError, AnimationResult};

/// 蒙皮矩阵缓冲区
#[derive(Debug, Clone, Default)]
pub struct SkinningMatrixBuffer {
    matrices: Vec<Mat4>,
}

impl SkinningMatrixBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_joint_count(joint_count: usize) -> Self {
        Self {
            matrices: vec![Mat4::IDENTITY; joint_count],
        }
    }

    /// 重设大小；旧内容全部丢弃并以单位矩阵填充
    pub fn resize(&mut self, joint_count: usize) {
        self.matrices.clear();
        self.matrices.resize(joint_count, Mat4::IDENTITY);
    }

    pub fn set(&mut self, joint_index: usize, matrix: Mat4) -> AnimationResult<()> {
        let len = self.matrices.len();
        let slot = self
            .matrices
            .get_mut(joint_index)
            .ok_or_else(|| AnimationError::out_of_range("skinning buffer slot", joint_index, len))?;
        *slot = matrix;
        Ok(())
    }

    pub fn get(&self, joint_index: usize) -> Option<&Mat4> {
        self.matrices.get(joint_index)
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    /// 只读视图
    pub fn as_slice(&self) -> &[Mat4] {
        &self.matrices
    }

    /// 上传用的原始字节（每个矩阵 16 个 f32，列主序）
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.matrices)
    }

    /// 以单位矩阵覆盖全部内容
    pub fn fill_identity(&mut self) {
        self.matrices.fill(Mat4::IDENTITY);
    }

    pub fn clear(&mut self) {
        self.matrices.clear();
    }
}
