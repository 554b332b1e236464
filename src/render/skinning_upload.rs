//! 蒙皮矩阵 GPU 上传
//!
//! 把 `SkinningMatrixBuffer` 写入 wgpu 存储缓冲区。上传时机由渲染端决定，
//! 调用前须先完成当帧的 `evaluate`。

use crate::animation::SkinningMatrixBuffer;

/// 最小缓冲区大小（字节）
pub const MIN_SKINNING_BUFFER_SIZE: wgpu::BufferAddress = 256;

/// 持有蒙皮矩阵的 GPU 缓冲区
#[derive(Debug, Default)]
pub struct GpuSkinningBuffer {
    buffer: Option<wgpu::Buffer>,
    capacity: wgpu::BufferAddress,
}

impl GpuSkinningBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// GPU 缓冲区（首次上传前为 None）
    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }

    pub fn capacity(&self) -> wgpu::BufferAddress {
        self.capacity
    }

    /// 上传蒙皮矩阵，必要时创建或扩容缓冲区
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        matrices: &SkinningMatrixBuffer,
    ) {
        let bytes = matrices.as_bytes();
        let required = required_size(bytes.len());

        if self.buffer.is_none() || needs_realloc(self.capacity, required) {
            tracing::debug!(
                target: "render.skinning",
                "Allocating skinning buffer: {} bytes for {} joints",
                required,
                matrices.len()
            );
            self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Skinning Matrix Buffer"),
                size: required,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.capacity = required;
        }

        if let Some(buffer) = &self.buffer {
            if !bytes.is_empty() {
                queue.write_buffer(buffer, 0, bytes);
            }
        }
    }
}

/// 现有容量装不下时需要重新创建缓冲区；只增不减
pub fn needs_realloc(capacity: wgpu::BufferAddress, required: wgpu::BufferAddress) -> bool {
    required > capacity
}

/// 给定字节数所需的缓冲区大小（不小于最小值）
pub fn required_size(byte_len: usize) -> wgpu::BufferAddress {
    (byte_len as wgpu::BufferAddress).max(MIN_SKINNING_BUFFER_SIZE)
}
