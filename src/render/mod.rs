//! 渲染端协作接口
//!
//! - `shader_config` - 向着色器配置端报告骨骼数量
//! - `skinning_upload` - 把蒙皮矩阵上传到 GPU

pub mod shader_config;
pub mod skinning_upload;

pub use shader_config::{
    HeadlessShaderConfigurator, SkeletalShaderConfig, SkinningShaderConfigurator,
    SKINNING_MATRIX_SIZE,
};
pub use skinning_upload::GpuSkinningBuffer;
