//! 蒙皮着色器配置
//!
//! 求值器初始化时向着色器配置端报告关节数，以便其确定 uniform block 的大小。
//! 这是单向通知，不是回调。

/// 每个蒙皮矩阵占用的字节数
pub const SKINNING_MATRIX_SIZE: usize = std::mem::size_of::<[f32; 16]>();

/// 骨骼动画着色器配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkeletalShaderConfig {
    /// 骨骼数量
    pub bone_count: usize,
    /// 是否启用光照变体
    pub lighting: bool,
}

impl SkeletalShaderConfig {
    pub fn new(bone_count: usize) -> Self {
        Self {
            bone_count,
            lighting: true,
        }
    }

    /// 蒙皮矩阵 uniform block 所需字节数
    pub fn uniform_block_size(&self) -> usize {
        self.bone_count * SKINNING_MATRIX_SIZE
    }

    /// 注入到着色器源码前的预处理定义
    pub fn shader_defines(&self) -> Vec<(String, String)> {
        let mut defines = vec![
            ("SKELETAL_ANIMATION".to_string(), "1".to_string()),
            ("BONE_COUNT".to_string(), self.bone_count.to_string()),
        ];
        if self.lighting {
            defines.push(("LIGHTING".to_string(), "1".to_string()));
        }
        defines
    }
}

/// 着色器配置端
pub trait SkinningShaderConfigurator {
    fn configure(&mut self, config: &SkeletalShaderConfig);
}

impl<F> SkinningShaderConfigurator for F
where
    F: FnMut(&SkeletalShaderConfig),
{
    fn configure(&mut self, config: &SkeletalShaderConfig) {
        self(config)
    }
}

/// 无渲染环境下使用的空实现
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessShaderConfigurator;

impl SkinningShaderConfigurator for HeadlessShaderConfigurator {
    fn configure(&mut self, config: &SkeletalShaderConfig) {
        tracing::trace!(target: "render.skinning", bone_count = config.bone_count, "headless shader configuration");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_block_size() {
        assert_eq!(SkeletalShaderConfig::new(3).uniform_block_size(), 192);
    }

    #[test]
    fn test_shader_defines() {
        let mut config = SkeletalShaderConfig::new(12);
        assert!(config
            .shader_defines()
            .contains(&("BONE_COUNT".to_string(), "12".to_string())));

        config.lighting = false;
        assert!(!config.shader_defines().iter().any(|(k, _)| k == "LIGHTING"));
    }

    #[test]
    fn test_closure_configurator() {
        let mut seen = None;
        let mut configurator = |config: &SkeletalShaderConfig| seen = Some(config.bone_count);
        configurator.configure(&SkeletalShaderConfig::new(5));
        assert_eq!(seen, Some(5));
    }
}
