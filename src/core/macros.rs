//! 核心宏定义
//!
//! 提供统一的宏来减少代码重复

/// 为结构体实现Default trait的宏
///
/// 使用示例:
/// ```rust
/// use skeletal_engine::impl_default;
///
/// struct PlaybackDefaults {
///     speed: f32,
///     clip: String,
/// }
///
/// impl_default!(PlaybackDefaults {
///     speed: 1.0,
///     clip: String::new(),
/// });
///
/// assert_eq!(PlaybackDefaults::default().speed, 1.0);
/// ```
#[macro_export]
macro_rules! impl_default {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }
    };
}
