use super::{ConfigError, ConfigResult};
use crate::impl_default;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 姿态求值配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// `init` 时是否深拷贝骨骼定义中的动画片段
    pub copy_animation_data: bool,

    /// 播放游标超出轨道最后一个关键帧时的处理方式
    #[serde(default)]
    pub end_of_track: EndOfTrackPolicy,

    /// 蒙皮 uniform block 可容纳的最大关节数
    pub max_joints: usize,

    /// `create_instance_default` 使用的播放速度
    pub default_speed: f32,
}

impl_default!(EvaluationConfig {
    copy_animation_data: true,
    end_of_track: EndOfTrackPolicy::Hold,
    max_joints: 256,
    default_speed: 1.0,
});

impl EvaluationConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_joints == 0 {
            return Err(ConfigError::ValidationError(
                "max_joints must be at least 1".to_string(),
            ));
        }
        if !self.default_speed.is_finite() {
            return Err(ConfigError::ValidationError(
                "default_speed must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// 游标越过轨道末尾时的策略
///
/// 轨道不必覆盖整个片段时长；游标被钳制到片段时长后可能没有任何关键帧区间包含它。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndOfTrackPolicy {
    /// 保持关节局部变换不变
    #[default]
    Hold,
    /// 显式使用最后一个关键帧的值
    PinLastKeyframe,
}

impl FromStr for EndOfTrackPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hold" => Ok(Self::Hold),
            "pin_last_keyframe" | "pin" => Ok(Self::PinLastKeyframe),
            other => Err(ConfigError::ParseError(format!(
                "unknown end-of-track policy: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EvaluationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_joints_rejected() {
        let config = EvaluationConfig {
            max_joints: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("hold".parse::<EndOfTrackPolicy>().unwrap(), EndOfTrackPolicy::Hold);
        assert_eq!(
            "Pin_Last_Keyframe".parse::<EndOfTrackPolicy>().unwrap(),
            EndOfTrackPolicy::PinLastKeyframe
        );
        assert!("loop".parse::<EndOfTrackPolicy>().is_err());
    }
}
