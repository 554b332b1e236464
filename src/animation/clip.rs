use serde::{Deserialize, Serialize};

use super::keyframe::KeyframeTrack;
use crate::core::{AnimationError, AnimationResult};

/// 已注册到求值器中的动画片段
///
/// 轨道按关节 ID 对齐；列表可以比关节数短，缺失或为空的轨道表示该关节不受驱动。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    /// 动画名称
    pub name: String,
    /// 持续时间 (秒)
    pub duration: f32,
    /// 默认播放速度
    pub speed: f32,
    /// 关节轨道 (下标 = 关节 ID)
    pub tracks: Vec<KeyframeTrack>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, duration: f32, speed: f32) -> Self {
        Self {
            name: name.into(),
            duration,
            speed,
            tracks: Vec::new(),
        }
    }

    /// 设置某个关节的轨道，必要时以空轨道补齐
    pub fn set_track(&mut self, joint_id: usize, track: KeyframeTrack) {
        if self.tracks.len() <= joint_id {
            self.tracks.resize_with(joint_id + 1, KeyframeTrack::default);
        }
        self.tracks[joint_id] = track;
    }

    /// 获取关节轨道；缺失或为空时返回 None
    pub fn track(&self, joint_id: usize) -> Option<&KeyframeTrack> {
        self.tracks.get(joint_id).filter(|t| !t.is_empty())
    }

    /// 非空轨道数量
    pub fn animated_joint_count(&self) -> usize {
        self.tracks.iter().filter(|t| !t.is_empty()).count()
    }

    /// 针对给定关节数验证片段
    pub fn validate(&self, joint_count: usize) -> AnimationResult<()> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(AnimationError::Configuration(format!(
                "clip '{}' has invalid duration {}",
                self.name, self.duration
            )));
        }
        for (joint_id, track) in self.tracks.iter().enumerate() {
            if track.is_empty() {
                continue;
            }
            if joint_id >= joint_count {
                return Err(AnimationError::out_of_range("track joint", joint_id, joint_count));
            }
            track.validate().map_err(|e| match e {
                AnimationError::Configuration(msg) => AnimationError::Configuration(format!(
                    "clip '{}', joint {}: {}",
                    self.name, joint_id, msg
                )),
                other => other,
            })?;
        }
        Ok(())
    }
}

/// 资源加载器格式的单骨骼关键帧
///
/// 通过骨骼名称匹配关节；名称为空时退回到 `bone_id`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneKeyframes {
    #[serde(default)]
    pub bone_id: Option<usize>,
    #[serde(default)]
    pub bone_name: String,
    pub track: KeyframeTrack,
}

impl BoneKeyframes {
    pub fn named(bone_name: impl Into<String>, track: KeyframeTrack) -> Self {
        Self {
            bone_id: None,
            bone_name: bone_name.into(),
            track,
        }
    }

    pub fn with_id(bone_id: usize, track: KeyframeTrack) -> Self {
        Self {
            bone_id: Some(bone_id),
            bone_name: String::new(),
            track,
        }
    }
}

/// 资源加载器格式的骨骼动画
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkeletalAnimation {
    pub name: String,
    /// 总时长 (秒)
    pub duration: f32,
    pub speed: f32,
    pub keyframes: Vec<BoneKeyframes>,
}

impl SkeletalAnimation {
    pub fn new(name: impl Into<String>, duration: f32, speed: f32) -> Self {
        Self {
            name: name.into(),
            duration,
            speed,
            keyframes: Vec::new(),
        }
    }

    pub fn add_keyframes(&mut self, keyframes: BoneKeyframes) {
        self.keyframes.push(keyframes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn two_key_track() -> KeyframeTrack {
        let mut track = KeyframeTrack::new();
        track.push(0.0, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
        track.push(2.0, Vec3::new(2.0, 2.0, 2.0), Quat::IDENTITY, Vec3::ONE);
        track
    }

    #[test]
    fn test_animation_clip() {
        let mut clip = AnimationClip::new("test_animation", 2.0, 1.0);
        clip.set_track(1, two_key_track());

        assert_eq!(clip.tracks.len(), 2);
        assert!(clip.track(0).is_none());
        assert_eq!(clip.animated_joint_count(), 1);

        let pos = clip.track(1).unwrap().sample(1.0).unwrap().translation;
        assert!((pos.x - 1.0).abs() < 0.001);
        assert!((pos.y - 1.0).abs() < 0.001);
        assert!((pos.z - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_validate_track_beyond_joint_count() {
        let mut clip = AnimationClip::new("wave", 2.0, 1.0);
        clip.set_track(4, two_key_track());
        assert!(clip.validate(5).is_ok());
        assert_eq!(
            clip.validate(3),
            Err(AnimationError::out_of_range("track joint", 4, 3))
        );
    }

    #[test]
    fn test_validate_rejects_negative_duration() {
        let clip = AnimationClip::new("broken", -1.0, 1.0);
        assert!(matches!(clip.validate(1), Err(AnimationError::Configuration(_))));
    }

    #[test]
    fn test_validate_names_clip_and_joint() {
        let mut track = two_key_track();
        track.positions.pop();
        let mut clip = AnimationClip::new("walk", 2.0, 1.0);
        clip.set_track(0, track);

        match clip.validate(1) {
            Err(AnimationError::Configuration(msg)) => {
                assert!(msg.contains("walk"));
                assert!(msg.contains("joint 0"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
