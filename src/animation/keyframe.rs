use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::skeleton::JointTransform;
use crate::core::{AnimationError, AnimationResult};

/// 单个关节在一个动画片段中的关键帧轨道
///
/// 四个序列按下标一一对应；空轨道表示该片段不驱动此关节。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyframeTrack {
    /// 时间戳 (秒)，单调不减
    pub timestamps: Vec<f32>,
    pub positions: Vec<Vec3>,
    pub rotations: Vec<Quat>,
    pub scalings: Vec<Vec3>,
}

impl KeyframeTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加关键帧
    ///
    /// 不排序；顺序由调用方保证，`validate` 负责检查。
    pub fn push(&mut self, time: f32, position: Vec3, rotation: Quat, scale: Vec3) {
        self.timestamps.push(time);
        self.positions.push(position);
        self.rotations.push(rotation);
        self.scalings.push(scale);
    }

    /// 以变换形式追加关键帧
    pub fn push_transform(&mut self, time: f32, transform: JointTransform) {
        self.push(time, transform.translation, transform.rotation, transform.scale);
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// 最后一个关键帧的时间戳
    pub fn end_time(&self) -> Option<f32> {
        self.timestamps.last().copied()
    }

    /// 把比时间戳短的非空通道用该通道的第一个采样补齐
    ///
    /// 导入器常为常量通道只输出一个关键帧。空通道和过长的通道保持原样，交给 `validate` 拒绝。
    pub fn pad_channels(&mut self) {
        let len = self.timestamps.len();
        pad_with_first(&mut self.positions, len);
        pad_with_first(&mut self.rotations, len);
        pad_with_first(&mut self.scalings, len);
    }

    /// 检查序列长度一致、时间戳有限且单调不减
    pub fn validate(&self) -> AnimationResult<()> {
        let len = self.timestamps.len();
        if self.positions.len() != len || self.rotations.len() != len || self.scalings.len() != len
        {
            return Err(AnimationError::Configuration(format!(
                "keyframe sequences differ in length (timestamps {}, positions {}, rotations {}, scalings {})",
                len,
                self.positions.len(),
                self.rotations.len(),
                self.scalings.len()
            )));
        }
        if let Some(bad) = self.timestamps.iter().position(|t| !t.is_finite()) {
            return Err(AnimationError::Configuration(format!(
                "keyframe {bad} has a non-finite timestamp"
            )));
        }
        if let Some(k) = self.timestamps.windows(2).position(|w| w[1] < w[0]) {
            return Err(AnimationError::Configuration(format!(
                "timestamps decrease between keyframes {} and {}",
                k,
                k + 1
            )));
        }
        Ok(())
    }

    /// 线性扫描查找包含 `cursor` 的区间 `(k, k+1)`，返回 (k, 插值因子)
    ///
    /// 区间为闭区间，取第一个命中的区间；边界上的精确匹配归属于该区间。
    pub fn find_segment(&self, cursor: f32) -> Option<(usize, f32)> {
        for (k, pair) in self.timestamps.windows(2).enumerate() {
            let (time, time_next) = (pair[0], pair[1]);
            if time <= cursor && cursor <= time_next {
                let span = time_next - time;
                // 零长度区间
                let s = if span > 0.0 { (cursor - time) / span } else { 0.0 };
                return Some((k, s));
            }
        }
        None
    }

    /// 第 `k` 个关键帧的变换
    pub fn keyframe(&self, k: usize) -> Option<JointTransform> {
        Some(JointTransform::new(
            *self.positions.get(k)?,
            *self.rotations.get(k)?,
            *self.scalings.get(k)?,
        ))
    }

    /// 在 `cursor` 处采样；没有区间包含 `cursor` 时返回 None
    pub fn sample(&self, cursor: f32) -> Option<JointTransform> {
        let (k, s) = self.find_segment(cursor)?;
        let from = self.keyframe(k)?;
        let to = self.keyframe(k + 1)?;
        Some(from.interpolate(&to, s))
    }

    /// 最后一个关键帧的变换
    pub fn last_keyframe(&self) -> Option<JointTransform> {
        self.keyframe(self.len().checked_sub(1)?)
    }
}

fn pad_with_first<T: Copy>(channel: &mut Vec<T>, len: usize) {
    if let Some(&first) = channel.first() {
        if channel.len() < len {
            channel.resize(len, first);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_track() -> KeyframeTrack {
        let mut track = KeyframeTrack::new();
        track.push(0.0, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
        track.push(1.0, Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY, Vec3::ONE);
        track.push(3.0, Vec3::new(1.0, 4.0, 0.0), Quat::IDENTITY, Vec3::splat(2.0));
        track
    }

    #[test]
    fn test_sample_at_keyframes_is_exact() {
        let track = linear_track();
        assert_eq!(track.sample(0.0).unwrap().translation, Vec3::ZERO);
        assert_eq!(track.sample(1.0).unwrap().translation, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(track.sample(3.0).unwrap().translation, Vec3::new(1.0, 4.0, 0.0));
    }

    #[test]
    fn test_sample_interpolates() {
        let track = linear_track();
        let value = track.sample(2.0).unwrap();
        assert!((value.translation - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);
        assert!((value.scale - Vec3::splat(1.5)).length() < 1e-5);
    }

    #[test]
    fn test_boundary_resolves_to_first_segment() {
        let track = linear_track();
        assert_eq!(track.find_segment(1.0), Some((0, 1.0)));
    }

    #[test]
    fn test_outside_track_has_no_segment() {
        let track = linear_track();
        assert!(track.sample(3.5).is_none());
        assert!(track.sample(-0.1).is_none());
        assert!(KeyframeTrack::new().sample(0.0).is_none());
    }

    #[test]
    fn test_zero_length_segment() {
        let mut track = KeyframeTrack::new();
        track.push(1.0, Vec3::X, Quat::IDENTITY, Vec3::ONE);
        track.push(1.0, Vec3::Y, Quat::IDENTITY, Vec3::ONE);
        assert_eq!(track.sample(1.0).unwrap().translation, Vec3::X);
    }

    #[test]
    fn test_slerp_rotation() {
        let mut track = KeyframeTrack::new();
        track.push(0.0, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
        track.push(
            1.0,
            Vec3::ZERO,
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            Vec3::ONE,
        );
        let rotation = track.sample(0.5).unwrap().rotation;
        let expected = Quat::from_rotation_z(std::f32::consts::FRAC_PI_4);
        assert!(rotation.angle_between(expected) < 1e-4);
        assert!((rotation.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_validate() {
        assert!(linear_track().validate().is_ok());

        let mut uneven = linear_track();
        uneven.scalings.pop();
        assert!(uneven.validate().is_err());

        let mut decreasing = KeyframeTrack::new();
        decreasing.push(1.0, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
        decreasing.push(0.5, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
        assert!(decreasing.validate().is_err());
    }

    #[test]
    fn test_pad_channels_repeats_first_sample() {
        let mut track = KeyframeTrack {
            timestamps: vec![0.0, 1.0, 2.0],
            positions: vec![Vec3::Y],
            rotations: vec![Quat::IDENTITY; 3],
            scalings: vec![Vec3::splat(2.0)],
        };
        track.pad_channels();

        assert!(track.validate().is_ok());
        assert_eq!(track.positions, vec![Vec3::Y; 3]);
        assert_eq!(track.scalings, vec![Vec3::splat(2.0); 3]);
        assert_eq!(track.sample(1.5).unwrap().translation, Vec3::Y);
    }

    #[test]
    fn test_pad_channels_leaves_empty_channel() {
        let mut track = linear_track();
        track.rotations.clear();
        track.pad_channels();
        assert!(track.rotations.is_empty());
        assert!(track.validate().is_err());
    }

    #[test]
    fn test_push_transform() {
        let mut track = KeyframeTrack::new();
        let pose = JointTransform::new(Vec3::X, Quat::from_rotation_x(0.5), Vec3::splat(3.0));
        track.push_transform(0.25, pose);
        assert_eq!(track.timestamps, vec![0.25]);
        assert_eq!(track.keyframe(0), Some(pose));
    }

    #[test]
    fn test_last_keyframe() {
        let track = linear_track();
        assert_eq!(track.end_time(), Some(3.0));
        assert_eq!(track.last_keyframe().unwrap().scale, Vec3::splat(2.0));
        assert!(KeyframeTrack::new().last_keyframe().is_none());
    }
}
