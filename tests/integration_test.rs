use bevy_ecs::prelude::{Schedule, World};
use glam::{Mat4, Quat, Vec3};
use skeletal_engine::animation::{
    skeletal_animation_system, AnimationClip, BoneKeyframes, KeyframeTrack, SkeletalAnimation,
    SkeletalAnimator, SkeletonDefinition, SkeletonEvaluator,
};
use skeletal_engine::config::{AnimationConfig, EndOfTrackPolicy};
use skeletal_engine::ecs::Time;
use skeletal_engine::render::{HeadlessShaderConfigurator, SkeletalShaderConfig};
use skeletal_engine::{AnimationError, JointTransform};

fn three_joint_chain() -> SkeletonDefinition {
    let mut def = SkeletonDefinition::new();
    let root = def.add_bone("hip", None, Mat4::IDENTITY).unwrap();
    let knee = def
        .add_bone("knee", Some(root), Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)))
        .unwrap();
    def.add_bone("ankle", Some(knee), Mat4::from_translation(Vec3::new(0.0, -2.0, 0.0)))
        .unwrap();
    def
}

fn middle_joint_clip() -> AnimationClip {
    let mut track = KeyframeTrack::new();
    track.push(0.0, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
    track.push(2.0, Vec3::new(2.0, 0.0, 0.0), Quat::IDENTITY, Vec3::ONE);

    let mut clip = AnimationClip::new("kick", 2.0, 1.0);
    clip.set_track(1, track);
    clip
}

#[test]
fn test_round_trip_scenario() {
    let def = three_joint_chain();
    let mut evaluator = SkeletonEvaluator::new();
    evaluator
        .init(Some(&def), true, &mut HeadlessShaderConfigurator)
        .unwrap();

    evaluator
        .set_local_transform(0, JointTransform::from_translation(Vec3::new(0.0, 0.0, 5.0)))
        .unwrap();
    let clip_id = evaluator.add_clip(middle_joint_clip()).unwrap();
    let handle = evaluator.create_instance(clip_id, 1.0, 0.0).unwrap();

    evaluator.advance(1.0);
    evaluator.evaluate(Some(handle), true).unwrap();

    // t = 1.0 / 2.0 -> 一半
    let knee_local = evaluator.local_transform(1).unwrap();
    assert!((knee_local.translation - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);

    let expected = Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0))
        * Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0))
        * Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0));
    let knee_id = evaluator.joint_id("knee").unwrap();
    let actual = *evaluator.skinning_buffer().get(knee_id).unwrap();
    assert!(actual.abs_diff_eq(expected, 1e-6));
}

#[test]
fn test_handle_lifecycle() {
    let mut evaluator = SkeletonEvaluator::new();
    evaluator
        .init(Some(&three_joint_chain()), true, &mut HeadlessShaderConfigurator)
        .unwrap();
    evaluator.add_clip(middle_joint_clip()).unwrap();

    let first = evaluator.create_instance(0, 1.0, 0.0).unwrap();
    let second = evaluator.create_instance(0, 1.0, 0.5).unwrap();
    assert!(evaluator.destroy_instance(first));

    assert_eq!(
        evaluator.evaluate(Some(first), true),
        Err(AnimationError::InvalidHandle(first))
    );

    let third = evaluator.create_instance(0, 2.0, 0.0).unwrap();
    assert_ne!(third, first);
    assert!(evaluator.instance(first).is_err());
    assert_eq!(evaluator.instance(third).unwrap().speed, 2.0);
    assert_eq!(evaluator.instance(second).unwrap().cursor, 0.5);
    assert_eq!(evaluator.live_instance_count(), 2);
}

#[test]
fn test_name_matched_import_through_definition() {
    let mut def = three_joint_chain();
    let mut track = KeyframeTrack::new();
    track.push(0.0, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
    track.push(1.0, Vec3::new(0.0, 0.0, 1.0), Quat::IDENTITY, Vec3::ONE);

    let mut animation = SkeletalAnimation::new("flex", 1.0, 1.0);
    animation.add_keyframes(BoneKeyframes::named("ankle", track.clone()));
    animation.add_keyframes(BoneKeyframes::named("toe", track));
    def.add_animation(animation);

    let mut bone_counts = Vec::new();
    let mut configurator = |config: &SkeletalShaderConfig| bone_counts.push(config.bone_count);
    let mut evaluator = SkeletonEvaluator::new();
    evaluator.load(&def, &mut configurator).unwrap();
    assert_eq!(bone_counts, vec![3]);

    let clip = evaluator.clip(0).unwrap();
    assert_eq!(clip.animated_joint_count(), 1);
    assert!(clip.track(2).is_some());
}

#[test]
fn test_config_drives_end_of_track_policy() -> anyhow::Result<()> {
    let config = AnimationConfig::from_toml_str(
        r#"
        [evaluation]
        copy_animation_data = true
        end_of_track = "pin_last_keyframe"
        max_joints = 8
        default_speed = 1.0
        "#,
    )?;

    let mut clip = middle_joint_clip();
    clip.duration = 4.0;

    let mut evaluator = SkeletonEvaluator::with_config(config.evaluation);
    evaluator.init(Some(&three_joint_chain()), true, &mut HeadlessShaderConfigurator)?;
    assert_eq!(evaluator.config().end_of_track, EndOfTrackPolicy::PinLastKeyframe);

    evaluator.add_clip(clip)?;
    let handle = evaluator.create_instance(0, 1.0, 3.0)?;
    evaluator.evaluate(Some(handle), true)?;
    assert_eq!(
        evaluator.local_transform(1)?.translation,
        Vec3::new(2.0, 0.0, 0.0)
    );
    Ok(())
}

#[test]
fn test_ecs_frame_loop() {
    let mut world = World::default();
    world.insert_resource(Time::default());

    let mut evaluator = SkeletonEvaluator::new();
    evaluator
        .init(Some(&three_joint_chain()), true, &mut HeadlessShaderConfigurator)
        .unwrap();
    evaluator.add_clip(middle_joint_clip()).unwrap();
    let mut animator = SkeletalAnimator::new(evaluator);
    animator.play(0).unwrap();
    let entity = world.spawn(animator).id();

    let mut schedule = Schedule::default();
    schedule.add_systems(skeletal_animation_system);
    for _ in 0..4 {
        world.resource_mut::<Time>().tick(0.25);
        schedule.run(&mut world);
    }

    let animator = world.get::<SkeletalAnimator>(entity).unwrap();
    let handle = animator.active.unwrap();
    assert!((animator.evaluator.instance(handle).unwrap().cursor - 1.0).abs() < 1e-6);

    let ankle = animator.evaluator.skinning_buffer().get(2).unwrap();
    // ankle 本身没有轨道，随 knee 平移 (1, 0, 0)
    let expected = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0))
        * Mat4::from_translation(Vec3::new(0.0, -2.0, 0.0));
    assert!(ankle.abs_diff_eq(expected, 1e-6));
}
