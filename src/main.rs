use glam::{Mat4, Quat, Vec3};
use skeletal_engine::animation::{BoneKeyframes, KeyframeTrack, SkeletalAnimation, SkeletonDefinition};
use skeletal_engine::config::AnimationConfig;
use skeletal_engine::render::SkeletalShaderConfig;
use skeletal_engine::{AnimationResult, JointTransform, SkeletonEvaluator};
use tracing_subscriber::EnvFilter;

const FRAME_TIME: f32 = 1.0 / 30.0;

fn main() {
    let mut config = AnimationConfig::load_or_default();
    config.apply_env_overrides();

    initialize_logging(&config);

    if let Err(e) = config.validate() {
        tracing::error!(target: "demo", "Invalid configuration: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&config) {
        tracing::error!(target: "demo", "Demo failed: {}", e);
        std::process::exit(1);
    }
}

/// 初始化日志系统
///
/// `RUST_LOG` 优先，否则使用配置中的日志级别。
fn initialize_logging(config: &AnimationConfig) {
    if !config.logging.log_to_console {
        return;
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_filter()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 三节手臂：肩、肘、腕，肘部在两秒内弯曲 90 度
fn arm_definition() -> AnimationResult<SkeletonDefinition> {
    let mut def = SkeletonDefinition::new();
    let shoulder = def.add_bone("shoulder", None, Mat4::IDENTITY)?;
    let elbow = def.add_bone(
        "elbow",
        Some(shoulder),
        Mat4::from_translation(Vec3::new(-1.0, 0.0, 0.0)),
    )?;
    def.add_bone(
        "wrist",
        Some(elbow),
        Mat4::from_translation(Vec3::new(-2.0, 0.0, 0.0)),
    )?;

    let rest = JointTransform::from_translation(Vec3::X);
    let bent = JointTransform {
        rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        ..rest
    };
    let mut bend = KeyframeTrack::new();
    bend.push_transform(0.0, rest);
    bend.push_transform(2.0, bent);
    let mut forearm = KeyframeTrack::new();
    forearm.push(0.0, Vec3::X, Quat::IDENTITY, Vec3::ONE);
    forearm.push(2.0, Vec3::X, Quat::IDENTITY, Vec3::ONE);

    let mut animation = SkeletalAnimation::new("bend", 2.0, 1.0);
    animation.add_keyframes(BoneKeyframes::named("elbow", bend));
    animation.add_keyframes(BoneKeyframes::named("wrist", forearm));
    def.add_animation(animation);
    Ok(def)
}

fn run(config: &AnimationConfig) -> AnimationResult<()> {
    let def = arm_definition()?;

    let mut evaluator = SkeletonEvaluator::with_config(config.evaluation.clone());
    let mut shader = |shader_config: &SkeletalShaderConfig| {
        tracing::info!(
            target: "demo",
            "Skinning block: {} bones, {} bytes",
            shader_config.bone_count,
            shader_config.uniform_block_size()
        );
    };
    evaluator.load(&def, &mut shader)?;

    let clip_id = evaluator.clip_id("bend").unwrap_or(0);
    let handle = evaluator.create_instance_default(clip_id)?;

    let mut frame = 0u32;
    while !evaluator.is_finished(handle)? {
        evaluator.advance(FRAME_TIME);
        evaluator.evaluate(Some(handle), true)?;
        frame += 1;

        if frame % 15 == 0 {
            let wrist = evaluator.skinning_buffer().get(2).copied().unwrap_or(Mat4::IDENTITY);
            let wrist_position = wrist.transform_point3(Vec3::new(2.0, 0.0, 0.0));
            tracing::info!(
                target: "demo",
                "frame {:>3} t={:.2}s wrist at ({:.3}, {:.3}, {:.3})",
                frame,
                evaluator.instance(handle)?.cursor,
                wrist_position.x,
                wrist_position.y,
                wrist_position.z
            );
        }
    }

    tracing::info!(target: "demo", "Clip finished after {} frames", frame);
    evaluator.destroy_instance(handle);
    Ok(())
}
