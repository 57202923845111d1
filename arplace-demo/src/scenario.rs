use anyhow::{Context, Result, bail};
use arplace::platform::{ScriptedFrame, ScriptedPlatform};
use arplace::scene::{ModelCatalog, NodeTree};
use arplace::{
    ArEvent, ArInteraction, ArInteractionDesc, FramePump, InputSourceId, Quat, SceneGraph,
    Transform, Vec3,
};

const ENVIRONMENT: &str = "assets/environment.glb";
const PICKABLE: &str = "assets/pickable.glb";

type Demo = ArInteraction<ScriptedPlatform, NodeTree, ModelCatalog>;

#[derive(Debug, Clone)]
pub struct Options {
    pub seed: u64,
    /// Frames simulated before the surface is found, and again while holding
    pub frames: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            seed: 2024,
            frames: 10,
        }
    }
}

impl Options {
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--seed" => {
                    let value = args.next().context("--seed needs a value")?;
                    options.seed = value.parse().context("--seed must be an integer")?;
                }
                "--frames" => {
                    let value = args.next().context("--frames needs a value")?;
                    options.frames = value.parse().context("--frames must be an integer")?;
                }
                other => bail!("unknown argument '{}' (expected --seed or --frames)", other),
            }
        }
        Ok(options)
    }
}

pub fn run(options: &Options) -> Result<()> {
    let desc = ArInteractionDesc::new()
        .environment_model(ENVIRONMENT)
        .pickable_models([PICKABLE])
        .rng_seed(options.seed);
    let catalog = ModelCatalog::new()
        .with_model(ENVIRONMENT, "environment", 0.8)
        .with_model(PICKABLE, "pickable", 0.08);

    let mut demo: Demo =
        ArInteraction::new(desc, ScriptedPlatform::new(), NodeTree::new(), catalog)?;
    let hand = InputSourceId(0);
    demo.register_controller(hand)?;
    let mut pump = FramePump::new();

    log::info!("=== Starting AR session ===");
    demo.on_session_start();
    report(&demo);

    log::info!("=== Scanning: {} frames without a surface ===", options.frames);
    for _ in 0..options.frames {
        pump.tick(&mut demo, Some(&ScriptedFrame::empty()), |_| {});
    }
    report(&demo);

    let surface = Transform::new(Vec3::new(0.0, -1.2, -1.0), Quat::IDENTITY);
    log::info!("=== Surface found at {:?} ===", surface.translation);
    pump.tick(&mut demo, Some(&ScriptedFrame::with_hit(surface)), |_| {});
    report(&demo);

    log::info!("=== Tap to place ===");
    demo.on_select(hand);
    report(&demo);

    let Some(target) = demo.selectables().as_slice().first().copied() else {
        bail!("placement produced no pickable objects");
    };
    let target_position = demo
        .scene()
        .world_transform(target)
        .context("pickable vanished from the scene")?
        .translation;

    log::info!("=== Grabbing {} at {:?} ===", target, target_position);
    let origin = Vec3::new(0.0, 1.4, 0.0);
    let aim = Quat::from_rotation_arc(-Vec3::Z, (target_position - origin).normalize());
    demo.update_controller_pose(hand, Transform::new(origin, aim))?;
    demo.on_select_start(hand);
    report(&demo);

    log::info!("=== Carrying for {} frames ===", options.frames);
    for i in 0..options.frames {
        let step = Vec3::new(0.02 * (i + 1) as f32, 0.0, 0.0);
        demo.update_controller_pose(hand, Transform::new(origin + step, aim))?;
        pump.tick(&mut demo, Some(&ScriptedFrame::with_hit(surface)), |_| {});
    }

    log::info!("=== Releasing ===");
    demo.on_select_end(hand);
    let final_position = demo
        .scene()
        .world_transform(target)
        .context("pickable vanished from the scene")?
        .translation;
    log::info!(
        "{} moved from {:?} to {:?}",
        target,
        target_position,
        final_position
    );
    report(&demo);

    log::info!("=== Ending AR session ===");
    demo.on_session_end();
    report(&demo);

    let stats = pump.stats();
    log::info!(
        "Frames: {} total, {} with AR frame, {} with reticle visible",
        stats.ticks,
        stats.xr_ticks,
        stats.reticle_ticks
    );
    Ok(())
}

fn report(demo: &Demo) {
    for event in demo.poll_events() {
        if event.is_error() {
            log::warn!("event: {:?}", event);
        } else if matches!(event, ArEvent::ReticleShown | ArEvent::ReticleHidden) {
            log::debug!("event: {:?}", event);
        } else {
            log::info!("event: {:?}", event);
        }
    }
}
