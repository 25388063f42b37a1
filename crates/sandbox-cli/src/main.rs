//! sandbox CLI - headless runner for rigid-body scenes
//!
//! Loads a scene, simulates it through the full frame loop on a headless
//! device, and reports when the goal is reached.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sandbox::{AppConfig, Controller, FixedClock, LoggingEditor};
use sandbox_physics::{Model, StepConfig};
use sandbox_render::{FsAssets, HeadlessDevice};
use sandbox_scene::{GoalCondition, SceneDescription, Shape};
use sandbox_view::ScriptedInput;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "sandbox")]
#[command(about = "Rigid-body physics sandbox", long_about = None)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a scene headlessly
    Run {
        /// Scene file (.json or .toml)
        scene: PathBuf,
        /// Application config (TOML); defaults are used if missing
        #[arg(short, long, default_value = "sandbox.toml")]
        config: PathBuf,
        /// Number of frames to run
        #[arg(short, long, default_value_t = 600)]
        frames: u64,
        /// Seconds per frame
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f32,
        /// JSON input script, one array of events per frame
        #[arg(short, long)]
        script: Option<PathBuf>,
    },
    /// Validate a scene and build it without running
    Check {
        /// Scene file
        scene: PathBuf,
    },
    /// Display information about a scene
    Info {
        /// Scene file
        scene: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Run {
            scene,
            config,
            frames,
            dt,
            script,
        } => run_scene(&scene, &config, frames, dt, script.as_deref()),
        Commands::Check { scene } => check_scene(&scene),
        Commands::Info { scene } => show_info(&scene),
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let default = if verbose { "sandbox=debug" } else { "sandbox=info" };
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::new(default),
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .context("failed to install log subscriber")?;
    Ok(())
}

fn load_scene(path: &Path) -> Result<SceneDescription> {
    SceneDescription::load(path).with_context(|| format!("failed to load {}", path.display()))
}

fn run_scene(
    scene_path: &Path,
    config_path: &Path,
    frames: u64,
    dt: f32,
    script: Option<&Path>,
) -> Result<()> {
    let config = AppConfig::load_or_default(Some(config_path))?;
    let scene = load_scene(scene_path)?;
    let input = match script {
        Some(path) => ScriptedInput::load(path)?,
        None => ScriptedInput::default(),
    };
    let mut assets = FsAssets::new(&config.assets.texture_root, &config.assets.model_root);
    let device = HeadlessDevice::new(config.view.width, config.view.height);
    tracing::info!(
        scene = %scene_path.display(),
        bodies = scene.bodies.len(),
        frames,
        "starting headless session"
    );

    let mut controller =
        Controller::new(&scene, &config, device, input, LoggingEditor, &mut assets)
            .context("failed to start simulation")?;
    let summary = controller.run(&mut FixedClock(dt), Some(frames))?;

    println!(
        "Ran {} frames ({:.2}s simulated, {} substeps)",
        summary.frames,
        controller.model().elapsed(),
        controller.model().world().substeps()
    );
    match summary.goal_achieved_at {
        Some(t) => println!("Goal achieved at {t:.3}s"),
        None => println!("Goal not achieved"),
    }
    if summary.closed {
        println!("Closed by input");
    }
    Ok(())
}

fn check_scene(path: &Path) -> Result<()> {
    let scene = load_scene(path)?;

    let mut device = HeadlessDevice::new(1, 1);
    let mut model = Model::new(StepConfig::default());
    let roots = AppConfig::default().assets;
    let mut assets = FsAssets::new(&roots.texture_root, &roots.model_root);
    model
        .reset(&scene, &mut device, &mut assets)
        .with_context(|| format!("failed to build {}", path.display()))?;

    let bodies = model.bodies().len();
    model.teardown(&mut device);
    println!("{}: OK ({} bodies)", path.display(), bodies);
    Ok(())
}

fn show_info(path: &Path) -> Result<()> {
    let scene = load_scene(path)?;

    println!("Scene: {}", path.display());
    let g = scene.gravity;
    println!("Gravity: ({}, {}, {})", g.x, g.y, g.z);
    let c = &scene.camera;
    println!(
        "Camera: ({}, {}, {}) yaw {} pitch {} fov {}",
        c.position.x, c.position.y, c.position.z, c.yaw, c.pitch, c.fov
    );
    println!();

    println!("Textures: {}", scene.textures.len());
    for texture in &scene.textures {
        println!("  - {} ({})", texture.name, texture.file);
    }

    println!("Materials: {}", scene.materials.len());
    for material in &scene.materials {
        println!(
            "  - {} (friction {}, restitution {})",
            material.name, material.friction, material.restitution
        );
    }

    println!("Bodies: {}", scene.bodies.len());
    for body in &scene.bodies {
        let shape = match &body.shape {
            Shape::Sphere { radius } => format!("sphere r={radius}"),
            Shape::Box { half_extents: h } => {
                format!("box {}x{}x{}", h.x * 2.0, h.y * 2.0, h.z * 2.0)
            }
            Shape::Plane { normal: n } => format!("plane n=({}, {}, {})", n.x, n.y, n.z),
            Shape::ObjModel { model, scale } => format!("model {model} x{scale}"),
        };
        let kind = if body.mass == 0.0 {
            "static".to_string()
        } else {
            format!("{} kg", body.mass)
        };
        println!("  - {} [{}] {}, {}", body.name, body.material, shape, kind);
    }

    let goal = match &scene.goal.condition {
        GoalCondition::Below { axis, value } => format!("{axis:?} < {value}"),
        GoalCondition::Above { axis, value } => format!("{axis:?} > {value}"),
        GoalCondition::Region { min, max } => format!(
            "inside ({}, {}, {})..({}, {}, {})",
            min.x, min.y, min.z, max.x, max.y, max.z
        ),
    };
    println!("Goal: {} {}", scene.goal.body, goal);

    Ok(())
}
