use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use clap::{Parser, Subcommand};
use mapforge::config::OutputFormat;
use mapforge::generator::{MapGenerator, ProgressEvent, ProgressReporter};
use mapforge::{load_scene, ConfigLoader, GenerationConfig, Scene};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Procedural terrain map generator", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Override log level (trace|debug|info|warn|error)
    #[arg(short, long)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the augmentation engine and write one map config per map
    Plan {
        /// Path to the generation config (.yaml or .json)
        #[arg(short, long)]
        config: PathBuf,

        /// Path to the base terrain mesh (.obj)
        #[arg(short, long)]
        base_map: PathBuf,

        /// Directory the planned map configs are written to
        #[arg(long, default_value = "./configs")]
        configs_dir: PathBuf,

        /// Seed for deterministic placement; random when omitted
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Rebuild and export scenes from previously planned map configs
    Build {
        /// Path to the base terrain mesh (.obj)
        #[arg(short, long)]
        base_map: PathBuf,

        /// Directory holding the planned map configs
        #[arg(long, default_value = "./configs")]
        configs_dir: PathBuf,

        /// Directory the exported scenes are written to
        #[arg(short, long, default_value = "./output")]
        output_dir: PathBuf,

        /// Output format: obj or gltf
        #[arg(short, long, default_value = "obj")]
        format: String,
    },
    /// Plan and build in one pass
    Generate {
        /// Path to the generation config (.yaml or .json)
        #[arg(short, long)]
        config: PathBuf,

        /// Path to the base terrain mesh (.obj)
        #[arg(short, long)]
        base_map: PathBuf,

        /// Directory the planned map configs are written to
        #[arg(long, default_value = "./configs")]
        configs_dir: PathBuf,

        /// Directory the exported scenes are written to
        #[arg(short, long, default_value = "./output")]
        output_dir: PathBuf,

        /// Seed for deterministic placement; random when omitted
        #[arg(short, long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = args.log_level.as_deref().unwrap_or("info");
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let generator = MapGenerator::new();

    match args.command {
        Command::Plan {
            config,
            base_map,
            configs_dir,
            seed,
        } => {
            let (config, scene) = load_inputs(&config, &base_map)?;
            let mut rng = seeded_rng(seed);
            let (progress, watcher) = spawn_progress_logger();

            let written =
                generator.plan_maps(&config, &scene, &configs_dir, &mut rng, &progress)?;
            drop(progress);
            let _ = watcher.join();

            info!("planned {} map config(s) in {}", written.len(), configs_dir.display());
        }
        Command::Build {
            base_map,
            configs_dir,
            output_dir,
            format,
        } => {
            let scene = load_base_scene(&base_map)?;
            let format = parse_format(&format)?;
            let (progress, watcher) = spawn_progress_logger();

            let exported =
                generator.build_maps(&configs_dir, &scene, &output_dir, format, &progress)?;
            drop(progress);
            let _ = watcher.join();

            info!("exported {} map(s) to {}", exported.len(), output_dir.display());
        }
        Command::Generate {
            config,
            base_map,
            configs_dir,
            output_dir,
            seed,
        } => {
            let (config, scene) = load_inputs(&config, &base_map)?;
            let mut rng = seeded_rng(seed);
            let (progress, watcher) = spawn_progress_logger();

            let written =
                generator.plan_maps(&config, &scene, &configs_dir, &mut rng, &progress)?;
            info!("planned {} map config(s)", written.len());

            let exported = generator.build_maps(
                &configs_dir,
                &scene,
                &output_dir,
                config.output_type,
                &progress,
            )?;
            drop(progress);
            let _ = watcher.join();

            info!("exported {} map(s) to {}", exported.len(), output_dir.display());
        }
    }

    Ok(())
}

fn load_inputs(
    config_path: &PathBuf,
    base_map: &PathBuf,
) -> Result<(GenerationConfig, Scene), Box<dyn std::error::Error>> {
    let config = ConfigLoader::load_generation_config(config_path)?;
    info!(
        "loaded generation config: {} map(s), {} augmentation(s)",
        config.map_count,
        config.augmentations.len()
    );

    let scene = load_base_scene(base_map)?;
    Ok((config, scene))
}

fn load_base_scene(base_map: &PathBuf) -> Result<Scene, Box<dyn std::error::Error>> {
    let scene = load_scene(base_map)?;
    let bounds = scene.bounds();
    info!(
        "loaded base map {} (bounds {:?} to {:?})",
        base_map.display(),
        bounds.min.to_array(),
        bounds.max.to_array()
    );
    Ok(scene)
}

fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    let seed = seed.unwrap_or_else(|| rand::rng().next_u64());
    info!("placement seed: {}", seed);
    ChaCha8Rng::seed_from_u64(seed)
}

fn parse_format(format: &str) -> Result<OutputFormat, String> {
    match format {
        "obj" => Ok(OutputFormat::Obj),
        "gltf" => Ok(OutputFormat::Gltf),
        other => Err(format!("unsupported output format: {}", other)),
    }
}

/// Drains progress events onto the log until the sender side is dropped.
fn spawn_progress_logger() -> (ProgressReporter, thread::JoinHandle<()>) {
    let (sender, receiver) = mpsc::channel();
    let handle = thread::spawn(move || {
        for event in receiver {
            match event {
                ProgressEvent::RunStarted { map } => debug!(%map, "run started"),
                ProgressEvent::DirectiveApplied { map, kind } => {
                    debug!(%map, %kind, "directive applied")
                }
                ProgressEvent::RunFinished { map } => debug!(%map, "run finished"),
                ProgressEvent::MapExported { map, path } => {
                    debug!(%map, path = %path.display(), "map exported")
                }
            }
        }
    });

    (ProgressReporter::new(sender), handle)
}
