//! `perception` CLI: follow-me scenario runs, replays, ground-plane boxes and
//! point-cloud export.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use perception_core::ground_plane::{FrameLayout, GroundPlaneConfig, GroundPlaneExtractor};
use perception_core::roi_tracker::RoiTrackerConfig;
use serde::{Deserialize, Serialize};
use sim::playback::{play, PlaybackReport};
use sim::recording::{load_recording, save_recording};
use sim::scenarios::{Scenario, ScenarioKind};
use sim::scene::GroundScene;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "perception", about = "ROI tracking and ground-plane bounding boxes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a named follow-me scenario and report tracker statistics.
    RunScenario {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output statistics to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also save the recorded message stream
        #[arg(long)]
        save_replay: Option<PathBuf>,
    },
    /// Replay a previously recorded message stream.
    Replay {
        /// Path to recording JSON file
        input: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Render an overhead scene and compute the bounding box of its objects.
    Bbox {
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Number of random boxes (the default scene when omitted)
        #[arg(long)]
        boxes: Option<usize>,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Frames to process (reuses the scratch buffer)
        #[arg(long, default_value_t = 1)]
        frames: u32,
    },
    /// Write the text export of a synthetic point cloud.
    ExportCloud {
        output: PathBuf,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

/// Settings loadable from `--config`. Missing sections keep their defaults.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct PerceptionConfig {
    tracker: RoiTrackerConfig,
    ground: GroundPlaneConfig,
}

impl PerceptionConfig {
    fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)
                    .with_context(|| format!("reading config {}", p.display()))?;
                serde_json::from_str(&text).with_context(|| format!("parsing config {}", p.display()))?
            }
            None => Self::default(),
        };
        config.tracker.validate()?;
        config.ground.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::RunScenario {
            scenario,
            seed,
            config,
            output,
            save_replay: save_path,
        } => {
            let config = PerceptionConfig::load(config.as_deref())?;
            run_scenario(scenario, seed, &config, output.as_deref(), save_path.as_deref())?;
        }
        Commands::Replay {
            input,
            config,
            output,
        } => {
            let config = PerceptionConfig::load(config.as_deref())?;
            run_replay(&input, &config, output.as_deref())?;
        }
        Commands::Bbox {
            seed,
            boxes,
            config,
            frames,
        } => {
            let config = PerceptionConfig::load(config.as_deref())?;
            run_bbox(seed, boxes, frames, &config.ground);
        }
        Commands::ExportCloud { output, seed } => {
            export_cloud(&output, seed)?;
        }
    }

    Ok(())
}

fn run_scenario(
    kind: ScenarioKind,
    seed: u64,
    config: &PerceptionConfig,
    output_path: Option<&Path>,
    replay_path: Option<&Path>,
) -> Result<()> {
    let scenario = Scenario::build(kind, seed);
    println!(
        "Running scenario '{}' (seed={}, duration={:.0}s, {} walkers)...",
        scenario.name,
        seed,
        scenario.duration,
        scenario.walkers.len()
    );

    let start = std::time::Instant::now();
    let recording = scenario.record();
    let report = play(&recording, config.tracker.clone());
    let elapsed = start.elapsed();

    print_report(&report, elapsed.as_secs_f64());

    if let Some(rpath) = replay_path {
        save_recording(&recording, rpath)?;
        println!("Recording saved to {}", rpath.display());
    }
    if let Some(opath) = output_path {
        write_report(&report, seed, elapsed.as_secs_f64(), opath)?;
        println!("Statistics saved to {}", opath.display());
    }
    Ok(())
}

fn run_replay(input: &Path, config: &PerceptionConfig, output_path: Option<&Path>) -> Result<()> {
    let recording = load_recording(input)?;
    println!(
        "Replaying '{}' ({} messages)...",
        recording.scenario_name,
        recording.messages.len()
    );

    let start = std::time::Instant::now();
    let report = play(&recording, config.tracker.clone());
    let elapsed = start.elapsed();
    print_report(&report, elapsed.as_secs_f64());

    if let Some(opath) = output_path {
        write_report(&report, recording.seed, elapsed.as_secs_f64(), opath)?;
    }
    Ok(())
}

fn print_report(report: &PlaybackReport, elapsed_s: f64) {
    let stats = &report.stats;
    println!(
        "Done: {} messages, {} batches, {} detections, elapsed={:.3}s",
        report.messages, stats.batches, stats.detections, elapsed_s
    );
    println!(
        "ROIs: {} born, {} updated, {} evicted, peak {}, {} still tracked (churn {:.3})",
        stats.births,
        stats.updates,
        stats.evictions,
        stats.peak_tracked,
        report.final_tracked,
        stats.id_churn()
    );
    println!(
        "Target: {} refreshes, visible on {} ticks, hidden on {} ticks, last label '{}'",
        stats.target_refreshes,
        report.target_visible_ticks,
        report.target_hidden_ticks,
        report.last_distance_label
    );
}

fn write_report(report: &PlaybackReport, seed: u64, elapsed_s: f64, path: &Path) -> Result<()> {
    let json = serde_json::json!({
        "scenario": report.scenario,
        "seed": seed,
        "elapsed_s": elapsed_s,
        "report": report,
        "id_churn": report.stats.id_churn(),
        "mean_fresh": report.stats.mean_fresh(),
    });
    std::fs::write(path, serde_json::to_string_pretty(&json)?)?;
    Ok(())
}

fn run_bbox(seed: u64, boxes: Option<usize>, frames: u32, ground: &GroundPlaneConfig) {
    let scene = match boxes {
        Some(n) => GroundScene::random(n, seed),
        None => GroundScene::default(),
    };
    let (cols, rows) = scene.dims();
    let mut extractor = GroundPlaneExtractor::new(ground.clone(), FrameLayout::default());

    let start = std::time::Instant::now();
    let mut last = ground.initial_bounds();
    for frame in 0..frames.max(1) {
        let data = scene.render(seed.wrapping_add(frame as u64));
        last = extractor.process(cols, rows, &data);
    }
    let elapsed = start.elapsed();

    println!(
        "Boundaries: X ({:.2}; {:.2}) Y ({:.2}; {:.2}) Z ({:.2}; {:.2})",
        last.max_x, last.min_x, last.max_y, last.min_y, last.max_z, last.min_z
    );
    let labels = last.labels();
    println!("{}  {}  {}", labels.height, labels.width, labels.depth);
    let truth = scene.expected_bounds(ground);
    println!(
        "Expected:   X ({:.2}; {:.2}) Y ({:.2}; {:.2}) Z ({:.2}; {:.2})",
        truth.max_x, truth.min_x, truth.max_y, truth.min_y, truth.max_z, truth.min_z
    );
    println!(
        "{} frame(s) of {}x{} in {:.3}s",
        frames.max(1),
        cols,
        rows,
        elapsed.as_secs_f64()
    );
}

fn export_cloud(output: &Path, seed: u64) -> Result<()> {
    let cloud = GroundScene::default().to_cloud(seed)?;
    let file = std::fs::File::create(output)
        .with_context(|| format!("creating {}", output.display()))?;
    cloud.write_export(BufWriter::new(file))?;
    println!(
        "Exported {} points ({} x {}) to {}",
        cloud.len(),
        cloud.width,
        cloud.height,
        output.display()
    );
    Ok(())
}
