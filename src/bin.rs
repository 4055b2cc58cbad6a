use std::{collections::HashMap, path::PathBuf, process::ExitCode};

use clap::Parser;
use rosu::{audio::Cue, autoplay::run_session, beatmap, config::Config, skin_ini::SkinIni};

#[derive(Parser, Debug)]
#[command(name = "rosu-judge")]
#[command(about = "Plays a beatmap headlessly with autoplay and reports the judgments")]
struct Args {
    /// Path to a .osu or native beatmap file
    #[arg(required = true)]
    beatmap: PathBuf,

    /// Gameplay tuning .ini
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skin directory containing skin.ini
    #[arg(short, long)]
    skin: Option<PathBuf>,

    /// Simulated frames per second
    #[arg(long, default_value = "240")]
    fps: f64,

    /// Log every judgment
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let _client = tracy_client::Client::start();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .with_target(false)
        .with_thread_names(true)
        .init();

    let config = match &args.config {
        Some(path) => match Config::from_path(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to load config {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    let skin = args.skin
        .as_ref()
        .map(SkinIni::from_dir)
        .unwrap_or_default();

    let chart = match beatmap::load_from_path(&args.beatmap) {
        Ok(chart) => chart,
        Err(e) => {
            tracing::error!("Failed to load {}: {e}", args.beatmap.display());
            return ExitCode::FAILURE;
        }
    };

    if args.fps <= 0.0 {
        tracing::error!("Frame rate must be positive, got {}", args.fps);
        return ExitCode::FAILURE;
    }

    let mut cues: Vec<Cue> = Vec::new();
    let processor = run_session(&chart, &config, &skin, 1000.0 / args.fps, &mut cues);

    let stats = processor.stats();

    tracing::info!(
        "300: {} | 100: {} | 50: {} | miss: {} | max combo: {} | accuracy: {:.2}%",
        stats.x300, stats.x100, stats.x50, stats.miss, stats.max_combo, stats.accuracy() * 100.0,
    );

    let mut cue_counts: HashMap<&'static str, usize> = HashMap::new();

    for cue in &cues {
        *cue_counts.entry(cue.sample_name()).or_default() += 1;
    }

    tracing::info!("Cues played: {cue_counts:?}");

    if let Some(hash) = &chart.hash {
        tracing::info!("Beatmap md5: {hash}");
    }

    ExitCode::SUCCESS
}
