//! # Tilestitch Command Line Entry Point
//!
//! Loads a chunk repository, generates a level and writes its streams.

use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use tilestitch::{
    BehaviorTable, ChunkLevelGenerator, ChunkRepository, GenerationConfig, LevelArchive,
    LevelType, StitchResult,
};

/// Command line arguments for the level generator.
#[derive(Parser, Debug)]
#[command(name = "tilestitch")]
#[command(about = "Stitch pre-authored chunks into a platformer level")]
#[command(version)]
struct Args {
    /// Directory of chunk archives (*.lvl with optional *.ent / *.hzd)
    #[arg(short, long)]
    chunks: Option<PathBuf>,

    /// JSON generation config; command line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Level width in tiles, before the end cap
    #[arg(long)]
    width: Option<i32>,

    /// Level height in tiles
    #[arg(long)]
    height: Option<i32>,

    /// Random seed for level generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Difficulty rating
    #[arg(short, long)]
    difficulty: Option<u32>,

    /// Level type (overground, underground, castle)
    #[arg(long)]
    level_type: Option<LevelType>,

    /// Skip the start platform
    #[arg(long)]
    no_start: bool,

    /// Skip the closing staircase and exit
    #[arg(long)]
    no_end: bool,

    /// 256-byte tile behavior file; the built-in table is used otherwise
    #[arg(long)]
    behaviors: Option<PathBuf>,

    /// Output path prefix for the .lvl/.ent/.hzd streams
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Print an ASCII preview of the generated level
    #[arg(long)]
    preview: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> StitchResult<()> {
    let args = Args::parse();

    // Initialize logging
    initialize_logging(&args.log_level);

    info!("Starting Tilestitch v{}", tilestitch::VERSION);

    run(args).await.inspect_err(|e| error!("{}", e))
}

/// Initializes env_logger, letting `RUST_LOG` win over the flag.
fn initialize_logging(log_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_target(false)
        .init();
}

/// Builds the effective configuration from the optional file and the flags.
fn build_config(args: &Args) -> StitchResult<GenerationConfig> {
    let mut config = match &args.config {
        Some(path) => GenerationConfig::from_json_file(path)?,
        None => GenerationConfig::default(),
    };

    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(difficulty) = args.difficulty {
        config.difficulty = difficulty;
    }
    if let Some(level_type) = args.level_type {
        config.level_type = level_type;
    }
    if args.no_start {
        config.build_start = false;
    }
    if args.no_end {
        config.build_end = false;
    }

    Ok(config)
}

async fn run(args: Args) -> StitchResult<()> {
    let config = build_config(&args)?;

    let behaviors = Arc::new(match &args.behaviors {
        Some(path) => {
            info!("Loading tile behaviors from {}", path.display());
            BehaviorTable::load(path)?
        }
        None => BehaviorTable::standard(),
    });

    let mut repository = ChunkRepository::new();
    if let Some(dir) = &args.chunks {
        let count = repository
            .load_dir(dir, config.level_type, Arc::clone(&behaviors))
            .await?;
        info!("Loaded {} chunks from {}", count, dir.display());
    }

    let generator = ChunkLevelGenerator::new(Arc::new(repository), behaviors);
    let (level, report) = generator.generate_with_report(&config)?;
    info!(
        "Placed {} connector and {} terminal chunks",
        report.connector_phase.placed, report.terminal_phase.placed
    );

    if args.preview {
        print!("{level}");
    }

    if let Some(out) = &args.out {
        LevelArchive::from_grid(&level)?.write_to(out)?;
        info!("Wrote level streams to {}.*", out.display());
    }

    Ok(())
}
