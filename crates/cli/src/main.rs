mod settings;

use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use strm_artwork_core::pipeline::batch_orchestrator::{BatchOptions, BatchOrchestrator};
use strm_artwork_core::pipeline::batch_report::BatchStatus;
use strm_artwork_core::pipeline::log_sink::LogCrateSink;
use strm_artwork_core::shared::artwork_kind::ArtworkNaming;

use settings::Settings;

/// Generate fanart and poster images for .strm pointer files.
#[derive(Parser, Debug)]
#[command(name = "strm-artwork", version)]
struct Cli {
    /// Library directory to scan (default: settings file, then current directory).
    root: Option<PathBuf>,

    /// Do not generate fanart images.
    #[arg(long)]
    no_fanart: bool,

    /// Do not generate poster images.
    #[arg(long)]
    no_poster: bool,

    /// Artwork file names: suffixed (<name>-fanart.jpg) or fixed (fanart.jpg).
    #[arg(long)]
    naming: Option<ArtworkNaming>,

    /// JPEG quality (1-100).
    #[arg(long)]
    jpeg_quality: Option<u8>,

    /// Number of pointer files processed in parallel.
    #[arg(long)]
    jobs: Option<usize>,

    /// Seed for frame selection, for reproducible output.
    #[arg(long)]
    seed: Option<u64>,

    /// Pointer file extension.
    #[arg(long)]
    extension: Option<String>,

    /// Settings file (JSON). Defaults to the platform config directory.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Everything a run needs after merging flags over the settings file.
#[derive(Debug)]
struct RunConfig {
    root: PathBuf,
    options: BatchOptions,
    jpeg_quality: u8,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(BatchStatus::Success) => {}
        Ok(BatchStatus::Failed) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run() -> Result<BatchStatus, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load(),
    };
    let config = merge(cli, settings);
    validate(&config)?;

    let cancelled = install_cancel_handler()?;
    let orchestrator = BatchOrchestrator::with_ffmpeg(config.jpeg_quality);

    log::info!("Scanning {}", config.root.display());
    let report = orchestrator.run_batch(
        &config.root,
        &config.options,
        Some(&LogCrateSink),
        &cancelled,
    )?;

    println!("{}", report.summary());
    Ok(report.status())
}

fn merge(cli: Cli, settings: Settings) -> RunConfig {
    let root = cli
        .root
        .or(settings.root)
        .unwrap_or_else(|| PathBuf::from("."));
    RunConfig {
        root,
        options: BatchOptions {
            want_fanart: settings.fanart && !cli.no_fanart,
            want_poster: settings.poster && !cli.no_poster,
            naming: cli.naming.unwrap_or(settings.naming),
            jobs: cli.jobs.unwrap_or(settings.jobs),
            pointer_extension: cli.extension.unwrap_or(settings.extension),
            sampler_seed: cli.seed.or(settings.seed),
        },
        jpeg_quality: cli.jpeg_quality.unwrap_or(settings.jpeg_quality),
    }
}

fn validate(config: &RunConfig) -> Result<(), Box<dyn std::error::Error>> {
    if !(1..=100).contains(&config.jpeg_quality) {
        return Err(format!(
            "JPEG quality must be between 1 and 100, got {}",
            config.jpeg_quality
        )
        .into());
    }
    if config.options.jobs == 0 {
        return Err("Jobs must be at least 1".into());
    }
    if config.options.pointer_extension.trim_start_matches('.').is_empty() {
        return Err("Pointer extension must not be empty".into());
    }
    if !config.options.want_fanart && !config.options.want_poster {
        return Err("--no-fanart and --no-poster together leave nothing to do".into());
    }
    Ok(())
}

/// Ctrl-C stops the batch after the files already in progress.
fn install_cancel_handler() -> Result<Arc<AtomicBool>, Box<dyn std::error::Error>> {
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        eprintln!("\nInterrupted, finishing current files...");
    })?;
    Ok(cancelled)
}
