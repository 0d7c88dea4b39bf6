//! texcrunch - batch texture cruncher
//!
//! Pads textures to block-aligned sizes and switches them to crunched
//! compression, a few per tick.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use texcrunch::config::{AssetScope, JobConfig, MaxTextureSize};
use texcrunch::host::{FsHost, TextureHost};
use texcrunch::job::StepResult;
use texcrunch::session::CrunchSession;
use texcrunch::settings::Settings;
use texcrunch::textures::{compute_aligned_size, padding_steps, MAX_ALIGNED_SIDE};
use tracing_subscriber::EnvFilter;

/// Host frame interval the session is ticked at
const TICK_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Parser)]
#[command(name = "texcrunch")]
#[command(version)]
#[command(about = "Pad textures to multiples of 4 and crunch-compress them in batches")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use RUST_LOG=debug for more detail)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Crunch every eligible texture in a project
    Crunch {
        /// Project directory (containing Assets/)
        project: PathBuf,

        #[command(flatten)]
        options: JobOptions,

        /// Remember these options as the new defaults
        #[arg(long)]
        save_settings: bool,
    },

    /// List the textures a crunch would touch
    Scan {
        /// Project directory (containing Assets/)
        project: PathBuf,

        #[command(flatten)]
        options: JobOptions,
    },

    /// Show the padding steps for a texture size
    Plan {
        width: u32,
        height: u32,
    },

    /// Show the saved settings
    Settings,
}

/// Job options; anything left out comes from the saved settings
#[derive(Args)]
struct JobOptions {
    /// Compression quality (0-100)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
    quality: Option<u8>,

    /// Textures crunched per tick
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    speed: Option<u32>,

    /// Max texture size (512, 1024 or 2048)
    #[arg(short, long)]
    max_size: Option<MaxTextureSize>,

    /// Only textures under Assets/Resources
    #[arg(long)]
    resources_only: bool,
}

impl JobOptions {
    fn apply(&self, settings: &Settings) -> JobConfig {
        let mut config = settings.to_job_config();
        if let Some(quality) = self.quality {
            config.compression_quality = quality;
        }
        if let Some(speed) = self.speed {
            config.processing_speed = speed;
        }
        if let Some(max_size) = self.max_size {
            config.max_size = max_size;
        }
        if self.resources_only {
            config.scope = AssetScope::ResourcesOnly;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Only initialize logging if verbose or RUST_LOG is set
    if cli.verbose || std::env::var("RUST_LOG").is_ok() {
        let directive = if cli.verbose {
            "texcrunch=debug".parse()?
        } else {
            "texcrunch=warn".parse()?
        };
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
            .init();
    }

    match cli.command {
        Commands::Crunch {
            project,
            options,
            save_settings,
        } => {
            let mut settings = Settings::load();
            let config = options.apply(&settings);

            if save_settings {
                settings.update_from(&config);
                settings.last_project = project.display().to_string();
                settings.save()?;
            }

            crunch(project, config).await?;
        }

        Commands::Scan { project, options } => {
            let config = options.apply(&Settings::load());
            scan(project, &config)?;
        }

        Commands::Plan { width, height } => {
            let (aligned_width, aligned_height) = compute_aligned_size(width, height)
                .with_context(|| format!("Sides must be at most {}", MAX_ALIGNED_SIDE))?;
            let steps = padding_steps(width, height).unwrap_or_default();

            if steps.is_empty() {
                println!("{}x{} is already aligned", width, height);
            } else {
                for (i, step) in steps.iter().enumerate() {
                    println!("{:>4}  {}", i + 1, step);
                }
                println!(
                    "\n{}x{} -> {}x{} in {} resamples",
                    width,
                    height,
                    aligned_width,
                    aligned_height,
                    steps.len()
                );
            }
        }

        Commands::Settings => {
            let path = Settings::settings_path()?;
            let settings = Settings::try_load()?;
            println!("Settings file: {}", path.display());
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}

async fn crunch(project: PathBuf, config: JobConfig) -> Result<()> {
    let host = FsHost::new(&project)?;
    let mut session = CrunchSession::new(host, config);

    let started = session.begin()?;
    println!(
        "Crunching {} textures in {} (quality {}, max size {}, {} per tick)",
        started.total,
        project.display(),
        session.config().compression_quality,
        session.config().max_size,
        session.config().processing_speed
    );

    let pb = ProgressBar::new(started.total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) | {msg}")?
            .progress_chars("=>-"),
    );

    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            result = &mut ctrl_c, if !interrupted => {
                result.context("Failed to listen for Ctrl-C")?;
                interrupted = true;
                session.cancel();
                pb.set_message("cancelling...");
                continue;
            }
        }

        let result = session.tick();
        pb.set_position(session.progress().processed as u64);

        if result != StepResult::Continue {
            break;
        }
    }

    pb.finish_with_message(session.status_message().unwrap_or_default().to_string());

    if let Some(report) = session.last_report() {
        println!("\n=== Crunch Summary ===");
        println!("Processed: {}/{}", report.progress.processed, report.progress.total);
        println!("Failed:    {}", report.failures.len());
        for failure in &report.failures {
            println!("  {}: {}", failure.asset, failure.error);
        }
    }

    Ok(())
}

fn scan(project: PathBuf, config: &JobConfig) -> Result<()> {
    config.validate()?;
    let mut host = FsHost::new(&project)?;
    let target = config.target_compression();

    let assets = host.query_textures(config.scope)?;
    let mut eligible = 0;
    let mut misaligned = 0;

    for asset in &assets {
        // Unreadable settings still get crunched
        if let Ok(state) = host.compression_state(asset) {
            if state == target {
                continue;
            }
        }
        eligible += 1;

        match host.dimensions(asset) {
            Ok(size) if size.is_aligned() => println!("{:>11}  {}", size.to_string(), asset),
            Ok(size) => {
                misaligned += 1;
                match compute_aligned_size(size.width, size.height) {
                    Some((w, h)) => println!("{:>11}  {}  pad → {}x{}", size.to_string(), asset, w, h),
                    None => println!("{:>11}  {}  (too large to pad)", size.to_string(), asset),
                }
            }
            Err(e) => println!("{:>11}  {}  ({:#})", "?", asset, e),
        }
    }

    println!(
        "\nTotal: {} of {} textures eligible, {} need padding",
        eligible,
        assets.len(),
        misaligned
    );

    Ok(())
}
