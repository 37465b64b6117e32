use std::path::PathBuf;
use std::sync::Arc;

use bitrate_analyzer::commands::{self, AnalyzeRequest};
use bitrate_analyzer::{AnalysisQueue, AnalyzerConfig, FfprobeProbe};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Debug, Parser)]
#[command(
    name = "bitrate-analyzer",
    version,
    about = "Per-frame and windowed bitrate analysis for video files"
)]
struct Cli {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Analyze the bitrate of a video file.
    Analyze {
        file: PathBuf,

        /// Write the JSON export. Without a path, uses the configured export directory.
        #[arg(long, num_args = 0..=1, value_name = "PATH")]
        export: Option<Option<PathBuf>>,

        /// Print the export document instead of the text summary.
        #[arg(long)]
        json: bool,

        /// Show a progress bar.
        #[arg(long)]
        progress: bool,

        /// Path to the ffprobe binary.
        #[arg(long, value_name = "PATH")]
        ffprobe: Option<PathBuf>,

        /// Timeout for each ffprobe query, in seconds.
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },
    /// Check that ffprobe is installed.
    CheckDeps {
        /// Path to the ffprobe binary.
        #[arg(long, value_name = "PATH")]
        ffprobe: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env = env_logger::Env::default().default_filter_or(default_level);
    let mut builder = env_logger::Builder::from_env(env);
    if verbose {
        // --verbose wins over RUST_LOG
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn progress_bar() -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(100);
    let style = ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos:>3}% {msg}")?;
    pb.set_style(style.progress_chars("##-"));
    Ok(pb)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = AnalyzerConfig::load()?;

    match cli.command {
        Commands::Analyze {
            file,
            export,
            json,
            progress,
            ffprobe,
            timeout,
        } => {
            let request = AnalyzeRequest {
                file,
                export,
                json,
                ffprobe,
                timeout_secs: timeout,
            };
            let config = request.apply_overrides(config)?;
            let queue = AnalysisQueue::new(Arc::new(FfprobeProbe::from_config(&config)));

            let bar = if progress { Some(progress_bar()?) } else { None };
            let outcome = commands::run_analysis(&queue, &request, |p| {
                if let Some(pb) = &bar {
                    pb.set_position(u64::from(p.percentage));
                    pb.set_message(p.message.clone());
                }
            })
            .await;
            let result = match outcome {
                Ok(result) => {
                    if let Some(pb) = &bar {
                        pb.finish_with_message("done");
                    }
                    result
                }
                Err(e) => {
                    if let Some(pb) = &bar {
                        pb.abandon();
                    }
                    return Err(e.into());
                }
            };

            println!("{}", commands::render(&result, request.json)?);

            if let Some(path) = request.export_path(&config) {
                let path = commands::export(&result, path)?;
                eprintln!(
                    "{} {}",
                    "success:".green().bold(),
                    format!("Exported analysis to {}", path.display()).green()
                );
            }
        }
        Commands::CheckDeps { ffprobe } => {
            let mut config = config;
            if ffprobe.is_some() {
                config.ffprobe_path = ffprobe;
            }
            let report = commands::check_dependencies(&config);
            for dep in &report.dependencies {
                if dep.installed {
                    println!(
                        "{} {} {}",
                        "ok".green().bold(),
                        dep.name,
                        dep.version.as_deref().unwrap_or("")
                    );
                } else {
                    println!("{} {} not found", "missing".red().bold(), dep.name);
                }
            }
            if !report.all_installed {
                return Err(format!(
                    "required tools missing on {}. {}",
                    report.platform,
                    bitrate_analyzer::media::install_hint()
                )
                .into());
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
