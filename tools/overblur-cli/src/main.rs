//! overblur CLI: find a static overlay in a video and blur it out.
//!
//! Usage:
//!   overblur blur -i <IN> -o <OUT> -t <TEMPLATE>...   Blur every occurrence
//!   overblur scan -i <IN> -t <TEMPLATE>...            Print the segment plan
//!   overblur check                                    Check ffmpeg/ffprobe
//!   overblur config [--save]                          Show effective config

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use overblur_common::config::AppConfig;

mod commands;

use commands::DetectArgs;

#[derive(Parser)]
#[command(
    name = "overblur",
    about = "Find a static overlay in a video and blur it where it shows",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the overlay and write a copy of the video with it blurred
    Blur {
        #[command(flatten)]
        detect: DetectArgs,

        /// Output file
        #[arg(short, long, visible_alias = "out")]
        output: PathBuf,

        /// ffmpeg program and leading arguments
        #[arg(long)]
        ffmpeg: Option<String>,

        /// ffmpeg boxblur parameters, see https://ffmpeg.org/ffmpeg-filters.html#boxblur
        #[arg(long)]
        boxblur: Option<String>,

        /// Print commands to stdout but don't execute them
        #[arg(long, visible_alias = "dryrun")]
        dry_run: bool,

        /// Keep intermediate files
        #[arg(long)]
        no_clean: bool,
    },

    /// Detect the overlay and print the segment plan
    Scan {
        #[command(flatten)]
        detect: DetectArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that ffmpeg and ffprobe are available
    Check,

    /// Print the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    overblur_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Blur {
            detect,
            output,
            ffmpeg,
            boxblur,
            dry_run,
            no_clean,
        } => {
            commands::blur::run(
                &config,
                detect,
                commands::blur::BlurArgs {
                    output,
                    ffmpeg,
                    boxblur,
                    dry_run,
                    no_clean,
                },
            )
            .await
        }
        Commands::Scan { detect, json } => commands::scan::run(&config, detect, json).await,
        Commands::Check => commands::check::run(),
        Commands::Config { save } => commands::config::run(&config, save),
    }
}
