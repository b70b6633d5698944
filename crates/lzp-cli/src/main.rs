//! lzp - Local Z projection CLI
//!
//! Writes and checks parameter files, and runs the projection pipeline on
//! synthetic time-lapse volumes.

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "lzp")]
#[command(author, version, about = "Local Z projection of 3D+time microscopy volumes")]
#[command(long_about = "
Estimates the in-focus surface of each time point of a 3D+time volume and
projects a thin Z window around it into a flat image per channel.

Examples:
  lzp params init reference -o ref.json --recommended
  lzp params init extract -o extract.json
  lzp params show ref.json reference
  lzp demo --frames 5 --drift 0.5 --tilt 0.05
  lzp demo --reference ref.json --extract extract.json --save-dir out/
  lzp -v -j 4 demo --one-pass --delta-z 2
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (repeat for more detail)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or inspect parameter files
    #[command(visible_alias = "p")]
    Params(ParamsArgs),

    /// Run the pipeline on a synthetic volume
    Demo(DemoArgs),
}

/// Which parameter set a file holds.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum ParamsKind {
    /// Height-map estimation parameters
    Reference,
    /// Extraction parameters
    Extract,
}

#[derive(Args)]
struct ParamsArgs {
    #[command(subcommand)]
    action: ParamsAction,
}

#[derive(Subcommand)]
enum ParamsAction {
    /// Write a parameter file
    Init {
        /// Parameter set
        kind: ParamsKind,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the recommended preset instead of the defaults
        #[arg(long)]
        recommended: bool,
    },

    /// Validate a parameter file and print it normalized
    Show {
        /// Parameter file
        input: PathBuf,

        /// Parameter set
        kind: ParamsKind,
    },
}

/// Frame access policy flag.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum Policy {
    /// Zero-copy view of each frame
    #[default]
    View,
    /// Copy each frame into RAM first
    Copy,
}

#[derive(Args)]
struct DemoArgs {
    /// Width in pixels
    #[arg(long, default_value = "64")]
    width: usize,

    /// Height in pixels
    #[arg(long, default_value = "64")]
    height: usize,

    /// Number of Z planes
    #[arg(long, default_value = "20")]
    depth: usize,

    /// Number of channels
    #[arg(long, default_value = "2")]
    channels: usize,

    /// Number of time points
    #[arg(long, default_value = "3")]
    frames: usize,

    /// Focus plane at x = 0, t = 0
    #[arg(long, default_value = "10.0")]
    focus: f64,

    /// Focus shift per pixel along X
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    tilt: f64,

    /// Focus shift per time point
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    drift: f64,

    /// Reference surface parameter file (recommended preset if omitted)
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Extraction parameter file (recommended preset if omitted)
    #[arg(long)]
    extract: Option<PathBuf>,

    /// Override the Z half-range of every channel
    #[arg(long)]
    delta_z: Option<u32>,

    /// Use the fused single-sweep projector on the target channel
    #[arg(long)]
    one_pass: bool,

    /// Frame access policy
    #[arg(long, value_enum, default_value_t = Policy::View)]
    policy: Policy,

    /// Write raw frames to this directory
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Also write raw height maps (with --save-dir)
    #[arg(long)]
    save_height_maps: bool,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Params(args) => commands::params::run(args, cli.verbose),
        Commands::Demo(args) => commands::demo::run(args, cli.verbose),
    }
}
