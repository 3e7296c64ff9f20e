//! Eddy density command line.
//!
//! Loads anticyclonic and cyclonic eddy track files, bins eddy centres on a
//! regular grid and renders count and ratio maps to a PNG figure.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use eddy_grid::parse_range;
use eddy_obs::Direction;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use eddy_density::{run_density, run_subset, run_summary, DensityConfig, SubsetOptions};

#[derive(Parser, Debug)]
#[command(name = "eddy-density")]
#[command(about = "Eddy centre density maps from eddy tracking products")]
struct Cli {
    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the four-panel density figure
    Density(DensityArgs),
    /// Print statistics of one observation file
    Summary {
        /// Dataset path or sample-data identifier
        file: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Extract tracks and write them to a new file
    Subset(SubsetArgs),
}

#[derive(Args, Debug)]
struct DensityArgs {
    /// Anticyclonic dataset (path or sample-data identifier)
    #[arg(short, long, default_value = "Anticyclonic.nc")]
    anticyclonic: String,

    /// Cyclonic dataset (path or sample-data identifier)
    #[arg(short, long, default_value = "Cyclonic.nc")]
    cyclonic: String,

    /// Output PNG
    #[arg(short, long, default_value = "eddy_density.png")]
    output: PathBuf,

    /// YAML configuration file
    #[arg(long, env = "EDDY_CONFIG")]
    config: Option<PathBuf>,

    /// Bin size in degrees
    #[arg(long)]
    step: Option<f64>,

    /// Longitude range as start,stop
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<String>,

    /// Latitude range as start,stop
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<String>,

    /// Plot raw counts instead of eddies per square degree per day
    #[arg(long)]
    raw_counts: bool,

    /// Print the run report as JSON
    #[arg(long)]
    report: bool,
}

#[derive(Args, Debug)]
struct SubsetArgs {
    /// Dataset path or sample-data identifier
    file: String,

    /// Output NetCDF file
    #[arg(short, long)]
    output: PathBuf,

    /// Days since 1950-01-01 as start,end (negative: relative to dataset bounds, 0: open)
    #[arg(long, allow_hyphen_values = true)]
    period: Option<String>,

    /// Keep tracks with at least this many observations
    #[arg(long)]
    min_length: Option<i64>,

    /// Keep tracks with at most this many observations
    #[arg(long)]
    max_length: Option<i64>,

    /// Keep tracks travelling N, S, E or W
    #[arg(long)]
    direction: Option<Direction>,

    /// Minimum displacement in degrees for --direction
    #[arg(long, default_value_t = 0.0)]
    min_delta: f64,

    /// With --period, keep whole tracks touching the period
    #[arg(long)]
    full_path: bool,

    /// With --period, drop tracks only partly inside the period
    #[arg(long)]
    remove_incomplete: bool,

    /// Renumber track ids after extraction
    #[arg(long)]
    compress_id: bool,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    match cli.command {
        Command::Density(args) => density(args),
        Command::Summary { file, json } => {
            let summary = run_summary(&file)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", summary);
            }
            Ok(())
        }
        Command::Subset(args) => subset(args),
    }
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_target(true).with_level(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn density(args: DensityArgs) -> Result<()> {
    let mut config = DensityConfig::load(args.config.as_deref())?;
    if let Some(step) = args.step {
        config.grid.step = step;
    }
    if let Some(lon) = &args.lon {
        config.grid.lon_range = parse_range(lon)?;
    }
    if let Some(lat) = &args.lat {
        config.grid.lat_range = parse_range(lat)?;
    }
    if args.raw_counts {
        config.grid.normalize = false;
    }
    info!(
        step = config.grid.step,
        lon = ?config.grid.lon_range,
        lat = ?config.grid.lat_range,
        "Starting density run"
    );

    let report = run_density(&args.anticyclonic, &args.cyclonic, &config, &args.output)?;
    if args.report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn subset(args: SubsetArgs) -> Result<()> {
    let period = match &args.period {
        Some(p) => {
            let (a, b) = parse_range(p)?;
            Some((a as i64, b as i64))
        }
        None => None,
    };
    let options = SubsetOptions {
        period,
        min_length: args.min_length,
        max_length: args.max_length,
        direction: args.direction,
        min_delta: args.min_delta,
        full_path: args.full_path,
        remove_incomplete: args.remove_incomplete,
        compress_id: args.compress_id,
    };
    let kept = run_subset(&args.file, &args.output, &options)?;
    info!(kept, "Subset done");
    Ok(())
}
