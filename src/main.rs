mod config;
mod error;
mod input;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use railcurves_core::config::{DEFAULT_DISTANCE_INTERVAL_METERS, DEFAULT_TIME_INTERVAL_SECONDS};
use railcurves_core::prelude::*;
use serde::Serialize;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use error::CliError;

#[derive(Parser, Debug)]
#[command(author, version, about = "Curve-constrained speed profiles for rail paths", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Rail mode for every path, ignoring their mode tags
    #[arg(long, global = true, value_parser = parse_mode)]
    mode: Option<RailMode>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Vertex radii, curve sections and curve statistics
    Curves(PathArgs),
    /// Achievable speed at every vertex
    Profile(PathArgs),
    /// Speed sampled along the distance
    Distance(DistanceArgs),
    /// Speed sampled over time, including dwell times
    Time(TimeArgs),
    /// Station to station travel times with and without curves
    TravelTimes(PathArgs),
    /// Curve sections and coarse vertices as a GeoJSON FeatureCollection
    Geojson(PathArgs),
    /// Time profiles or travel times for an array of paths
    Batch(BatchArgs),
}

#[derive(clap::Args, Debug)]
struct PathArgs {
    /// Path document (`-` for standard input)
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

#[derive(clap::Args, Debug)]
struct DistanceArgs {
    #[command(flatten)]
    path: PathArgs,

    /// Sampling interval in meters
    #[arg(long, default_value_t = DEFAULT_DISTANCE_INTERVAL_METERS)]
    interval: f64,

    /// Stop at every station
    #[arg(long)]
    stations: bool,
}

#[derive(clap::Args, Debug)]
struct TimeArgs {
    #[command(flatten)]
    path: PathArgs,

    /// Sampling interval in seconds
    #[arg(long, default_value_t = DEFAULT_TIME_INTERVAL_SECONDS)]
    interval: f64,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum BatchKind {
    Time,
    TravelTimes,
}

#[derive(clap::Args, Debug)]
struct BatchArgs {
    /// JSON array of path documents (`-` for standard input)
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    #[arg(long, value_enum, default_value_t = BatchKind::TravelTimes)]
    kind: BatchKind,

    /// Sampling interval in seconds for time profiles
    #[arg(long, default_value_t = DEFAULT_TIME_INTERVAL_SECONDS)]
    interval: f64,
}

fn parse_mode(value: &str) -> Result<RailMode, String> {
    value.parse::<RailMode>().map_err(|e| e.to_string())
}

/// Base options and path reading with an optional forced rail mode.
struct Inputs {
    base: SpeedProfileOptions,
    forced_mode: Option<RailMode>,
}

impl Inputs {
    fn new(profile: SpeedProfileOptions, forced_mode: Option<RailMode>) -> Self {
        let mut base = profile;
        if let Some(mode) = forced_mode {
            base.curve.mode = mode;
        }
        Self { base, forced_mode }
    }

    fn prepare(&self, path: RailPath) -> RailPath {
        if self.forced_mode.is_some() {
            path.without_mode()
        } else {
            path
        }
    }

    fn read_path(&self, input: &std::path::Path) -> Result<RailPath, CliError> {
        input::read_path(input).map(|path| self.prepare(path))
    }

    fn read_paths(&self, input: &std::path::Path) -> Result<Vec<RailPath>, CliError> {
        let paths = input::read_paths(input)?;
        Ok(paths.into_iter().map(|path| self.prepare(path)).collect())
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn run_command(
    command: Command,
    config: &AppConfig,
    inputs: &Inputs,
    pretty: bool,
) -> Result<String, CliError> {
    let base = &inputs.base;

    match command {
        Command::Curves(args) => {
            let path = inputs.read_path(&args.input)?;
            to_json(&path.curve_analysis(base)?, pretty)
        }
        Command::Profile(args) => {
            let path = inputs.read_path(&args.input)?;
            to_json(&path.speed_profile(base)?, pretty)
        }
        Command::Distance(args) => {
            let path = inputs.read_path(&args.path.input)?;
            if args.stations {
                to_json(&path.station_distance_profile(base, args.interval)?, pretty)
            } else {
                to_json(&path.distance_profile(base, args.interval)?, pretty)
            }
        }
        Command::Time(args) => {
            let path = inputs.read_path(&args.path.input)?;
            to_json(&path.time_profile(base, args.interval)?, pretty)
        }
        Command::TravelTimes(args) => {
            let path = inputs.read_path(&args.input)?;
            to_json(&path.segment_travel_times(base)?, pretty)
        }
        Command::Geojson(args) => {
            let path = inputs.read_path(&args.input)?;
            let mode = path.speed_profile_options(base).mode();
            let collection = path
                .curve_analysis(base)?
                .map(|analysis| curve_analysis_to_geojson(path.coords(), &analysis, mode))
                .transpose()?;
            to_json(&collection, pretty)
        }
        Command::Batch(args) => {
            let paths = inputs.read_paths(&args.input)?;
            if let Some(threads) = config.threads {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build_global()
                    .map_err(|e| CliError::ThreadPool(e.to_string()))?;
            }
            info!("Loaded {} paths", paths.len());
            match args.kind {
                BatchKind::Time => {
                    to_json(&bulk_time_profiles(&paths, base, args.interval)?, pretty)
                }
                BatchKind::TravelTimes => to_json(&bulk_travel_times(&paths, base)?, pretty),
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.logging.level);
    debug!("Base options: {:?}", config.profile);

    let pretty = cli.pretty || config.output.pretty;
    let inputs = Inputs::new(config.profile, cli.mode);
    match run_command(cli.command, &config, &inputs, pretty) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use geo::line_string;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn forced_mode_overrides_path_tags() {
        let path = RailPath::new(
            "T",
            geo::line_string![(x: 6.1, y: 46.2), (x: 6.11, y: 46.2)],
            vec![0],
        )
        .with_mode("tram");

        let forced = Inputs::new(SpeedProfileOptions::default(), Some(RailMode::Metro));
        let prepared = forced.prepare(path.clone());
        assert_eq!(prepared.speed_profile_options(&forced.base).mode(), RailMode::Metro);

        let tagged = Inputs::new(SpeedProfileOptions::default(), None);
        let prepared = tagged.prepare(path);
        assert_eq!(prepared.speed_profile_options(&tagged.base).mode(), RailMode::Tram);

        let cli = Cli::parse_from(["railcurves", "curves", "p.json", "--mode", "highSpeedRail"]);
        assert_eq!(cli.mode, Some(RailMode::HighSpeedRail));
        assert!(Cli::try_parse_from(["railcurves", "curves", "p.json", "--mode", "bus"]).is_err());
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::parse_from(["railcurves", "distance", "path.json", "--stations", "--pretty"]);
        assert!(cli.pretty);
        match cli.command {
            Command::Distance(args) => {
                assert!(args.stations);
                assert_eq!(args.interval, DEFAULT_DISTANCE_INTERVAL_METERS);
                assert_eq!(args.path.input, PathBuf::from("path.json"));
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::parse_from(["railcurves", "batch", "-", "--kind", "time"]);
        assert!(matches!(
            cli.command,
            Command::Batch(BatchArgs {
                kind: BatchKind::Time,
                ..
            })
        ));
    }
}
