mod abort;
mod config;
mod pointing;
mod session;
mod source;
mod tracker;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::{Config, ConfigError, API_KEY_ENV};
use crate::pointing::{Hardware, HardwareMode};
use crate::session::SessionPlan;
use crate::source::{Observer, SourceKind, SyntheticSource};
use crate::tracker::{Interval, Target, TrackDuration, TrackOutcome};

#[derive(Parser, Debug)]
#[command(name = "sat-pointer")]
#[command(about = "Track a satellite's position with respect to an observer location")]
struct Cli {
    /// NORAD id of the satellite to track (25544 is the ISS)
    #[arg(short, long, default_value_t = 25544)]
    sat: u32,
    /// Observer latitude, decimal degrees
    #[arg(short, long, allow_negative_numbers = true)]
    lat: Option<f64>,
    /// Observer longitude, decimal degrees
    #[arg(short = 'L', long, allow_negative_numbers = true)]
    lon: Option<f64>,
    /// Observer altitude above sea level, meters
    #[arg(short, long, allow_negative_numbers = true)]
    alt: Option<f64>,
    /// Tracking duration in seconds, -1 for indefinite
    #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
    duration: i64,
    /// Seconds between two pointing updates, accurate to the second
    #[arg(short, long, default_value_t = 1.0)]
    interval: f64,
    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Replay a recorded trace instead of calling the API; twice for
    /// synthetic positions
    #[arg(short, long, action = clap::ArgAction::Count)]
    testing: u8,
    /// Recorded trace used with --testing
    #[arg(long)]
    trace: Option<PathBuf>,
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Actuator backend: auto, sysfs, simulated or none
    #[arg(long)]
    hardware: Option<HardwareMode>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 | 1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn plan(cli: &Cli, config: &Config) -> Result<SessionPlan, ConfigError> {
    let station = config.station.observer();
    let observer = Observer {
        latitude_deg: cli.lat.unwrap_or(station.latitude_deg),
        longitude_deg: cli.lon.unwrap_or(station.longitude_deg),
        altitude_m: cli.alt.unwrap_or(station.altitude_m),
    };

    let api_key = if cli.testing == 0 {
        config
            .n2yo
            .resolve_api_key(std::env::var(API_KEY_ENV).ok())?
    } else {
        None
    };
    let live = SourceKind::Live {
        base_url: config.n2yo.base_url.clone(),
        api_key,
        timeout: Some(config.n2yo.timeout()),
    };
    let trace = cli.trace.clone().unwrap_or_else(|| config.replay.trace.clone());
    let source = SourceKind::from_testing_level(cli.testing, live, trace);

    let (duration, interval) = if source == SourceKind::Synthetic {
        (
            TrackDuration::Seconds(SyntheticSource::LEN as i64),
            Interval::default(),
        )
    } else {
        (
            TrackDuration::from_cli(cli.duration),
            Interval::from_secs_f64(cli.interval),
        )
    };

    Ok(SessionPlan {
        target: Target {
            norad_id: cli.sat,
            observer,
        },
        duration,
        interval,
        verbosity: cli.verbose,
        source,
        self_test: cli.testing > 0,
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => match Config::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error reading config {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    let plan = match plan(&cli, &config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let hardware = match Hardware::resolve(
        cli.hardware.unwrap_or(config.hardware.mode),
        config.hardware.gpio_root.clone(),
        config.hardware.pwm_chip.clone(),
    ) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Hardware error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let cancel = abort::on_ctrl_c();
    let result = session::run(&plan, hardware, &config.hardware.pins(), &cancel).await;
    println!("Pointing to sat:{} terminated", cli.sat);

    match result {
        Ok(TrackOutcome::Aborted { ticks, .. }) => {
            log::warn!("Tracking interrupted after {} ticks", ticks);
            ExitCode::SUCCESS
        }
        Ok(outcome) => {
            log::debug!(
                "{} ticks, {} refreshes",
                outcome.ticks(),
                outcome.refreshes()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Tracking failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
