#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Finds the circle around a point that holds as many residents as the
//! current death (or case) count, and prints the answer as JSON.
//!
//! Data files are read from `$EQUIVALENT_AREA_DATA_DIR/output/` (or
//! `./output/`) unless `--data-dir` or a config file says otherwise.
//! `RUST_LOG` controls logging on stderr.

use std::path::PathBuf;

use clap::Parser;
use clap::error::ErrorKind;
use equivalent_area_query::{
    DataPaths, FixedTarget, JsonTargetSource, Measure, QueryConfig, TargetSource, run_query_with,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[derive(Parser)]
#[command(
    name = "equivalent_area",
    about = "Find the circle around a point whose population matches the current count",
    allow_negative_numbers = true
)]
struct Cli {
    /// Latitude of the query point
    lat: f64,

    /// Longitude of the query point
    lon: f64,

    /// Count to match: `deaths` or `cases`
    #[arg(long, default_value_t = Measure::Deaths)]
    measure: Measure,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the data files (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Use this target instead of reading the count file
    #[arg(long)]
    target: Option<u64>,

    /// Seed for the capital selection, for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

/// Help and version requests succeed; every other parse failure is a usage
/// error.
const fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            if let Err(err) = e.print() {
                log::error!("Failed to print usage: {err}");
            }
            std::process::exit(exit_code(e.kind()));
        }
    };

    let mut config = match &cli.config {
        Some(path) => QueryConfig::load(path)?,
        None => QueryConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data = DataPaths::in_dir(dir);
    }

    let targets: Box<dyn TargetSource> = match cli.target {
        Some(target) => Box::new(FixedTarget(target)),
        None => Box::new(JsonTargetSource::new(&config.data.case_count)),
    };

    let mut rng = cli
        .seed
        .map_or_else(|| StdRng::from_rng(&mut rand::rng()), StdRng::seed_from_u64);

    log::info!(
        "Querying ({}, {}) for {} using {}",
        cli.lat,
        cli.lon,
        cli.measure,
        config.data.tract_index.display()
    );

    let output = run_query_with(
        cli.lat,
        cli.lon,
        cli.measure,
        targets.as_ref(),
        &config,
        &mut rng,
    )?;

    let json = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{json}");

    Ok(())
}
