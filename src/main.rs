//! CLI entry point for the city price grid generator.
//!
//! Converts a city boundary polygon and a price-tagged listings dataset into
//! a boundary-clipped grid of per-cell price statistics, written as GeoJSON.

use anyhow::{Context, Result};
use city_price_grid::{
    aggregate::aggregate,
    boundary::load_boundary,
    convert::DegreeConverter,
    grid::build_grid,
    listings::load_listings,
    output::{build_collection, output_path, summarize, write_collection},
};
use clap::Parser;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser, Debug)]
#[command(name = "city_price_grid")]
#[command(
    about = "Builds a boundary-clipped grid of price statistics over a city",
    long_about = None
)]
struct Cli {
    /// City identifier; locates input files and names the output artifact
    #[arg(value_name = "CITY")]
    city: String,

    /// Grid cell size in meters
    #[arg(value_name = "CELL_SIZE", default_value_t = 200.0, value_parser = positive_meters)]
    cell_size: f64,

    /// Directory holding {city}_boundary.geojson and {city}_listings.csv
    #[arg(short, long, default_value = "data")]
    data_dir: String,

    /// Directory for the output artifact (defaults to the data directory)
    #[arg(short, long)]
    output_dir: Option<String>,
}

fn positive_meters(s: &str) -> std::result::Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("`{s}` is not a number"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("cell size must be a positive number of meters, got `{s}`"))
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/city_price_grid.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("city_price_grid.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    run(&cli)
}

/// Runs the pipeline: load boundary -> load listings -> build grid ->
/// aggregate -> write. Strictly sequential; the first unrecoverable error
/// terminates the run.
fn run(cli: &Cli) -> Result<()> {
    let data_dir = Path::new(&cli.data_dir);
    let boundary_path = data_dir.join(format!("{}_boundary.geojson", cli.city));
    let listings_path = data_dir.join(format!("{}_listings.csv", cli.city));

    info!(
        city = %cli.city,
        cell_size_m = cli.cell_size,
        boundary = %boundary_path.display(),
        listings = %listings_path.display(),
        "Starting grid generation"
    );

    let boundary = load_boundary(&boundary_path)?;
    let converter =
        DegreeConverter::for_boundary(&boundary).context("boundary polygon has no centroid")?;

    let listings = load_listings(&listings_path)?;

    let grid = build_grid(&boundary, &converter, cli.cell_size)?;
    info!(
        rows = grid.rows,
        cols = grid.cols,
        kept = grid.cells.len(),
        discarded = grid.rows * grid.cols - grid.cells.len(),
        "Lattice clipped to boundary"
    );

    let populated = aggregate(&grid, &listings);
    info!(populated = populated.len(), "Listings aggregated into cells");

    let out_dir: PathBuf = cli
        .output_dir
        .as_deref()
        .unwrap_or(&cli.data_dir)
        .into();
    let path = output_path(&out_dir, &cli.city, cli.cell_size);
    let collection = build_collection(&cli.city, cli.cell_size, &populated);
    write_collection(&path, &collection)?;
    info!(path = %path.display(), features = collection.features.len(), "Artifact written");

    summarize(&populated).report();

    Ok(())
}
