//! Overlay writer.
//!
//! Turns HadUK-Grid monthly NetCDF files into sparse tiles and WGS84 map
//! overlays.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use netcdf_parser::RasterSource;
use overlay_writer::{BatchReport, OverlayConfig, OverlayWriter};

#[derive(Parser, Debug)]
#[command(name = "overlay-writer")]
#[command(about = "Build UK climate map overlays from HadUK-Grid data")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/overlay.yaml", env = "OVERLAY_CONFIG")]
    config: String,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read source grids and write sparse tiles
    Extract,
    /// Render overlays, legends and averages from existing tiles
    Render,
    /// Extract and render in one pass
    Run,
    /// Show where a BNG point lands on the overlay
    Locate {
        /// Easting in metres
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        /// Northing in metres
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
    },
}

fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(&args);

    match execute(&args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!(error = ?e, "Fatal");
            std::process::exit(1);
        }
    }
}

fn init_tracing(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = fmt().with_env_filter(filter).with_target(true);
    match args.log_format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn execute(args: &Args) -> Result<i32> {
    let config = OverlayConfig::load(&args.config)?;
    info!(
        config = %args.config,
        years = ?config.years,
        months = ?config.months,
        "Loaded configuration"
    );
    let writer = OverlayWriter::new(config)?;

    let report = match &args.command {
        Command::Extract => writer.extract(&*open_source(writer.config())?)?,
        Command::Render => writer.render()?,
        Command::Run => writer.run(&*open_source(writer.config())?)?,
        Command::Locate { x, y } => {
            let location = writer.locate(*x, *y)?;
            println!("{}", serde_json::to_string_pretty(&location)?);
            return Ok(0);
        }
    };

    print_report(&report);
    Ok(report.outcome().exit_code())
}

#[cfg(feature = "native")]
fn open_source(config: &OverlayConfig) -> Result<Box<dyn RasterSource>> {
    use climate_common::Variable;
    use netcdf_parser::{FilePattern, NetCdfSource};

    netcdf_parser::silence_hdf5_errors();
    let mut source = NetCdfSource::new(&config.paths.data_dir).with_extent(config.extent);
    for variable in Variable::ALL {
        source = source.with_pattern(variable, FilePattern::new(config.sources.pattern(variable)));
    }
    info!(data_dir = %config.paths.data_dir.display(), "Reading NetCDF sources");
    Ok(Box::new(source))
}

#[cfg(not(feature = "native"))]
fn open_source(config: &OverlayConfig) -> Result<Box<dyn RasterSource>> {
    anyhow::bail!(
        "reading {} needs NetCDF support; rebuild with `--features native`",
        config.paths.data_dir.display()
    )
}

fn print_report(report: &BatchReport) {
    for (key, reason) in &report.skipped {
        info!(key = %key, reason = %reason, "Skipped");
    }
    for (key, reason) in &report.failed {
        error!(key = %key, reason = %reason, "Failed");
    }
    let summary = serde_json::json!({
        "outcome": format!("{:?}", report.outcome()).to_lowercase(),
        "produced": report.produced.len(),
        "skipped": report.skipped.iter().map(|(k, r)| format!("{}: {}", k, r)).collect::<Vec<_>>(),
        "failed": report.failed.iter().map(|(k, r)| format!("{}: {}", k, r)).collect::<Vec<_>>(),
    });
    match serde_json::to_string_pretty(&summary) {
        Ok(text) => println!("{}", text),
        Err(e) => error!(error = %e, "Could not format report"),
    }
}
