use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use stream_valve::config::{Settings, ValveConfig};
use stream_valve::logging::{init_tracing, Logger};
use stream_valve::report::Report;
use stream_valve::valve::FileValve;

/// Stream a file through a valve and report its throughput.
#[derive(Debug, Parser)]
#[command(name = "stream-valve", version, about)]
struct Args {
    /// File to stream
    path: PathBuf,

    /// YAML valve configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bytes per chunk
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Target throughput in bytes per second
    #[arg(long)]
    throughput: Option<f64>,

    /// Log the observed rate for every chunk
    #[arg(long)]
    debug: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let settings = Settings::from_env()?;
    init_tracing(&settings)?;

    info!("Starting Stream Valve");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => ValveConfig::from_file(path)?,
        None => ValveConfig::default(),
    };
    if let Some(chunk_size) = args.chunk_size {
        config = config.with_chunk_size(chunk_size);
    }
    if let Some(throughput) = args.throughput {
        config = config.with_throughput(throughput);
    }
    if args.debug {
        config = config.with_debug(true);
    }
    if let Some(logger) = Logger::from_settings(&settings) {
        config = config.with_logger(logger);
    }

    let chunk_size = config.chunk_size;
    let throughput = config.throughput;
    let mut valve = FileValve::new(&args.path, config)?;
    info!(path = %args.path.display(), chunk_size, "Streaming file");

    let meter = valve.with_open(|v| {
        for chunk in v.chunks()? {
            chunk?;
        }
        Ok(v.meter())
    })?;

    let report = Report::new(
        &args.path,
        chunk_size,
        throughput,
        meter,
        settings.decimal_prec,
    );
    if args.json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report);
    }

    info!("Stream Valve finished");
    Ok(())
}
