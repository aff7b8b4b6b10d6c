//! sarpol CLI: run the polarization workflow over a local scene catalog

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use sarpol::core::display::PngSink;
use sarpol::{LocalCatalog, Pipeline, PipelineConfig};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "sarpol")]
#[command(author, version, about = "Sentinel-1 normalized polarization index composites", long_about = None)]
struct Cli {
    /// Directory holding catalog.json and the band rasters
    #[arg(long)]
    catalog: PathBuf,

    /// Pipeline configuration (JSON); project-site defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for rendered map layers
    #[arg(long, default_value = "./output")]
    output: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter));
    builder.format_timestamp_secs();
    builder.init();

    let start_time = Instant::now();

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    let catalog = LocalCatalog::open(&cli.catalog)
        .with_context(|| format!("Failed to open catalog {}", cli.catalog.display()))?;
    let mut sink = PngSink::new(&cli.output)
        .with_context(|| format!("Failed to create output directory {}", cli.output.display()))?;

    let pipeline = Pipeline::new(config).context("Invalid pipeline configuration")?;
    let output = pipeline.run(&catalog, &mut sink).context("Processing failed")?;

    log::info!("Processed {} scenes", output.scene_count);
    for composite in [&output.mean, &output.median] {
        match composite.stats() {
            Some(stats) => log::info!(
                "{} composite: min {:.4}, max {:.4}, mean {:.4} ({} of {} pixels valid)",
                composite.reducer,
                stats.min,
                stats.max,
                stats.mean,
                stats.valid_pixels,
                stats.total_pixels
            ),
            None => log::info!("{} composite is empty", composite.reducer),
        }
    }
    for path in sink.written() {
        log::info!("Wrote {}", path.display());
    }
    log::info!("Finished in {:.2?}", start_time.elapsed());

    Ok(())
}
