use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gcodepin::{generate_plan, init_logging, load_config, process_file, BUILD_DATE, VERSION};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Pinning configuration file (TOML or JSON)
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Only plan the pins and log the summary
    #[arg(long)]
    dry_run: bool,

    /// Do not insert the constants header
    #[arg(long)]
    no_header: bool,

    /// Sliced G-code programs to process
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;
    tracing::debug!("gcodepin {} (built {})", VERSION, BUILD_DATE);

    let config = load_config(&cli.config)?;
    let plan = generate_plan(&config)?;

    if cli.dry_run {
        println!("{}", plan.layout_json().context("Failed to render layout")?);
        for layer in plan.schedule.layers() {
            tracing::info!(
                "Layer {}: {} pin occupancies",
                layer,
                plan.schedule.entries_at(layer).len()
            );
        }
        return Ok(());
    }

    std::fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("Failed to create {}", cli.output_dir.display()))?;

    for input in &cli.inputs {
        let output = process_file(&plan, &config, input, &cli.output_dir, !cli.no_header)?;
        println!("{}", output.display());
    }

    Ok(())
}
