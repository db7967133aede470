//! # gcodepin
//!
//! Reinforcing-pin toolpath synthesis for layer-by-layer 3D printing.
//! Plans a grid of vertical pins inside a specimen cross-section, schedules
//! their printing over the build height and splices the generated commands
//! into a sliced G-code program.
//!
//! ## Architecture
//!
//! gcodepin is organized as a workspace with multiple crates:
//!
//! 1. **gcodepin-core** - Configuration, value types, errors, units
//! 2. **gcodepin-gcode** - Line records, parser, layer tracking, merger
//! 3. **gcodepin-camtools** - Layout, placement, volume model, schedule, synthesizer
//! 4. **gcodepin** - Facade and command line binary

use anyhow::Context;
use std::path::{Path, PathBuf};

pub use gcodepin_camtools::{
    build_plan, output_file_name, CamToolError, FeasibilityError, PinLayout, PinningPlan,
    Schedule, ScheduleEntry, VolumeError,
};
pub use gcodepin_core::{ConfigError, PinningConfig};
pub use gcodepin_gcode::{merge, serialize, Document, GcodeParser, LayerBlocks, MergeError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Log lines go to stderr; verbosity follows `RUST_LOG`.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Load and validate a configuration file
pub fn load_config(path: &Path) -> anyhow::Result<PinningConfig> {
    PinningConfig::load_from_file(path)
        .with_context(|| format!("Failed to load config: {}", path.display()))
}

/// Build the pinning plan for a configuration
pub fn generate_plan(config: &PinningConfig) -> anyhow::Result<PinningPlan> {
    let plan = build_plan(config).context("Failed to build pinning plan")?;
    tracing::info!(
        "Planned {} pins per part ({:.2}% infill), {} parts, {} pin layers",
        plan.layout.pin_count(),
        plan.layout.achieved_infill,
        plan.pin_sets.len(),
        plan.blocks.len()
    );
    Ok(plan)
}

/// Splice a plan into one input program and write the result
///
/// The output lands in `output_dir` under the name derived from the input
/// and the configuration. Returns the written path.
pub fn process_file(
    plan: &PinningPlan,
    config: &PinningConfig,
    input: &Path,
    output_dir: &Path,
    with_header: bool,
) -> anyhow::Result<PathBuf> {
    let document = GcodeParser::new(config.pin.layer_height)
        .parse_file(input)
        .with_context(|| format!("Failed to read G-code: {}", input.display()))?;

    let merged = merge(&document, &plan.blocks, &plan.merge_options(with_header))
        .with_context(|| format!("Failed to merge pins into {}", input.display()))?;

    let output = output_dir.join(output_file_name(input, config));
    merged
        .write_to(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(
        "Wrote {} ({} -> {} lines)",
        output.display(),
        document.len(),
        merged.len()
    );
    Ok(output)
}
