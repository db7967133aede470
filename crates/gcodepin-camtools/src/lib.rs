//! # gcodepin CAM Tools
//!
//! Pin planning and toolpath synthesis for reinforcing pins printed into a
//! sliced specimen.
//!
//! ## Components
//!
//! - **Layout**: evenly spaced pin grid with infill and margin checks
//! - **Placement**: cross-section to build-plate transform per part
//! - **Volume**: extrusion volume model for simple and rivet pins
//! - **Schedule**: per-pin occupancy spans with staggering
//! - **Synthesizer**: per-occupancy command sequences grouped by layer
//! - **Wipe**: fixed concentric wipe pattern
//! - **Constants / Naming**: output header block and file names

pub mod constants;
pub mod error;
pub mod layout;
pub mod naming;
pub mod placement;
pub mod plan;
pub mod schedule;
pub mod synthesizer;
pub mod volume;
pub mod wipe;

pub use constants::constants_block;
pub use error::{
    CamToolError, CamToolResult, FeasibilityError, FeasibilityResult, VolumeError, VolumeResult,
};
pub use layout::{PinLayout, PinLayoutPlanner, PinSpec};
pub use naming::output_file_name;
pub use placement::{place_pins, place_point, AbsolutePinSet};
pub use plan::{build_plan, PinningPlan};
pub use schedule::{start_layers, Schedule, ScheduleEntry, ScheduleGenerator};
pub use synthesizer::{skew_weights, spiral_radius, ToolpathBuffer, ToolpathSynthesizer};
pub use volume::{
    clip_structure, extrusion_length, frustum_volume, simple_volume, structure_volume,
    SectionKind, StructureSection, VolumeModel, FILAMENT_DIAMETER,
};
pub use wipe::{wipe_moves, WIPE_RADII};
