//! # gcodepin G-code
//!
//! G-code parsing, layer tracking, and pin block merging for gcodepin.
//! Parsed documents keep every source line verbatim so that a merge with no
//! blocks reproduces the input byte for byte.

pub mod document;
pub mod error;
pub mod gcode;
pub mod markers;
pub mod merger;

pub use document::Document;
pub use error::{GcodeError, MergeError, MergeResult, Result};
pub use gcode::{
    format_number, parse_fields, precision_for, GcodeLine, GcodeParser, LayerTracker,
    MarkerCountTracker, Param, ParamValue, ZHeightTracker,
};
pub use merger::{merge, serialize, LayerBlocks, MergeOptions};
