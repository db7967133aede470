//! Error types for the CAM tools crate.
//!
//! This module provides structured error types for pin layout feasibility,
//! extrusion volume modeling and toolpath synthesis.

use gcodepin_core::ConfigError;
use thiserror::Error;

/// Errors that can occur while building a pinning plan.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// The pin layout does not fit the cross-section.
    #[error("Infeasible layout: {0}")]
    Feasibility(#[from] FeasibilityError),

    /// The extrusion volume model rejected a structure.
    #[error("Volume model error: {0}")]
    Volume(#[from] VolumeError),

    /// Spiral mode leaves no room between the nozzle and the pin wall.
    #[error("Spiral radius {radius:.3} mm is not positive for pin radius {pin_radius:.3} mm")]
    SpiralRadius { radius: f64, pin_radius: f64 },

    /// Emitted extrusion deviates from the modeled volume.
    #[error(
        "Extrusion mismatch for pin {pin} at layer {layer}: emitted {emitted:.5} mm, modeled {modeled:.5} mm"
    )]
    ExtrusionMismatch {
        pin: usize,
        layer: u32,
        emitted: f64,
        modeled: f64,
    },

    /// A pin's start layer lies outside `1..=pin_height_layers`.
    #[error("Start layer {start_layer} of pin {pin} outside 1..={pin_height_layers}")]
    InvalidStartLayer {
        pin: usize,
        start_layer: u32,
        pin_height_layers: u32,
    },

    /// The configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Reasons a pin layout is rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeasibilityError {
    /// Achieved infill is more than one point away from the request.
    #[error("achieved infill {achieved:.3}% differs from requested {requested:.3}% by more than 1 point")]
    InfillMismatch { achieved: f64, requested: f64 },

    /// The outer margin along one axis is below the minimum.
    #[error("margin along {axis} is {margin:.4} mm, at least {required:.4} mm required")]
    MarginTooSmall {
        axis: String,
        margin: f64,
        required: f64,
    },

    /// Counts or dimensions cannot describe a layout.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// Errors related to the extrusion volume model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VolumeError {
    /// The clipped rivet stack does not add up to the requested height.
    #[error("rivet stack covers {clipped:.4} mm of the requested {requested:.4} mm")]
    StackMismatch { clipped: f64, requested: f64 },
}

/// Result type alias for CAM tool operations.
pub type CamToolResult<T> = Result<T, CamToolError>;

/// Result type alias for layout feasibility checks.
pub type FeasibilityResult<T> = Result<T, FeasibilityError>;

/// Result type alias for volume model operations.
pub type VolumeResult<T> = Result<T, VolumeError>;
