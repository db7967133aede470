//! Pin shape, height and rivet profile definitions.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Cross-section shape of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PinShape {
    /// Round pin; `dimension` is the diameter
    Circular,
    /// Square pin; `dimension` is the side length
    Square,
}

impl PinShape {
    /// Cross-section area (mm²) for the given dimension
    pub fn area(&self, dimension: f64) -> f64 {
        match self {
            PinShape::Circular => PI * dimension * dimension / 4.0,
            PinShape::Square => dimension * dimension,
        }
    }

    /// Returns the configuration name of the shape.
    pub fn name(&self) -> &'static str {
        match self {
            PinShape::Circular => "circular",
            PinShape::Square => "square",
        }
    }
}

impl fmt::Display for PinShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PinShape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "circular" | "circle" | "round" => Ok(PinShape::Circular),
            "square" => Ok(PinShape::Square),
            other => Err(Error::UnknownShape(other.to_string())),
        }
    }
}

impl TryFrom<String> for PinShape {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PinShape> for String {
    fn from(shape: PinShape) -> Self {
        shape.name().to_string()
    }
}

/// Pin height input, either a layer count or an explicit height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinHeight {
    /// Height expressed as a number of layers
    Layers(u32),
    /// Height expressed in millimeters
    Millimeters(f64),
}

impl PinHeight {
    /// Height in millimeters for the given layer height
    pub fn to_mm(&self, layer_height: f64) -> f64 {
        match *self {
            PinHeight::Layers(layers) => layers as f64 * layer_height,
            PinHeight::Millimeters(mm) => mm,
        }
    }
}

impl Default for PinHeight {
    fn default() -> Self {
        PinHeight::Layers(8)
    }
}

/// Composite rivet-like pin solid: lower cone, cylinder, upper cone
///
/// The lower cone narrows from `cone_radius` at its base to
/// `cylinder_radius`; the upper cone mirrors it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RivetProfile {
    /// Radius at the outer face of each cone (mm)
    pub cone_radius: f64,
    /// Height of each cone (mm)
    pub cone_height: f64,
    /// Radius of the cylindrical shank (mm)
    pub cylinder_radius: f64,
    /// Height of the cylindrical shank (mm)
    pub cylinder_height: f64,
}

impl RivetProfile {
    /// Height of the complete stack (mm)
    pub fn nominal_height(&self) -> f64 {
        2.0 * self.cone_height + self.cylinder_height
    }
}

/// Staggering configuration as written in config files
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaggerSettings {
    /// Offset (layers) between the start layers of successive pins
    pub start_layer_offset: Option<u32>,
    /// Explicit start layers, applied cyclically over pin indices; wins over the offset
    pub fixed_start_layers: Vec<u32>,
}

/// Resolved staggering rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaggerRule {
    /// Every pin starts at the full pin height
    None,
    /// Start layers taken cyclically from the list
    Fixed(Vec<u32>),
    /// Start layers evenly offset; `None` derives the offset from the pin count
    Offset(Option<u32>),
}

impl StaggerSettings {
    /// Resolve the settings into a rule
    pub fn rule(&self) -> StaggerRule {
        if !self.fixed_start_layers.is_empty() {
            StaggerRule::Fixed(self.fixed_start_layers.clone())
        } else {
            StaggerRule::Offset(self.start_layer_offset)
        }
    }
}
