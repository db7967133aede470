//! Extrusion volume model
//!
//! Converts pin solids into filament feed lengths. A pin is either a simple
//! prism (circular or square) or a rivet stack of lower cone, cylinder and
//! upper cone. Partial heights of a rivet are handled by [`clip_structure`],
//! which the schedule generator uses as well.

use gcodepin_core::{PinShape, RivetProfile};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use crate::error::{VolumeError, VolumeResult};
use crate::layout::PinSpec;

/// Filament diameter (mm)
pub const FILAMENT_DIAMETER: f64 = 1.75;

/// Height tolerance when reconciling clipped stacks (mm)
const STACK_TOLERANCE: f64 = 1e-6;

/// Filament cross-section area (mm²)
pub fn filament_area() -> f64 {
    let r = FILAMENT_DIAMETER / 2.0;
    PI * r * r
}

/// Filament length that delivers `volume` mm³
pub fn extrusion_length(volume: f64, flow_ratio: f64) -> f64 {
    volume / filament_area() * flow_ratio
}

/// Volume of a straight prism or cylinder
pub fn simple_volume(shape: PinShape, dimension: f64, height: f64) -> f64 {
    shape.area(dimension) * height
}

/// Truncated cone volume
pub fn frustum_volume(height: f64, r1: f64, r2: f64) -> f64 {
    PI * height * (r1 * r1 + r1 * r2 + r2 * r2) / 3.0
}

/// Part of the rivet stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// Bottom cone
    LowerCone,
    /// Shank
    Cylinder,
    /// Top cone
    UpperCone,
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKind::LowerCone => write!(f, "lower_cone"),
            SectionKind::Cylinder => write!(f, "cylinder"),
            SectionKind::UpperCone => write!(f, "upper_cone"),
        }
    }
}

/// One (possibly clipped) piece of the rivet stack
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructureSection {
    /// Which part of the stack
    pub kind: SectionKind,
    /// Height (mm)
    pub height: f64,
    /// Radius at the bottom face (mm)
    pub bottom_radius: f64,
    /// Radius at the top face (mm)
    pub top_radius: f64,
}

impl StructureSection {
    /// Volume of the section (mm³)
    pub fn volume(&self) -> f64 {
        frustum_volume(self.height, self.bottom_radius, self.top_radius)
    }

    /// Radius at `dz` above the bottom face
    pub fn radius_at(&self, dz: f64) -> f64 {
        if self.height <= 0.0 {
            return self.bottom_radius;
        }
        let t = (dz / self.height).clamp(0.0, 1.0);
        self.bottom_radius + (self.top_radius - self.bottom_radius) * t
    }

    /// Volume between `z0` and `z1` above the bottom face
    pub fn slice_volume(&self, z0: f64, z1: f64) -> f64 {
        let lo = z0.max(0.0);
        let hi = z1.min(self.height);
        if hi <= lo {
            return 0.0;
        }
        frustum_volume(hi - lo, self.radius_at(lo), self.radius_at(hi))
    }
}

/// Full rivet stack, bottom to top
pub fn nominal_stack(profile: &RivetProfile) -> [StructureSection; 3] {
    [
        StructureSection {
            kind: SectionKind::LowerCone,
            height: profile.cone_height,
            bottom_radius: profile.cone_radius,
            top_radius: profile.cylinder_radius,
        },
        StructureSection {
            kind: SectionKind::Cylinder,
            height: profile.cylinder_height,
            bottom_radius: profile.cylinder_radius,
            top_radius: profile.cylinder_radius,
        },
        StructureSection {
            kind: SectionKind::UpperCone,
            height: profile.cone_height,
            bottom_radius: profile.cylinder_radius,
            top_radius: profile.cone_radius,
        },
    ]
}

/// Pieces of the rivet stack inside `[window_start, window_start + height]`
///
/// Radii at cut points are interpolated linearly. Fails when the window
/// leaves the stack, i.e. the pieces do not add up to `height`.
pub fn clip_structure(
    profile: &RivetProfile,
    window_start: f64,
    height: f64,
) -> VolumeResult<Vec<StructureSection>> {
    let window_end = window_start + height;
    let mut sections = Vec::with_capacity(3);
    let mut section_start = 0.0;

    for section in nominal_stack(profile) {
        let section_end = section_start + section.height;
        let lo = window_start.max(section_start);
        let hi = window_end.min(section_end);
        if hi - lo > STACK_TOLERANCE {
            sections.push(StructureSection {
                kind: section.kind,
                height: hi - lo,
                bottom_radius: section.radius_at(lo - section_start),
                top_radius: section.radius_at(hi - section_start),
            });
        }
        section_start = section_end;
    }

    let clipped: f64 = sections.iter().map(|s| s.height).sum();
    if (clipped - height).abs() > STACK_TOLERANCE {
        return Err(VolumeError::StackMismatch {
            clipped,
            requested: height,
        });
    }
    Ok(sections)
}

/// Total volume of a section list
pub fn structure_volume(sections: &[StructureSection]) -> f64 {
    sections.iter().map(StructureSection::volume).sum()
}

/// Volume of a stacked section list between `z0` and `z1` (from its bottom)
pub fn slice_structure_volume(sections: &[StructureSection], z0: f64, z1: f64) -> f64 {
    let mut base = 0.0;
    let mut volume = 0.0;
    for section in sections {
        volume += section.slice_volume(z0 - base, z1 - base);
        base += section.height;
    }
    volume
}

/// Volume and extrusion figures for one pin geometry
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeModel {
    shape: PinShape,
    dimension: f64,
    rivet: Option<RivetProfile>,
    flow_ratio: f64,
}

impl VolumeModel {
    /// Create a model for the given pin
    pub fn new(spec: &PinSpec, rivet: Option<RivetProfile>, flow_ratio: f64) -> Self {
        Self {
            shape: spec.shape,
            dimension: spec.dimension,
            rivet,
            flow_ratio,
        }
    }

    /// Whether the pin is a rivet stack
    pub fn is_rivet(&self) -> bool {
        self.rivet.is_some()
    }

    /// Volume of one occupancy (mm³)
    ///
    /// A non-empty `structure` takes precedence over the simple shape.
    pub fn occupancy_volume(&self, height_mm: f64, structure: &[StructureSection]) -> f64 {
        if structure.is_empty() {
            simple_volume(self.shape, self.dimension, height_mm)
        } else {
            structure_volume(structure)
        }
    }

    /// Filament length of one occupancy (mm)
    pub fn occupancy_extrusion(&self, height_mm: f64, structure: &[StructureSection]) -> f64 {
        extrusion_length(self.occupancy_volume(height_mm, structure), self.flow_ratio)
    }

    /// Volume between `z0` and `z1` above the occupancy bottom (mm³)
    pub fn slice_volume(&self, structure: &[StructureSection], z0: f64, z1: f64) -> f64 {
        if structure.is_empty() {
            simple_volume(self.shape, self.dimension, (z1 - z0).max(0.0))
        } else {
            slice_structure_volume(structure, z0, z1)
        }
    }

    /// Filament length between `z0` and `z1` above the occupancy bottom (mm)
    pub fn slice_extrusion(&self, structure: &[StructureSection], z0: f64, z1: f64) -> f64 {
        extrusion_length(self.slice_volume(structure, z0, z1), self.flow_ratio)
    }
}
