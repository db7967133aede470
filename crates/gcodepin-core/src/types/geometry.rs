//! Planar geometry shared by the planner, the placement transform and the
//! toolpath synthesizer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point on the build plate (or inside a cross-section), in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point2D {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        debug_assert!(
            x.is_finite() && y.is_finite(),
            "Point2D must be finite: x={x}, y={y}"
        );
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Rotate about the origin by `angle_deg` degrees (counter-clockwise)
    pub fn rotated(&self, angle_deg: f64) -> Point2D {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        Point2D {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    /// Translate by another point treated as a vector
    pub fn offset(&self, by: Point2D) -> Point2D {
        Point2D {
            x: self.x + by.x,
            y: self.y + by.y,
        }
    }

    /// Round both coordinates to `decimals` places
    pub fn rounded(&self, decimals: i32) -> Point2D {
        let factor = 10f64.powi(decimals);
        Point2D {
            x: (self.x * factor).round() / factor,
            y: (self.y * factor).round() / factor,
        }
    }
}

impl fmt::Display for Point2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.x, self.y)
    }
}

/// Rectangular cross-section of the printed specimen that receives the pins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSection {
    /// Longest side of the rectangle (mm)
    pub largest_side: f64,
    /// Shortest side of the rectangle (mm)
    pub smallest_side: f64,
    /// Minimum distance between the pin grid and the outer wall (mm)
    pub least_edge_margin: f64,
    /// Requested pin infill as a percentage of the cross-section area
    pub infill_percentage: f64,
}

impl CrossSection {
    /// Area of the rectangle (mm²)
    pub fn area(&self) -> f64 {
        self.largest_side * self.smallest_side
    }

    /// Centre of the footprint relative to its corner
    pub fn half_extent(&self) -> Point2D {
        Point2D::new(self.largest_side / 2.0, self.smallest_side / 2.0)
    }
}

impl Default for CrossSection {
    fn default() -> Self {
        Self {
            largest_side: 10.0,
            smallest_side: 4.0,
            least_edge_margin: 0.5,
            infill_percentage: 24.0,
        }
    }
}

/// One physical part instance on the build plate
///
/// `x`/`y` locate the centre of the part's footprint; `rotation` turns the
/// cross-section about that centre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartPlacement {
    /// Part name, used in generated comments
    pub name: String,
    /// Footprint centre X on the build plate (mm)
    pub x: f64,
    /// Footprint centre Y on the build plate (mm)
    pub y: f64,
    /// Rotation in degrees, counter-clockwise
    #[serde(default)]
    pub rotation: f64,
}

impl PartPlacement {
    /// Create a new placement
    pub fn new(name: impl Into<String>, x: f64, y: f64, rotation: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            rotation,
        }
    }

    /// Footprint centre as a point
    pub fn origin(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_quarter_turn() {
        let p = Point2D::new(1.0, 0.0).rotated(90.0);
        assert!(p.x.abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rounding() {
        let p = Point2D::new(3.141_59, 2.718_28).rounded(2);
        assert_eq!(p, Point2D::new(3.14, 2.72));
    }

    #[test]
    fn test_cross_section_area() {
        let cs = CrossSection::default();
        assert_eq!(cs.area(), 40.0);
        assert_eq!(cs.half_extent(), Point2D::new(5.0, 2.0));
    }
}
