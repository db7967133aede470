//! Pin layout planner
//!
//! Spreads a grid of pins evenly over the rectangular specimen cross-section
//! and checks that the result honours the requested infill and edge margin.

use gcodepin_core::{CrossSection, PinRequest, PinShape, Point2D};
use serde::{Deserialize, Serialize};

use crate::error::{FeasibilityError, FeasibilityResult};

/// Allowed distance between achieved and requested infill, in percentage points
pub const INFILL_TOLERANCE: f64 = 1.0;

/// Decimal places kept for pin positions
const POSITION_DECIMALS: i32 = 4;

/// Resolved pin geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinSpec {
    /// Cross-section shape
    pub shape: PinShape,
    /// Diameter (circular) or side (square), mm
    pub dimension: f64,
    /// Pin height (mm)
    pub height_mm: f64,
    /// Pin height in whole layers
    pub height_layers: u32,
    /// Print layer height (mm)
    pub layer_height: f64,
}

impl PinSpec {
    /// Half the dimension
    pub fn radius(&self) -> f64 {
        self.dimension / 2.0
    }

    /// Cross-section area (mm²)
    pub fn area(&self) -> f64 {
        self.shape.area(self.dimension)
    }
}

/// Planned pin grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinLayout {
    /// Pin geometry
    pub spec: PinSpec,
    /// Pin centres relative to the cross-section corner, row-major
    pub positions: Vec<Point2D>,
    /// Achieved infill (%)
    pub achieved_infill: f64,
}

impl PinLayout {
    /// Number of pins in the grid
    pub fn pin_count(&self) -> usize {
        self.positions.len()
    }
}

/// Planner for evenly spaced pin grids
pub struct PinLayoutPlanner<'a> {
    cross_section: &'a CrossSection,
    request: &'a PinRequest,
}

impl<'a> PinLayoutPlanner<'a> {
    /// Create a planner for the given cross-section and pin request
    pub fn new(cross_section: &'a CrossSection, request: &'a PinRequest) -> Self {
        Self {
            cross_section,
            request,
        }
    }

    /// Compute and validate the pin grid
    pub fn plan(&self) -> FeasibilityResult<PinLayout> {
        let cs = self.cross_section;
        let req = self.request;
        self.check_geometry()?;

        let xs = axis_positions(cs.largest_side, req.count_largest_side, req.dimension)?;
        let ys = axis_positions(cs.smallest_side, req.count_smallest_side, req.dimension)?;

        let positions: Vec<Point2D> = xs
            .iter()
            .flat_map(|&x| ys.iter().map(move |&y| Point2D::new(x, y)))
            .map(|p| p.rounded(POSITION_DECIMALS))
            .collect();

        let achieved_infill =
            positions.len() as f64 * req.shape.area(req.dimension) / cs.area() * 100.0;
        if (achieved_infill - cs.infill_percentage).abs() > INFILL_TOLERANCE {
            return Err(FeasibilityError::InfillMismatch {
                achieved: achieved_infill,
                requested: cs.infill_percentage,
            });
        }

        for (axis, side, count) in [
            ("largest_side", cs.largest_side, req.count_largest_side),
            ("smallest_side", cs.smallest_side, req.count_smallest_side),
        ] {
            let margin = edge_margin(side, count, req.dimension, req.layer_height);
            if margin < cs.least_edge_margin {
                return Err(FeasibilityError::MarginTooSmall {
                    axis: axis.to_string(),
                    margin,
                    required: cs.least_edge_margin,
                });
            }
        }

        let spec = PinSpec {
            shape: req.shape,
            dimension: req.dimension,
            height_mm: req.height_mm(),
            height_layers: req.height_layers(),
            layer_height: req.layer_height,
        };
        tracing::info!(
            "Planned {} {} pins ({}x{}), infill {:.3}%",
            positions.len(),
            spec.shape,
            req.count_largest_side,
            req.count_smallest_side,
            achieved_infill
        );

        Ok(PinLayout {
            spec,
            positions,
            achieved_infill,
        })
    }

    fn check_geometry(&self) -> FeasibilityResult<()> {
        let cs = self.cross_section;
        let req = self.request;
        if cs.largest_side <= 0.0 || cs.smallest_side <= 0.0 {
            return Err(FeasibilityError::InvalidGeometry(
                "cross-section sides must be positive".to_string(),
            ));
        }
        if req.count_largest_side == 0 || req.count_smallest_side == 0 {
            return Err(FeasibilityError::InvalidGeometry(
                "pin counts must be at least 1".to_string(),
            ));
        }
        if req.dimension <= 0.0 || req.layer_height <= 0.0 {
            return Err(FeasibilityError::InvalidGeometry(
                "pin dimension and layer height must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Evenly spaced pin centres along one side
pub fn axis_positions(side: f64, count: u32, dimension: f64) -> FeasibilityResult<Vec<f64>> {
    let available = side - count as f64 * dimension;
    if available < 0.0 {
        return Err(FeasibilityError::InvalidGeometry(format!(
            "{} pins of {} mm do not fit in {} mm",
            count, dimension, side
        )));
    }
    let spacing = if count > 1 {
        available / (count as f64 + 1.0)
    } else {
        available / 2.0
    };
    Ok((0..count)
        .map(|i| spacing + i as f64 * (dimension + spacing) + dimension / 2.0)
        .collect())
}

/// Outer margin left on one side by the pin grid
///
/// Adjacent pins keep one layer height of clearance on each side.
pub fn edge_margin(side: f64, count: u32, dimension: f64, layer_height: f64) -> f64 {
    let occupied = count.saturating_sub(1) as f64 * (dimension + 2.0 * layer_height);
    (side - occupied) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcodepin_core::PinHeight;

    fn request(shape: PinShape, dimension: f64, nx: u32, ny: u32) -> PinRequest {
        PinRequest {
            shape,
            dimension,
            count_largest_side: nx,
            count_smallest_side: ny,
            height: PinHeight::Layers(5),
            layer_height: 0.12,
        }
    }

    #[test]
    fn test_single_pin_is_centred() {
        let xs = axis_positions(4.0, 1, 1.0).unwrap();
        assert_eq!(xs, vec![2.0]);
    }

    #[test]
    fn test_axis_spacing() {
        let xs = axis_positions(10.0, 3, 1.0).unwrap();
        assert_eq!(xs, vec![2.25, 5.0, 7.75]);
    }

    #[test]
    fn test_row_major_order() {
        let cs = CrossSection {
            largest_side: 10.0,
            smallest_side: 10.0,
            least_edge_margin: 0.5,
            infill_percentage: 4.0,
        };
        let req = request(PinShape::Square, 1.0, 2, 2);
        let layout = PinLayoutPlanner::new(&cs, &req).plan().unwrap();
        let first = layout.positions[0];
        let second = layout.positions[1];
        assert_eq!(first.x, second.x);
        assert!(second.y > first.y);
    }

    #[test]
    fn test_infill_mismatch() {
        let cs = CrossSection {
            infill_percentage: 30.0,
            ..CrossSection::default()
        };
        let req = request(PinShape::Square, 0.5, 2, 1);
        let err = PinLayoutPlanner::new(&cs, &req).plan().unwrap_err();
        assert!(matches!(err, FeasibilityError::InfillMismatch { .. }));
    }

    #[test]
    fn test_margin_too_small() {
        let cs = CrossSection {
            largest_side: 3.0,
            smallest_side: 3.0,
            least_edge_margin: 1.0,
            infill_percentage: 45.0,
        };
        let req = request(PinShape::Square, 1.0, 2, 2);
        let err = PinLayoutPlanner::new(&cs, &req).plan().unwrap_err();
        assert!(matches!(
            err,
            FeasibilityError::MarginTooSmall { ref axis, .. } if axis == "largest_side"
        ));
    }

    #[test]
    fn test_pins_that_do_not_fit() {
        let cs = CrossSection::default();
        let req = request(PinShape::Circular, 3.0, 1, 2);
        let err = PinLayoutPlanner::new(&cs, &req).plan().unwrap_err();
        assert!(matches!(err, FeasibilityError::InvalidGeometry(_)));
    }
}
