//! Placement transform
//!
//! Maps pin positions from cross-section coordinates onto the build plate.
//! Each part is anchored at its footprint centre and rotated about it.

use gcodepin_core::{CrossSection, PartPlacement, Point2D};
use serde::{Deserialize, Serialize};

use crate::layout::PinLayout;

/// Absolute pin positions for one part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsolutePinSet {
    /// Name of the part
    pub part_name: String,
    /// Pin centres on the build plate, in layout order
    pub positions: Vec<Point2D>,
}

/// Map one cross-section point onto the build plate
pub fn place_point(point: Point2D, cross_section: &CrossSection, part: &PartPlacement) -> Point2D {
    let centre = cross_section.half_extent().rotated(part.rotation);
    let anchor = Point2D::new(part.x - centre.x, part.y - centre.y);
    point.rotated(part.rotation).offset(anchor)
}

/// Map the layout onto every part, preserving part order
pub fn place_pins(
    layout: &PinLayout,
    cross_section: &CrossSection,
    parts: &[PartPlacement],
) -> Vec<AbsolutePinSet> {
    parts
        .iter()
        .map(|part| AbsolutePinSet {
            part_name: part.name.clone(),
            positions: layout
                .positions
                .iter()
                .map(|&p| place_point(p, cross_section, part))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centre_maps_to_part_origin() {
        let cs = CrossSection::default();
        let part = PartPlacement::new("a", 100.0, 50.0, 37.0);
        let placed = place_point(cs.half_extent(), &cs, &part);
        assert!((placed.x - 100.0).abs() < 1e-9);
        assert!((placed.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_quarter_turn() {
        let cs = CrossSection::default();
        let part = PartPlacement::new("a", 0.0, 0.0, 90.0);
        // corner (0, 0) sits at (-5, -2) from the centre before rotation
        let placed = place_point(Point2D::new(0.0, 0.0), &cs, &part);
        assert!((placed.x - 2.0).abs() < 1e-9);
        assert!((placed.y + 5.0).abs() < 1e-9);
    }
}
