//! Wipe pattern around a finished pin

use gcodepin_core::Point2D;
use gcodepin_gcode::GcodeLine;

/// Wipe circle radii (mm), one full turn each
pub const WIPE_RADII: [f64; 3] = [0.4, 0.8, 1.2];

/// Concentric wipe circles around `center`
///
/// Outward pass clockwise through ascending radii, inward pass
/// counter-clockwise through descending radii, then back to the centre.
pub fn wipe_moves(center: Point2D, feed: f64) -> Vec<GcodeLine> {
    let mut lines = Vec::with_capacity(WIPE_RADII.len() * 4 + 1);
    let outward = WIPE_RADII.iter().map(|&r| ("G2", r));
    let inward = WIPE_RADII.iter().rev().map(|&r| ("G3", r));

    for (arc, radius) in outward.chain(inward) {
        let start_x = center.x + radius;
        lines.push(
            GcodeLine::new("G1")
                .with('X', start_x)
                .with('Y', center.y)
                .with('F', feed),
        );
        lines.push(
            GcodeLine::new(arc)
                .with('X', start_x)
                .with('Y', center.y)
                .with('I', -radius)
                .with('J', 0.0)
                .with('F', feed),
        );
    }
    lines.push(
        GcodeLine::new("G1")
            .with('X', center.x)
            .with('Y', center.y)
            .with('F', feed)
            .with_comment("wipe done"),
    );
    lines
}
