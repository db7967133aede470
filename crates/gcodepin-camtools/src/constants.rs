//! Constants block written into the output header

use gcodepin_core::{
    format_feed_rate, ExtrusionDistribution, ExtrusionMode, FeedRateUnits, PinningConfig,
};
use gcodepin_gcode::format_number;

use crate::layout::PinLayout;

fn mode_name(mode: ExtrusionMode) -> &'static str {
    match mode {
        ExtrusionMode::SingleShot => "single_shot",
        ExtrusionMode::Stepped => "stepped",
        ExtrusionMode::Blob => "blob",
    }
}

fn distribution_name(distribution: ExtrusionDistribution) -> String {
    match distribution {
        ExtrusionDistribution::Even => "even".to_string(),
        ExtrusionDistribution::Skewed { percentage } => {
            format!("skewed {}%", format_number(percentage, 3))
        }
        ExtrusionDistribution::Geometric => "geometric".to_string(),
    }
}

/// Flattened configuration plus derived values, in output order
pub fn constants_block(config: &PinningConfig, layout: &PinLayout) -> Vec<(String, String)> {
    let mut pairs = config.flatten();
    let positions = layout
        .positions
        .iter()
        .map(|p| format!("({}, {})", format_number(p.x, 4), format_number(p.y, 4)))
        .collect::<Vec<_>>()
        .join(" ");

    pairs.extend([
        (
            "pin_height_mm".to_string(),
            format_number(layout.spec.height_mm, 4),
        ),
        (
            "pin_height_layers".to_string(),
            layout.spec.height_layers.to_string(),
        ),
        ("total_layers".to_string(), config.total_layers().to_string()),
        ("pin_count".to_string(), layout.pin_count().to_string()),
        (
            "achieved_infill".to_string(),
            format_number(layout.achieved_infill, 3),
        ),
        ("pin_positions".to_string(), positions),
        (
            "extrusion_mode".to_string(),
            mode_name(config.extrusion_mode()).to_string(),
        ),
        (
            "extrusion_distribution".to_string(),
            distribution_name(config.extrusion_distribution()),
        ),
    ]);

    let motion = &config.motion;
    for (name, speed) in [
        ("z_lift", motion.z_lift_speed),
        ("xy_travel", motion.xy_travel_speed),
        ("z_drop", motion.z_drop_speed),
        ("extrusion", motion.extrusion_speed),
        ("retraction", motion.retraction_speed),
    ] {
        pairs.push((
            format!("feed.{}", name),
            format_feed_rate(motion.feed(speed), FeedRateUnits::MmPerMin),
        ));
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PinLayoutPlanner;

    #[test]
    fn test_constants_include_derived_values() {
        let config = PinningConfig::default();
        let layout = PinLayoutPlanner::new(&config.cross_section, &config.pin)
            .plan()
            .unwrap();
        let pairs = constants_block(&config, &layout);
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(get("pin_height_layers").as_deref(), Some("8"));
        assert_eq!(get("total_layers").as_deref(), Some("100"));
        assert_eq!(get("extrusion_mode").as_deref(), Some("stepped"));
        assert_eq!(get("pin.shape").as_deref(), Some("circular"));
        assert_eq!(get("pin_positions").as_deref(), Some("(2, 2) (5, 2) (8, 2)"));
        assert_eq!(get("feed.xy_travel").as_deref(), Some("9000.000 mm/min"));
    }

    #[test]
    fn test_feeds_reported_in_mm_per_min() {
        let mut config = PinningConfig::default();
        config.motion.feed_rate_units = FeedRateUnits::MmPerSec;
        config.motion.extrusion_speed = 30.0;
        let layout = PinLayoutPlanner::new(&config.cross_section, &config.pin)
            .plan()
            .unwrap();
        let pairs = constants_block(&config, &layout);
        assert!(pairs
            .iter()
            .any(|(k, v)| k == "feed.extrusion" && v == "1800.000 mm/min"));
        assert!(pairs
            .iter()
            .any(|(k, v)| k == "motion.feed_rate_units" && v == "mm/sec"));
    }
}
