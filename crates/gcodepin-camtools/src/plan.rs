//! Complete pinning plan for one configuration

use gcodepin_core::PinningConfig;
use gcodepin_gcode::{LayerBlocks, MergeOptions};

use crate::constants::constants_block;
use crate::error::CamToolResult;
use crate::layout::{PinLayout, PinLayoutPlanner};
use crate::placement::{place_pins, AbsolutePinSet};
use crate::schedule::{Schedule, ScheduleGenerator};
use crate::synthesizer::ToolpathSynthesizer;

/// Everything generated for one configuration, ready to merge
#[derive(Debug, Clone)]
pub struct PinningPlan {
    /// Planned pin grid
    pub layout: PinLayout,
    /// Absolute pin positions per part
    pub pin_sets: Vec<AbsolutePinSet>,
    /// Occupancy schedule
    pub schedule: Schedule,
    /// Generated blocks per trigger layer
    pub blocks: LayerBlocks,
    /// Header constants
    pub constants: Vec<(String, String)>,
    /// First layer that may receive pins
    pub start_layer: u32,
}

impl PinningPlan {
    /// Merge options carrying this plan's header and start layer
    pub fn merge_options(&self, with_header: bool) -> MergeOptions {
        MergeOptions {
            start_layer: self.start_layer,
            header: with_header.then(|| self.constants.clone()),
        }
    }

    /// Planned layout and absolute pin positions as pretty JSON
    pub fn layout_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&serde_json::json!({
            "layout": &self.layout,
            "parts": &self.pin_sets,
        }))
    }
}

/// Plan, schedule and synthesize all pins of a configuration
///
/// Any failure aborts the whole plan; nothing partial is returned.
pub fn build_plan(config: &PinningConfig) -> CamToolResult<PinningPlan> {
    config.validate()?;

    let layout = PinLayoutPlanner::new(&config.cross_section, &config.pin).plan()?;
    let pin_sets = place_pins(&layout, &config.cross_section, &config.parts);
    let schedule = ScheduleGenerator::from_config(config).generate(layout.pin_count())?;
    let blocks = ToolpathSynthesizer::new(config, &layout.spec)?.synthesize(&schedule, &pin_sets)?;
    let constants = constants_block(config, &layout);

    Ok(PinningPlan {
        layout,
        pin_sets,
        schedule,
        blocks,
        constants,
        start_layer: config.start_layer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_defaults() {
        let plan = build_plan(&PinningConfig::default()).unwrap();
        assert_eq!(plan.layout.pin_count(), 3);
        assert_eq!(plan.pin_sets.len(), 1);
        assert_eq!(plan.merge_options(false).header, None);
        assert_eq!(
            plan.merge_options(true).header.as_deref(),
            Some(plan.constants.as_slice())
        );
    }

    #[test]
    fn test_layout_json() {
        let plan = build_plan(&PinningConfig::default()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&plan.layout_json().unwrap()).unwrap();
        assert_eq!(json["layout"]["spec"]["shape"], "circular");
        assert_eq!(json["parts"][0]["part_name"], "part_1");
        assert_eq!(json["parts"][0]["positions"].as_array().unwrap().len(), 3);
    }
}
