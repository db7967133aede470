//! Pinning schedule generator
//!
//! Every pin index runs its own timeline of occupancies: a first span from
//! layer 1 up to its start layer, then full pin-height spans until the
//! specimen top, where the last span is clipped. Each span is keyed at its
//! top layer, the completed layer after which the pin is printed.

use gcodepin_core::{PinningConfig, RivetProfile, StaggerRule};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CamToolError, CamToolResult, VolumeResult};
use crate::volume::{clip_structure, StructureSection};

/// One scheduled occupancy of one pin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Index of the pin in layout order
    pub pin_index: usize,
    /// Completed layer that triggers the insertion
    pub layer: u32,
    /// Number of layers covered
    pub height_layers: u32,
    /// Whether this is the pin's first occupancy
    pub first_occupancy: bool,
    /// Clipped rivet sections, empty for simple pins
    pub structure: Vec<StructureSection>,
}

impl ScheduleEntry {
    /// Lowest layer covered by the occupancy
    pub fn bottom_layer(&self) -> u32 {
        self.layer + 1 - self.height_layers
    }

    /// Occupancy height (mm)
    pub fn height_mm(&self, layer_height: f64) -> f64 {
        self.height_layers as f64 * layer_height
    }
}

/// Start layer of every pin index
///
/// Start layers are clamped to `total_layers`.
pub fn start_layers(
    rule: &StaggerRule,
    pin_height_layers: u32,
    pin_count: usize,
    total_layers: u32,
) -> Vec<u32> {
    let phl = pin_height_layers.max(1);
    (0..pin_count)
        .map(|i| {
            let start = match rule {
                StaggerRule::Fixed(list) if !list.is_empty() => list[i % list.len()],
                StaggerRule::Offset(offset) => {
                    let offset = offset.unwrap_or_else(|| (phl / pin_count.max(1) as u32).max(1));
                    phl - ((i as u64 * offset as u64) % phl as u64) as u32
                }
                _ => phl,
            };
            start.min(total_layers)
        })
        .collect()
}

/// Schedule generator parameters
#[derive(Debug, Clone)]
pub struct ScheduleGenerator {
    pin_height_layers: u32,
    total_layers: u32,
    layer_height: f64,
    rule: StaggerRule,
    rivet: Option<RivetProfile>,
}

impl ScheduleGenerator {
    /// Create a generator without staggering or rivet profile
    pub fn new(pin_height_layers: u32, total_layers: u32, layer_height: f64) -> Self {
        Self {
            pin_height_layers,
            total_layers,
            layer_height,
            rule: StaggerRule::None,
            rivet: None,
        }
    }

    /// Create a generator from a validated configuration
    pub fn from_config(config: &PinningConfig) -> Self {
        Self::new(
            config.pin_height_layers(),
            config.total_layers(),
            config.pin.layer_height,
        )
        .with_rule(config.stagger_rule())
        .with_rivet(config.rivet)
    }

    /// Set the staggering rule
    pub fn with_rule(mut self, rule: StaggerRule) -> Self {
        self.rule = rule;
        self
    }

    /// Set the rivet profile
    pub fn with_rivet(mut self, rivet: Option<RivetProfile>) -> Self {
        self.rivet = rivet;
        self
    }

    /// Build the schedule for `pin_count` pins
    ///
    /// Fails when a start layer is 0 or above the pin height.
    pub fn generate(&self, pin_count: usize) -> CamToolResult<Schedule> {
        let phl = self.pin_height_layers;
        let total = self.total_layers;
        let mut entries: BTreeMap<u32, Vec<ScheduleEntry>> = BTreeMap::new();

        if phl > 0 && total > 0 {
            let starts = start_layers(&self.rule, phl, pin_count, total);
            if let Some((pin, &start_layer)) = starts
                .iter()
                .enumerate()
                .find(|(_, &s)| s == 0 || s > phl)
            {
                return Err(CamToolError::InvalidStartLayer {
                    pin,
                    start_layer,
                    pin_height_layers: phl,
                });
            }
            for (pin_index, &start) in starts.iter().enumerate() {
                let mut bottom = 1;
                let mut top = start;
                while bottom <= total {
                    let first_occupancy = bottom == 1;
                    let height_layers = top + 1 - bottom;
                    let structure = self.structure_for(start, first_occupancy, height_layers)?;
                    entries.entry(top).or_default().push(ScheduleEntry {
                        pin_index,
                        layer: top,
                        height_layers,
                        first_occupancy,
                        structure,
                    });
                    bottom = top + 1;
                    top = (top + phl).min(total);
                }
            }
        }

        let schedule = Schedule {
            entries,
            pin_height_layers: phl,
            total_layers: total,
            pin_count,
        };
        tracing::info!(
            "Scheduled {} occupancies over {} layers for {} pins",
            schedule.len(),
            schedule.layer_count(),
            pin_count
        );
        Ok(schedule)
    }

    fn structure_for(
        &self,
        start: u32,
        first_occupancy: bool,
        height_layers: u32,
    ) -> VolumeResult<Vec<StructureSection>> {
        let Some(profile) = &self.rivet else {
            return Ok(Vec::new());
        };
        let window_layers = if first_occupancy {
            self.pin_height_layers.saturating_sub(start)
        } else {
            0
        };
        clip_structure(
            profile,
            window_layers as f64 * self.layer_height,
            height_layers as f64 * self.layer_height,
        )
    }
}

/// Occupancies keyed by their trigger layer
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schedule {
    entries: BTreeMap<u32, Vec<ScheduleEntry>>,
    pin_height_layers: u32,
    total_layers: u32,
    pin_count: usize,
}

impl Schedule {
    /// Entries triggered by `layer`, in pin order
    pub fn entries_at(&self, layer: u32) -> &[ScheduleEntry] {
        self.entries.get(&layer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Layers holding at least one entry, ascending
    pub fn layers(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }

    /// All entries of one pin, ascending by layer
    pub fn entries_for_pin(&self, pin_index: usize) -> Vec<&ScheduleEntry> {
        self.entries
            .values()
            .flatten()
            .filter(|e| e.pin_index == pin_index)
            .collect()
    }

    /// Number of layers holding entries
    pub fn layer_count(&self) -> usize {
        self.entries.len()
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pin height in layers
    pub fn pin_height_layers(&self) -> u32 {
        self.pin_height_layers
    }

    /// Specimen height in layers
    pub fn total_layers(&self) -> u32 {
        self.total_layers
    }

    /// Number of pins scheduled
    pub fn pin_count(&self) -> usize {
        self.pin_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::SectionKind;

    #[test]
    fn test_offset_start_layers() {
        let starts = start_layers(&StaggerRule::Offset(None), 8, 4, 100);
        assert_eq!(starts, vec![8, 6, 4, 2]);

        let starts = start_layers(&StaggerRule::Offset(Some(3)), 8, 4, 100);
        assert_eq!(starts, vec![8, 5, 2, 7]);
    }

    #[test]
    fn test_fixed_start_layers_cycle() {
        let starts = start_layers(&StaggerRule::Fixed(vec![8, 3]), 8, 3, 100);
        assert_eq!(starts, vec![8, 3, 8]);
    }

    #[test]
    fn test_start_layers_clamped() {
        let starts = start_layers(&StaggerRule::None, 8, 2, 5);
        assert_eq!(starts, vec![5, 5]);
    }

    #[test]
    fn test_zero_start_layer_rejected() {
        let err = ScheduleGenerator::new(8, 20, 0.1)
            .with_rule(StaggerRule::Fixed(vec![4, 0]))
            .generate(2)
            .unwrap_err();
        assert!(matches!(
            err,
            CamToolError::InvalidStartLayer {
                pin: 1,
                start_layer: 0,
                pin_height_layers: 8
            }
        ));

        let err = ScheduleGenerator::new(8, 20, 0.1)
            .with_rule(StaggerRule::Fixed(vec![9]))
            .generate(1)
            .unwrap_err();
        assert!(matches!(err, CamToolError::InvalidStartLayer { start_layer: 9, .. }));
    }

    #[test]
    fn test_spans_without_stagger() {
        let schedule = ScheduleGenerator::new(8, 20, 0.1).generate(1).unwrap();
        let layers: Vec<u32> = schedule.layers().collect();
        assert_eq!(layers, vec![8, 16, 20]);
        assert_eq!(schedule.entries_at(20)[0].height_layers, 4);
        assert!(schedule.entries_at(8)[0].first_occupancy);
        assert!(!schedule.entries_at(16)[0].first_occupancy);
        assert_eq!(schedule.entries_at(16)[0].bottom_layer(), 9);
    }

    #[test]
    fn test_staggered_pins_share_layers() {
        let schedule = ScheduleGenerator::new(4, 12, 0.1)
            .with_rule(StaggerRule::Offset(Some(2)))
            .generate(2)
            .unwrap();
        // pin 0: 4, 8, 12; pin 1: 2, 6, 10, 12
        assert_eq!(schedule.entries_at(12).len(), 2);
        assert_eq!(schedule.entries_at(2)[0].pin_index, 1);
        assert_eq!(schedule.entries_for_pin(1).len(), 4);
    }

    #[test]
    fn test_first_rivet_occupancy_is_top_clipped_window() {
        let rivet = RivetProfile {
            cone_radius: 1.0,
            cone_height: 0.3,
            cylinder_radius: 0.7,
            cylinder_height: 0.2,
        };
        let schedule = ScheduleGenerator::new(8, 20, 0.1)
            .with_rule(StaggerRule::Fixed(vec![2]))
            .with_rivet(Some(rivet))
            .generate(1)
            .unwrap();
        let first = &schedule.entries_at(2)[0];
        assert_eq!(first.structure.len(), 1);
        assert_eq!(first.structure[0].kind, SectionKind::UpperCone);

        let full = &schedule.entries_at(10)[0];
        assert_eq!(full.structure.len(), 3);
        assert_eq!(full.structure[0].kind, SectionKind::LowerCone);
    }
}
