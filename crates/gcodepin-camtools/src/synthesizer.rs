//! Toolpath synthesizer
//!
//! Emits the command sequence of every scheduled pin occupancy and groups the
//! result by trigger layer. Commands are collected as [`GcodeLine`] records in
//! a [`ToolpathBuffer`] so that later steps can adjust the extrusion of lines
//! already emitted; nothing is rendered to text here.
//!
//! Per occupancy the order is fixed: retract, lift and travel, dive, optional
//! sink, prime, extrude, optional de-pressurize, rise, dwell, wipe and exit.

use gcodepin_core::{
    ConfigError, ExtrusionDistribution, ExtrusionMode, PinningConfig, PinningPolicy, Point2D,
};
use gcodepin_gcode::markers::pinning_layer_title;
use gcodepin_gcode::{format_number, GcodeLine, LayerBlocks};

use crate::error::{CamToolError, CamToolResult, FeasibilityError};
use crate::layout::PinSpec;
use crate::placement::AbsolutePinSet;
use crate::schedule::{Schedule, ScheduleEntry};
use crate::volume::VolumeModel;
use crate::wipe::wipe_moves;

/// Allowed relative deviation between emitted and modeled extrusion
pub const CONSERVATION_TOLERANCE: f64 = 0.05;

const EPSILON: f64 = 1e-9;

/// Ordered, editable command records of one occupancy
#[derive(Debug, Clone, Default)]
pub struct ToolpathBuffer {
    lines: Vec<GcodeLine>,
    volume_records: Vec<usize>,
}

impl ToolpathBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line that carries no modeled volume
    pub fn push(&mut self, line: GcodeLine) {
        self.lines.push(line);
    }

    /// Append a comment-only line
    pub fn push_comment(&mut self, text: impl Into<String>) {
        self.lines.push(GcodeLine::comment_only(text));
    }

    /// Append a line whose extrusion counts towards the modeled volume
    pub fn push_volume(&mut self, line: GcodeLine) {
        self.volume_records.push(self.lines.len());
        self.lines.push(line);
    }

    /// Append several lines that carry no modeled volume
    pub fn extend(&mut self, lines: impl IntoIterator<Item = GcodeLine>) {
        self.lines.extend(lines);
    }

    /// Sum of extrusion over the volume-carrying records
    pub fn volume_extruded(&self) -> f64 {
        self.volume_records
            .iter()
            .filter_map(|&i| self.lines[i].extrusion())
            .sum()
    }

    /// Withdraw `amount` of extrusion from the most recent volume records
    ///
    /// Records are decremented in place, never below zero. Returns whatever
    /// could not be withdrawn.
    pub fn absorb(&mut self, amount: f64) -> f64 {
        let mut remaining = amount;
        for &idx in self.volume_records.iter().rev() {
            if remaining <= EPSILON {
                break;
            }
            let line = &mut self.lines[idx];
            let Some(e) = line.extrusion().filter(|e| *e > 0.0) else {
                continue;
            };
            let take = e.min(remaining);
            line.set_number('E', e - take);
            remaining -= take;
        }
        remaining.max(0.0)
    }

    /// Lines in emission order
    pub fn lines(&self) -> &[GcodeLine] {
        &self.lines
    }

    /// Consume the buffer
    pub fn into_lines(self) -> Vec<GcodeLine> {
        self.lines
    }

    /// Number of lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Radius of the spiral traced inside a pin hole
pub fn spiral_radius(spec: &PinSpec, policy: &PinningPolicy) -> f64 {
    spec.radius()
        - policy.nozzle_outer_diameter / 2.0
        - policy.rib_inside_protrusion
        - policy.rib_clearance
}

/// Per-step weights of a linear skew, recentred so the mean weight is 1
///
/// Weights run from `percentage / 100` at the bottom step to its reciprocal
/// at the top step before recentring; they may turn negative for strong skews.
pub fn skew_weights(steps: usize, percentage: f64) -> Vec<f64> {
    if steps <= 1 {
        return vec![1.0; steps];
    }
    let first = percentage / 100.0;
    let last = 1.0 / first;
    let shift = (first + last) / 2.0 - 1.0;
    (0..steps)
        .map(|k| {
            let t = k as f64 / (steps - 1) as f64;
            first + (last - first) * t - shift
        })
        .collect()
}

/// Synthesizer for pin toolpaths
pub struct ToolpathSynthesizer<'a> {
    config: &'a PinningConfig,
    spec: &'a PinSpec,
    model: VolumeModel,
    mode: ExtrusionMode,
    distribution: ExtrusionDistribution,
    spiral_radius: Option<f64>,
}

impl<'a> ToolpathSynthesizer<'a> {
    /// Create a synthesizer, resolving extrusion policies once
    pub fn new(config: &'a PinningConfig, spec: &'a PinSpec) -> CamToolResult<Self> {
        let policy = &config.policy;
        if policy.one_shot && policy.blob {
            return Err(ConfigError::IncompatiblePolicies(
                "one_shot and blob extrusion are mutually exclusive".to_string(),
            )
            .into());
        }

        let spiral_radius = if policy.spiral_mode {
            let radius = spiral_radius(spec, policy);
            if radius <= 0.0 {
                return Err(CamToolError::SpiralRadius {
                    radius,
                    pin_radius: spec.radius(),
                });
            }
            Some(radius)
        } else {
            None
        };

        Ok(Self {
            config,
            spec,
            model: VolumeModel::new(spec, config.rivet, config.flow_ratio),
            mode: config.extrusion_mode(),
            distribution: config.extrusion_distribution(),
            spiral_radius,
        })
    }

    /// Resolved extrusion mode
    pub fn mode(&self) -> ExtrusionMode {
        self.mode
    }

    /// Resolved extrusion distribution
    pub fn distribution(&self) -> ExtrusionDistribution {
        self.distribution
    }

    /// Spiral radius when spiral mode is enabled
    pub fn spiral_radius(&self) -> Option<f64> {
        self.spiral_radius
    }

    /// Volume model used for the conservation check
    pub fn model(&self) -> &VolumeModel {
        &self.model
    }

    /// Synthesize every occupancy of the schedule, grouped by trigger layer
    pub fn synthesize(
        &self,
        schedule: &Schedule,
        pin_sets: &[AbsolutePinSet],
    ) -> CamToolResult<LayerBlocks> {
        let mut blocks = LayerBlocks::new();

        for layer in schedule.layers() {
            let mut entries: Vec<&ScheduleEntry> = schedule.entries_at(layer).iter().collect();
            if layer % 2 == 1 {
                entries.reverse();
            }

            let mut lines = vec![GcodeLine::comment_only(pinning_layer_title(layer))];
            for set in pin_sets {
                lines.push(GcodeLine::comment_only(format!("part {}", set.part_name)));
                for entry in &entries {
                    let center = set.positions.get(entry.pin_index).copied().ok_or_else(|| {
                        FeasibilityError::InvalidGeometry(format!(
                            "pin {} has no position in part {}",
                            entry.pin_index, set.part_name
                        ))
                    })?;
                    let buffer = self.synthesize_occupancy(entry, &set.part_name, center)?;
                    lines.extend(buffer.into_lines());
                }
            }

            for line in &mut lines {
                line.layer = layer;
            }
            blocks.insert(layer, lines);
        }

        tracing::info!(
            "Synthesized {} pin blocks, {} lines",
            blocks.len(),
            blocks.total_lines()
        );
        Ok(blocks)
    }

    /// Mode applied to one occupancy
    ///
    /// Top-only printing is always single-shot; one-shot only covers
    /// full-height occupancies and falls back to steps otherwise.
    pub fn occupancy_mode(&self, entry: &ScheduleEntry) -> ExtrusionMode {
        if !self.config.policy.diving_mode {
            return ExtrusionMode::SingleShot;
        }
        match self.mode {
            ExtrusionMode::SingleShot if entry.height_layers < self.spec.height_layers => {
                ExtrusionMode::Stepped
            }
            mode => mode,
        }
    }

    /// Extrusion length of every step of an occupancy
    pub fn step_extrusions(&self, entry: &ScheduleEntry, total: f64) -> Vec<f64> {
        let steps = entry.height_layers as usize;
        if steps == 0 {
            return Vec::new();
        }
        let even = total / steps as f64;
        match self.distribution {
            ExtrusionDistribution::Even => vec![even; steps],
            ExtrusionDistribution::Skewed { percentage } => skew_weights(steps, percentage)
                .into_iter()
                .map(|w| even * w)
                .collect(),
            ExtrusionDistribution::Geometric => {
                let lh = self.spec.layer_height;
                (0..steps)
                    .map(|k| {
                        self.model.slice_extrusion(
                            &entry.structure,
                            k as f64 * lh,
                            (k + 1) as f64 * lh,
                        )
                    })
                    .collect()
            }
        }
    }

    /// Steps after which blob extrusion is released
    ///
    /// The last step inside each structure section closes a blob, as does the
    /// final step.
    pub fn blob_closing_steps(&self, entry: &ScheduleEntry) -> Vec<bool> {
        let steps = entry.height_layers as usize;
        let lh = self.spec.layer_height;
        let mut tops = Vec::with_capacity(entry.structure.len());
        let mut acc = 0.0;
        for section in &entry.structure {
            acc += section.height;
            tops.push(acc);
        }
        let section_of = |z: f64| {
            tops.iter()
                .position(|&top| top >= z - 1e-6)
                .unwrap_or(tops.len())
        };
        (0..steps)
            .map(|k| {
                k + 1 == steps
                    || section_of((k + 1) as f64 * lh) != section_of((k + 2) as f64 * lh)
            })
            .collect()
    }

    /// Synthesize one occupancy of one pin
    pub fn synthesize_occupancy(
        &self,
        entry: &ScheduleEntry,
        part_name: &str,
        center: Point2D,
    ) -> CamToolResult<ToolpathBuffer> {
        let motion = &self.config.motion;
        let policy = &self.config.policy;
        let lh = self.spec.layer_height;
        let top = entry.layer as f64 * lh;
        let height = entry.height_mm(lh);
        let bottom = top - height;
        let pin_no = entry.pin_index + 1;
        let modeled = self.model.occupancy_extrusion(height, &entry.structure);
        let retraction_feed = motion.feed(motion.retraction_speed);

        let mut buf = ToolpathBuffer::new();
        buf.push_comment(format!(
            "Pin {} part {} layer {} (X{} Y{} Z{})",
            pin_no,
            part_name,
            entry.layer,
            format_number(center.x, 3),
            format_number(center.y, 3),
            format_number(top, 3)
        ));
        buf.push(GcodeLine::verbatim(format!(
            "M117 Pin {} at layer {}",
            pin_no, entry.layer
        )));
        if let Some(temp) = policy.heated_pin_temperature {
            buf.push(
                GcodeLine::new("M109")
                    .with('S', temp)
                    .with_comment("heat nozzle for pin"),
            );
        }
        buf.push(GcodeLine::new("M83").with_comment("relative extrusion"));

        buf.push(
            GcodeLine::new("G1")
                .with('E', -motion.retraction_length)
                .with('F', retraction_feed)
                .with_comment("retract"),
        );
        self.relative_z(&mut buf, motion.z_hop_length, motion.feed(motion.z_lift_speed), "lift");
        buf.push(
            GcodeLine::new("G1")
                .with('X', center.x)
                .with('Y', center.y)
                .with('F', motion.feed(motion.xy_travel_speed))
                .with_comment("move to pin"),
        );
        self.relative_z(&mut buf, -motion.z_hop_length, motion.feed(motion.z_drop_speed), "drop");

        let mut z = top;
        if policy.diving_mode {
            buf.push(
                GcodeLine::new("G1")
                    .with('Z', bottom)
                    .with('F', motion.feed(motion.z_drop_speed))
                    .with_comment("dive"),
            );
            z = bottom;
        }

        if policy.nozzle_sinking > 0.0
            && (z >= policy.nozzle_sinking - EPSILON
                || (entry.first_occupancy && policy.sinking_on_first_layer))
        {
            let sinking_feed = motion.feed(policy.nozzle_sinking_speed);
            let sunk = z - policy.nozzle_sinking;
            buf.push(
                GcodeLine::new("G1")
                    .with('Z', sunk)
                    .with('F', sinking_feed)
                    .with_comment("sink"),
            );
            if policy.nozzle_sinking_wait_time > 0.0 {
                buf.push(GcodeLine::new("G4").with('S', policy.nozzle_sinking_wait_time));
            }
            if policy.nozzle_extrude_sunk {
                z = sunk;
            } else {
                buf.push(GcodeLine::new("G1").with('Z', z).with('F', sinking_feed));
            }
        }

        buf.push(
            GcodeLine::new("G1")
                .with('E', motion.retraction_length)
                .with('F', retraction_feed)
                .with_comment("prime"),
        );
        if policy.pressure_e_length > 0.0 {
            buf.push(
                GcodeLine::new("G1")
                    .with('E', policy.pressure_e_length)
                    .with('F', motion.feed(policy.pressure_e_speed))
                    .with_comment("pressurize"),
            );
        }

        match self.occupancy_mode(entry) {
            ExtrusionMode::SingleShot => self.extrude_single(&mut buf, center, &mut z, top, modeled),
            ExtrusionMode::Stepped => {
                self.extrude_steps(&mut buf, entry, center, &mut z, bottom, modeled, false)
            }
            ExtrusionMode::Blob => {
                self.extrude_steps(&mut buf, entry, center, &mut z, bottom, modeled, true)
            }
        }

        if policy.pressure_e_length > 0.0 {
            buf.push(
                GcodeLine::new("G1")
                    .with('E', -policy.pressure_e_length)
                    .with('F', motion.feed(policy.pressure_e_speed))
                    .with_comment("depressurize"),
            );
        }
        if z < top - EPSILON {
            buf.push(
                GcodeLine::new("G1")
                    .with('Z', top)
                    .with('F', motion.feed(motion.z_lift_speed)),
            );
        }
        if policy.dwell_time > 0.0 {
            buf.push(GcodeLine::new("G4").with('S', policy.dwell_time));
        }
        if policy.wipe_enabled {
            buf.extend(wipe_moves(center, motion.feed(motion.wipe_speed)));
        }
        self.relative_z(&mut buf, motion.z_hop_length, motion.feed(motion.z_lift_speed), "exit");
        if let Some(temp) = policy.restore_temperature {
            buf.push(GcodeLine::new("M104").with('S', temp));
        }
        buf.push_comment(format!("End pin {} at layer {}", pin_no, entry.layer));

        let emitted = buf.volume_extruded();
        if modeled > 0.0 && ((emitted - modeled) / modeled).abs() > CONSERVATION_TOLERANCE {
            return Err(CamToolError::ExtrusionMismatch {
                pin: entry.pin_index,
                layer: entry.layer,
                emitted,
                modeled,
            });
        }
        tracing::debug!(
            "Pin {} part {} layer {}: {} layers, E {:.5} mm",
            pin_no,
            part_name,
            entry.layer,
            entry.height_layers,
            emitted
        );
        Ok(buf)
    }

    fn relative_z(&self, buf: &mut ToolpathBuffer, dz: f64, feed: f64, comment: &str) {
        buf.push(GcodeLine::new("G91"));
        buf.push(
            GcodeLine::new("G1")
                .with('Z', dz)
                .with('F', feed)
                .with_comment(comment),
        );
        buf.push(GcodeLine::new("G90"));
    }

    fn extrusion_feed(&self) -> f64 {
        self.config.motion.feed(self.config.motion.extrusion_speed)
    }

    fn travel_feed(&self) -> f64 {
        self.config.motion.feed(self.config.motion.xy_travel_speed)
    }

    fn extrude_single(
        &self,
        buf: &mut ToolpathBuffer,
        center: Point2D,
        z: &mut f64,
        top: f64,
        total: f64,
    ) {
        let feed = self.extrusion_feed();
        if !self.config.policy.diving_mode {
            buf.push_volume(
                GcodeLine::new("G1")
                    .with('E', total)
                    .with('F', feed)
                    .with_comment("extrude pin"),
            );
            return;
        }

        match self.spiral_radius {
            Some(r) => {
                buf.push(
                    GcodeLine::new("G1")
                        .with('X', center.x + r)
                        .with('Y', center.y)
                        .with('F', self.travel_feed()),
                );
                buf.push_volume(
                    GcodeLine::new("G2")
                        .with('X', center.x + r)
                        .with('Y', center.y)
                        .with('I', -r)
                        .with('J', 0.0)
                        .with('Z', top)
                        .with('E', total)
                        .with('F', feed)
                        .with_comment("extrude pin"),
                );
                buf.push(
                    GcodeLine::new("G1")
                        .with('X', center.x)
                        .with('Y', center.y)
                        .with('F', self.travel_feed()),
                );
            }
            None => buf.push_volume(
                GcodeLine::new("G1")
                    .with('Z', top)
                    .with('E', total)
                    .with('F', feed)
                    .with_comment("extrude pin"),
            ),
        }
        *z = top;
    }

    fn step_move(&self, center: Point2D, z: f64, e: Option<f64>) -> GcodeLine {
        let mut line = match self.spiral_radius {
            Some(r) => GcodeLine::new("G2")
                .with('X', center.x + r)
                .with('Y', center.y)
                .with('I', -r)
                .with('J', 0.0)
                .with('Z', z),
            None => GcodeLine::new("G1").with('Z', z),
        };
        if let Some(e) = e {
            line = line.with('E', e);
        }
        line.with('F', self.extrusion_feed())
    }

    #[allow(clippy::too_many_arguments)]
    fn extrude_steps(
        &self,
        buf: &mut ToolpathBuffer,
        entry: &ScheduleEntry,
        center: Point2D,
        z: &mut f64,
        bottom: f64,
        total: f64,
        blob: bool,
    ) {
        let policy = &self.config.policy;
        let lh = self.spec.layer_height;
        let steps = entry.height_layers as usize;
        let amounts = self.step_extrusions(entry, total);
        let closing = if blob {
            self.blob_closing_steps(entry)
        } else {
            Vec::new()
        };

        if let Some(r) = self.spiral_radius {
            buf.push(
                GcodeLine::new("G1")
                    .with('X', center.x + r)
                    .with('Y', center.y)
                    .with('F', self.travel_feed()),
            );
        }

        let mut carry = 0.0;
        let mut pending: f64 = 0.0;
        for (k, &amount) in amounts.iter().enumerate() {
            let z_step = bottom + (k + 1) as f64 * lh;
            let mut e = amount;

            if policy.no_pin_retraction {
                if e < 0.0 {
                    let mut need = -e;
                    if blob {
                        let take = need.min(pending.max(0.0));
                        pending -= take;
                        need -= take;
                    }
                    carry += buf.absorb(need);
                    e = 0.0;
                } else if carry > 0.0 {
                    let take = carry.min(e);
                    e -= take;
                    carry -= take;
                }
            }

            if blob {
                pending += e;
                buf.push(self.step_move(center, z_step, None));
                if closing.get(k).copied().unwrap_or(true) && pending.abs() > EPSILON {
                    buf.push_volume(
                        GcodeLine::new("G1")
                            .with('E', pending)
                            .with('F', self.config.motion.feed(policy.blob_feedrate))
                            .with_comment("blob"),
                    );
                    pending = 0.0;
                }
            } else if e.abs() > EPSILON {
                buf.push_volume(self.step_move(center, z_step, Some(e)));
            } else {
                buf.push(self.step_move(center, z_step, None));
            }
        }

        if carry > EPSILON {
            tracing::warn!(
                "Pin {} layer {}: {:.5} mm of negative extrusion could not be absorbed",
                entry.pin_index + 1,
                entry.layer,
                carry
            );
        }

        if self.spiral_radius.is_some() {
            buf.push(
                GcodeLine::new("G1")
                    .with('X', center.x)
                    .with('Y', center.y)
                    .with('F', self.travel_feed()),
            );
        }
        if steps > 0 {
            *z = bottom + steps as f64 * lh;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PinLayoutPlanner;
    use crate::schedule::ScheduleGenerator;

    fn spec(config: &PinningConfig) -> PinSpec {
        PinLayoutPlanner::new(&config.cross_section, &config.pin)
            .plan()
            .unwrap()
            .spec
    }

    fn entry(layer: u32, height_layers: u32) -> ScheduleEntry {
        ScheduleEntry {
            pin_index: 0,
            layer,
            height_layers,
            first_occupancy: false,
            structure: Vec::new(),
        }
    }

    fn renders(buf: &ToolpathBuffer) -> Vec<String> {
        buf.lines().iter().map(GcodeLine::render).collect()
    }

    #[test]
    fn test_skew_weights_mean_is_one() {
        let w = skew_weights(5, 200.0);
        let sum: f64 = w.iter().sum();
        assert!((sum - 5.0).abs() < 1e-12);
        assert!(w[0] > w[4]);
        assert!((w[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_absorb_decrements_latest_records() {
        let mut buf = ToolpathBuffer::new();
        buf.push_volume(GcodeLine::new("G1").with('E', 0.3));
        buf.push_volume(GcodeLine::new("G1").with('E', 0.1));
        let remaining = buf.absorb(0.25);
        assert!(remaining.abs() < 1e-12);
        assert_eq!(buf.lines()[1].extrusion(), Some(0.0));
        assert!((buf.lines()[0].extrusion().unwrap() - 0.15).abs() < 1e-12);
        assert!((buf.volume_extruded() - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_stepped_occupancy_sequence() {
        let config = PinningConfig::default();
        let spec = spec(&config);
        let synth = ToolpathSynthesizer::new(&config, &spec).unwrap();
        let buf = synth
            .synthesize_occupancy(&entry(16, 8), "part_1", Point2D::new(10.0, 5.0))
            .unwrap();
        let lines = renders(&buf);

        assert_eq!(lines[0], "; Pin 1 part part_1 layer 16 (X10 Y5 Z1.6)");
        assert_eq!(lines[1], "M117 Pin 1 at layer 16");
        assert_eq!(lines[3], "G1 E-0.5 F1500 ; retract");
        assert!(lines.contains(&"G1 X10 Y5 F9000 ; move to pin".to_string()));
        assert!(lines.contains(&"G1 Z0.8 F600 ; dive".to_string()));
        let steps = lines.iter().filter(|l| l.starts_with("G1 Z") && l.contains(" E")).count();
        assert_eq!(steps, 8);
        assert_eq!(lines.last().unwrap(), "; End pin 1 at layer 16");

        let modeled = synth.model().occupancy_extrusion(0.8, &[]);
        assert!((buf.volume_extruded() - modeled).abs() < 1e-9);
    }

    #[test]
    fn test_single_shot_full_height() {
        let mut config = PinningConfig::default();
        config.policy.one_shot = true;
        let spec = spec(&config);
        let synth = ToolpathSynthesizer::new(&config, &spec).unwrap();

        let full = synth
            .synthesize_occupancy(&entry(8, 8), "p", Point2D::new(0.0, 0.0))
            .unwrap();
        let extruding = full.lines().iter().filter(|l| l.comment == "extrude pin").count();
        assert_eq!(extruding, 1);

        assert_eq!(synth.occupancy_mode(&entry(20, 4)), ExtrusionMode::Stepped);
    }

    #[test]
    fn test_spiral_radius_error() {
        let mut config = PinningConfig::default();
        config.pin.dimension = 1.0;
        config.cross_section.infill_percentage = 5.9;
        config.policy.spiral_mode = true;
        let spec = spec(&config);
        let err = ToolpathSynthesizer::new(&config, &spec).err().unwrap();
        assert!(matches!(err, CamToolError::SpiralRadius { .. }));
    }

    #[test]
    fn test_blob_releases_at_final_step() {
        let mut config = PinningConfig::default();
        config.policy.blob = true;
        let spec = spec(&config);
        let synth = ToolpathSynthesizer::new(&config, &spec).unwrap();
        let buf = synth
            .synthesize_occupancy(&entry(8, 8), "p", Point2D::new(0.0, 0.0))
            .unwrap();
        let blobs: Vec<_> = buf.lines().iter().filter(|l| l.comment == "blob").collect();
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].number('F'), Some(6000.0));
    }

    #[test]
    fn test_no_pin_retraction_never_emits_negative_steps() {
        let mut config = PinningConfig::default();
        config.policy.variable_extrusion_enabled = true;
        config.policy.extrusion_skew_percentage = 400.0;
        config.policy.no_pin_retraction = true;
        let spec = spec(&config);
        let synth = ToolpathSynthesizer::new(&config, &spec).unwrap();
        let buf = synth
            .synthesize_occupancy(&entry(8, 8), "p", Point2D::new(0.0, 0.0))
            .unwrap();

        let negative_steps = buf
            .lines()
            .iter()
            .filter(|l| l.has_command("G1") && l.number('Z').is_some())
            .filter_map(GcodeLine::extrusion)
            .filter(|e| *e < 0.0)
            .count();
        assert_eq!(negative_steps, 0);
        let modeled = synth.model().occupancy_extrusion(0.8, &[]);
        assert!((buf.volume_extruded() - modeled).abs() < 1e-9);
    }
}
