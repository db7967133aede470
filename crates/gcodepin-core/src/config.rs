//! Pinning configuration
//!
//! One validated value object carries every setting consumed by the planner,
//! the schedule generator, the synthesizer and the merger. Defaults are
//! enumerated once in the `Default` impls below. Files can be JSON or TOML.
//!
//! Configuration is organized into logical sections:
//! - Cross-section and pin layout request
//! - Part placements on the build plate
//! - Motion settings (speeds, hop, retraction)
//! - Pinning policies (diving, spiral, sinking, extrusion shaping, wipe)
//! - Optional rivet profile and staggering

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult, Result};
use crate::types::{
    CrossSection, PartPlacement, PinHeight, PinShape, RivetProfile, StaggerRule, StaggerSettings,
};
use crate::units::{to_mm_per_min, FeedRateUnits};

/// Tolerance used when converting heights to whole layer counts
const LAYER_EPSILON: f64 = 1e-9;

/// Number of whole layers that fit in `height_mm`
pub fn layer_count(height_mm: f64, layer_height: f64) -> u32 {
    if height_mm <= 0.0 || layer_height <= 0.0 {
        return 0;
    }
    (height_mm / layer_height + LAYER_EPSILON).floor() as u32
}

/// Requested pin layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinRequest {
    /// Pin cross-section shape
    pub shape: PinShape,
    /// Diameter (circular) or side (square), mm
    pub dimension: f64,
    /// Number of pins along the largest side
    pub count_largest_side: u32,
    /// Number of pins along the smallest side
    pub count_smallest_side: u32,
    /// Pin height, as layers or mm
    pub height: PinHeight,
    /// Print layer height (mm)
    pub layer_height: f64,
}

impl PinRequest {
    /// Total number of pin slots in the grid
    pub fn pin_count(&self) -> u32 {
        self.count_largest_side * self.count_smallest_side
    }

    /// Pin height in mm
    pub fn height_mm(&self) -> f64 {
        self.height.to_mm(self.layer_height)
    }

    /// Pin height in whole layers
    pub fn height_layers(&self) -> u32 {
        layer_count(self.height_mm(), self.layer_height)
    }
}

impl Default for PinRequest {
    fn default() -> Self {
        Self {
            shape: PinShape::Circular,
            dimension: 2.0,
            count_largest_side: 3,
            count_smallest_side: 1,
            height: PinHeight::Layers(8),
            layer_height: 0.1,
        }
    }
}

/// Motion speeds and distances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSettings {
    /// Units the speeds below are written in
    pub feed_rate_units: FeedRateUnits,
    /// Z lift speed
    pub z_lift_speed: f64,
    /// XY travel speed
    pub xy_travel_speed: f64,
    /// Z drop (dive) speed
    pub z_drop_speed: f64,
    /// Pin extrusion speed
    pub extrusion_speed: f64,
    /// Wipe motion speed
    pub wipe_speed: f64,
    /// Filament retraction speed
    pub retraction_speed: f64,
    /// Z hop before travelling to a pin (mm)
    pub z_hop_length: f64,
    /// Filament retraction length (mm)
    pub retraction_length: f64,
}

impl MotionSettings {
    /// Convert a configured speed into mm/min
    pub fn feed(&self, speed: f64) -> f64 {
        to_mm_per_min(speed, self.feed_rate_units)
    }
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            feed_rate_units: FeedRateUnits::MmPerMin,
            z_lift_speed: 1500.0,
            xy_travel_speed: 9000.0,
            z_drop_speed: 600.0,
            extrusion_speed: 1800.0,
            wipe_speed: 1800.0,
            retraction_speed: 1500.0,
            z_hop_length: 0.2,
            retraction_length: 0.5,
        }
    }
}

/// Pinning routine policies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinningPolicy {
    /// Dive into the pre-printed hole before extruding
    pub diving_mode: bool,
    /// Trace a circle while rising (diving mode only)
    pub spiral_mode: bool,
    /// Outer diameter of the nozzle tip (mm)
    pub nozzle_outer_diameter: f64,
    /// Rib protrusion inside the hole wall (mm)
    pub rib_inside_protrusion: f64,
    /// Clearance kept from the ribs (mm)
    pub rib_clearance: f64,
    /// Extra sinking depth below the hole bottom (mm), 0 disables
    pub nozzle_sinking: f64,
    /// Sinking speed
    pub nozzle_sinking_speed: f64,
    /// Dwell after sinking (s)
    pub nozzle_sinking_wait_time: f64,
    /// Allow sinking on occupancies that start on the first layer
    pub sinking_on_first_layer: bool,
    /// Start extruding from the sunk position
    pub nozzle_extrude_sunk: bool,
    /// Wipe around the pin after extrusion
    pub wipe_enabled: bool,
    /// Skew extrusion across the steps of an occupancy
    pub variable_extrusion_enabled: bool,
    /// Skew factor in percent; 100 is no skew
    pub extrusion_skew_percentage: f64,
    /// Distribute extrusion following the local pin radius
    pub geometrical_extrusion_enabled: bool,
    /// Extrude full-height occupancies in a single motion
    pub one_shot: bool,
    /// Collapse step extrusion into blobs at section boundaries
    pub blob: bool,
    /// Feed rate of blob extrusion moves
    pub blob_feedrate: f64,
    /// Never retract material inside a pin
    pub no_pin_retraction: bool,
    /// Dwell after the pin is extruded (s), 0 disables
    pub dwell_time: f64,
    /// Pressure compensation extrusion length (mm), 0 disables
    pub pressure_e_length: f64,
    /// Pressure compensation speed
    pub pressure_e_speed: f64,
    /// Nozzle temperature used while printing pins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heated_pin_temperature: Option<f64>,
    /// Temperature restored after each pin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore_temperature: Option<f64>,
}

impl Default for PinningPolicy {
    fn default() -> Self {
        Self {
            diving_mode: true,
            spiral_mode: false,
            nozzle_outer_diameter: 1.45,
            rib_inside_protrusion: 0.0,
            rib_clearance: 0.0,
            nozzle_sinking: 0.0,
            nozzle_sinking_speed: 1800.0,
            nozzle_sinking_wait_time: 0.0,
            sinking_on_first_layer: false,
            nozzle_extrude_sunk: false,
            wipe_enabled: false,
            variable_extrusion_enabled: false,
            extrusion_skew_percentage: 100.0,
            geometrical_extrusion_enabled: false,
            one_shot: false,
            blob: false,
            blob_feedrate: 6000.0,
            no_pin_retraction: false,
            dwell_time: 0.0,
            pressure_e_length: 0.0,
            pressure_e_speed: 6000.0,
            heated_pin_temperature: None,
            restore_temperature: None,
        }
    }
}

/// How the extrusion of one occupancy is laid down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtrusionMode {
    /// One motion carries the full extrusion length of a full-height occupancy
    SingleShot,
    /// One extruding motion per layer step
    Stepped,
    /// Non-extruding steps, extrusion released at blob-closing steps
    Blob,
}

/// How extrusion is split across the steps of one occupancy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtrusionDistribution {
    /// Every step gets the same share
    Even,
    /// Linear skew from `percentage/100` at the bottom to its reciprocal at the top
    Skewed {
        /// Skew percentage, 100 is even
        percentage: f64,
    },
    /// Share follows the local cross-section of the pin solid
    Geometric,
}

/// Complete pinning configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinningConfig {
    /// Specimen cross-section
    pub cross_section: CrossSection,
    /// Requested pin layout
    pub pin: PinRequest,
    /// Part instances on the build plate
    pub parts: Vec<PartPlacement>,
    /// Specimen height (mm)
    pub specimen_height_mm: f64,
    /// Extrusion multiplier
    pub flow_ratio: f64,
    /// First completed layer that may receive pins
    pub start_layer: u32,
    /// Motion settings
    pub motion: MotionSettings,
    /// Pinning policies
    pub policy: PinningPolicy,
    /// Optional rivet profile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rivet: Option<RivetProfile>,
    /// Optional staggering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stagger: Option<StaggerSettings>,
}

impl Default for PinningConfig {
    fn default() -> Self {
        Self {
            cross_section: CrossSection::default(),
            pin: PinRequest::default(),
            parts: vec![PartPlacement::new("part_1", 0.0, 0.0, 0.0)],
            specimen_height_mm: 10.0,
            flow_ratio: 1.0,
            start_layer: 0,
            motion: MotionSettings::default(),
            policy: PinningPolicy::default(),
            rivet: None,
            stagger: None,
        }
    }
}

fn require_positive(key: &str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, format!("must be > 0, got {}", value)))
    }
}

fn require_non_negative(key: &str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, format!("must be >= 0, got {}", value)))
    }
}

impl PinningConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()).into());
        };

        config.validate()?;
        tracing::debug!("Loaded pinning config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()).into());
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let cs = &self.cross_section;
        require_positive("cross_section.largest_side", cs.largest_side)?;
        require_positive("cross_section.smallest_side", cs.smallest_side)?;
        require_non_negative("cross_section.least_edge_margin", cs.least_edge_margin)?;
        require_positive("cross_section.infill_percentage", cs.infill_percentage)?;

        let pin = &self.pin;
        require_positive("pin.dimension", pin.dimension)?;
        require_positive("pin.layer_height", pin.layer_height)?;
        if pin.count_largest_side == 0 || pin.count_smallest_side == 0 {
            return Err(ConfigError::invalid("pin.count", "pin counts must be >= 1"));
        }
        if pin.height_layers() == 0 {
            return Err(ConfigError::invalid(
                "pin.height",
                "pin must be at least one layer high",
            ));
        }

        if self.parts.is_empty() {
            return Err(ConfigError::invalid("parts", "at least one part is required"));
        }
        require_positive("specimen_height_mm", self.specimen_height_mm)?;
        if self.total_layers() == 0 {
            return Err(ConfigError::invalid(
                "specimen_height_mm",
                "specimen must be at least one layer high",
            ));
        }
        require_positive("flow_ratio", self.flow_ratio)?;

        let m = &self.motion;
        require_positive("motion.z_lift_speed", m.z_lift_speed)?;
        require_positive("motion.xy_travel_speed", m.xy_travel_speed)?;
        require_positive("motion.z_drop_speed", m.z_drop_speed)?;
        require_positive("motion.extrusion_speed", m.extrusion_speed)?;
        require_positive("motion.retraction_speed", m.retraction_speed)?;
        require_non_negative("motion.z_hop_length", m.z_hop_length)?;
        require_non_negative("motion.retraction_length", m.retraction_length)?;

        let p = &self.policy;
        require_non_negative("policy.nozzle_sinking", p.nozzle_sinking)?;
        require_non_negative("policy.nozzle_sinking_wait_time", p.nozzle_sinking_wait_time)?;
        require_non_negative("policy.dwell_time", p.dwell_time)?;
        require_non_negative("policy.pressure_e_length", p.pressure_e_length)?;
        require_non_negative("policy.rib_inside_protrusion", p.rib_inside_protrusion)?;
        require_non_negative("policy.rib_clearance", p.rib_clearance)?;
        if p.nozzle_sinking > 0.0 {
            require_positive("policy.nozzle_sinking_speed", p.nozzle_sinking_speed)?;
        }
        if p.wipe_enabled {
            require_positive("motion.wipe_speed", m.wipe_speed)?;
        }
        if p.variable_extrusion_enabled {
            require_positive("policy.extrusion_skew_percentage", p.extrusion_skew_percentage)?;
        }
        if p.blob {
            require_positive("policy.blob_feedrate", p.blob_feedrate)?;
        }
        if p.pressure_e_length > 0.0 {
            require_positive("policy.pressure_e_speed", p.pressure_e_speed)?;
        }
        if let Some(t) = p.heated_pin_temperature {
            require_positive("policy.heated_pin_temperature", t)?;
        }
        if p.one_shot && p.blob {
            return Err(ConfigError::IncompatiblePolicies(
                "one_shot and blob extrusion are mutually exclusive".to_string(),
            ));
        }
        if p.spiral_mode && !p.diving_mode {
            return Err(ConfigError::IncompatiblePolicies(
                "spiral_mode requires diving_mode".to_string(),
            ));
        }

        if let Some(rivet) = &self.rivet {
            if pin.shape != PinShape::Circular {
                return Err(ConfigError::IncompatiblePolicies(
                    "a rivet profile requires circular pins".to_string(),
                ));
            }
            require_positive("rivet.cone_radius", rivet.cone_radius)?;
            require_non_negative("rivet.cone_height", rivet.cone_height)?;
            require_positive("rivet.cylinder_radius", rivet.cylinder_radius)?;
            require_non_negative("rivet.cylinder_height", rivet.cylinder_height)?;
            require_positive("rivet.nominal_height", rivet.nominal_height())?;
        }

        if let StaggerRule::Fixed(layers) = self.stagger_rule() {
            let phl = pin.height_layers();
            if let Some(bad) = layers.iter().find(|&&l| l == 0 || l > phl) {
                return Err(ConfigError::invalid(
                    "stagger.fixed_start_layers",
                    format!("start layer {} outside 1..={}", bad, phl),
                ));
            }
        }

        Ok(())
    }

    /// Pin height (mm)
    pub fn pin_height_mm(&self) -> f64 {
        self.pin.height_mm()
    }

    /// Pin height in whole layers
    pub fn pin_height_layers(&self) -> u32 {
        self.pin.height_layers()
    }

    /// Number of layers in the specimen
    pub fn total_layers(&self) -> u32 {
        layer_count(self.specimen_height_mm, self.pin.layer_height)
    }

    /// Resolved extrusion mode
    pub fn extrusion_mode(&self) -> ExtrusionMode {
        if self.policy.blob {
            ExtrusionMode::Blob
        } else if self.policy.one_shot || !self.policy.diving_mode {
            ExtrusionMode::SingleShot
        } else {
            ExtrusionMode::Stepped
        }
    }

    /// Resolved per-step extrusion distribution
    pub fn extrusion_distribution(&self) -> ExtrusionDistribution {
        if self.policy.geometrical_extrusion_enabled {
            ExtrusionDistribution::Geometric
        } else if self.policy.variable_extrusion_enabled {
            ExtrusionDistribution::Skewed {
                percentage: self.policy.extrusion_skew_percentage,
            }
        } else {
            ExtrusionDistribution::Even
        }
    }

    /// Resolved staggering rule
    pub fn stagger_rule(&self) -> StaggerRule {
        self.stagger
            .as_ref()
            .map(StaggerSettings::rule)
            .unwrap_or(StaggerRule::None)
    }

    /// Flatten every setting into dotted `key: value` pairs
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        match serde_json::to_value(self) {
            Ok(value) => flatten_value("", &value, &mut out),
            Err(e) => tracing::warn!("Failed to flatten pinning config: {}", e),
        }
        out
    }
}

fn flatten_value(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_value(&path, child, out);
            }
        }
        Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PinningConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pin_height_layers(), 8);
        assert_eq!(config.total_layers(), 100);
    }

    #[test]
    fn test_layer_count_tolerates_float_noise() {
        assert_eq!(layer_count(0.6, 0.12), 5);
        assert_eq!(layer_count(7.32, 0.12), 61);
        assert_eq!(layer_count(0.0, 0.1), 0);
    }

    #[test]
    fn test_one_shot_and_blob_conflict() {
        let mut config = PinningConfig::default();
        config.policy.one_shot = true;
        config.policy.blob = true;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::IncompatiblePolicies(_))
        ));
    }

    #[test]
    fn test_rivet_requires_circular_pins() {
        let mut config = PinningConfig::default();
        config.pin.shape = PinShape::Square;
        config.rivet = Some(RivetProfile {
            cone_radius: 0.7,
            cone_height: 0.4,
            cylinder_radius: 1.0,
            cylinder_height: 0.0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fixed_start_layers_bounded_by_pin_height() {
        let mut config = PinningConfig::default();
        config.stagger = Some(StaggerSettings {
            start_layer_offset: None,
            fixed_start_layers: vec![8, 9],
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("stagger.fixed_start_layers"));
    }

    #[test]
    fn test_extrusion_mode_resolution() {
        let mut config = PinningConfig::default();
        assert_eq!(config.extrusion_mode(), ExtrusionMode::Stepped);

        config.policy.one_shot = true;
        assert_eq!(config.extrusion_mode(), ExtrusionMode::SingleShot);

        config.policy.one_shot = false;
        config.policy.blob = true;
        assert_eq!(config.extrusion_mode(), ExtrusionMode::Blob);

        config.policy.blob = false;
        config.policy.diving_mode = false;
        assert_eq!(config.extrusion_mode(), ExtrusionMode::SingleShot);
    }

    #[test]
    fn test_distribution_resolution() {
        let mut config = PinningConfig::default();
        assert_eq!(config.extrusion_distribution(), ExtrusionDistribution::Even);

        config.policy.variable_extrusion_enabled = true;
        config.policy.extrusion_skew_percentage = 200.0;
        assert_eq!(
            config.extrusion_distribution(),
            ExtrusionDistribution::Skewed { percentage: 200.0 }
        );

        config.policy.geometrical_extrusion_enabled = true;
        assert_eq!(
            config.extrusion_distribution(),
            ExtrusionDistribution::Geometric
        );
    }

    #[test]
    fn test_flatten_uses_dotted_keys() {
        let config = PinningConfig::default();
        let flat = config.flatten();
        assert!(flat
            .iter()
            .any(|(k, v)| k == "pin.shape" && v == "circular"));
        assert!(flat.iter().any(|(k, _)| k == "motion.retraction_length"));
        assert!(flat.iter().any(|(k, _)| k == "parts"));
    }
}
