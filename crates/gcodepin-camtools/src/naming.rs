//! Output file naming
//!
//! The suffix encodes every setting that changes the printed pins, so two
//! configurations never write the same file.

use gcodepin_core::PinningConfig;
use gcodepin_gcode::format_number;
use std::path::Path;

fn num(value: f64) -> String {
    format_number(value, 3)
}

/// Derived output file name for `input`
pub fn output_file_name(input: &Path, config: &PinningConfig) -> String {
    let policy = &config.policy;
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    let mut name = format!(
        "{}_{}L_{}",
        stem,
        config.pin_height_layers(),
        if policy.diving_mode { "diving" } else { "top" }
    );
    if let Some(temp) = policy.heated_pin_temperature {
        name.push_str(&format!("_T{}", num(temp)));
    }
    if policy.nozzle_sinking > 0.0 {
        name.push_str(&format!(
            "_S{}W{}",
            num(policy.nozzle_sinking),
            num(policy.nozzle_sinking_wait_time)
        ));
    }
    if policy.spiral_mode {
        name.push_str("_spiral");
    }
    if policy.rib_inside_protrusion > 0.0 || policy.rib_clearance > 0.0 {
        name.push_str(&format!(
            "_P{}C{}",
            num(policy.rib_inside_protrusion),
            num(policy.rib_clearance)
        ));
    }
    if policy.variable_extrusion_enabled {
        name.push_str(&format!("_skew{}", num(policy.extrusion_skew_percentage)));
    }
    if policy.wipe_enabled {
        name.push_str("_wipe");
    }
    name.push_str(".gcode");
    name
}
