//! Unit conversion utilities
//!
//! Motion speeds may be configured in mm/s or mm/min; everything emitted into
//! G-code is mm/min.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Feed rate units selection
///
/// Config files spell the units as text, e.g. `"mm/s"` or `"mm_per_min"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FeedRateUnits {
    /// Millimeters per minute
    MmPerMin,
    /// Millimeters per second
    MmPerSec,
}

impl Default for FeedRateUnits {
    fn default() -> Self {
        Self::MmPerMin
    }
}

impl fmt::Display for FeedRateUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MmPerMin => write!(f, "mm/min"),
            Self::MmPerSec => write!(f, "mm/sec"),
        }
    }
}

impl FromStr for FeedRateUnits {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(' ', "").as_str() {
            "mm/min" | "mm_per_min" => Ok(Self::MmPerMin),
            "mm/s" | "mm/sec" | "mm_per_sec" => Ok(Self::MmPerSec),
            _ => Err(format!("Unknown feed rate units: {}", s)),
        }
    }
}

impl TryFrom<String> for FeedRateUnits {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FeedRateUnits> for String {
    fn from(units: FeedRateUnits) -> Self {
        units.to_string()
    }
}

/// Convert a feed rate expressed in `units` to mm/min
pub fn to_mm_per_min(value: f64, units: FeedRateUnits) -> f64 {
    match units {
        FeedRateUnits::MmPerMin => value,
        FeedRateUnits::MmPerSec => value * 60.0,
    }
}

/// Format feed rate value for display
///
/// * `value_mm_per_min` - Feed rate in mm/min
/// * `units` - Target feed rate units
pub fn format_feed_rate(value_mm_per_min: f64, units: FeedRateUnits) -> String {
    let value = match units {
        FeedRateUnits::MmPerMin => value_mm_per_min,
        FeedRateUnits::MmPerSec => value_mm_per_min / 60.0,
    };
    format!("{:.3} {}", value, units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_rate_conversion() {
        assert_eq!(to_mm_per_min(1000.0, FeedRateUnits::MmPerMin), 1000.0);
        assert_eq!(to_mm_per_min(30.0, FeedRateUnits::MmPerSec), 1800.0);
    }

    #[test]
    fn test_format_feed_rate() {
        assert_eq!(format_feed_rate(1000.0, FeedRateUnits::MmPerMin), "1000.000 mm/min");
        assert_eq!(format_feed_rate(1000.0, FeedRateUnits::MmPerSec), "16.667 mm/sec");
    }

    #[test]
    fn test_parse_units() {
        assert_eq!("mm/min".parse::<FeedRateUnits>().unwrap(), FeedRateUnits::MmPerMin);
        assert_eq!("MM/S".parse::<FeedRateUnits>().unwrap(), FeedRateUnits::MmPerSec);
        assert!("in/min".parse::<FeedRateUnits>().is_err());
    }

    #[test]
    fn test_units_serde_as_text() {
        let units: FeedRateUnits = serde_json::from_str("\"mm/s\"").unwrap();
        assert_eq!(units, FeedRateUnits::MmPerSec);
        assert_eq!(serde_json::to_string(&FeedRateUnits::MmPerMin).unwrap(), "\"mm/min\"");
        assert!(serde_json::from_str::<FeedRateUnits>("\"furlongs\"").is_err());
    }
}
