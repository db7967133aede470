//! # gcodepin Core
//!
//! Core types, configuration, and error handling for gcodepin.
//! Provides the value objects shared by the planner, the toolpath
//! synthesizer and the G-code merger.

pub mod config;
pub mod error;
pub mod types;
pub mod units;

pub use config::{
    layer_count, ExtrusionDistribution, ExtrusionMode, MotionSettings, PinRequest, PinningConfig,
    PinningPolicy,
};

pub use error::{ConfigError, ConfigResult, Error, Result};

pub use types::{
    CrossSection, PartPlacement, PinHeight, PinShape, Point2D, RivetProfile, StaggerRule,
    StaggerSettings,
};

pub use units::{format_feed_rate, to_mm_per_min, FeedRateUnits};
