//! Layer tracking
//!
//! Parsed lines are tagged with the layer they belong to. How the layer is
//! derived depends on the slicer output, so the rule sits behind the
//! [`LayerTracker`] trait.

use super::line::GcodeLine;
use crate::markers::LAYER_CHANGE;

/// Assigns layers to lines as a document is read top to bottom
pub trait LayerTracker {
    /// Observe the next line and return the layer it belongs to
    fn observe(&mut self, line: &GcodeLine) -> u32;

    /// Layer of the most recently observed line
    fn current_layer(&self) -> u32;

    /// Forget all state before a new document
    fn reset(&mut self);
}

/// Layer = round(Z / layer_height), Z taken from absolute moves or `;Z:` comments
#[derive(Debug, Clone)]
pub struct ZHeightTracker {
    layer_height: f64,
    z: f64,
    relative: bool,
}

impl ZHeightTracker {
    /// Create a tracker for the given layer height
    pub fn new(layer_height: f64) -> Self {
        debug_assert!(layer_height > 0.0, "layer height must be positive");
        Self {
            layer_height,
            z: 0.0,
            relative: false,
        }
    }

    /// Last absolute Z seen
    pub fn z(&self) -> f64 {
        self.z
    }
}

impl LayerTracker for ZHeightTracker {
    fn observe(&mut self, line: &GcodeLine) -> u32 {
        match line.command.as_deref() {
            Some("G90") => self.relative = false,
            Some("G91") => self.relative = true,
            Some(_) if !self.relative => {
                if let Some(z) = line.number('Z') {
                    self.z = z;
                }
            }
            Some(_) => {}
            None => {
                if let Some(z) = line
                    .comment
                    .strip_prefix("Z:")
                    .and_then(|v| v.trim().parse::<f64>().ok())
                {
                    self.z = z;
                }
            }
        }
        self.current_layer()
    }

    fn current_layer(&self) -> u32 {
        (self.z / self.layer_height).round().max(0.0) as u32
    }

    fn reset(&mut self) {
        self.z = 0.0;
        self.relative = false;
    }
}

/// Counts layer-change markers
///
/// The marker line itself still belongs to the layer it completes; the
/// count advances on the following line.
#[derive(Debug, Clone, Default)]
pub struct MarkerCountTracker {
    count: u32,
    pending: bool,
}

impl MarkerCountTracker {
    /// Create a tracker starting at layer 0
    pub fn new() -> Self {
        Self::default()
    }
}

impl LayerTracker for MarkerCountTracker {
    fn observe(&mut self, line: &GcodeLine) -> u32 {
        if self.pending {
            self.count += 1;
            self.pending = false;
        }
        if line.is_comment_only() && line.comment == LAYER_CHANGE {
            self.pending = true;
        }
        self.count
    }

    fn current_layer(&self) -> u32 {
        self.count
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
