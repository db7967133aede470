//! Error types for G-code parsing and merging
//!
//! This module defines error types for:
//! - Splicing generated blocks into a parsed document
//! - Reading and writing G-code files

use thiserror::Error;

/// Errors raised while splicing pin blocks into a document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// A header was requested but the document has no header marker
    #[error("Document marker missing: expected one of {expected}")]
    DocumentMarkerMissing {
        /// Markers that were searched for
        expected: String,
    },

    /// A layer expected to receive pins has no generated block
    #[error("Missing schedule entry for layer {layer}")]
    MissingScheduleEntry {
        /// Completed layer number
        layer: u32,
    },

    /// The document ends before a layer that must receive pins
    #[error("Pin block for layer {layer} was never inserted: document ends at layer {last_layer}")]
    LayerNotReached {
        /// Completed layer holding the block
        layer: u32,
        /// Last layer seen in the document
        last_layer: u32,
    },
}

/// Main error type for gcodepin-gcode
#[derive(Error, Debug)]
pub enum GcodeError {
    /// Merge error
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for merge operations
pub type MergeResult<T> = std::result::Result<T, MergeError>;

/// Result type for gcodepin-gcode
pub type Result<T> = std::result::Result<T, GcodeError>;
