//! G-code records, parser and layer tracking
//!
//! This module provides:
//! - Structured line records with verbatim source text
//! - Line parsing into command, parameters and comment
//! - Layer tracking strategies

pub mod layer;
pub mod line;
pub mod parser;

pub use layer::*;
pub use line::*;
pub use parser::*;
