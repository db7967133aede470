//! Domain value types.
//!
//! ## Modules
//!
//! - [`geometry`]: points, the specimen cross-section and part placements
//! - [`pin`]: pin shapes, heights, rivet profiles and staggering

pub mod geometry;
pub mod pin;

pub use geometry::*;
pub use pin::*;
