//! DS9 RGB grid library
//!
//! Drives SAOImage DS9 to build RGB composites of per-band survey cutouts and
//! lays the composites of one survey out in a galactic-coordinate grid.
//! The `ds9_rgb_grid` binary is a thin CLI over these modules.

pub mod compositor;
pub mod config;
pub mod ds9;
pub mod error;
pub mod grid;
pub mod sky;
pub mod targets;

pub use error::{Error, Result};
