//! Derives a normalized chord-button overlay map from a reference photograph of
//! an omnichord-style control panel.
//!
//! The pipeline runs candidate extraction, geometric filtering, column
//! calibration, per-column row clustering and identity assignment in a single
//! deterministic pass. See [`pipeline::generate_overlay_map`].

pub mod calibrate;
pub mod config;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod identity;
pub mod kornia;
pub mod overlay_map;
pub mod pipeline;
pub mod plot_overlay;
pub mod rows;

pub use config::OverlayConfig;
pub use error::OverlayError;
pub use overlay_map::{ChordElement, OverlayMap, Reference};
pub use pipeline::{generate_overlay_map, overlay_from_regions};
