//! Candidate mask refinement by local color clustering.
//!
//! This module provides the refinement pipeline, leaves first:
//! - **Geometry**: clipped analysis window and core region per seed
//! - **DBSCAN**: density-based clustering of a window's RGB colors
//! - **Synthesis**: dominant label as background, everything else outlier
//! - **Assembly**: per-seed loop, ordered core write-back, empty fallback
//!
//! ## Formats
//!
//! | Input | Shape | Type | Description |
//! |-------|-------|------|-------------|
//! | Image | (H, W, C), C >= 3 | u8 | RGB(A), alpha ignored |
//! | Candidate mask | (H, W) | u8 | 255 = seed, anything else = background |
//! | Output mask | (H, W) | u8 | 255 = outlier, 0 = background |

pub mod assemble;
pub mod config;
pub mod dbscan;
pub mod geometry;
pub mod synthesize;

pub use assemble::{assemble, assemble_detailed, assemble_with_cancel, CancelToken, RefineResult};
pub use config::RefineConfig;
pub use dbscan::{cluster_colors, ClusterLabeling, NOISE};
pub use geometry::{Bounds, SeedGeometry};
pub use synthesize::{background_label, outlier_mask};
