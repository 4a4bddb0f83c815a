//! Error types for mask refinement.
//!
//! Only configuration and shape problems are errors of the refinement
//! itself. The load/save variants belong to the file collaborators in
//! [`crate::io`]; the batch runner turns load failures into skips.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RefineError>;

#[derive(Debug, Error)]
pub enum RefineError {
    /// Radii, eps or min_samples outside their allowed ranges.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Image and candidate mask do not share (height, width).
    #[error("image is {image:?} (h, w) but candidate mask is {mask:?}")]
    DimensionMismatch {
        image: (usize, usize),
        mask: (usize, usize),
    },

    /// Image has fewer than three color channels.
    #[error("expected at least 3 color channels, got {0}")]
    UnsupportedChannels(usize),

    #[error("refinement cancelled")]
    Cancelled,

    #[error("failed to read image {}: {source}", path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to read mask {}: {source}", path.display())]
    MaskRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to list {}: {source}", path.display())]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write mask {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl RefineError {
    /// True for failures the batch runner reports and skips past.
    pub fn is_skippable(&self) -> bool {
        matches!(self, RefineError::ImageRead { .. } | RefineError::MaskRead { .. })
    }
}
