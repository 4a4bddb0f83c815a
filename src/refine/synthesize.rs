//! Turn a window's cluster labels into a binary outlier mask.
//!
//! The most populated label (noise included) is the window background;
//! every other pixel is an outlier (255).

use ndarray::Array2;

use super::dbscan::ClusterLabeling;

/// Mask value for outlier pixels.
pub const OUTLIER: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Most populated label. Ties go to the smallest label id, so noise (-1)
/// wins a tie against any cluster.
pub fn background_label(labeling: &ClusterLabeling) -> i32 {
    let populations = labeling.populations();
    let mut best_slot = 0usize;
    for (slot, &count) in populations.iter().enumerate() {
        if count > populations[best_slot] {
            best_slot = slot;
        }
    }
    best_slot as i32 - 1
}

/// Build the window-local outlier mask.
///
/// # Arguments
/// * `labeling` - Labels in window row-major order
/// * `shape` - Window (height, width); `height * width` must equal the
///   number of labels
pub fn outlier_mask(labeling: &ClusterLabeling, shape: (usize, usize)) -> Array2<u8> {
    let (height, width) = shape;
    debug_assert_eq!(height * width, labeling.len());

    let background = background_label(labeling);
    let labels = labeling.labels();
    Array2::from_shape_fn((height, width), |(y, x)| {
        if labels[y * width + x] == background {
            BACKGROUND
        } else {
            OUTLIER
        }
    })
}
