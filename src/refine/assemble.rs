//! Per-seed windowed clustering and output mask assembly.
//!
//! Every foreground pixel (255) of the candidate mask is a seed. For each
//! seed the surrounding window is clustered by color, the window's
//! dominant cluster is taken as background, and only the small core
//! region around the seed is copied into the output mask.
//!
//! Work is split into two phases:
//! 1. Clustering runs in parallel over the seeds and only reads the
//!    image; each worker returns the core patch of its window mask.
//! 2. Patches are written serially in row-major seed order, so where
//!    core regions overlap the later seed wins, exactly as a sequential
//!    scan would.
//!
//! If no seed produced a single outlier pixel the candidate mask is
//! returned unchanged.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use ndarray::{Array2, ArrayView2, ArrayView3};
use rayon::prelude::*;

use super::config::RefineConfig;
use super::dbscan::{cluster_colors, window_colors};
use super::geometry::SeedGeometry;
use super::synthesize::{outlier_mask, OUTLIER};
use crate::error::{RefineError, Result};

/// Candidate mask value marking a seed pixel.
pub const SEED: u8 = 255;

/// Cooperative cancellation flag shared with clustering workers.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Refinement result with metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct RefineResult {
    /// Refined mask (255 = outlier, 0 = background), or the candidate
    /// mask itself when `fallback` is set.
    pub mask: Array2<u8>,
    /// Number of seed pixels processed.
    pub seed_count: usize,
    /// Outlier pixels in the assembled mask before any fallback.
    pub outlier_pixels: usize,
    /// True when nothing was marked and the candidate mask was kept.
    pub fallback: bool,
}

/// Core patch computed for one seed.
struct SeedPatch {
    geometry: SeedGeometry,
    patch: Array2<u8>,
}

/// Seed pixels in row-major order.
pub fn seed_pixels(candidate: ArrayView2<u8>) -> Vec<(usize, usize)> {
    candidate
        .indexed_iter()
        .filter(|(_, v)| **v == SEED)
        .map(|(pos, _)| pos)
        .collect()
}

/// Refine a candidate mask.
///
/// # Arguments
/// * `image` - Image (height, width, channels), channels >= 3; only RGB
///   is clustered
/// * `candidate` - Candidate mask (height, width), 255 marks seeds
/// * `config` - Clustering and window parameters
///
/// # Returns
/// Refined mask with the candidate mask's shape
pub fn assemble(image: ArrayView3<u8>, candidate: ArrayView2<u8>, config: &RefineConfig) -> Result<Array2<u8>> {
    assemble_detailed(image, candidate, config, &CancelToken::new()).map(|result| result.mask)
}

/// Like [`assemble`], but stops early with [`RefineError::Cancelled`]
/// once `cancel` is triggered.
pub fn assemble_with_cancel(
    image: ArrayView3<u8>,
    candidate: ArrayView2<u8>,
    config: &RefineConfig,
    cancel: &CancelToken,
) -> Result<Array2<u8>> {
    assemble_detailed(image, candidate, config, cancel).map(|result| result.mask)
}

/// Refine a candidate mask and report what happened.
pub fn assemble_detailed(
    image: ArrayView3<u8>,
    candidate: ArrayView2<u8>,
    config: &RefineConfig,
    cancel: &CancelToken,
) -> Result<RefineResult> {
    config.validate()?;

    let (height, width, channels) = image.dim();
    if channels < 3 {
        return Err(RefineError::UnsupportedChannels(channels));
    }
    if candidate.dim() != (height, width) {
        return Err(RefineError::DimensionMismatch {
            image: (height, width),
            mask: candidate.dim(),
        });
    }

    let seeds = seed_pixels(candidate);
    debug!(
        "refining {}x{} mask: {} seeds, window {}, core {}, eps {}, min_samples {}",
        width,
        height,
        seeds.len(),
        config.window_size(),
        config.core_size(),
        config.eps,
        config.min_samples
    );

    // Phase 1: read-only, parallel. Collecting keeps seed order.
    let patches: Option<Vec<SeedPatch>> = seeds
        .par_iter()
        .map(|&seed| {
            if cancel.is_cancelled() {
                return None;
            }
            Some(cluster_seed(&image, seed, (height, width), config))
        })
        .collect();
    let patches = patches.ok_or(RefineError::Cancelled)?;

    // Phase 2: ordered write-back.
    let mut output = Array2::<u8>::zeros((height, width));
    {
        let mut out_view = output.view_mut();
        for SeedPatch { geometry, patch } in &patches {
            geometry.core.view_mask_mut(&mut out_view).assign(patch);
        }
    }

    let outlier_pixels = output.iter().filter(|&&v| v == OUTLIER).count();
    if outlier_pixels == 0 {
        warn!(
            "empty refinement, keeping candidate mask ({} seeds, none marked an outlier)",
            seeds.len()
        );
        return Ok(RefineResult {
            mask: candidate.to_owned(),
            seed_count: seeds.len(),
            outlier_pixels,
            fallback: true,
        });
    }

    Ok(RefineResult {
        mask: output,
        seed_count: seeds.len(),
        outlier_pixels,
        fallback: false,
    })
}

fn cluster_seed(
    image: &ArrayView3<u8>,
    seed: (usize, usize),
    shape: (usize, usize),
    config: &RefineConfig,
) -> SeedPatch {
    let geometry = SeedGeometry::new(seed, config.window_radius, config.core_radius, shape);

    let window = geometry.window.view_image(image);
    let labeling = cluster_colors(&window_colors(window), config.eps, config.min_samples);
    let window_mask = outlier_mask(&labeling, geometry.window.shape());

    let patch = geometry.core_local.view_mask(&window_mask.view()).to_owned();
    SeedPatch { geometry, patch }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    const GRAY: [u8; 3] = [128, 128, 128];
    const RED: [u8; 3] = [250, 10, 10];

    fn solid(height: usize, width: usize, color: [u8; 3]) -> Array3<u8> {
        Array3::from_shape_fn((height, width, 3), |(_, _, c)| color[c])
    }

    fn paint(image: &mut Array3<u8>, y0: usize, y1: usize, x0: usize, x1: usize, color: [u8; 3]) {
        for y in y0..y1 {
            for x in x0..x1 {
                for c in 0..3 {
                    image[[y, x, c]] = color[c];
                }
            }
        }
    }

    fn config(window_radius: usize, core_radius: usize) -> RefineConfig {
        RefineConfig {
            eps: 20.0,
            min_samples: 3,
            window_radius,
            core_radius,
        }
    }

    #[test]
    fn test_output_shape_matches_mask() {
        let image = solid(7, 11, GRAY);
        let mut mask = Array2::<u8>::zeros((7, 11));
        mask[[3, 5]] = 255;
        mask[[0, 10]] = 255;

        let result = assemble(image.view(), mask.view(), &config(3, 1)).unwrap();
        assert_eq!(result.dim(), (7, 11));
    }

    #[test]
    fn test_no_seeds_returns_candidate() {
        let image = solid(6, 6, GRAY);
        let mask = Array2::<u8>::zeros((6, 6));

        let result = assemble_detailed(image.view(), mask.view(), &config(2, 1), &CancelToken::new()).unwrap();
        assert!(result.fallback);
        assert_eq!(result.seed_count, 0);
        assert_eq!(result.mask, mask);
    }

    #[test]
    fn test_uniform_image_falls_back() {
        let image = solid(12, 12, GRAY);
        let mut mask = Array2::<u8>::zeros((12, 12));
        mask[[2, 2]] = 255;
        mask[[6, 8]] = 255;
        mask[[11, 0]] = 255;

        let result = assemble_detailed(image.view(), mask.view(), &config(3, 1), &CancelToken::new()).unwrap();
        assert!(result.fallback);
        assert_eq!(result.outlier_pixels, 0);
        assert_eq!(result.mask, mask);
    }

    #[test]
    fn test_isolated_seed_marks_outlier_core() {
        // 3x3 red blob in a gray field, seed in its center.
        let mut image = solid(21, 21, GRAY);
        paint(&mut image, 9, 12, 9, 12, RED);
        let mut mask = Array2::<u8>::zeros((21, 21));
        mask[[10, 10]] = 255;

        let result = assemble_detailed(image.view(), mask.view(), &config(5, 2), &CancelToken::new()).unwrap();
        assert!(!result.fallback);
        assert_eq!(result.seed_count, 1);

        let out = result.mask;
        for y in 0..21 {
            for x in 0..21 {
                let in_blob = (9..12).contains(&y) && (9..12).contains(&x);
                let expected = if in_blob { 255 } else { 0 };
                assert_eq!(out[[y, x]], expected, "pixel ({y}, {x})");
            }
        }
    }

    #[test]
    fn test_corner_seed_stays_in_bounds() {
        let mut image = solid(10, 10, GRAY);
        paint(&mut image, 0, 1, 0, 1, RED);
        let mut mask = Array2::<u8>::zeros((10, 10));
        mask[[0, 0]] = 255;

        // Window clipped to [0, 4) x [0, 4): 16 pixels, 15 gray + 1 red.
        let result = assemble(image.view(), mask.view(), &config(3, 1)).unwrap();
        assert_eq!(result[[0, 0]], 255);
        assert_eq!(result.iter().filter(|&&v| v == 255).count(), 1);
    }

    #[test]
    fn test_later_seed_wins_overlap() {
        // Seeds at (5, 4) and (5, 6) with core radius 1 overlap in column 5,
        // which is gray. The first window (cols 2..7) is mostly gray, so
        // column 5 is background there. The second window (cols 4..9) is
        // mostly red, so column 5 is an outlier there.
        let mut image = solid(11, 11, GRAY);
        paint(&mut image, 0, 11, 6, 11, RED);
        let mut mask = Array2::<u8>::zeros((11, 11));
        mask[[5, 4]] = 255;
        mask[[5, 6]] = 255;

        let cfg = config(2, 1);
        let first = assemble(image.view(), mask.view(), &cfg).unwrap();
        for y in 4..7 {
            assert_eq!(first[[y, 5]], 255, "row {y}");
            assert_eq!(first[[y, 3]], 0);
            assert_eq!(first[[y, 4]], 0);
            assert_eq!(first[[y, 6]], 0);
        }
        assert_eq!(first[[3, 5]], 0);
        assert_eq!(first.iter().filter(|&&v| v == 255).count(), 3);

        for _ in 0..3 {
            let again = assemble(image.view(), mask.view(), &cfg).unwrap();
            assert_eq!(again, first);
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let image = solid(5, 5, GRAY);
        let mask = Array2::<u8>::zeros((5, 4));
        let result = assemble(image.view(), mask.view(), &config(2, 1));
        assert!(matches!(result, Err(RefineError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_grayscale_image_rejected() {
        let image = Array3::<u8>::zeros((5, 5, 1));
        let mask = Array2::<u8>::zeros((5, 5));
        let result = assemble(image.view(), mask.view(), &config(2, 1));
        assert!(matches!(result, Err(RefineError::UnsupportedChannels(1))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let image = solid(5, 5, GRAY);
        let mask = Array2::<u8>::zeros((5, 5));
        let result = assemble(image.view(), mask.view(), &config(1, 2));
        assert!(matches!(result, Err(RefineError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_cancelled_run_returns_error() {
        let image = solid(8, 8, GRAY);
        let mut mask = Array2::<u8>::zeros((8, 8));
        mask[[4, 4]] = 255;

        let cancel = CancelToken::new();
        cancel.cancel();
        let result = assemble_with_cancel(image.view(), mask.view(), &config(2, 1), &cancel);
        assert!(matches!(result, Err(RefineError::Cancelled)));
    }

    #[test]
    fn test_only_exact_255_is_seed() {
        let mut mask = Array2::<u8>::zeros((3, 3));
        mask[[0, 1]] = 255;
        mask[[1, 1]] = 254;
        mask[[2, 0]] = 255;
        assert_eq!(seed_pixels(mask.view()), vec![(0, 1), (2, 0)]);
    }
}
