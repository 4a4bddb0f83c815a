//! WebAssembly exports for mask refinement.
//!
//! These functions are exposed to JavaScript via wasm-bindgen. Images
//! and masks are passed as flat row-major byte arrays.

use ndarray::{ArrayView2, ArrayView3};
use wasm_bindgen::prelude::*;

use crate::refine::assemble::assemble;
use crate::refine::config::RefineConfig;

// ============================================================================
// Mask Refinement
// ============================================================================

/// Refine a candidate mask by windowed DBSCAN color clustering.
///
/// # Arguments
/// * `data` - Flat image bytes (length = width * height * channels)
/// * `mask` - Flat candidate mask (length = width * height), 255 = candidate
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `channels` - 3 (RGB) or 4 (RGBA)
/// * `eps` - DBSCAN neighborhood radius in RGB units
/// * `min_samples` - Neighbors required for a core point
/// * `window_radius` - Analysis window radius
/// * `core_radius` - Radius of the committed core region
///
/// # Returns
/// Flat refined mask (length = width * height)
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn refine_mask_wasm(
    data: &[u8],
    mask: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    eps: f32,
    min_samples: usize,
    window_radius: i32,
    core_radius: i32,
) -> Result<Vec<u8>, JsValue> {
    let config = RefineConfig::new(eps, min_samples, window_radius as i64, core_radius as i64)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let image = ArrayView3::from_shape((height, width, channels), data)
        .map_err(|e| JsValue::from_str(&format!("Invalid image dimensions: {e}")))?;
    let candidate = ArrayView2::from_shape((height, width), mask)
        .map_err(|e| JsValue::from_str(&format!("Invalid mask dimensions: {e}")))?;

    let result = assemble(image, candidate, &config).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(result.into_raw_vec_and_offset().0)
}
