//! Image and mask file access.
//!
//! Images are decoded to RGB8 (H, W, 3) and masks to 8-bit luma (H, W),
//! matching the array layout the refinement expects.

use std::fs;
use std::path::Path;

use image::{GrayImage, ImageError};
use ndarray::{Array2, Array3, ArrayView2};

use crate::error::{RefineError, Result};

/// Load an image as an (H, W, 3) RGB array.
pub fn load_image(path: &Path) -> Result<Array3<u8>> {
    let decoded = image::open(path).map_err(|source| RefineError::ImageRead {
        path: path.to_path_buf(),
        source,
    })?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    // RgbImage stores row-major RGB triples, which is exactly (H, W, 3).
    Array3::from_shape_vec((height as usize, width as usize, 3), rgb.into_raw()).map_err(|e| {
        RefineError::ImageRead {
            path: path.to_path_buf(),
            source: ImageError::IoError(std::io::Error::other(e)),
        }
    })
}

/// Load a mask as an (H, W) luma array.
pub fn load_mask(path: &Path) -> Result<Array2<u8>> {
    let decoded = image::open(path).map_err(|source| RefineError::MaskRead {
        path: path.to_path_buf(),
        source,
    })?;
    let luma = decoded.to_luma8();
    let (width, height) = luma.dimensions();

    Array2::from_shape_vec((height as usize, width as usize), luma.into_raw()).map_err(|e| {
        RefineError::MaskRead {
            path: path.to_path_buf(),
            source: ImageError::IoError(std::io::Error::other(e)),
        }
    })
}

/// Write a mask as an 8-bit grayscale image, creating parent directories.
///
/// The file format follows the path's extension.
pub fn save_mask(path: &Path, mask: ArrayView2<u8>) -> Result<()> {
    let write_error = |source: ImageError| RefineError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| write_error(ImageError::IoError(e)))?;
    }

    let (height, width) = mask.dim();
    let pixels: Vec<u8> = mask.iter().copied().collect();
    let gray = GrayImage::from_raw(width as u32, height as u32, pixels).ok_or_else(|| {
        write_error(ImageError::IoError(std::io::Error::other("mask buffer size mismatch")))
    })?;

    gray.save(path).map_err(write_error)
}
