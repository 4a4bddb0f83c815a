//! MaskRefine Rust Extensions
//!
//! Refines coarse candidate masks by re-examining every candidate pixel
//! through local color clustering, with Python bindings via PyO3 and
//! WASM bindings for JavaScript.
//!
//! ## Image Format
//! - **Image**: (height, width, channels) u8 with 3 (RGB) or 4 (RGBA)
//!   channels; alpha is ignored
//! - **Candidate mask**: (height, width) u8, 255 marks a candidate pixel
//! - **Output mask**: (height, width) u8, 255 marks an outlier pixel
//!
//! ## Pipeline
//! For each candidate pixel a window around it is clustered with DBSCAN
//! in RGB space. The most populated label is the window background and
//! everything else is an outlier; only a small core around the candidate
//! is committed to the output. When nothing at all is marked the
//! candidate mask is returned unchanged.

pub mod batch;
pub mod error;
pub mod io;
pub mod refine;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{RefineError, Result};
pub use refine::{assemble, assemble_detailed, assemble_with_cancel, CancelToken, RefineConfig, RefineResult};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray2, PyReadonlyArray2, PyReadonlyArray3};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::refine::assemble::{assemble_detailed, CancelToken};
    use crate::refine::config::{
        RefineConfig, DEFAULT_CORE_RADIUS, DEFAULT_EPS, DEFAULT_MIN_SAMPLES, DEFAULT_WINDOW_RADIUS,
    };

    // ========================================================================
    // Mask Refinement
    // ========================================================================

    /// Refine a candidate mask by windowed DBSCAN color clustering.
    ///
    /// # Arguments
    /// * `image` - Input image (height, width, 3 or 4) u8
    /// * `mask` - Candidate mask (height, width) u8, 255 = candidate
    /// * `eps` - DBSCAN neighborhood radius in RGB units
    /// * `min_samples` - Neighbors required for a core point
    /// * `window_radius` - Analysis window radius
    /// * `core_radius` - Radius of the committed core region
    ///
    /// Returns the refined mask, or the candidate mask if nothing was marked.
    #[pyfunction]
    #[pyo3(signature = (
        image,
        mask,
        eps=DEFAULT_EPS,
        min_samples=DEFAULT_MIN_SAMPLES,
        window_radius=DEFAULT_WINDOW_RADIUS as i64,
        core_radius=DEFAULT_CORE_RADIUS as i64,
    ))]
    pub fn refine_mask<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        mask: PyReadonlyArray2<'py, u8>,
        eps: f32,
        min_samples: usize,
        window_radius: i64,
        core_radius: i64,
    ) -> PyResult<Bound<'py, PyArray2<u8>>> {
        let config = RefineConfig::new(eps, min_samples, window_radius, core_radius)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        let image = image.as_array();
        let mask = mask.as_array();

        let result = assemble_detailed(image, mask, &config, &CancelToken::new())
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(result.mask.into_pyarray(py))
    }

    /// MaskRefine Rust extension module
    #[pymodule]
    pub fn maskrefine_rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(refine_mask, m)?)?;
        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::maskrefine_rust;
