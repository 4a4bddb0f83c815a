//! Refinement parameters.

use crate::error::{RefineError, Result};

/// Default DBSCAN neighborhood radius in RGB units.
pub const DEFAULT_EPS: f32 = 55.0;
/// Default number of neighbors a core point needs.
pub const DEFAULT_MIN_SAMPLES: usize = 100;
pub const DEFAULT_WINDOW_RADIUS: usize = 10;
pub const DEFAULT_CORE_RADIUS: usize = 4;

/// Parameters for one refinement run.
///
/// The analysis window around a seed is `2 * window_radius + 1` pixels
/// wide; only the `2 * core_radius + 1` core of it is committed to the
/// output mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefineConfig {
    /// Neighborhood radius (Euclidean distance in RGB space).
    pub eps: f32,
    /// Minimum number of other points within `eps` for a core point.
    pub min_samples: usize,
    pub window_radius: usize,
    pub core_radius: usize,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            eps: DEFAULT_EPS,
            min_samples: DEFAULT_MIN_SAMPLES,
            window_radius: DEFAULT_WINDOW_RADIUS,
            core_radius: DEFAULT_CORE_RADIUS,
        }
    }
}

impl RefineConfig {
    /// Build a validated config from signed radii.
    ///
    /// Foreign callers (CLI, Python, WASM) hand over signed integers, so
    /// negative radii are rejected here rather than wrapped.
    pub fn new(eps: f32, min_samples: usize, window_radius: i64, core_radius: i64) -> Result<Self> {
        let window_radius = usize::try_from(window_radius).map_err(|_| {
            RefineError::InvalidConfiguration(format!(
                "window_radius must be non-negative, got {window_radius}"
            ))
        })?;
        let core_radius = usize::try_from(core_radius).map_err(|_| {
            RefineError::InvalidConfiguration(format!(
                "core_radius must be non-negative, got {core_radius}"
            ))
        })?;

        let config = Self {
            eps,
            min_samples,
            window_radius,
            core_radius,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.eps.is_finite() || self.eps <= 0.0 {
            return Err(RefineError::InvalidConfiguration(format!(
                "eps must be a positive number, got {}",
                self.eps
            )));
        }
        if self.min_samples == 0 {
            return Err(RefineError::InvalidConfiguration(
                "min_samples must be at least 1".to_string(),
            ));
        }
        if self.core_radius > self.window_radius {
            return Err(RefineError::InvalidConfiguration(format!(
                "core_radius ({}) exceeds window_radius ({})",
                self.core_radius, self.window_radius
            )));
        }
        Ok(())
    }

    /// Side length of a full, unclipped analysis window.
    pub fn window_size(&self) -> usize {
        2 * self.window_radius + 1
    }

    /// Side length of a full, unclipped core region.
    pub fn core_size(&self) -> usize {
        2 * self.core_radius + 1
    }
}
