//! Dataset traversal and parameter sweeps.
//!
//! ## Dataset layout
//!
//! ```text
//! <root>/img/<folder>/<name>.<png|jpg|jpeg|bmp>   input images
//! <root>/mask-pre/<folder>/<name>.png             candidate masks
//! <root>/mask-dbscan/minsamples_<m>/eps<eps>/<folder>/<image file name>
//! ```
//!
//! Unreadable inputs, folders without a mask folder and images without a
//! mask are reported and skipped. Failing to write an output aborts the
//! run.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::{RefineError, Result};
use crate::io::{load_image, load_mask, save_mask};
use crate::refine::assemble::{assemble_detailed, CancelToken};
use crate::refine::config::{
    RefineConfig, DEFAULT_CORE_RADIUS, DEFAULT_EPS, DEFAULT_MIN_SAMPLES, DEFAULT_WINDOW_RADIUS,
};

pub const IMAGE_DIR: &str = "img";
pub const MASK_DIR: &str = "mask-pre";
pub const OUTPUT_DIR: &str = "mask-dbscan";

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Grid of parameters to run a dataset with.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSweep {
    pub eps_values: Vec<f32>,
    pub min_samples_values: Vec<usize>,
    pub window_radius: usize,
    pub core_radius: usize,
}

impl Default for ParameterSweep {
    fn default() -> Self {
        Self {
            eps_values: vec![DEFAULT_EPS],
            min_samples_values: vec![DEFAULT_MIN_SAMPLES],
            window_radius: DEFAULT_WINDOW_RADIUS,
            core_radius: DEFAULT_CORE_RADIUS,
        }
    }
}

impl ParameterSweep {
    /// Every combination, `min_samples` outer and `eps` inner, validated.
    pub fn configs(&self) -> Result<Vec<RefineConfig>> {
        let mut configs = Vec::with_capacity(self.eps_values.len() * self.min_samples_values.len());
        for &min_samples in &self.min_samples_values {
            for &eps in &self.eps_values {
                let config = RefineConfig {
                    eps,
                    min_samples,
                    window_radius: self.window_radius,
                    core_radius: self.core_radius,
                };
                config.validate()?;
                configs.push(config);
            }
        }
        Ok(configs)
    }
}

/// What happened to a single image.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Refined mask written.
    Refined { output: PathBuf },
    /// No outliers found; the candidate mask was written unchanged.
    Fallback { output: PathBuf },
    /// Input could not be used; nothing written.
    Skipped { reason: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Masks written, fallbacks included.
    pub processed: usize,
    pub skipped: usize,
    /// Written masks that are the unchanged candidate mask.
    pub fallbacks: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Refined { .. } => self.processed += 1,
            FileOutcome::Fallback { .. } => {
                self.processed += 1;
                self.fallbacks += 1;
            }
            FileOutcome::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Directory a parameter combination writes into.
pub fn output_root(root: &Path, config: &RefineConfig) -> PathBuf {
    root.join(OUTPUT_DIR)
        .join(format!("minsamples_{}", config.min_samples))
        .join(format!("eps{}", config.eps))
}

/// Refine one image/mask pair and write `output_dir/<image file name>`.
pub fn refine_file(
    image_path: &Path,
    mask_path: &Path,
    output_dir: &Path,
    config: &RefineConfig,
) -> Result<FileOutcome> {
    let image = match load_image(image_path) {
        Ok(image) => image,
        Err(e) if e.is_skippable() => return Ok(skip(e.to_string())),
        Err(e) => return Err(e),
    };
    let mask = match load_mask(mask_path) {
        Ok(mask) => mask,
        Err(e) if e.is_skippable() => return Ok(skip(e.to_string())),
        Err(e) => return Err(e),
    };

    let result = match assemble_detailed(image.view(), mask.view(), config, &CancelToken::new()) {
        Ok(result) => result,
        Err(e @ RefineError::DimensionMismatch { .. }) => {
            return Ok(skip(format!("{}: {e}", image_path.display())))
        }
        Err(e) => return Err(e),
    };

    let file_name = image_path.file_name().ok_or_else(|| {
        RefineError::InvalidConfiguration(format!("image path {} has no file name", image_path.display()))
    })?;
    let output = output_dir.join(file_name);
    save_mask(&output, result.mask.view())?;

    if result.fallback {
        warn!("empty refinement for {}, wrote candidate mask", image_path.display());
        Ok(FileOutcome::Fallback { output })
    } else {
        info!(
            "refined {} ({} seeds, {} outlier pixels) -> {}",
            image_path.display(),
            result.seed_count,
            result.outlier_pixels,
            output.display()
        );
        Ok(FileOutcome::Refined { output })
    }
}

fn skip(reason: String) -> FileOutcome {
    warn!("skipping: {reason}");
    FileOutcome::Skipped { reason }
}

/// Run every configuration of `sweep` over the dataset at `root`.
pub fn run_dataset(root: &Path, sweep: &ParameterSweep) -> Result<BatchSummary> {
    let configs = sweep.configs()?;
    let image_root = root.join(IMAGE_DIR);
    let mask_root = root.join(MASK_DIR);

    info!(
        "processing dataset {} ({} parameter combinations)",
        root.display(),
        configs.len()
    );

    let folders = sorted_entries(&image_root, |p| p.is_dir())?;
    let mut summary = BatchSummary::default();

    for config in &configs {
        let param_root = output_root(root, config);

        for folder in &folders {
            let Some(folder_name) = folder.file_name() else {
                continue;
            };
            let mask_folder = mask_root.join(folder_name);
            if !mask_folder.is_dir() {
                warn!("skipping unmatched folder {}", folder.display());
                continue;
            }
            let output_folder = param_root.join(folder_name);

            for image_path in sorted_entries(folder, is_image_file)? {
                let Some(stem) = image_path.file_stem() else {
                    continue;
                };
                let mut mask_name = stem.to_os_string();
                mask_name.push(".png");
                let mask_path = mask_folder.join(mask_name);
                let outcome = if mask_path.is_file() {
                    refine_file(&image_path, &mask_path, &output_folder, config)?
                } else {
                    skip(format!("mask not found: {}", mask_path.display()))
                };
                summary.record(&outcome);
            }
        }
    }

    info!(
        "dataset done: {} processed, {} fallbacks, {} skipped",
        summary.processed, summary.fallbacks, summary.skipped
    );
    Ok(summary)
}

fn is_image_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| IMAGE_EXTENSIONS.iter().any(|known| e.eq_ignore_ascii_case(known)))
            .unwrap_or(false)
}

/// Entries of `dir` accepted by `keep`, sorted by path.
fn sorted_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let read_error = |source: std::io::Error| RefineError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if keep(&path) {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}
