// CLI entry for maskrefine
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueHint};
use log::info;
use maskrefine_rust::batch::{refine_file, run_dataset, FileOutcome, ParameterSweep};
use maskrefine_rust::refine::config::{
    RefineConfig, DEFAULT_CORE_RADIUS, DEFAULT_EPS, DEFAULT_MIN_SAMPLES, DEFAULT_WINDOW_RADIUS,
};

#[derive(Parser, Debug)]
#[command(name = "maskrefine", version, about = "Refine candidate masks by windowed DBSCAN color clustering")]
struct Cli {
    /// Number of worker threads (default: all cores)
    #[arg(long = "threads", global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refine a single image/mask pair
    File {
        /// Input image path
        #[arg(value_hint = ValueHint::FilePath)]
        image: PathBuf,
        /// Candidate mask path
        #[arg(value_hint = ValueHint::FilePath)]
        mask: PathBuf,
        /// Output directory; the mask is written under the image's file name
        #[arg(value_hint = ValueHint::DirPath)]
        output_dir: PathBuf,

        /// DBSCAN neighborhood radius
        #[arg(long = "eps", default_value_t = DEFAULT_EPS)]
        eps: f32,
        /// Neighbors required for a core point
        #[arg(long = "min-samples", default_value_t = DEFAULT_MIN_SAMPLES)]
        min_samples: usize,
        #[arg(long = "window-radius", default_value_t = DEFAULT_WINDOW_RADIUS as i64, allow_negative_numbers = true)]
        window_radius: i64,
        #[arg(long = "core-radius", default_value_t = DEFAULT_CORE_RADIUS as i64, allow_negative_numbers = true)]
        core_radius: i64,
    },
    /// Refine a whole dataset (img/, mask-pre/ -> mask-dbscan/)
    Dataset {
        /// Dataset root
        #[arg(value_hint = ValueHint::DirPath)]
        root: PathBuf,

        /// DBSCAN neighborhood radius; repeat to sweep
        #[arg(long = "eps")]
        eps: Vec<f32>,
        /// Neighbors required for a core point; repeat to sweep
        #[arg(long = "min-samples")]
        min_samples: Vec<usize>,
        #[arg(long = "window-radius", default_value_t = DEFAULT_WINDOW_RADIUS as i64, allow_negative_numbers = true)]
        window_radius: i64,
        #[arg(long = "core-radius", default_value_t = DEFAULT_CORE_RADIUS as i64, allow_negative_numbers = true)]
        core_radius: i64,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .build_global()
            .context("failed to configure thread pool")?;
    }

    match cli.command {
        Command::File {
            image,
            mask,
            output_dir,
            eps,
            min_samples,
            window_radius,
            core_radius,
        } => {
            let config = RefineConfig::new(eps, min_samples, window_radius, core_radius)?;
            match refine_file(&image, &mask, &output_dir, &config)? {
                FileOutcome::Refined { output } => info!("wrote {}", output.display()),
                FileOutcome::Fallback { output } => info!("wrote candidate mask to {}", output.display()),
                FileOutcome::Skipped { reason } => anyhow::bail!("nothing written: {reason}"),
            }
        }
        Command::Dataset {
            root,
            eps,
            min_samples,
            window_radius,
            core_radius,
        } => {
            // Validates the radii the same way the single-file path does.
            let base = RefineConfig::new(DEFAULT_EPS, DEFAULT_MIN_SAMPLES, window_radius, core_radius)?;
            let mut sweep = ParameterSweep {
                window_radius: base.window_radius,
                core_radius: base.core_radius,
                ..ParameterSweep::default()
            };
            if !eps.is_empty() {
                sweep.eps_values = eps;
            }
            if !min_samples.is_empty() {
                sweep.min_samples_values = min_samples;
            }

            let summary = run_dataset(&root, &sweep)
                .with_context(|| format!("dataset run failed for {}", root.display()))?;
            println!(
                "processed {} ({} unchanged), skipped {}",
                summary.processed, summary.fallbacks, summary.skipped
            );
        }
    }

    Ok(())
}
