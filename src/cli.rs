//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use paperfetch_core::{AcquisitionConfig, ManifestMode};

/// Find open-access papers on a topic and download their PDFs.
///
/// Papers are saved under `<output-dir>/<topic>/` together with a JSON
/// manifest describing every candidate that was considered.
#[derive(Parser, Debug)]
#[command(name = "paperfetch")]
#[command(author, version, about)]
pub struct Args {
    /// Research topic to search for
    pub topic: String,

    /// Number of PDFs to download (clamped to the configured maximum)
    #[arg(allow_negative_numbers = true)]
    pub count: i64,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/paperfetch/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory that holds one sub-directory per topic
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Maximum concurrent downloads (1-16)
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=16))]
    pub concurrency: Option<u8>,

    /// Search retries after the first attempt (0-10)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub max_retries: Option<u8>,

    /// Use the bundled offline paper list when search is unavailable
    #[arg(long)]
    pub use_fallback: bool,

    /// Record only saved papers in the manifest
    #[arg(long)]
    pub success_only: bool,

    /// Keep search order instead of ranking by citation count
    #[arg(long)]
    pub keep_search_order: bool,
}

impl Args {
    /// Applies flags on top of file/default configuration.
    pub fn apply_to(&self, config: &mut AcquisitionConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_root.clone_from(dir);
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = usize::from(concurrency);
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = u32::from(max_retries);
        }
        if self.use_fallback {
            config.use_fallback = true;
        }
        if self.success_only {
            config.manifest_mode = ManifestMode::SuccessOnly;
        }
        if self.keep_search_order {
            config.order_by_citations = false;
        }
    }
}
