//! Configuration Module
//! Fixed input/output locations and output settings for one sample.

use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Summary tables live under `$HOME/<RESULTS_SUBDIR>`
pub const RESULTS_SUBDIR: &str = "results/barcode04/summary";
pub const FIGURES_SUBDIR: &str = "figures";
pub const DEFAULT_SAMPLE: &str = "barcode04";
pub const DEFAULT_SAMPLE_TITLE: &str = "Barcode04";
pub const DEFAULT_DPI: f64 = 300.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("HOME is not set; cannot locate the results directory")]
    NoHome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FigureConfig {
    pub base_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Prefix for output file names
    pub sample: String,
    /// Prefix for chart titles
    pub sample_title: String,
    pub dpi: f64,
}

impl FigureConfig {
    /// Default layout rooted at the user's home directory.
    pub fn from_home() -> Result<Self, ConfigError> {
        let home = env::var_os("HOME")
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::NoHome)?;
        Ok(Self::with_base_dir(Path::new(&home).join(RESULTS_SUBDIR)))
    }

    /// Same layout under an arbitrary summary directory.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            output_dir: base_dir.join(FIGURES_SUBDIR),
            base_dir,
            sample: DEFAULT_SAMPLE.to_string(),
            sample_title: DEFAULT_SAMPLE_TITLE.to_string(),
            dpi: DEFAULT_DPI,
        }
    }

    pub fn input_path(&self, file_name: &str) -> PathBuf {
        self.base_dir.join(file_name)
    }
}
