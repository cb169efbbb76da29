//! Figure Export Module
//! Writes each chart as a PNG and a PDF into the output directory.

use crate::charts::{BarChart, RenderError, StaticChartRenderer};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to render chart: {0}")]
    Render(#[from] RenderError),
}

/// Paths of the two files written for one figure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFigure {
    pub png: PathBuf,
    pub pdf: PathBuf,
}

impl SavedFigure {
    pub fn paths(&self) -> [&Path; 2] {
        [&self.png, &self.pdf]
    }

    /// One `Saved: <path>` line per file, PNG first.
    pub fn saved_lines(&self) -> Vec<String> {
        self.paths()
            .iter()
            .map(|path| format!("Saved: {}", path.display()))
            .collect()
    }
}

pub struct FigureExporter;

impl FigureExporter {
    /// Save `chart` as `<name>.png` and `<name>.pdf` under `output_dir`.
    ///
    /// The directory is created if needed. The `Saved:` lines are printed only
    /// once both files are on disk, and the chart is then dropped.
    pub fn save(
        chart: BarChart,
        output_dir: &Path,
        name: &str,
        dpi: f64,
    ) -> Result<SavedFigure, ExportError> {
        fs::create_dir_all(output_dir).map_err(|source| ExportError::CreateDir {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let png = output_dir.join(format!("{}.png", name));
        let png_bytes = StaticChartRenderer::render_png(&chart, dpi)?;
        Self::write_file(&png, &png_bytes)?;

        let pdf = output_dir.join(format!("{}.pdf", name));
        let pdf_bytes = StaticChartRenderer::render_pdf(&chart)?;
        Self::write_file(&pdf, &pdf_bytes)?;

        let saved = SavedFigure { png, pdf };
        for line in saved.saved_lines() {
            println!("{}", line);
        }
        drop(chart);
        Ok(saved)
    }

    fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
        fs::write(path, bytes).map_err(|source| ExportError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}
