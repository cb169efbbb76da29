//! AMR Figures - bar charts of antimicrobial-resistance hit summaries
//!
//! Reads the per-sample summary tables and writes one PNG and one PDF per
//! figure.

pub mod charts;
pub mod config;
pub mod data;
pub mod export;
pub mod figures;

pub use config::{ConfigError, FigureConfig};
pub use export::{ExportError, FigureExporter, SavedFigure};
pub use figures::{FigurePipeline, FigureSpec, PipelineError, FIGURES};
