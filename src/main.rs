//! AMR Figures - renders the Barcode04 AMR summary tables as bar charts.
//!
//! Reads `~/results/barcode04/summary/amr_by_*.tsv` and writes PNG and PDF
//! figures to `~/results/barcode04/summary/figures/`.

use amr_figures::{FigureConfig, FigurePipeline, FIGURES};
use anyhow::Context;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = FigureConfig::from_home()?;
    log::info!("Reading summary tables from {}", config.base_dir.display());

    for spec in FIGURES.iter() {
        FigurePipeline::run_figure(spec, &config)
            .with_context(|| format!("Failed to generate {}", spec.output_name(&config)))?;
    }

    Ok(())
}
