//! Figures Module
//! The three AMR summary figures and the pipeline that produces them.
//!
//! Each figure is loaded, sorted, plotted and saved before the next one
//! starts.

use crate::charts::{BarChart, ChartPlotter, Orientation};
use crate::config::FigureConfig;
use crate::data::{LoaderError, RecordTable, SortOrder, TableLoader};
use crate::export::{ExportError, FigureExporter, SavedFigure};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl PipelineError {
    /// Missing, unreadable or undecodable input table
    pub fn is_input(&self) -> bool {
        matches!(self, PipelineError::Load(_))
    }

    /// Output directory or file could not be produced
    pub fn is_output(&self) -> bool {
        matches!(self, PipelineError::Export(_))
    }
}

/// Static description of one figure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigureSpec {
    pub input_file: &'static str,
    pub label_column: &'static str,
    pub count_column: &'static str,
    pub order: SortOrder,
    pub orientation: Orientation,
    /// Title suffix after "AMR hits by"
    pub subject: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    /// File stem after the sample prefix
    pub stem: &'static str,
}

impl FigureSpec {
    pub fn title(&self, config: &FigureConfig) -> String {
        format!("{}: AMR hits by {}", config.sample_title, self.subject)
    }

    pub fn output_name(&self, config: &FigureConfig) -> String {
        format!("{}_{}", config.sample, self.stem)
    }
}

pub const MOLECULE_TYPE: FigureSpec = FigureSpec {
    input_file: "amr_by_molecule_type.tsv",
    label_column: "molecule_type",
    count_column: "count",
    order: SortOrder::Descending,
    orientation: Orientation::Vertical,
    subject: "molecule type",
    x_label: "Molecule type",
    y_label: "Number of AMR hits",
    stem: "amr_by_molecule_type",
};

pub const DRUG_CLASS: FigureSpec = FigureSpec {
    input_file: "amr_by_drug_class.tsv",
    label_column: "drug_class",
    count_column: "count",
    order: SortOrder::Ascending,
    orientation: Orientation::Horizontal,
    subject: "drug class",
    x_label: "Count",
    y_label: "Drug class",
    stem: "amr_by_drug_class",
};

pub const MECHANISM: FigureSpec = FigureSpec {
    input_file: "amr_by_mechanism.tsv",
    label_column: "mechanism",
    count_column: "count",
    order: SortOrder::Ascending,
    orientation: Orientation::Horizontal,
    subject: "resistance mechanism",
    x_label: "Count",
    y_label: "Resistance mechanism",
    stem: "amr_by_mechanism",
};

/// Run order
pub const FIGURES: [FigureSpec; 3] = [MOLECULE_TYPE, DRUG_CLASS, MECHANISM];

pub struct FigurePipeline;

impl FigurePipeline {
    /// Generate every figure in order, stopping at the first failure.
    pub fn run(config: &FigureConfig) -> Result<Vec<SavedFigure>, PipelineError> {
        FIGURES
            .iter()
            .map(|spec| Self::run_figure(spec, config))
            .collect()
    }

    /// Load, plot and save a single figure.
    pub fn run_figure(spec: &FigureSpec, config: &FigureConfig) -> Result<SavedFigure, PipelineError> {
        let chart = Self::load_chart(spec, config)?;
        log::info!("Rendering {} ({} bars)", spec.output_name(config), chart.bars.len());
        let saved = FigureExporter::save(
            chart,
            &config.output_dir,
            &spec.output_name(config),
            config.dpi,
        )?;
        Ok(saved)
    }

    /// Read the figure's input table and build its chart.
    pub fn load_chart(spec: &FigureSpec, config: &FigureConfig) -> Result<BarChart, LoaderError> {
        let path = config.input_path(spec.input_file);
        let table = TableLoader::load_tsv(&path, spec.label_column, spec.count_column)?;
        Ok(Self::chart_from_table(spec, table, config))
    }

    /// Sort the table for display and lay it out as the figure's chart.
    pub fn chart_from_table(spec: &FigureSpec, table: RecordTable, config: &FigureConfig) -> BarChart {
        ChartPlotter::build(
            table.sorted_by_count(spec.order),
            spec.orientation,
            &spec.title(config),
            spec.x_label,
            spec.y_label,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;

    fn config() -> FigureConfig {
        FigureConfig::with_base_dir("/summary")
    }

    fn table(spec: &FigureSpec, rows: &[(&str, i64)]) -> RecordTable {
        RecordTable::new(
            spec.label_column,
            spec.count_column,
            rows.iter().map(|(l, c)| Record::new(*l, *c)).collect(),
        )
    }

    #[test]
    fn titles_and_names_use_sample_prefix() {
        let config = config();
        assert_eq!(MOLECULE_TYPE.title(&config), "Barcode04: AMR hits by molecule type");
        assert_eq!(DRUG_CLASS.title(&config), "Barcode04: AMR hits by drug class");
        assert_eq!(
            MECHANISM.title(&config),
            "Barcode04: AMR hits by resistance mechanism"
        );
        assert_eq!(MOLECULE_TYPE.output_name(&config), "barcode04_amr_by_molecule_type");
        assert_eq!(DRUG_CLASS.output_name(&config), "barcode04_amr_by_drug_class");
        assert_eq!(MECHANISM.output_name(&config), "barcode04_amr_by_mechanism");
    }

    #[test]
    fn molecule_type_bars_are_non_increasing() {
        let chart = FigurePipeline::chart_from_table(
            &MOLECULE_TYPE,
            table(&MOLECULE_TYPE, &[("plasmid", 2), ("chromosome", 11), ("unknown", 0)]),
            &config(),
        );
        assert_eq!(chart.orientation, Orientation::Vertical);
        assert_eq!(chart.counts(), vec![11, 2, 0]);
        assert_eq!(chart.x_label, "Molecule type");
        assert_eq!(chart.y_label, "Number of AMR hits");
    }

    #[test]
    fn drug_class_puts_bar_above_foo() {
        let chart = FigurePipeline::chart_from_table(
            &DRUG_CLASS,
            table(&DRUG_CLASS, &[("foo", 3), ("bar", 7)]),
            &config(),
        );
        assert_eq!(chart.orientation, Orientation::Horizontal);
        assert_eq!(chart.labels(), vec!["foo", "bar"]);
        assert_eq!(chart.counts(), vec![3, 7]);
    }

    #[test]
    fn mechanism_bars_are_non_decreasing() {
        let chart = FigurePipeline::chart_from_table(
            &MECHANISM,
            table(&MECHANISM, &[("efflux", 9), ("inactivation", 1), ("target", 4)]),
            &config(),
        );
        let counts = chart.counts();
        assert!(counts.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(chart.y_label, "Resistance mechanism");
    }

    #[test]
    fn missing_input_is_input_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = FigureConfig::with_base_dir(dir.path().join("absent"));
        let err = FigurePipeline::run_figure(&MOLECULE_TYPE, &config).unwrap_err();
        assert!(err.is_input());
        assert!(!err.is_output());
    }
}
