//! Chart Plotter Module
//! Builds the in-memory bar chart description that the renderer draws.

use crate::data::{Record, RecordTable};

/// Bar colour (matplotlib's default first series colour)
pub const BAR_COLOR: (u8, u8, u8) = (31, 119, 180);

/// Canvas for vertical bar charts, in inches
pub const VERTICAL_FIGURE: FigureSize = FigureSize {
    width_in: 6.4,
    height_in: 4.8,
};

/// Horizontal charts are this wide regardless of category count
pub const HORIZONTAL_WIDTH_IN: f64 = 8.0;
/// Height floor for horizontal charts
pub const HORIZONTAL_MIN_HEIGHT_IN: f64 = 4.0;
/// Height added per category on horizontal charts
pub const HORIZONTAL_INCHES_PER_BAR: f64 = 0.35;

/// Bar direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Categories along x, counts up the y-axis
    Vertical,
    /// Categories up the y-axis, counts along x
    Horizontal,
}

/// Physical canvas size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigureSize {
    pub width_in: f64,
    pub height_in: f64,
}

impl FigureSize {
    /// Canvas for a horizontal chart with `categories` bars.
    pub fn horizontal(categories: usize) -> Self {
        Self {
            width_in: HORIZONTAL_WIDTH_IN,
            height_in: HORIZONTAL_MIN_HEIGHT_IN.max(HORIZONTAL_INCHES_PER_BAR * categories as f64),
        }
    }

    /// Size in device units for a given resolution.
    pub fn to_device(&self, units_per_inch: f64) -> (u32, u32) {
        (
            (self.width_in * units_per_inch).round() as u32,
            (self.height_in * units_per_inch).round() as u32,
        )
    }
}

/// A single-series bar chart ready to be rendered.
///
/// `bars` are in display order: left to right for vertical charts, bottom to
/// top for horizontal charts.
#[derive(Debug, Clone)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub orientation: Orientation,
    pub bars: Vec<Record>,
    pub size: FigureSize,
}

/// Builds [`BarChart`]s from record tables.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Vertical bars on a fixed canvas, in the table's current order.
    pub fn vertical(table: RecordTable, title: &str, x_label: &str, y_label: &str) -> BarChart {
        BarChart {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            orientation: Orientation::Vertical,
            bars: table.into_records(),
            size: VERTICAL_FIGURE,
        }
    }

    /// Horizontal bars; canvas height grows with the number of categories.
    pub fn horizontal(table: RecordTable, title: &str, x_label: &str, y_label: &str) -> BarChart {
        let size = FigureSize::horizontal(table.len());
        BarChart {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            orientation: Orientation::Horizontal,
            bars: table.into_records(),
            size,
        }
    }

    pub fn build(
        table: RecordTable,
        orientation: Orientation,
        title: &str,
        x_label: &str,
        y_label: &str,
    ) -> BarChart {
        match orientation {
            Orientation::Vertical => Self::vertical(table, title, x_label, y_label),
            Orientation::Horizontal => Self::horizontal(table, title, x_label, y_label),
        }
    }
}

impl BarChart {
    /// Slot index of the first bar with this label (0 = leftmost / bottom).
    pub fn position_of(&self, label: &str) -> Option<usize> {
        self.bars.iter().position(|bar| bar.label == label)
    }

    pub fn counts(&self) -> Vec<i64> {
        self.bars.iter().map(|bar| bar.count).collect()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.bars.iter().map(|bar| bar.label.as_str()).collect()
    }

    /// Largest count, 0 for an empty chart.
    pub fn max_count(&self) -> i64 {
        self.bars.iter().map(|bar| bar.count).max().unwrap_or(0)
    }

    /// Smallest count, 0 for an empty chart.
    pub fn min_count(&self) -> i64 {
        self.bars.iter().map(|bar| bar.count).min().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SortOrder;

    fn table(rows: &[(&str, i64)]) -> RecordTable {
        RecordTable::new(
            "label",
            "count",
            rows.iter().map(|(l, c)| Record::new(*l, *c)).collect(),
        )
    }

    #[test]
    fn vertical_chart_uses_fixed_canvas() {
        let chart = ChartPlotter::vertical(table(&[("chromosome", 10)]), "t", "x", "y");
        assert_eq!(chart.orientation, Orientation::Vertical);
        assert_eq!(chart.size, VERTICAL_FIGURE);
    }

    #[test]
    fn horizontal_canvas_has_minimum_height() {
        let chart = ChartPlotter::horizontal(table(&[("a", 1), ("b", 2)]), "t", "x", "y");
        assert_eq!(chart.size.width_in, HORIZONTAL_WIDTH_IN);
        assert_eq!(chart.size.height_in, HORIZONTAL_MIN_HEIGHT_IN);
    }

    #[test]
    fn horizontal_canvas_grows_with_categories() {
        let rows: Vec<Record> = (0..40)
            .map(|i| Record::new(format!("mechanism {i}"), i))
            .collect();
        let chart = ChartPlotter::horizontal(
            RecordTable::new("mechanism", "count", rows),
            "t",
            "x",
            "y",
        );
        assert!(chart.size.height_in >= 0.35 * 40.0 - 1e-9);
        assert!(chart.size.height_in >= HORIZONTAL_MIN_HEIGHT_IN);
    }

    #[test]
    fn ascending_horizontal_chart_puts_larger_bar_above() {
        let sorted = table(&[("foo", 3), ("bar", 7)]).sorted_by_count(SortOrder::Ascending);
        let chart = ChartPlotter::horizontal(sorted, "t", "Count", "Drug class");

        let foo = chart.position_of("foo").expect("foo bar");
        let bar = chart.position_of("bar").expect("bar bar");
        assert!(bar > foo);
        assert_eq!(chart.bars[bar].count, 7);
        assert_eq!(chart.bars[foo].count, 3);
    }

    #[test]
    fn count_extremes_include_negative_bars() {
        let chart = ChartPlotter::vertical(table(&[("a", -2), ("b", 5)]), "t", "x", "y");
        assert_eq!(chart.min_count(), -2);
        assert_eq!(chart.max_count(), 5);

        let empty = ChartPlotter::vertical(table(&[]), "t", "x", "y");
        assert_eq!((empty.min_count(), empty.max_count()), (0, 0));
    }

    #[test]
    fn device_size_scales_with_resolution() {
        assert_eq!(VERTICAL_FIGURE.to_device(300.0), (1920, 1440));
        assert_eq!(FigureSize::horizontal(40).to_device(72.0), (576, 1008));
    }
}
