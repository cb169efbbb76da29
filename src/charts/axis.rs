//! Fixed-tick axis
//! A linear f64 coordinate whose tick marks sit exactly at caller-given values.

use plotters::coord::ranged1d::{DefaultFormatting, KeyPointHint, Ranged};
use std::ops::Range;

/// Linear axis over `start..end` with ticks at `ticks`.
///
/// Labels are always supplied through the mesh label formatters, so the
/// `Debug`-based default formatting is never shown.
#[derive(Debug, Clone, PartialEq)]
pub struct TickAxis {
    start: f64,
    end: f64,
    ticks: Vec<f64>,
}

impl TickAxis {
    pub fn new(range: Range<f64>, ticks: Vec<f64>) -> Self {
        Self {
            start: range.start,
            end: range.end,
            ticks,
        }
    }

    pub fn ticks(&self) -> &[f64] {
        &self.ticks
    }
}

impl Ranged for TickAxis {
    type FormatOption = DefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        let span = self.end - self.start;
        if span == 0.0 {
            return (limit.0 + limit.1) / 2;
        }
        let ratio = (*value - self.start) / span;
        limit.0 + ((limit.1 - limit.0) as f64 * ratio).round() as i32
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        // no light lines
        if hint.weight().allow_light_points() {
            Vec::new()
        } else {
            self.ticks.clone()
        }
    }

    fn range(&self) -> Range<f64> {
        self.start..self.end
    }
}
