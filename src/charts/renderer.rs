//! Static Chart Renderer
//! Draws a [`BarChart`] with plotters and encodes it as PNG or PDF bytes.
//!
//! Layout:
//! 1. Title centered above the plot
//! 2. Category axis: labels at each bar centre, in display order
//! 3. Count axis: includes 0 and every bar, whole-number ticks on a 1/2/5 step
//! 4. One series of bars, no grid, white background
//!
//! All sizes are given in points and scaled per backend, so the raster and
//! vector outputs share one layout.

use super::axis::TickAxis;
use super::pdf::{PdfBackend, PDF_UNITS_PER_POINT, POINTS_PER_INCH};
use super::pdf_font::PdfFont;
use super::plotter::{BarChart, Orientation, BAR_COLOR};
use image::{imageops, DynamicImage, ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::io::Cursor;
use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("render backend failure: {0}")]
    Backend(String),
    #[error("image buffer conversion failed")]
    Buffer,
    #[error("png encoding failure: {0}")]
    PngEncoding(#[from] image::ImageError),
}

/// Padding kept around the drawn content when cropping, in inches
pub const CROP_PADDING_IN: f64 = 0.1;

const FONT_FAMILY: &str = "sans-serif";
const TITLE_PT: f64 = 12.0;
const LABEL_PT: f64 = 10.0;
const TICK_PT: f64 = 10.0;
const MARGIN_PT: f64 = 6.0;
const LABEL_GAP_PT: f64 = 4.0;
const AXIS_LINE_PT: f64 = 0.8;

/// Fraction of a category slot covered by its bar
const BAR_WIDTH: f64 = 0.8;
/// Distance from the outer bar centres to the ends of the category axis
const SLOT_PAD: f64 = 0.6;
/// The count axis extends this far past the longest bar on either side of 0
const COUNT_HEADROOM: f64 = 1.05;
const COUNT_TICK_TARGET: usize = 5;

fn backend_err<E: std::fmt::Debug>(error: E) -> RenderError {
    RenderError::Backend(format!("{:?}", error))
}

/// Styles and label-area sizes shared by both orientations.
struct Layout {
    tick_style: TextStyle<'static>,
    label_style: TextStyle<'static>,
    axis_px: u32,
    category_area: u32,
    count_area: u32,
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render to a PNG at `dpi`, cropped to the drawn content.
    pub fn render_png(chart: &BarChart, dpi: f64) -> Result<Vec<u8>, RenderError> {
        let (width, height) = chart.size.to_device(dpi);
        log::debug!("Rendering '{}' raster at {}x{} px", chart.title, width, height);

        let mut rgb_buffer = vec![255u8; width as usize * height as usize * 3];
        {
            let root =
                BitMapBackend::with_buffer(&mut rgb_buffer, (width, height)).into_drawing_area();
            Self::draw(&root, chart, dpi / POINTS_PER_INCH)?;
            root.present().map_err(backend_err)?;
        }

        let image = RgbImage::from_raw(width, height, rgb_buffer).ok_or(RenderError::Buffer)?;
        let padding = (CROP_PADDING_IN * dpi).round() as u32;
        let cropped = Self::crop_to_content(image, padding);

        let mut output = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(cropped).write_to(&mut output, ImageFormat::Png)?;
        Ok(output.into_inner())
    }

    /// Render to a single-page PDF, cropped to the drawn content. Text is set
    /// in the embedded system sans-serif font, or Helvetica when none loads.
    pub fn render_pdf(chart: &BarChart) -> Result<Vec<u8>, RenderError> {
        let font = match PdfFont::system_sans_serif() {
            Ok(font) => Some(font),
            Err(e) => {
                log::warn!("PDF text falls back to Helvetica: {}", e);
                None
            }
        };
        Self::render_pdf_with_font(chart, font)
    }

    pub fn render_pdf_with_font(
        chart: &BarChart,
        font: Option<PdfFont>,
    ) -> Result<Vec<u8>, RenderError> {
        let units_per_inch = POINTS_PER_INCH * PDF_UNITS_PER_POINT;
        let size = chart.size.to_device(units_per_inch);
        let padding = (CROP_PADDING_IN * units_per_inch).round() as u32;
        log::debug!("Rendering '{}' vector page at {}x{} units", chart.title, size.0, size.1);

        let mut document = Vec::new();
        {
            let mut backend = PdfBackend::with_buffer(&mut document, size).with_crop_padding(padding);
            if let Some(font) = font {
                backend = backend.with_font(font);
            }
            let root = backend.into_drawing_area();
            Self::draw(&root, chart, PDF_UNITS_PER_POINT)?;
            root.present().map_err(backend_err)?;
        }
        Ok(document)
    }

    /// Draw the chart onto `root`. `px_per_pt` converts point sizes to
    /// backend units.
    pub fn draw<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &BarChart,
        px_per_pt: f64,
    ) -> Result<(), RenderError> {
        root.fill(&WHITE).map_err(backend_err)?;

        let tick_style = TextStyle::from((FONT_FAMILY, TICK_PT * px_per_pt));
        let label_style = TextStyle::from((FONT_FAMILY, LABEL_PT * px_per_pt));
        let gap = (LABEL_GAP_PT * px_per_pt).round() as u32;

        let count_range = Self::count_axis_range(chart.min_count(), chart.max_count());
        let count_ticks = Self::count_ticks(&count_range);
        let count_labels: Vec<String> = count_ticks.iter().map(|v| Self::count_label(*v)).collect();
        let category_labels: Vec<String> = chart.bars.iter().map(|b| b.label.clone()).collect();

        let (_, tick_h) = root.estimate_text_size("0", &tick_style).map_err(backend_err)?;
        let (_, label_h) = root.estimate_text_size("Ag", &label_style).map_err(backend_err)?;
        let widest = |texts: &[String]| -> Result<u32, RenderError> {
            texts.iter().try_fold(0u32, |acc, text| {
                root.estimate_text_size(text, &tick_style)
                    .map(|(w, _)| acc.max(w))
                    .map_err(backend_err)
            })
        };

        let across_area = tick_h + label_h + 3 * gap;
        let (category_area, count_area) = match chart.orientation {
            Orientation::Vertical => (across_area, widest(&count_labels)? + label_h + 3 * gap),
            Orientation::Horizontal => (widest(&category_labels)? + label_h + 3 * gap, across_area),
        };

        let layout = Layout {
            tick_style: tick_style.clone(),
            label_style,
            axis_px: (AXIS_LINE_PT * px_per_pt).round().max(1.0) as u32,
            category_area,
            count_area,
        };

        let count_axis = TickAxis::new(count_range, count_ticks);
        let mut builder = ChartBuilder::on(root);
        builder
            .caption(
                &chart.title,
                TextStyle::from((FONT_FAMILY, TITLE_PT * px_per_pt)),
            )
            .margin((MARGIN_PT * px_per_pt).round() as u32);

        match chart.orientation {
            Orientation::Vertical => Self::draw_vertical(
                &mut builder,
                chart,
                &layout,
                &category_labels,
                count_axis,
            )?,
            Orientation::Horizontal => Self::draw_horizontal(
                &mut builder,
                chart,
                &layout,
                &category_labels,
                count_axis,
            )?,
        }

        root.present().map_err(backend_err)?;
        Ok(())
    }

    fn draw_vertical<DB: DrawingBackend>(
        builder: &mut ChartBuilder<DB>,
        chart: &BarChart,
        layout: &Layout,
        category_labels: &[String],
        count_axis: TickAxis,
    ) -> Result<(), RenderError> {
        let mut cc = builder
            .x_label_area_size(layout.category_area)
            .y_label_area_size(layout.count_area)
            .build_cartesian_2d(Self::category_axis(chart.bars.len()), count_axis)
            .map_err(backend_err)?;

        let category_fmt = |v: &f64| Self::category_label(category_labels, *v);
        let count_fmt = |v: &f64| Self::count_label(*v);
        cc.configure_mesh()
            .disable_mesh()
            .x_desc(chart.x_label.as_str())
            .y_desc(chart.y_label.as_str())
            .x_label_formatter(&category_fmt)
            .y_label_formatter(&count_fmt)
            .label_style(layout.tick_style.clone())
            .axis_desc_style(layout.label_style.clone())
            .axis_style(BLACK.stroke_width(layout.axis_px))
            .draw()
            .map_err(backend_err)?;

        let color = Self::bar_color();
        cc.draw_series(chart.bars.iter().enumerate().map(|(i, bar)| {
            let centre = i as f64;
            let count = bar.count as f64;
            // negative bars hang below the zero line
            Rectangle::new(
                [
                    (centre - BAR_WIDTH / 2.0, count.max(0.0)),
                    (centre + BAR_WIDTH / 2.0, count.min(0.0)),
                ],
                color.filled(),
            )
        }))
        .map_err(backend_err)?;
        Ok(())
    }

    fn draw_horizontal<DB: DrawingBackend>(
        builder: &mut ChartBuilder<DB>,
        chart: &BarChart,
        layout: &Layout,
        category_labels: &[String],
        count_axis: TickAxis,
    ) -> Result<(), RenderError> {
        let mut cc = builder
            .x_label_area_size(layout.count_area)
            .y_label_area_size(layout.category_area)
            .build_cartesian_2d(count_axis, Self::category_axis(chart.bars.len()))
            .map_err(backend_err)?;

        let category_fmt = |v: &f64| Self::category_label(category_labels, *v);
        let count_fmt = |v: &f64| Self::count_label(*v);
        cc.configure_mesh()
            .disable_mesh()
            .x_desc(chart.x_label.as_str())
            .y_desc(chart.y_label.as_str())
            .x_label_formatter(&count_fmt)
            .y_label_formatter(&category_fmt)
            .label_style(layout.tick_style.clone())
            .axis_desc_style(layout.label_style.clone())
            .axis_style(BLACK.stroke_width(layout.axis_px))
            .draw()
            .map_err(backend_err)?;

        // First row sits at the bottom of the axis
        let color = Self::bar_color();
        cc.draw_series(chart.bars.iter().enumerate().map(|(i, bar)| {
            let centre = i as f64;
            let count = bar.count as f64;
            Rectangle::new(
                [
                    (count.min(0.0), centre + BAR_WIDTH / 2.0),
                    (count.max(0.0), centre - BAR_WIDTH / 2.0),
                ],
                color.filled(),
            )
        }))
        .map_err(backend_err)?;
        Ok(())
    }

    fn bar_color() -> RGBColor {
        RGBColor(BAR_COLOR.0, BAR_COLOR.1, BAR_COLOR.2)
    }

    /// Category axis extent for `n` slots centred on 0..n.
    fn slot_range(n: usize) -> Range<f64> {
        let end = (n as f64 - 1.0 + SLOT_PAD).max(SLOT_PAD);
        -SLOT_PAD..end
    }

    fn slot_centres(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    /// Category axis with one tick per bar centre.
    fn category_axis(n: usize) -> TickAxis {
        TickAxis::new(Self::slot_range(n), Self::slot_centres(n))
    }

    fn category_label(labels: &[String], value: f64) -> String {
        let idx = value.round();
        if idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }

    fn count_label(value: f64) -> String {
        format!("{:.0}", value)
    }

    /// Count axis extent: always includes 0, with 5% headroom past the
    /// longest bar on each side. An all-zero chart gets `0..1`.
    pub fn count_axis_range(min_count: i64, max_count: i64) -> Range<f64> {
        let low = if min_count < 0 {
            min_count as f64 * COUNT_HEADROOM
        } else {
            0.0
        };
        let high = if max_count > 0 {
            max_count as f64 * COUNT_HEADROOM
        } else {
            0.0
        };
        if high - low <= 0.0 {
            low..low + 1.0
        } else {
            low..high
        }
    }

    /// Whole-number tick positions on a common step, covering `range`.
    pub fn count_ticks(range: &Range<f64>) -> Vec<f64> {
        let step = Self::nice_step(range.end - range.start, COUNT_TICK_TARGET).max(1.0);
        let first = (range.start / step).ceil() as i64;
        (first..)
            .map(|i| i as f64 * step)
            .take_while(|v| *v <= range.end + 1e-9)
            .collect()
    }

    fn nice_step(range: f64, target_steps: usize) -> f64 {
        let raw_step = range / target_steps as f64;
        let magnitude = 10f64.powf(raw_step.log10().floor());
        let normalized = raw_step / magnitude;

        let nice = if normalized <= 1.0 {
            1.0
        } else if normalized <= 2.0 {
            2.0
        } else if normalized <= 5.0 {
            5.0
        } else {
            10.0
        };

        nice * magnitude
    }

    /// Bounding box of non-white pixels as (left, top, right, bottom), inclusive.
    fn content_bounds(image: &RgbImage) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, pixel) in image.enumerate_pixels() {
            if pixel.0 == [255, 255, 255] {
                continue;
            }
            bounds = Some(match bounds {
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                None => (x, y, x, y),
            });
        }
        bounds
    }

    /// Crop to the drawn content plus `padding`, clamped to the canvas.
    fn crop_to_content(image: RgbImage, padding: u32) -> RgbImage {
        let Some((x0, y0, x1, y1)) = Self::content_bounds(&image) else {
            return image;
        };

        let left = x0.saturating_sub(padding);
        let top = y0.saturating_sub(padding);
        let right = x1.saturating_add(padding).min(image.width() - 1);
        let bottom = y1.saturating_add(padding).min(image.height() - 1);
        imageops::crop_imm(&image, left, top, right - left + 1, bottom - top + 1).to_image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChartPlotter;
    use crate::data::{Record, RecordTable};

    fn chart(orientation: Orientation, rows: &[(&str, i64)]) -> BarChart {
        let table = RecordTable::new(
            "label",
            "count",
            rows.iter().map(|(l, c)| Record::new(*l, *c)).collect(),
        );
        ChartPlotter::build(table, orientation, "Barcode04: test", "Category", "Count")
    }

    #[test]
    fn count_axis_has_headroom_and_floor() {
        assert_eq!(StaticChartRenderer::count_axis_range(0, 0), 0.0..1.0);
        let range = StaticChartRenderer::count_axis_range(0, 100);
        assert_eq!(range.start, 0.0);
        assert!((range.end - 105.0).abs() < 1e-9);
    }

    #[test]
    fn count_axis_extends_below_zero() {
        let range = StaticChartRenderer::count_axis_range(-20, 40);
        assert!((range.start + 21.0).abs() < 1e-9);
        assert!((range.end - 42.0).abs() < 1e-9);

        // all bars negative: the axis still ends at 0
        let range = StaticChartRenderer::count_axis_range(-10, -2);
        assert!((range.start + 10.5).abs() < 1e-9);
        assert_eq!(range.end, 0.0);
    }

    #[test]
    fn count_ticks_are_whole_numbers() {
        assert_eq!(StaticChartRenderer::count_ticks(&(0.0..1.0)), vec![0.0, 1.0]);
        assert_eq!(
            StaticChartRenderer::count_ticks(&(0.0..9.45)),
            vec![0.0, 2.0, 4.0, 6.0, 8.0]
        );
        assert_eq!(
            StaticChartRenderer::count_ticks(&(0.0..105.0)),
            vec![0.0, 50.0, 100.0]
        );
    }

    #[test]
    fn count_ticks_cover_negative_range() {
        assert_eq!(
            StaticChartRenderer::count_ticks(&(-21.0..42.0)),
            vec![-20.0, 0.0, 20.0, 40.0]
        );
        assert_eq!(
            StaticChartRenderer::count_ticks(&(-10.5..0.0)),
            vec![-10.0, -5.0, 0.0]
        );
    }

    #[test]
    fn category_axis_ticks_every_bar() {
        let axis = StaticChartRenderer::category_axis(3);
        assert_eq!(axis.ticks(), &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn category_label_maps_slot_centres() {
        let labels = vec!["a".to_string(), "b".to_string()];
        assert_eq!(StaticChartRenderer::category_label(&labels, 0.0), "a");
        assert_eq!(StaticChartRenderer::category_label(&labels, 1.0), "b");
        assert_eq!(StaticChartRenderer::category_label(&labels, 2.0), "");
        assert_eq!(StaticChartRenderer::category_label(&labels, -0.6), "");
    }

    #[test]
    fn slot_range_covers_all_bars() {
        assert_eq!(StaticChartRenderer::slot_range(3), -0.6..2.6);
        assert_eq!(StaticChartRenderer::slot_range(0), -0.6..0.6);
    }

    #[test]
    fn crop_keeps_padding_around_content() {
        let mut image = RgbImage::from_pixel(100, 80, image::Rgb([255, 255, 255]));
        image.put_pixel(40, 30, image::Rgb([0, 0, 0]));
        image.put_pixel(60, 50, image::Rgb([0, 0, 0]));

        let cropped = StaticChartRenderer::crop_to_content(image, 5);
        assert_eq!(cropped.dimensions(), (31, 31));
    }

    #[test]
    fn crop_of_blank_image_is_identity() {
        let image = RgbImage::from_pixel(10, 10, image::Rgb([255, 255, 255]));
        assert_eq!(StaticChartRenderer::crop_to_content(image, 3).dimensions(), (10, 10));
    }

    #[test]
    fn png_is_cropped_inside_the_canvas() {
        let chart = chart(Orientation::Vertical, &[("chromosome", 12), ("plasmid", 4)]);
        let bytes = StaticChartRenderer::render_png(&chart, 100.0).expect("png");

        let image = image::load_from_memory(&bytes).expect("decode png");
        assert!(image.width() <= 640 && image.height() <= 480);
        assert!(image.width() > 100 && image.height() > 100);
    }

    #[test]
    fn pdf_render_is_deterministic() {
        let chart = chart(Orientation::Horizontal, &[("efflux", 3), ("target alteration", 9)]);
        let first = StaticChartRenderer::render_pdf(&chart).expect("pdf");
        let second = StaticChartRenderer::render_pdf(&chart).expect("pdf");
        assert!(first.starts_with(b"%PDF-1.4"));
        assert_eq!(first, second);
    }

    #[test]
    fn pdf_contains_title_and_labels() {
        let chart = chart(Orientation::Horizontal, &[("efflux", 3), ("target alteration", 9)]);
        let bytes = StaticChartRenderer::render_pdf_with_font(&chart, None).expect("pdf");
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("(Barcode04: test) Tj"));
        assert!(text.contains("(target alteration) Tj"));
        assert!(text.contains("(efflux) Tj"));
    }

    #[test]
    fn vertical_pdf_labels_every_category_and_tick() {
        let chart = chart(Orientation::Vertical, &[("chromosome", 12), ("plasmid", 4)]);
        let bytes = StaticChartRenderer::render_pdf_with_font(&chart, None).expect("pdf");
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("(chromosome) Tj"));
        assert!(text.contains("(plasmid) Tj"));
        assert!(text.contains("(Category) Tj"));
        assert!(text.contains("(Count) Tj"));
        for tick in ["(0) Tj", "(5) Tj", "(10) Tj"] {
            assert!(text.contains(tick), "missing tick {}", tick);
        }
    }

    #[test]
    fn negative_bars_get_negative_ticks() {
        let chart = chart(Orientation::Vertical, &[("a", 5), ("b", -3)]);
        let bytes = StaticChartRenderer::render_pdf_with_font(&chart, None).expect("pdf");
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("(-2) Tj"));
        assert!(text.contains("(4) Tj"));
        assert!(StaticChartRenderer::render_png(&chart, 72.0).is_ok());
    }

    #[test]
    fn embedded_font_keeps_greek_title() {
        let table = RecordTable::new("label", "count", vec![Record::new("β-lactam", 4)]);
        let chart = ChartPlotter::build(
            table,
            Orientation::Horizontal,
            "Barcode04: β-lactam",
            "Count",
            "Drug class",
        );
        let font = PdfFont::system_sans_serif().expect("system sans-serif font");
        let bytes = StaticChartRenderer::render_pdf_with_font(&chart, Some(font)).expect("pdf");
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Subtype /Type0"));
        assert!(text.contains("<03B2>"));
        assert!(!text.contains("(Barcode04: ?-lactam)"));
    }

    #[test]
    fn empty_chart_still_renders() {
        let chart = chart(Orientation::Horizontal, &[]);
        assert!(StaticChartRenderer::render_pdf(&chart).is_ok());
        assert!(StaticChartRenderer::render_png(&chart, 72.0).is_ok());
    }
}
