//! Charts module - Bar chart layout and rendering

mod axis;
mod pdf;
mod pdf_font;
mod plotter;
mod renderer;

pub use axis::TickAxis;
pub use pdf::{PdfBackend, PDF_UNITS_PER_POINT, POINTS_PER_INCH};
pub use pdf_font::{PdfFont, PdfFontError};
pub use plotter::{BarChart, ChartPlotter, FigureSize, Orientation, BAR_COLOR, VERTICAL_FIGURE};
pub use renderer::{RenderError, StaticChartRenderer, CROP_PADDING_IN};
