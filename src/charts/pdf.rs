//! PDF Drawing Backend
//! A plotters backend that writes a single-page vector PDF.
//!
//! Geometry is emitted as native path operators. Text is set in an embedded
//! TrueType font when one is attached with [`PdfBackend::with_font`], and in
//! the standard Helvetica font (WinAnsi encoded) otherwise. Nothing is
//! rasterized. The page is cropped to the
//! extent of what was drawn (plus padding) when the backend is presented.
//!
//! The writer emits no timestamps or document IDs: the same drawing calls
//! always produce the same bytes.

use plotters_backend::{
    text_anchor::{HPos, VPos},
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend, DrawingErrorKind,
    FontTransform,
};
use super::pdf_font::{PdfFont, UsedGlyph};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::io::Error;

/// Device units per PDF point. Drawing happens on a grid four times finer
/// than the page so integer backend coordinates stay smooth.
pub const PDF_UNITS_PER_POINT: f64 = 4.0;
pub const POINTS_PER_INCH: f64 = 72.0;

/// plotters font sizes are line heights; the em size is smaller by this ratio
const FONT_SIZE_RATIO: f64 = 1.24;
const ASCENT_EM: f64 = 0.76;
const DESCENT_EM: f64 = 0.24;
const CAP_CENTER_EM: f64 = 0.35;
/// Bezier control distance for quarter circles
const CIRCLE_KAPPA: f64 = 0.552_284_749_8;

/// WinAnsi code points outside Latin-1
const WIN_ANSI_EXTRAS: [(char, u8); 27] = [
    ('€', 0x80),
    ('‚', 0x82),
    ('ƒ', 0x83),
    ('„', 0x84),
    ('…', 0x85),
    ('†', 0x86),
    ('‡', 0x87),
    ('ˆ', 0x88),
    ('‰', 0x89),
    ('Š', 0x8A),
    ('‹', 0x8B),
    ('Œ', 0x8C),
    ('Ž', 0x8E),
    ('‘', 0x91),
    ('’', 0x92),
    ('“', 0x93),
    ('”', 0x94),
    ('•', 0x95),
    ('–', 0x96),
    ('—', 0x97),
    ('˜', 0x98),
    ('™', 0x99),
    ('š', 0x9A),
    ('›', 0x9B),
    ('œ', 0x9C),
    ('ž', 0x9E),
    ('Ÿ', 0x9F),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bounds {
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
}

impl Bounds {
    fn point(x: i32, y: i32) -> Self {
        Self {
            x0: x,
            y0: y,
            x1: x,
            y1: y,
        }
    }

    fn include(&mut self, x: i32, y: i32) {
        self.x0 = self.x0.min(x);
        self.y0 = self.y0.min(y);
        self.x1 = self.x1.max(x);
        self.y1 = self.y1.max(y);
    }
}

/// Single-page PDF backend writing into a caller-owned buffer.
pub struct PdfBackend<'a> {
    target: &'a mut Vec<u8>,
    size: (u32, u32),
    content: String,
    alphas: BTreeSet<u16>,
    bounds: Option<Bounds>,
    crop_padding: u32,
    font: Option<PdfFont>,
    glyphs: BTreeMap<u16, UsedGlyph>,
    saved: bool,
}

impl<'a> PdfBackend<'a> {
    /// Create a backend of `size` device units (see [`PDF_UNITS_PER_POINT`]).
    /// The document is written into `target` on `present()` or drop.
    pub fn with_buffer(target: &'a mut Vec<u8>, size: (u32, u32)) -> Self {
        let mut content = String::new();
        let scale = 1.0 / PDF_UNITS_PER_POINT;
        let _ = writeln!(content, "{scale} 0 0 {scale} 0 0 cm");

        Self {
            target,
            size,
            content,
            alphas: BTreeSet::new(),
            bounds: None,
            crop_padding: 0,
            font: None,
            glyphs: BTreeMap::new(),
            saved: false,
        }
    }

    /// Padding kept around the drawn extent when cropping, in device units.
    pub fn with_crop_padding(mut self, padding: u32) -> Self {
        self.crop_padding = padding;
        self
    }

    /// Set text in `font`, embedded into the document.
    pub fn with_font(mut self, font: PdfFont) -> Self {
        self.font = Some(font);
        self
    }

    fn track(&mut self, x: i32, y: i32) {
        match self.bounds.as_mut() {
            Some(bounds) => bounds.include(x, y),
            None => self.bounds = Some(Bounds::point(x, y)),
        }
    }

    fn track_with_margin(&mut self, x: i32, y: i32, margin: i32) {
        self.track(x - margin, y - margin);
        self.track(x + margin, y + margin);
    }

    /// Flip from framebuffer rows to PDF's upward y-axis.
    fn flip(&self, y: f64) -> f64 {
        self.size.1 as f64 - y
    }

    fn alpha_key(alpha: f64) -> u16 {
        (alpha.clamp(0.0, 1.0) * 1000.0).round() as u16
    }

    /// Open a graphics state with the given colour as stroke and fill.
    fn begin(&mut self, color: BackendColor) {
        let (r, g, b) = color.rgb;
        let (r, g, b) = (r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0);
        self.content.push_str("q\n");
        let _ = writeln!(self.content, "{r:.3} {g:.3} {b:.3} RG {r:.3} {g:.3} {b:.3} rg");
        let key = Self::alpha_key(color.alpha);
        if key < 1000 {
            self.alphas.insert(key);
            let _ = writeln!(self.content, "/GA{key} gs");
        }
    }

    fn end(&mut self) {
        self.content.push_str("Q\n");
    }

    fn move_to(&mut self, (x, y): BackendCoord) {
        let y = self.flip(y as f64);
        let _ = writeln!(self.content, "{x} {y} m");
    }

    fn line_to(&mut self, (x, y): BackendCoord) {
        let y = self.flip(y as f64);
        let _ = writeln!(self.content, "{x} {y} l");
    }

    /// WinAnsi byte for `ch`, if the encoding has one.
    fn win_ansi_byte(ch: char) -> Option<u8> {
        match ch as u32 {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => Some(code as u8),
            _ => WIN_ANSI_EXTRAS
                .iter()
                .find(|(extra, _)| *extra == ch)
                .map(|(_, byte)| *byte),
        }
    }

    /// Literal string for the Helvetica font; unencodable characters become `?`.
    fn escape_text(text: &str) -> String {
        let mut out = String::with_capacity(text.len() + 2);
        out.push('(');
        for ch in text.chars() {
            match Self::win_ansi_byte(ch).unwrap_or(b'?') {
                byte @ (b'(' | b')' | b'\\') => {
                    out.push('\\');
                    out.push(byte as char);
                }
                byte @ 0x20..=0x7E => out.push(byte as char),
                byte => {
                    let _ = write!(out, "\\{byte:03o}");
                }
            }
        }
        out.push(')');
        out
    }

    /// Hex string of glyph ids for the embedded font; records the glyphs used.
    fn encode_glyphs(&mut self, glyphs: &[(u16, UsedGlyph)]) -> String {
        let mut out = String::with_capacity(glyphs.len() * 4 + 2);
        out.push('<');
        for (gid, glyph) in glyphs {
            self.glyphs.entry(*gid).or_insert(*glyph);
            let _ = write!(out, "{gid:04X}");
        }
        out.push('>');
        out
    }

    /// Page box in points: the drawn extent plus padding, or the full canvas
    /// when nothing was drawn.
    fn media_box(&self) -> (f64, f64, f64, f64) {
        let (w, h) = (self.size.0 as f64, self.size.1 as f64);
        let to_pt = |v: f64| v / PDF_UNITS_PER_POINT;
        match self.bounds {
            Some(bounds) => {
                let pad = self.crop_padding as i32;
                let x0 = (bounds.x0 - pad) as f64;
                let x1 = (bounds.x1 + pad) as f64;
                let top = (bounds.y0 - pad) as f64;
                let bottom = (bounds.y1 + pad) as f64;
                (to_pt(x0), to_pt(h - bottom), to_pt(x1), to_pt(h - top))
            }
            None => (0.0, 0.0, to_pt(w), to_pt(h)),
        }
    }

    /// Serialize the complete document.
    ///
    /// Objects 1 to 5 are catalog, pages, page, font and content. An embedded
    /// font adds its descendant objects from 6 on.
    fn document(&self) -> std::io::Result<Vec<u8>> {
        let (bx0, by0, bx1, by1) = self.media_box();

        let mut ext_states = String::new();
        for key in &self.alphas {
            let alpha = *key as f64 / 1000.0;
            let _ = write!(
                ext_states,
                " /GA{key} << /Type /ExtGState /CA {alpha:.3} /ca {alpha:.3} >>"
            );
        }

        let mut objects: Vec<Vec<u8>> = vec![
            b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
            b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec(),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [{bx0:.2} {by0:.2} {bx1:.2} {by1:.2}] \
                 /Resources << /Font << /F1 4 0 R >> /ExtGState <<{ext_states} >> >> \
                 /Contents 5 0 R >>"
            )
            .into_bytes(),
        ];

        let mut font_objects = match &self.font {
            Some(font) => font.objects(6, &self.glyphs)?,
            None => vec![
                b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                    .to_vec(),
            ],
        };
        let descendants = font_objects.split_off(1);
        objects.append(&mut font_objects);
        objects.push(
            format!(
                "<< /Length {} >>\nstream\n{}endstream",
                self.content.len(),
                self.content
            )
            .into_bytes(),
        );
        // descendants were numbered to follow the content stream
        objects.extend(descendants);

        let mut out: Vec<u8> = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        let mut offsets = Vec::with_capacity(objects.len());
        for (idx, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n", idx + 1).as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_offset = out.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in &offsets {
            let _ = write!(xref, "{offset:010} 00000 n \n");
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        );
        out.extend_from_slice(xref.as_bytes());
        Ok(out)
    }
}

impl DrawingBackend for PdfBackend<'_> {
    type ErrorType = Error;

    fn get_size(&self) -> (u32, u32) {
        self.size
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Error>> {
        Ok(())
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Error>> {
        if !self.saved {
            let document = self.document().map_err(DrawingErrorKind::DrawingError)?;
            self.target.clear();
            self.target.extend_from_slice(&document);
            self.saved = true;
        }
        Ok(())
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<Error>> {
        if color.alpha == 0.0 {
            return Ok(());
        }
        self.begin(color);
        let y = self.flip(point.1 as f64 + 1.0);
        let _ = writeln!(self.content, "{} {} 1 1 re f", point.0, y);
        self.end();
        self.track(point.0, point.1);
        self.track(point.0 + 1, point.1 + 1);
        Ok(())
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Error>> {
        self.draw_path([from, to], style)
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Error>> {
        let color = style.color();
        if color.alpha == 0.0 {
            return Ok(());
        }

        let (x0, y0) = upper_left;
        let (x1, y1) = bottom_right;
        let width = x1 - x0;
        let height = y1 - y0;
        let bottom = self.flip(y1 as f64);

        self.begin(color);
        if fill {
            let _ = writeln!(self.content, "{x0} {bottom} {width} {height} re f");
        } else {
            let _ = writeln!(self.content, "{} w", style.stroke_width());
            let _ = writeln!(self.content, "{x0} {bottom} {width} {height} re S");
        }
        self.end();

        // A fill covering the whole canvas is the page background and does
        // not count toward the crop box.
        let (w, h) = (self.size.0 as i32, self.size.1 as i32);
        let is_background = fill && x0 <= 0 && y0 <= 0 && x1 >= w - 1 && y1 >= h - 1;
        if !is_background {
            let margin = if fill { 0 } else { style.stroke_width() as i32 / 2 };
            self.track_with_margin(x0, y0, margin);
            self.track_with_margin(x1, y1, margin);
        }
        Ok(())
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Error>> {
        let color = style.color();
        if color.alpha == 0.0 {
            return Ok(());
        }

        let points: Vec<BackendCoord> = path.into_iter().collect();
        let Some((&first, rest)) = points.split_first() else {
            return Ok(());
        };

        let margin = (style.stroke_width() as i32 + 1) / 2;
        self.begin(color);
        let _ = writeln!(self.content, "{} w", style.stroke_width());
        self.move_to(first);
        self.track_with_margin(first.0, first.1, margin);
        for &point in rest {
            self.line_to(point);
            self.track_with_margin(point.0, point.1, margin);
        }
        self.content.push_str("S\n");
        self.end();
        Ok(())
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Error>> {
        let color = style.color();
        if color.alpha == 0.0 {
            return Ok(());
        }

        let (cx, cy) = (center.0 as f64, self.flip(center.1 as f64));
        let r = radius as f64;
        let k = r * CIRCLE_KAPPA;

        self.begin(color);
        if !fill {
            let _ = writeln!(self.content, "{} w", style.stroke_width());
        }
        let _ = writeln!(self.content, "{:.2} {:.2} m", cx + r, cy);
        let _ = writeln!(
            self.content,
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
            cx + r, cy + k, cx + k, cy + r, cx, cy + r
        );
        let _ = writeln!(
            self.content,
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
            cx - k, cy + r, cx - r, cy + k, cx - r, cy
        );
        let _ = writeln!(
            self.content,
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
            cx - r, cy - k, cx - k, cy - r, cx, cy - r
        );
        let _ = writeln!(
            self.content,
            "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} c",
            cx + k, cy - r, cx + r, cy - k, cx + r, cy
        );
        self.content.push_str(if fill { "f\n" } else { "S\n" });
        self.end();

        let margin = radius as i32 + style.stroke_width() as i32;
        self.track_with_margin(center.0, center.1, margin);
        Ok(())
    }

    fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        vert: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Error>> {
        let color = style.color();
        if color.alpha == 0.0 {
            return Ok(());
        }

        let points: Vec<BackendCoord> = vert.into_iter().collect();
        let Some((&first, rest)) = points.split_first() else {
            return Ok(());
        };

        self.begin(color);
        self.move_to(first);
        self.track(first.0, first.1);
        for &point in rest {
            self.line_to(point);
            self.track(point.0, point.1);
        }
        self.content.push_str("h f\n");
        self.end();
        Ok(())
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Error>> {
        let color = style.color();
        if color.alpha == 0.0 || text.is_empty() {
            return Ok(());
        }

        let em = style.size() / FONT_SIZE_RATIO;
        let shaped = self
            .font
            .as_ref()
            .map(|font| (font.glyphs(text), font.units_per_em()));
        let (width, encoded) = match shaped {
            Some((glyphs, units_per_em)) => {
                let advance: f64 = glyphs.iter().map(|(_, glyph)| glyph.advance as f64).sum();
                (advance * em / units_per_em, self.encode_glyphs(&glyphs))
            }
            None => {
                let ((min_x, _), (max_x, _)) = style
                    .layout_box(text)
                    .map_err(|e| DrawingErrorKind::FontError(Box::new(e)))?;
                ((max_x - min_x) as f64, Self::escape_text(text))
            }
        };

        let anchor = style.anchor();
        let dx = match anchor.h_pos {
            HPos::Left => 0.0,
            HPos::Center => -width / 2.0,
            HPos::Right => -width,
        };
        let baseline = match anchor.v_pos {
            VPos::Top => ASCENT_EM * em,
            VPos::Center => CAP_CENTER_EM * em,
            VPos::Bottom => -DESCENT_EM * em,
        };

        // Same clockwise convention as FontTransform::transform
        let transform = style.transform();
        let rotate = |x: f64, y: f64| -> (f64, f64) {
            match transform {
                FontTransform::None => (x, y),
                FontTransform::Rotate90 => (-y, x),
                FontTransform::Rotate180 => (-x, -y),
                FontTransform::Rotate270 => (y, -x),
            }
        };
        let matrix: (i32, i32, i32, i32) = match transform {
            FontTransform::None => (1, 0, 0, 1),
            FontTransform::Rotate90 => (0, -1, 1, 0),
            FontTransform::Rotate180 => (-1, 0, 0, -1),
            FontTransform::Rotate270 => (0, 1, -1, 0),
        };

        let top = baseline - ASCENT_EM * em;
        let bottom = baseline + DESCENT_EM * em;
        for (lx, ly) in [(dx, top), (dx + width, top), (dx, bottom), (dx + width, bottom)] {
            let (rx, ry) = rotate(lx, ly);
            self.track(
                (pos.0 as f64 + rx).round() as i32,
                (pos.1 as f64 + ry).round() as i32,
            );
        }

        let (ox, oy) = rotate(dx, baseline);
        let x = pos.0 as f64 + ox;
        let y = self.flip(pos.1 as f64 + oy);
        let (a, b, c, d) = matrix;

        self.begin(color);
        let _ = writeln!(
            self.content,
            "BT /F1 {em:.2} Tf {a} {b} {c} {d} {x:.2} {y:.2} Tm {encoded} Tj ET"
        );
        self.end();
        Ok(())
    }
}

impl Drop for PdfBackend<'_> {
    fn drop(&mut self) {
        if !self.saved {
            // drop must not panic; an unpresented drawing is written as-is
            let _ = self.present();
        }
    }
}
