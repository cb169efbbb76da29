//! PDF Font Module
//! Loads the system sans-serif TrueType font and writes the PDF objects that
//! embed it as a CID-keyed (Type0, Identity-H) font.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use font_kit::family_name::FamilyName;
use font_kit::handle::Handle;
use font_kit::properties::Properties;
use font_kit::source::SystemSource;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::sync::Arc;
use thiserror::Error;
use ttf_parser::{name_id, Face, GlyphId};

/// PDF glyph space: widths and metrics are expressed per 1000 em units
const GLYPH_SPACE: f64 = 1000.0;
/// ToUnicode `bfchar` blocks are limited to 100 entries
const BFCHAR_LIMIT: usize = 100;
const FALLBACK_NAME: &str = "EmbeddedSans";

#[derive(Error, Debug)]
pub enum PdfFontError {
    #[error("no system sans-serif font found: {0}")]
    NotFound(String),
    #[error("failed to read font file: {0}")]
    Io(#[from] std::io::Error),
    #[error("font data could not be parsed: {0}")]
    Parse(#[from] ttf_parser::FaceParsingError),
    #[error("font collections and CFF-outline fonts cannot be embedded")]
    Unsupported,
}

/// A TrueType font program ready to be embedded.
#[derive(Clone)]
pub struct PdfFont {
    data: Arc<Vec<u8>>,
    index: u32,
    base_name: String,
    units_per_em: f64,
    ascent: i16,
    descent: i16,
    cap_height: i16,
    bbox: [i16; 4],
}

/// A glyph used by the page, keyed by glyph id in [`PdfFont::objects`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsedGlyph {
    pub ch: char,
    pub advance: u16,
}

impl PdfFont {
    /// The font plotters resolves for "sans-serif" on this system.
    pub fn system_sans_serif() -> Result<Self, PdfFontError> {
        let handle = SystemSource::new()
            .select_best_match(&[FamilyName::SansSerif], &Properties::new())
            .map_err(|e| PdfFontError::NotFound(format!("{:?}", e)))?;

        let (data, index) = match handle {
            Handle::Path { path, font_index } => (fs::read(&path)?, font_index),
            Handle::Memory { bytes, font_index } => (bytes.to_vec(), font_index),
        };
        Self::from_bytes(data, index)
    }

    /// Wrap a single TrueType font file.
    pub fn from_bytes(data: Vec<u8>, index: u32) -> Result<Self, PdfFontError> {
        // FontFile2 holds exactly one glyf-based font
        if data.starts_with(b"ttcf") || data.starts_with(b"OTTO") {
            return Err(PdfFontError::Unsupported);
        }

        let face = Face::parse(&data, index)?;
        let bbox = face.global_bounding_box();
        let ascent = face.ascender();
        let base_name = face
            .names()
            .into_iter()
            .filter(|name| name.name_id == name_id::POST_SCRIPT_NAME)
            .find_map(|name| name.to_string())
            .map(|name| {
                name.chars()
                    .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                    .collect::<String>()
            })
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| FALLBACK_NAME.to_string());

        let font = Self {
            index,
            base_name,
            units_per_em: face.units_per_em() as f64,
            ascent,
            descent: face.descender(),
            cap_height: face.capital_height().unwrap_or(ascent),
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
            data: Arc::new(data),
        };
        log::debug!("Embedding font {} for PDF text", font.base_name);
        Ok(font)
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn units_per_em(&self) -> f64 {
        self.units_per_em
    }

    /// Glyph id and advance for each character. Characters the font lacks map
    /// to glyph 0.
    pub fn glyphs(&self, text: &str) -> Vec<(u16, UsedGlyph)> {
        // already validated in from_bytes
        let Ok(face) = Face::parse(&self.data, self.index) else {
            return Vec::new();
        };
        text.chars()
            .map(|ch| {
                let gid = face.glyph_index(ch).unwrap_or(GlyphId(0));
                let advance = face.glyph_hor_advance(gid).unwrap_or(0);
                (gid.0, UsedGlyph { ch, advance })
            })
            .collect()
    }

    fn scale(&self, value: f64) -> i64 {
        (value * GLYPH_SPACE / self.units_per_em).round() as i64
    }

    /// Bodies of the five objects that make up the embedded font: the Type0
    /// font first, then CIDFont, descriptor, font file and ToUnicode, which are
    /// numbered consecutively from `first_descendant`.
    pub fn objects(
        &self,
        first_descendant: usize,
        used: &BTreeMap<u16, UsedGlyph>,
    ) -> std::io::Result<Vec<Vec<u8>>> {
        let cid_font = first_descendant;
        let descriptor = first_descendant + 1;
        let font_file = first_descendant + 2;
        let to_unicode = first_descendant + 3;
        let name = &self.base_name;

        let type0 = format!(
            "<< /Type /Font /Subtype /Type0 /BaseFont /{name} /Encoding /Identity-H \
             /DescendantFonts [{cid_font} 0 R] /ToUnicode {to_unicode} 0 R >>"
        );

        let mut widths = String::new();
        for (gid, glyph) in used {
            let _ = write!(widths, " {} [{}]", gid, self.scale(glyph.advance as f64));
        }
        let cid = format!(
            "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{name} \
             /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
             /FontDescriptor {descriptor} 0 R /DW 1000 /W [{widths} ] /CIDToGIDMap /Identity >>"
        );

        let [x0, y0, x1, y1] = self.bbox;
        let desc = format!(
            "<< /Type /FontDescriptor /FontName /{name} /Flags 32 /FontBBox [{} {} {} {}] \
             /ItalicAngle 0 /Ascent {} /Descent {} /CapHeight {} /StemV 80 /FontFile2 {font_file} 0 R >>",
            self.scale(x0 as f64),
            self.scale(y0 as f64),
            self.scale(x1 as f64),
            self.scale(y1 as f64),
            self.scale(self.ascent as f64),
            self.scale(self.descent as f64),
            self.scale(self.cap_height as f64),
        );

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.data)?;
        let packed = encoder.finish()?;
        let mut file = format!(
            "<< /Length {} /Length1 {} /Filter /FlateDecode >>\nstream\n",
            packed.len(),
            self.data.len()
        )
        .into_bytes();
        file.extend_from_slice(&packed);
        file.extend_from_slice(b"\nendstream");

        let cmap = Self::to_unicode_cmap(used);
        let unicode = format!("<< /Length {} >>\nstream\n{}endstream", cmap.len(), cmap);

        Ok(vec![
            type0.into_bytes(),
            cid.into_bytes(),
            desc.into_bytes(),
            file,
            unicode.into_bytes(),
        ])
    }

    /// CMap mapping glyph ids back to text, so the PDF stays searchable.
    pub fn to_unicode_cmap(used: &BTreeMap<u16, UsedGlyph>) -> String {
        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
             /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
             /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
             1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
        );

        // glyph 0 is .notdef and may stand for several characters
        let entries: Vec<(&u16, &UsedGlyph)> = used.iter().filter(|(gid, _)| **gid != 0).collect();
        for chunk in entries.chunks(BFCHAR_LIMIT) {
            let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
            for (gid, glyph) in chunk {
                let mut units = [0u16; 2];
                let utf16: String = glyph
                    .ch
                    .encode_utf16(&mut units)
                    .iter()
                    .map(|unit| format!("{unit:04X}"))
                    .collect();
                let _ = writeln!(cmap, "<{:04X}> <{}>", gid, utf16);
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
        cmap
    }
}
