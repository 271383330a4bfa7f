//! HTML to PDF rendering.
//!
//! [`PrintPdfRenderer`] is deliberately simple: it flows headings and paragraphs
//! top to bottom with greedy word wrapping and places images at their natural
//! size (shrunk to fit the page). Images must be referenced by absolute path.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use printpdf::image_crate::GenericImageView;
use printpdf::{
    Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference,
};

use crate::app::{ConvertError, Result};
use crate::config::PdfConfig;
use crate::markup::{self, Block};

pub const UTF_8: &str = "UTF-8";

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MM_PER_PT: f32 = 25.4 / 72.0;
const IMAGE_DPI: f32 = 96.0;
const LINE_SPACING: f32 = 1.4;
const HEADING_SCALE: f32 = 1.4;
// average advance of a proportional glyph, as a fraction of the font size
const GLYPH_WIDTH: f32 = 0.5;

/// Renders a styled HTML document into PDF bytes written to `dest`.
pub trait PdfRenderer {
    fn render(&self, html: &str, font: &Path, encoding: &str, dest: &mut dyn Write) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct PrintPdfRenderer {
    font_size_pt: f32,
    margin_mm: f32,
}

impl Default for PrintPdfRenderer {
    fn default() -> Self {
        Self::new(&PdfConfig::default())
    }
}

impl PrintPdfRenderer {
    pub fn new(config: &PdfConfig) -> Self {
        Self {
            font_size_pt: config.font_size_pt,
            margin_mm: config.margin_mm,
        }
    }
}

impl PdfRenderer for PrintPdfRenderer {
    fn render(&self, html: &str, font: &Path, encoding: &str, dest: &mut dyn Write) -> Result<()> {
        if !is_utf8(encoding) {
            return Err(ConvertError::PdfRender(format!(
                "unsupported encoding {}",
                encoding
            )));
        }

        let blocks = markup::blocks(html)?;
        let title = markup::to_text(&title_of(html)).unwrap_or_default();

        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");

        let font_file = File::open(font).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConvertError::AssetNotFound {
                    path: font.to_path_buf(),
                }
            } else {
                ConvertError::Io(e)
            }
        })?;
        let font_ref = doc
            .add_external_font(BufReader::new(font_file))
            .map_err(|e| ConvertError::PdfRender(format!("font {}: {}", font.display(), e)))?;

        let mut pages = PageFlow {
            doc: &doc,
            layer: doc.get_page(page).get_layer(layer),
            font: font_ref,
            y: PAGE_HEIGHT_MM - self.margin_mm,
            margin: self.margin_mm,
            page_count: 1,
        };

        for block in &blocks {
            match block {
                Block::Heading(text) => pages.text(text, self.font_size_pt * HEADING_SCALE),
                Block::Paragraph(text) => pages.text(text, self.font_size_pt),
                Block::Image(src) => pages.image(Path::new(src)),
            }
        }
        tracing::debug!(blocks = blocks.len(), pages = pages.page_count, "Laid out PDF");

        let bytes = doc
            .save_to_bytes()
            .map_err(|e| ConvertError::PdfRender(e.to_string()))?;
        dest.write_all(&bytes)?;
        Ok(())
    }
}

fn is_utf8(encoding: &str) -> bool {
    encoding.eq_ignore_ascii_case("utf-8") || encoding.eq_ignore_ascii_case("utf8")
}

fn title_of(html: &str) -> String {
    let start = html.find("<title>").map(|i| i + "<title>".len());
    let end = html.find("</title>");
    match (start, end) {
        (Some(start), Some(end)) if start <= end => html[start..end].to_string(),
        _ => String::new(),
    }
}

/// Greedy word wrap on an approximate glyph width. Overlong words get a line of their own.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut width = 0;

    for word in text.split_whitespace() {
        let len = word.chars().count();
        if width > 0 && width + 1 + len > max_chars {
            lines.push(std::mem::take(&mut line));
            width = 0;
        }
        if width > 0 {
            line.push(' ');
            width += 1;
        }
        line.push_str(word);
        width += len;
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

struct PageFlow<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    y: f32,
    margin: f32,
    page_count: usize,
}

impl PageFlow<'_> {
    fn content_width(&self) -> f32 {
        PAGE_WIDTH_MM - 2.0 * self.margin
    }

    fn content_height(&self) -> f32 {
        PAGE_HEIGHT_MM - 2.0 * self.margin
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT_MM - self.margin;
        self.page_count += 1;
    }

    /// Move down by `height`, starting a new page when it would cross the bottom margin.
    fn reserve(&mut self, height: f32) {
        if self.y - height < self.margin && self.y < PAGE_HEIGHT_MM - self.margin {
            self.new_page();
        }
        self.y -= height;
    }

    fn text(&mut self, text: &str, size_pt: f32) {
        let line_height = size_pt * MM_PER_PT * LINE_SPACING;
        let max_chars = (self.content_width() / (size_pt * MM_PER_PT * GLYPH_WIDTH)) as usize;

        for line in wrap(text, max_chars) {
            self.reserve(line_height);
            self.layer
                .use_text(line, size_pt, Mm(self.margin), Mm(self.y), &self.font);
        }
        // paragraph gap
        self.y -= line_height / 2.0;
    }

    fn image(&mut self, path: &Path) {
        let decoded = std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                printpdf::image_crate::load_from_memory(&bytes).map_err(|e| e.to_string())
            });
        let image = match decoded {
            Ok(image) => image,
            Err(reason) => {
                tracing::warn!(path = %path.display(), %reason, "Skipping image");
                return;
            }
        };

        let (width_px, height_px) = image.dimensions();
        if width_px == 0 || height_px == 0 {
            return;
        }
        let width = width_px as f32 * 25.4 / IMAGE_DPI;
        let height = height_px as f32 * 25.4 / IMAGE_DPI;
        let scale = 1f32
            .min(self.content_width() / width)
            .min(self.content_height() / height);

        self.reserve(height * scale);
        Image::from_dynamic_image(&image).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(self.margin)),
                translate_y: Some(Mm(self.y)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
        self.y -= 2.0;
    }
}
