//! PDF writer: draws laid-out pages with `lopdf` using the base-14 Helvetica faces.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::render::font_metrics::FontFace;
use crate::render::layout::{layout_report, Page, PageGeometry, TextStyle, REPORT_TITLE};
use crate::render::{RenderError, ReportRenderer};
use crate::scoring::ReportDocument;

/// Default renderer: A4 pages, Helvetica, footer page numbers.
#[derive(Debug, Clone, Copy)]
pub struct LopdfRenderer {
    geometry: PageGeometry,
}

impl LopdfRenderer {
    pub fn new() -> Self {
        Self {
            geometry: PageGeometry::a4(),
        }
    }
}

impl Default for LopdfRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRenderer for LopdfRenderer {
    fn render_pdf(&self, doc: &ReportDocument) -> Result<Vec<u8>, RenderError> {
        let pages = layout_report(doc, &self.geometry);
        write_pdf(&pages, &self.geometry)
    }
}

pub fn write_pdf(pages: &[Page], geometry: &PageGeometry) -> Result<Vec<u8>, RenderError> {
    if pages.is_empty() {
        return Err(RenderError::EmptyLayout);
    }

    let mut pdf = Document::with_version("1.5");
    let pages_id = pdf.new_object_id();

    let mut fonts = lopdf::Dictionary::new();
    for face in [FontFace::Regular, FontFace::Bold] {
        let font_id = pdf.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource_name(), font_id);
    }
    let resources_id = pdf.add_object(dictionary! { "Font" => fonts });

    let total = pages.len();
    let mut kids: Vec<Object> = Vec::with_capacity(total);
    for (index, page) in pages.iter().enumerate() {
        let content = Content {
            operations: page_operations(page, index + 1, total, geometry),
        };
        let encoded = content
            .encode()
            .map_err(|e| RenderError::Pdf(format!("content stream encoding failed: {e}")))?;
        let content_id = pdf.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    pdf.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => total as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(geometry.width_pt as i64),
                Object::Integer(geometry.height_pt as i64),
            ],
        }),
    );

    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = pdf.add_object(dictionary! {
        "Title" => Object::string_literal(REPORT_TITLE),
        "Producer" => Object::string_literal(concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))),
    });
    pdf.trailer.set("Root", catalog_id);
    pdf.trailer.set("Info", info_id);
    pdf.compress();

    let mut bytes = Vec::new();
    pdf.save_to(&mut bytes)
        .map_err(|e| RenderError::Pdf(format!("failed to serialise document: {e}")))?;
    Ok(bytes)
}

fn page_operations(page: &Page, number: usize, total: usize, geometry: &PageGeometry) -> Vec<Operation> {
    let mut ops = Vec::with_capacity(page.lines.len() * 5 + 5);
    for line in &page.lines {
        push_text(&mut ops, line.style, line.x_pt, line.y_pt, &line.text);
    }

    let footer = format!("Page {number} of {total}");
    let style = TextStyle::Footer;
    let width = style.face().metrics().measure_pt(&footer, style.size_pt());
    let x = (geometry.width_pt - width) / 2.0;
    let y = geometry.margin_pt / 2.0;
    push_text(&mut ops, style, x, y, &footer);
    ops
}

fn push_text(ops: &mut Vec<Operation>, style: TextStyle, x: f32, y: f32, text: &str) {
    let color = style.color();
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![style.face().resource_name().into(), Object::from(style.size_pt())],
    ));
    ops.push(Operation::new(
        "rg",
        vec![Object::from(color.0), Object::from(color.1), Object::from(color.2)],
    ));
    ops.push(Operation::new("Td", vec![Object::from(x), Object::from(y)]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::string_literal(encode_win_ansi(text))],
    ));
    ops.push(Operation::new("ET", vec![]));
}

/// Encodes text for a WinAnsiEncoding simple font. Characters outside the code page
/// become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            c if (c as u32) < 0x80 || (0xA0..=0xFF).contains(&(c as u32)) => c as u8,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::QuestionCatalog;
    use crate::scoring::{compose, AnswerSet};

    fn sample_report(answered: bool) -> ReportDocument {
        let catalog = QuestionCatalog::built_in();
        let answers: AnswerSet = if answered {
            catalog
                .questions()
                .iter()
                .map(|q| (q.id.clone(), 6.0))
                .collect()
        } else {
            AnswerSet::new()
        };
        compose(&catalog, &answers, None, 2)
    }

    #[test]
    fn test_renders_loadable_pdf() {
        let doc = sample_report(true);
        let bytes = LopdfRenderer::new().render_pdf(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let expected_pages = layout_report(&doc, &PageGeometry::a4()).len();
        let loaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(loaded.get_pages().len(), expected_pages);
    }

    #[test]
    fn test_empty_report_renders_single_page() {
        let bytes = LopdfRenderer::new().render_pdf(&sample_report(false)).unwrap();
        let loaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(loaded.get_pages().len(), 1);
    }

    #[test]
    fn test_no_pages_is_an_error() {
        let err = write_pdf(&[], &PageGeometry::a4()).unwrap_err();
        assert!(matches!(err, RenderError::EmptyLayout));
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("A \u{2022} \u{2014}"), vec![b'A', b' ', 0x95, b' ', 0x97]);
        assert_eq!(encode_win_ansi("caf\u{e9}"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_win_ansi("\u{4e2d}"), vec![b'?']);
    }
}
