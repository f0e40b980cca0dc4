//! Minimal PDF 1.4 writer for laid-out [`Document`]s.
//!
//! Uses only the standard Type 1 fonts, so no font data is embedded.
//! Output is a pure function of the document: no timestamps or random IDs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::layout::{Document, Element, FilledRect, Font, Rgb, TextSpan, PAGE_HEIGHT, PAGE_WIDTH};
use crate::metrics::win_ansi;

const PT_PER_MM: f64 = 72.0 / 25.4;
const PRODUCER: &str = "Study Buddy";

/// Object numbers of the fixed objects; pages follow from 7.
const CATALOG: usize = 1;
const PAGES: usize = 2;
const FONT_REGULAR: usize = 3;
const FONT_BOLD: usize = 4;
const FONT_SYMBOL: usize = 5;
const INFO: usize = 6;
const FIRST_PAGE: usize = 7;

fn pt(mm: f64) -> f64 {
    mm * PT_PER_MM
}

/// Map a character to its ZapfDingbats code.
fn dingbat(ch: char) -> u8 {
    match ch {
        '✓' => b'3',
        '✔' => b'4',
        '✗' => b'7',
        '✘' => b'8',
        _ => b' ',
    }
}

/// Encode text as a PDF literal string, escaping delimiters and writing
/// non-ASCII bytes as octal so the content stream stays 7-bit.
fn pdf_string(text: &str, font: Font) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('(');
    for ch in text.chars() {
        let byte = match font {
            Font::Symbol => dingbat(ch),
            Font::Regular | Font::Bold => win_ansi(ch),
        };
        match byte {
            b'(' | b')' | b'\\' => {
                out.push('\\');
                out.push(byte as char);
            }
            0x20..=0x7e => out.push(byte as char),
            _ => out.push_str(&format!("\\{byte:03o}")),
        }
    }
    out.push(')');
    out
}

fn color_op(color: Rgb) -> String {
    format!(
        "{:.3} {:.3} {:.3} rg",
        color.0 as f64 / 255.0,
        color.1 as f64 / 255.0,
        color.2 as f64 / 255.0
    )
}

fn font_resource(font: Font) -> &'static str {
    match font {
        Font::Regular => "F1",
        Font::Bold => "F2",
        Font::Symbol => "F3",
    }
}

fn text_ops(span: &TextSpan) -> String {
    format!(
        "BT /{} {:.1} Tf {} {:.2} {:.2} Td {} Tj ET\n",
        font_resource(span.font),
        span.size,
        color_op(span.color),
        pt(span.x),
        pt(PAGE_HEIGHT - span.y),
        pdf_string(&span.text, span.font)
    )
}

fn rect_ops(rect: &FilledRect) -> String {
    format!(
        "{} {:.2} {:.2} {:.2} {:.2} re f\n",
        color_op(rect.color),
        pt(rect.x),
        pt(PAGE_HEIGHT - rect.y - rect.height),
        pt(rect.width),
        pt(rect.height)
    )
}

fn page_content(elements: &[Element]) -> String {
    let mut content = String::new();
    for element in elements {
        match element {
            Element::Text(span) => content.push_str(&text_ops(span)),
            Element::Rect(rect) => content.push_str(&rect_ops(rect)),
        }
    }
    content
}

/// Accumulates numbered objects and records their byte offsets.
struct PdfBuilder {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfBuilder {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    fn object(&mut self, number: usize, body: &str) {
        debug_assert_eq!(number, self.offsets.len() + 1);
        self.offsets.push(self.buf.len());
        self.buf
            .extend_from_slice(format!("{number} 0 obj\n{body}\nendobj\n").as_bytes());
    }

    fn stream(&mut self, number: usize, content: &str) {
        self.object(
            number,
            &format!(
                "<< /Length {} >>\nstream\n{content}endstream",
                content.len()
            ),
        );
    }

    fn finish(mut self) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let size = self.offsets.len() + 1;
        let mut xref = format!("xref\n0 {size}\n0000000000 65535 f \n");
        for offset in &self.offsets {
            xref.push_str(&format!("{offset:010} 00000 n \n"));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {size} /Root {CATALOG} 0 R /Info {INFO} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
        ));
        self.buf.extend_from_slice(xref.as_bytes());
        self.buf
    }
}

/// Encode a document as PDF bytes.
pub fn render_pdf(document: &Document) -> Vec<u8> {
    let page_count = document.pages.len().max(1);
    // Each page is a page object followed by its content stream.
    let page_object = |i: usize| FIRST_PAGE + 2 * i;

    let mut pdf = PdfBuilder::new();
    pdf.object(CATALOG, &format!("<< /Type /Catalog /Pages {PAGES} 0 R >>"));

    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", page_object(i)))
        .collect();
    pdf.object(
        PAGES,
        &format!(
            "<< /Type /Pages /Kids [{}] /Count {page_count} >>",
            kids.join(" ")
        ),
    );

    pdf.object(
        FONT_REGULAR,
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );
    pdf.object(
        FONT_BOLD,
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
    );
    pdf.object(
        FONT_SYMBOL,
        "<< /Type /Font /Subtype /Type1 /BaseFont /ZapfDingbats >>",
    );
    pdf.object(
        INFO,
        &format!(
            "<< /Title {} /Producer {} >>",
            pdf_string(&document.title, Font::Regular),
            pdf_string(PRODUCER, Font::Regular)
        ),
    );

    let empty = Vec::new();
    for i in 0..page_count {
        let elements = document.pages.get(i).map_or(&empty, |p| &p.elements);
        pdf.object(
            page_object(i),
            &format!(
                "<< /Type /Page /Parent {PAGES} 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Resources << /Font << /F1 {FONT_REGULAR} 0 R /F2 {FONT_BOLD} 0 R /F3 {FONT_SYMBOL} 0 R >> >> \
                 /Contents {} 0 R >>",
                pt(PAGE_WIDTH),
                pt(PAGE_HEIGHT),
                page_object(i) + 1
            ),
        );
        pdf.stream(page_object(i) + 1, &page_content(elements));
    }

    pdf.finish()
}

/// `data:application/pdf;base64,...` for the given PDF bytes.
pub fn to_data_url(pdf: &[u8]) -> String {
    format!("data:application/pdf;base64,{}", STANDARD.encode(pdf))
}
