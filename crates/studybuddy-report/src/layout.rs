//! Page layout for A4 reports.
//!
//! Coordinates are millimetres from the top-left corner of the page; `y`
//! is a text baseline. A [`PageWriter`] owns the vertical cursor and starts
//! new pages so that no baseline lands below [`BOTTOM_MARGIN`].

use textwrap::core::Fragment;
use textwrap::wrap_algorithms::wrap_first_fit;

use crate::metrics::advance;

pub const PAGE_WIDTH: f64 = 210.0;
pub const PAGE_HEIGHT: f64 = 297.0;
pub const TOP_MARGIN: f64 = 20.0;
pub const BOTTOM_MARGIN: f64 = 270.0;
pub const LINE_HEIGHT: f64 = 5.0;
/// No text runs right of this.
pub const RIGHT_EDGE: f64 = PAGE_WIDTH - 25.0;

const MM_PER_PT: f64 = 25.4 / 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const RED: Rgb = Rgb(220, 38, 38);
    pub const GREEN: Rgb = Rgb(34, 197, 94);
    pub const SUMMARY_FILL: Rgb = Rgb(240, 240, 255);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
    /// Dingbats; carries the check and cross glyphs.
    Symbol,
}

/// One run of text at a fixed position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub font: Font,
    pub color: Rgb,
    pub text: String,
}

impl TextSpan {
    /// Where the last glyph ends.
    pub fn right(&self) -> f64 {
        self.x + text_width(&self.text, self.font, self.size)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilledRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text(TextSpan),
    Rect(FilledRect),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<Element>,
}

impl Page {
    pub fn text_spans(&self) -> impl Iterator<Item = &TextSpan> {
        self.elements.iter().filter_map(|e| match e {
            Element::Text(span) => Some(span),
            Element::Rect(_) => None,
        })
    }
}

/// A laid-out report, ready to encode.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    pub pages: Vec<Page>,
}

impl Document {
    /// All text on every page, in drawing order.
    pub fn text_spans(&self) -> impl Iterator<Item = &TextSpan> {
        self.pages.iter().flat_map(Page::text_spans)
    }
}

fn units_to_mm(units: u32, size: f64) -> f64 {
    f64::from(units) / 1000.0 * size * MM_PER_PT
}

fn units(text: &str, font: Font) -> u32 {
    text.chars().map(|ch| u32::from(advance(ch, font))).sum()
}

/// Printed width of `text` in millimetres.
pub fn text_width(text: &str, font: Font, size: f64) -> f64 {
    units_to_mm(units(text, font), size)
}

/// A word, or a piece of a word too long for one line.
#[derive(Debug)]
struct Measured<'a> {
    text: &'a str,
    width: f64,
    /// Space after the fragment; zero between pieces of a broken word.
    gap: f64,
}

impl Fragment for Measured<'_> {
    fn width(&self) -> f64 {
        self.width
    }

    fn whitespace_width(&self) -> f64 {
        self.gap
    }

    fn penalty_width(&self) -> f64 {
        0.0
    }
}

/// Split `word` into pieces no wider than `width`; every piece keeps at
/// least one character.
fn push_word<'a>(out: &mut Vec<Measured<'a>>, word: &'a str, width: f64, font: Font, size: f64) {
    let gap = text_width(" ", font, size);
    let mut start = 0;
    let mut used = 0;
    for (i, ch) in word.char_indices() {
        let step = u32::from(advance(ch, font));
        if i > start && units_to_mm(used + step, size) > width {
            out.push(Measured {
                text: &word[start..i],
                width: units_to_mm(used, size),
                gap: 0.0,
            });
            start = i;
            used = 0;
        }
        used += step;
    }
    out.push(Measured {
        text: &word[start..],
        width: units_to_mm(used, size),
        gap,
    });
}

fn join(line: &[Measured<'_>]) -> String {
    let mut out = String::new();
    for (i, fragment) in line.iter().enumerate() {
        if i > 0 && line[i - 1].gap > 0.0 {
            out.push(' ');
        }
        out.push_str(fragment.text);
    }
    out
}

/// Wrap `text` so that every line fits in `width` millimetres when set in
/// `font` at `size`. Line breaks in `text` are kept.
pub fn wrap_to_width(text: &str, width: f64, font: Font, size: f64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut fragments = Vec::new();
        for word in paragraph.split_whitespace() {
            push_word(&mut fragments, word, width, font, size);
        }
        if fragments.is_empty() {
            lines.push(String::new());
            continue;
        }
        lines.extend(wrap_first_fit(&fragments, &[width]).into_iter().map(join));
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Style shared by every line of a text block.
#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub size: f64,
    pub font: Font,
    pub color: Rgb,
}

impl Style {
    pub const fn new(size: f64, font: Font, color: Rgb) -> Self {
        Self { size, font, color }
    }

    pub const fn with_color(self, color: Rgb) -> Self {
        Self { color, ..self }
    }
}

/// Cursor-driven page builder.
pub struct PageWriter {
    pages: Vec<Page>,
    y: f64,
}

impl Default for PageWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PageWriter {
    pub fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: TOP_MARGIN,
        }
    }

    /// Current baseline.
    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn move_to(&mut self, y: f64) {
        self.y = y;
    }

    pub fn advance(&mut self, dy: f64) {
        self.y += dy;
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page_break(&mut self) {
        self.pages.push(Page::default());
        self.y = TOP_MARGIN;
    }

    /// Start a new page if a block whose baselines span `extent` below the
    /// cursor would cross the bottom margin. Blocks taller than a page are
    /// left to flow line by line.
    pub fn keep_together(&mut self, extent: f64) {
        let fits_on_a_page = extent <= BOTTOM_MARGIN - TOP_MARGIN;
        if fits_on_a_page && self.y + extent > BOTTOM_MARGIN {
            self.page_break();
        }
    }

    fn current_page(&mut self) -> &mut Page {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn push_span(&mut self, x: f64, y: f64, style: Style, text: &str) {
        self.current_page().elements.push(Element::Text(TextSpan {
            x,
            y,
            size: style.size,
            font: style.font,
            color: style.color,
            text: text.to_string(),
        }));
    }

    /// Place a single line at the cursor without advancing it.
    pub fn text(&mut self, x: f64, style: Style, text: &str) {
        if self.y > BOTTOM_MARGIN {
            self.page_break();
        }
        let y = self.y;
        self.push_span(x, y, style, text);
    }

    /// Place a single line horizontally centred on the page.
    pub fn centered(&mut self, style: Style, text: &str) {
        let x = ((PAGE_WIDTH - text_width(text, style.font, style.size)) / 2.0).max(0.0);
        self.text(x, style, text);
    }

    /// Fill a rectangle whose top edge is `top`.
    pub fn rect(&mut self, x: f64, top: f64, width: f64, height: f64, color: Rgb) {
        self.current_page().elements.push(Element::Rect(FilledRect {
            x,
            y: top,
            width,
            height,
            color,
        }));
    }

    /// Wrap `text` to `width` and write it line by line from the cursor,
    /// `LINE_HEIGHT` apart. Returns the number of lines written; the cursor
    /// ends `lines * LINE_HEIGHT` below where the block started (on its
    /// last page).
    pub fn paragraph(&mut self, x: f64, width: f64, style: Style, text: &str) -> usize {
        let lines = wrap_to_width(text, width, style.font, style.size);
        self.keep_together((lines.len() - 1) as f64 * LINE_HEIGHT);
        for line in &lines {
            self.text(x, style, line);
            self.y += LINE_HEIGHT;
        }
        lines.len()
    }

    pub fn finish(self, title: &str) -> Document {
        Document {
            title: title.to_string(),
            pages: self.pages,
        }
    }
}
