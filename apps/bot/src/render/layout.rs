//! CV page layout: turns a `CvRecord` into positioned lines, page by page.
//!
//! Pure and deterministic: no PDF types here, so pagination and wrapping are
//! testable without inspecting document bytes. Coordinates are PDF points
//! with the origin at the bottom-left corner of the page.

use crate::models::CvRecord;
use crate::render::font_metrics::{get_metrics, FontWeight};

/// Typography of one kind of block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_size_pt: f32,
    pub weight: FontWeight,
    /// RGB, each channel 0.0 – 1.0.
    pub color: (f32, f32, f32),
    pub space_before_pt: f32,
    pub space_after_pt: f32,
}

impl TextStyle {
    /// Baseline-to-baseline distance.
    pub fn leading_pt(&self) -> f32 {
        self.font_size_pt * 1.2
    }
}

/// Page geometry and the three text styles of the CV.
#[derive(Debug, Clone, PartialEq)]
pub struct PageStyle {
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    pub margin_pt: f32,
    /// Vertical gap between sections.
    pub section_gap_pt: f32,
    pub title: TextStyle,
    pub heading: TextStyle,
    pub body: TextStyle,
}

impl PageStyle {
    pub fn text_width_pt(&self) -> f32 {
        self.page_width_pt - 2.0 * self.margin_pt
    }

    fn top_pt(&self) -> f32 {
        self.page_height_pt - self.margin_pt
    }
}

fn hex_rgb(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
}

/// A4 with 1" margins: 24pt title, 16pt headings, 12pt body.
pub fn default_page_style() -> PageStyle {
    PageStyle {
        page_width_pt: 595.28,
        page_height_pt: 841.89,
        margin_pt: 72.0,
        section_gap_pt: 14.4,
        title: TextStyle {
            font_size_pt: 24.0,
            weight: FontWeight::Bold,
            color: hex_rgb(0x2C, 0x3E, 0x50),
            space_before_pt: 0.0,
            space_after_pt: 30.0,
        },
        heading: TextStyle {
            font_size_pt: 16.0,
            weight: FontWeight::Bold,
            color: hex_rgb(0x34, 0x49, 0x5E),
            space_before_pt: 20.0,
            space_after_pt: 12.0,
        },
        body: TextStyle {
            font_size_pt: 12.0,
            weight: FontWeight::Regular,
            color: (0.0, 0.0, 0.0),
            space_before_pt: 0.0,
            space_after_pt: 12.0,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    Title,
    Heading,
    Body,
}

/// One line of text at its final position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub role: LineRole,
    pub x_pt: f32,
    pub baseline_pt: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub lines: Vec<PlacedLine>,
}

/// Section headings paired with their text, in document order.
pub fn cv_sections(record: &CvRecord) -> [(&'static str, String); 6] {
    [
        ("Introduction", record.intro.clone()),
        ("Experience", record.experience.clone()),
        ("Education", record.education.clone()),
        ("Technical Skills", record.tech_stack_text()),
        ("Professional Summary", record.summary.clone()),
        ("Career Objectives", record.wishes.clone()),
    ]
}

struct Cursor<'a> {
    style: &'a PageStyle,
    pages: Vec<PageLayout>,
    y: f32,
}

impl<'a> Cursor<'a> {
    fn new(style: &'a PageStyle) -> Self {
        Self {
            style,
            pages: vec![PageLayout::default()],
            y: style.top_pt(),
        }
    }

    fn at_page_top(&self) -> bool {
        (self.y - self.style.top_pt()).abs() < f32::EPSILON
    }

    fn skip(&mut self, gap_pt: f32) {
        if !self.at_page_top() {
            self.y -= gap_pt;
        }
    }

    fn new_page(&mut self) {
        self.pages.push(PageLayout::default());
        self.y = self.style.top_pt();
    }

    fn place(&mut self, text: String, role: LineRole, text_style: &TextStyle) {
        let leading = text_style.leading_pt();
        if self.y - leading < self.style.margin_pt && !self.at_page_top() {
            self.new_page();
        }
        let baseline = self.y - text_style.font_size_pt;
        self.y -= leading;
        if let Some(page) = self.pages.last_mut() {
            page.lines.push(PlacedLine {
                text,
                role,
                x_pt: self.style.margin_pt,
                baseline_pt: baseline,
            });
        }
    }

    /// Places a block: its own paragraphs wrapped to the text width.
    fn block(&mut self, text: &str, role: LineRole, text_style: &TextStyle) {
        self.skip(text_style.space_before_pt);
        let metrics = get_metrics(text_style.weight);
        for paragraph in text.lines() {
            for line in metrics.wrap_lines(
                paragraph,
                text_style.font_size_pt,
                self.style.text_width_pt(),
            ) {
                self.place(line, role, text_style);
            }
        }
        self.skip(text_style.space_after_pt);
    }
}

/// Lays out the CV: title, then the six sections in fixed order.
pub fn layout_cv(record: &CvRecord, style: &PageStyle) -> Vec<PageLayout> {
    let mut cursor = Cursor::new(style);

    cursor.block(&record.name, LineRole::Title, &style.title);
    cursor.skip(style.section_gap_pt);

    let sections = cv_sections(record);
    let last = sections.len() - 1;
    for (i, (heading, body)) in sections.iter().enumerate() {
        cursor.block(heading, LineRole::Heading, &style.heading);
        cursor.block(body, LineRole::Body, &style.body);
        if i < last {
            cursor.skip(style.section_gap_pt);
        }
    }

    cursor.pages
}
