//! Page layout: turns a report document into lines positioned on A4 pages.
//!
//! Pure and renderer-agnostic: the PDF writer only draws what this module places,
//! which keeps pagination testable without producing any bytes.

use serde::Serialize;

use crate::render::font_metrics::FontFace;
use crate::scoring::compose::{PillarSummary, ReportDocument};

// ────────────────────────────────────────────────────────────────────────────
// Geometry + styles
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PageGeometry {
    pub width_pt: f32,
    pub height_pt: f32,
    pub margin_pt: f32,
    /// Space kept clear above the bottom margin for the page footer.
    pub footer_reserve_pt: f32,
}

impl PageGeometry {
    /// A4 portrait, 50pt margins.
    pub fn a4() -> Self {
        Self {
            width_pt: 595.0,
            height_pt: 842.0,
            margin_pt: 50.0,
            footer_reserve_pt: 20.0,
        }
    }

    pub fn text_width_pt(&self) -> f32 {
        self.width_pt - 2.0 * self.margin_pt
    }

    fn top(&self) -> f32 {
        self.height_pt - self.margin_pt
    }

    fn bottom(&self) -> f32 {
        self.margin_pt + self.footer_reserve_pt
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const PRIMARY: Rgb = Rgb(0.133, 0.604, 0.808); // #229ace
    pub const TEXT: Rgb = Rgb(0.102, 0.102, 0.102); // #1a1a1a
    pub const MUTED: Rgb = Rgb(0.42, 0.42, 0.42);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextStyle {
    Title,
    Heading,
    Subheading,
    Body,
    Muted,
    Footer,
}

impl TextStyle {
    pub fn face(self) -> FontFace {
        match self {
            TextStyle::Title | TextStyle::Heading | TextStyle::Subheading => FontFace::Bold,
            _ => FontFace::Regular,
        }
    }

    pub fn size_pt(self) -> f32 {
        match self {
            TextStyle::Title => 20.0,
            TextStyle::Heading => 14.0,
            TextStyle::Subheading => 12.0,
            TextStyle::Body => 11.0,
            TextStyle::Muted => 10.0,
            TextStyle::Footer => 9.0,
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            TextStyle::Title | TextStyle::Heading => Rgb::PRIMARY,
            TextStyle::Subheading | TextStyle::Body => Rgb::TEXT,
            TextStyle::Muted | TextStyle::Footer => Rgb::MUTED,
        }
    }

    pub fn line_height_pt(self) -> f32 {
        self.size_pt() * 1.4
    }

    fn space_before_pt(self) -> f32 {
        match self {
            TextStyle::Title => 0.0,
            TextStyle::Heading => 18.0,
            TextStyle::Subheading => 10.0,
            _ => 2.0,
        }
    }

    fn keeps_with_next(self) -> bool {
        matches!(self, TextStyle::Heading | TextStyle::Subheading)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Blocks
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub style: TextStyle,
    pub text: String,
    pub indent_pt: f32,
    pub align: Align,
}

impl Block {
    fn new(style: TextStyle, text: impl Into<String>) -> Self {
        Self {
            style,
            text: text.into(),
            indent_pt: 0.0,
            align: Align::Left,
        }
    }

    fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    fn bullet(text: impl Into<String>) -> Self {
        Self {
            style: TextStyle::Body,
            text: format!("\u{2022} {}", text.into()),
            indent_pt: 12.0,
            align: Align::Left,
        }
    }
}

pub const REPORT_TITLE: &str = "Financial Health Assessment Report";

/// Flattens the report into an ordered list of styled text blocks.
pub fn document_blocks(doc: &ReportDocument) -> Vec<Block> {
    let mut blocks = vec![Block::new(TextStyle::Title, REPORT_TITLE).centered()];

    if let Some(profile) = &doc.profile {
        if let Some(org) = &profile.organization_name {
            blocks.push(Block::new(TextStyle::Muted, format!("Organisation: {org}")));
        }
        if let Some(name) = &profile.prepared_for {
            blocks.push(Block::new(TextStyle::Muted, format!("Prepared for: {name}")));
        }
    }
    blocks.push(Block::new(
        TextStyle::Muted,
        format!("Generated on: {}", doc.generated_at.format("%-d %B %Y")),
    ));

    blocks.push(Block::new(TextStyle::Heading, "Summary"));
    let overall = match doc.overall_tier {
        Some(tier) => format!(
            "Overall score: {} / 10 ({})",
            doc.overall_score_label(),
            tier.label()
        ),
        None => format!("Overall score: {}", doc.overall_score_label()),
    };
    blocks.push(Block::new(TextStyle::Subheading, overall));
    blocks.push(Block::new(TextStyle::Body, doc.overall_feedback.clone()));
    blocks.push(Block::new(
        TextStyle::Muted,
        format!("Questions answered: {}", doc.answered_count),
    ));

    if !doc.pillars.is_empty() {
        blocks.push(Block::new(TextStyle::Heading, "Pillar Breakdown"));
        for pillar in &doc.pillars {
            pillar_blocks(pillar, &mut blocks);
        }
    }

    if !doc.recommendations.is_empty() {
        blocks.push(Block::new(TextStyle::Heading, "Recommendations"));
        for rec in &doc.recommendations {
            blocks.push(Block::new(
                TextStyle::Subheading,
                format!(
                    "{} ({:.1} / 10, {})",
                    rec.pillar,
                    rec.average_score,
                    rec.tier.label()
                ),
            ));
            blocks.push(Block::new(TextStyle::Body, rec.advice_text.clone()));
        }
    }

    blocks
}

fn pillar_blocks(pillar: &PillarSummary, blocks: &mut Vec<Block>) {
    blocks.push(Block::new(
        TextStyle::Subheading,
        format!(
            "{} \u{2014} {:.1} / 10 ({})",
            pillar.name,
            pillar.average_score,
            pillar.tier.label()
        ),
    ));
    blocks.push(Block::new(TextStyle::Body, pillar.feedback.clone()));

    if !pillar.strengths.is_empty() {
        blocks.push(Block::new(TextStyle::Muted, "Strengths"));
        for s in &pillar.strengths {
            blocks.push(Block::bullet(format!("{} ({})", s.question_text, s.score)));
        }
    }
    if !pillar.improvements.is_empty() {
        blocks.push(Block::new(TextStyle::Muted, "Areas for improvement"));
        for s in &pillar.improvements {
            blocks.push(Block::bullet(format!("{} ({})", s.question_text, s.score)));
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pagination
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PlacedLine {
    pub text: String,
    pub style: TextStyle,
    pub x_pt: f32,
    /// Baseline, measured from the bottom of the page (PDF user space).
    pub y_pt: f32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Page {
    pub lines: Vec<PlacedLine>,
}

/// Wraps each block and flows the lines down the page, starting new pages as needed.
/// Headings move to the next page rather than sit alone at the bottom.
pub fn paginate(blocks: &[Block], geometry: &PageGeometry) -> Vec<Page> {
    let mut pages = vec![Page::default()];
    let mut cursor = geometry.top();

    for (i, block) in blocks.iter().enumerate() {
        let style = block.style;
        let metrics = style.face().metrics();
        let size = style.size_pt();
        let line_height = style.line_height_pt();
        let width = geometry.text_width_pt() - block.indent_pt;
        let lines = metrics.wrap(&block.text, size, width);
        if lines.is_empty() {
            continue;
        }

        let on_fresh_page = pages.last().map_or(true, |p| p.lines.is_empty());
        if !on_fresh_page {
            cursor -= style.space_before_pt();
        }

        let mut needed = line_height * lines.len() as f32;
        if style.keeps_with_next() {
            // Reserve the first line of every following block up to and including the
            // first one that is not itself a heading.
            for next in &blocks[i + 1..] {
                needed += next.style.space_before_pt() + next.style.line_height_pt();
                if !next.style.keeps_with_next() {
                    break;
                }
            }
        }
        if !on_fresh_page && cursor - needed < geometry.bottom() && needed <= geometry.top() - geometry.bottom() {
            pages.push(Page::default());
            cursor = geometry.top();
        }

        for line in lines {
            if cursor - line_height < geometry.bottom() {
                pages.push(Page::default());
                cursor = geometry.top();
            }
            cursor -= line_height;
            let x_pt = match block.align {
                Align::Left => geometry.margin_pt + block.indent_pt,
                Align::Center => {
                    let w = metrics.measure_pt(&line, size);
                    geometry.margin_pt + ((geometry.text_width_pt() - w) / 2.0).max(0.0)
                }
            };
            if let Some(page) = pages.last_mut() {
                page.lines.push(PlacedLine {
                    text: line,
                    style,
                    x_pt,
                    y_pt: cursor,
                });
            }
        }
    }

    pages
}

pub fn layout_report(doc: &ReportDocument, geometry: &PageGeometry) -> Vec<Page> {
    paginate(&document_blocks(doc), geometry)
}
