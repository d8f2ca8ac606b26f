#![allow(dead_code)]

use quire::QuireError;
use quire::types::blocks::{BreakBlock, FieldToken, ParagraphAttrs, ParagraphBlock, Run, SectionBreakBlock, SectionType};
use quire::types::measure::{Line, ParagraphMeasure};
use quire::types::{FlowBlock, Measure, MeasureConstraints};
use std::sync::atomic::{AtomicUsize, Ordering};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Line height every test paragraph is measured with.
pub const LINE_HEIGHT: f32 = 20.0;
/// Characters that fit on one measured line.
pub const CHARS_PER_LINE: usize = 40;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn paragraph(id: &str, text: &str) -> FlowBlock {
    FlowBlock::Paragraph(ParagraphBlock {
        id: id.into(),
        runs: vec![Run::text(text)],
        attrs: ParagraphAttrs::default(),
    })
}

/// "Page N" with N a page-number field.
pub fn page_number_paragraph(id: &str) -> FlowBlock {
    let mut field = Run::text("0");
    field.token = Some(FieldToken::PageNumber);
    FlowBlock::Paragraph(ParagraphBlock {
        id: id.into(),
        runs: vec![Run::text("Page "), field],
        attrs: ParagraphAttrs::default(),
    })
}

pub fn page_break(id: &str) -> FlowBlock {
    FlowBlock::PageBreak(BreakBlock { id: id.into() })
}

pub fn section_break(id: &str, kind: SectionType) -> FlowBlock {
    let mut block = SectionBreakBlock::new(id);
    block.section_type = Some(kind);
    FlowBlock::SectionBreak(block)
}

/// Measures `lines` lines of `LINE_HEIGHT`.
pub fn lines_measure(lines: usize) -> Measure {
    let lines: Vec<Line> = (0..lines)
        .map(|i| Line {
            from_char: i * CHARS_PER_LINE,
            to_char: (i + 1) * CHARS_PER_LINE,
            width: 100.0,
            line_height: LINE_HEIGHT,
            ..Default::default()
        })
        .collect();
    Measure::Paragraph(ParagraphMeasure {
        total_height: LINE_HEIGHT * lines.len() as f32,
        lines,
        marker: None,
    })
}

/// A deterministic stand-in for a text measurer: one line per
/// `CHARS_PER_LINE` characters of paragraph text.
#[derive(Default)]
pub struct LineCountMeasurer {
    pub calls: AtomicUsize,
}

impl LineCountMeasurer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl quire::Measurer for LineCountMeasurer {
    async fn measure(&self, block: &FlowBlock, _constraints: MeasureConstraints) -> Result<Measure, QuireError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match block {
            FlowBlock::Paragraph(p) => {
                let chars: usize = p.run_lengths().sum();
                Ok(lines_measure(chars.div_ceil(CHARS_PER_LINE).max(1)))
            }
            other => Err(QuireError::measure(other.id().as_str(), "only paragraphs are measured")),
        }
    }
}
