//! Page-number field resolution.
//!
//! Page-number and page-count fields can only be filled in once pagination is
//! known. Resolution rewrites the text of the field runs; the caller decides
//! whether the new text needs measuring again.

use quire_types::blocks::{FieldToken, ParagraphBlock};
use quire_types::{FlowBlock, Layout};

/// Blocks with their field runs rewritten for the pages they landed on.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTokens {
    pub blocks: Vec<FlowBlock>,
    /// Indices of blocks whose text changed.
    pub changed: Vec<usize>,
}

impl ResolvedTokens {
    pub fn is_stable(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Rewrites field runs of a paragraph. Returns whether any text changed.
pub fn substitute_paragraph(paragraph: &mut ParagraphBlock, number_text: &str, page_count: &str) -> bool {
    let mut changed = false;
    for run in &mut paragraph.runs {
        let text = match run.token {
            Some(FieldToken::PageNumber) => number_text,
            Some(FieldToken::TotalPageCount) => page_count,
            None => continue,
        };
        if run.text != text {
            run.text = text.to_string();
            changed = true;
        }
    }
    changed
}

/// Rewrites field runs anywhere inside `block`, including list items and
/// table cells.
pub fn substitute_block(block: &mut FlowBlock, number_text: &str, page_count: &str) -> bool {
    match block {
        FlowBlock::Paragraph(p) => substitute_paragraph(p, number_text, page_count),
        FlowBlock::List(list) => list.items.iter_mut().fold(false, |changed, item| {
            substitute_paragraph(&mut item.paragraph, number_text, page_count) | changed
        }),
        FlowBlock::Table(table) => table
            .rows
            .iter_mut()
            .flat_map(|row| &mut row.cells)
            .flat_map(|cell| &mut cell.blocks)
            .fold(false, |changed, p| substitute_paragraph(p, number_text, page_count) | changed),
        _ => false,
    }
}

pub fn has_tokens(block: &FlowBlock) -> bool {
    match block {
        FlowBlock::Paragraph(p) => p.has_page_tokens(),
        FlowBlock::List(list) => list.items.iter().any(|i| i.paragraph.has_page_tokens()),
        FlowBlock::Table(table) => table
            .rows
            .iter()
            .flat_map(|row| &row.cells)
            .flat_map(|cell| &cell.blocks)
            .any(ParagraphBlock::has_page_tokens),
        _ => false,
    }
}

/// Resolves every field in `blocks` against `layout`.
///
/// A block split across pages takes the number of the page it starts on.
/// Blocks that produced no fragment keep their current text.
pub fn resolve_page_tokens(blocks: &[FlowBlock], layout: &Layout, debug: bool) -> ResolvedTokens {
    let page_count = layout.pages.len().to_string();
    let mut out = blocks.to_vec();
    let mut changed = Vec::new();

    for (index, block) in out.iter_mut().enumerate() {
        if !has_tokens(block) {
            continue;
        }
        let Some(page) = layout.page_of_block(block.id()).and_then(|i| layout.pages.get(i)) else {
            if debug {
                log::debug!("Field block {} was not placed, keeping its text", block.id());
            }
            continue;
        };
        if substitute_block(block, &page.number_text, &page_count) {
            if debug {
                log::debug!(
                    "Resolved fields of {} to page '{}' of {}",
                    block.id(),
                    page.number_text,
                    page_count
                );
            }
            changed.push(index);
        }
    }

    ResolvedTokens { blocks: out, changed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_layout::{LayoutOptions, layout_document};
    use quire_types::Measure;
    use quire_types::blocks::{BreakBlock, ParagraphAttrs, Run};
    use quire_types::measure::{Line, ParagraphMeasure};

    fn field_paragraph(id: &str) -> FlowBlock {
        let mut number = Run::text("#");
        number.token = Some(FieldToken::PageNumber);
        let mut total = Run::text("#");
        total.token = Some(FieldToken::TotalPageCount);
        FlowBlock::Paragraph(ParagraphBlock {
            id: id.into(),
            runs: vec![Run::text("Page "), number, Run::text(" of "), total],
            attrs: ParagraphAttrs::default(),
        })
    }

    fn one_line() -> Measure {
        Measure::Paragraph(ParagraphMeasure {
            lines: vec![Line {
                line_height: 20.0,
                width: 100.0,
                ..Default::default()
            }],
            total_height: 20.0,
            marker: None,
        })
    }

    fn text_of(block: &FlowBlock) -> String {
        match block {
            FlowBlock::Paragraph(p) => p.runs.iter().map(|r| r.text.as_str()).collect(),
            _ => String::new(),
        }
    }

    #[test]
    fn test_fields_take_the_page_they_land_on() {
        let blocks = vec![
            field_paragraph("a"),
            FlowBlock::PageBreak(BreakBlock { id: "pb".into() }),
            field_paragraph("b"),
        ];
        let measures = vec![one_line(), Measure::PageBreak, one_line()];
        let layout = layout_document(&blocks, &measures, &LayoutOptions::default()).unwrap();

        let resolved = resolve_page_tokens(&blocks, &layout, false);
        assert_eq!(resolved.changed, vec![0, 2]);
        assert_eq!(text_of(&resolved.blocks[0]), "Page 1 of 2");
        assert_eq!(text_of(&resolved.blocks[2]), "Page 2 of 2");

        let again = resolve_page_tokens(&resolved.blocks, &layout, false);
        assert!(again.is_stable());
    }

    #[test]
    fn test_plain_blocks_are_untouched() {
        let mut plain = ParagraphBlock {
            id: "p".into(),
            runs: vec![Run::text("no fields")],
            attrs: ParagraphAttrs::default(),
        };
        assert!(!substitute_paragraph(&mut plain, "7", "9"));
        assert_eq!(plain.runs[0].text, "no fields");
    }
}
