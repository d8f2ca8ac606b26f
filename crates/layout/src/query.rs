//! Mapping document positions onto laid-out fragments.
//!
//! Positions are the `pm_start`/`pm_end` offsets carried by runs and boxes.
//! Inside a line, x is interpolated in proportion to the character offset;
//! the measurer does not report per-glyph advances.

use quire_types::blocks::ParagraphBlock;
use quire_types::measure::{Line, ParagraphMeasure};
use quire_types::{BlockId, FlowBlock, Fragment, Layout, Measure, Rect};
use std::collections::HashMap;

/// A fragment holding a document position.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentHit {
    pub page_index: usize,
    pub fragment_index: usize,
    pub block_id: BlockId,
    /// Line of the paragraph holding the position, for text fragments.
    pub line_index: Option<usize>,
}

/// A highlighted rectangle on one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    pub page_index: usize,
    pub rect: Rect,
}

/// A paragraph as seen by a text fragment, with the x of its first line.
struct TextSource<'a> {
    paragraph: &'a ParagraphBlock,
    measure: &'a ParagraphMeasure,
    first_line_offset: f32,
}

type BlockIndex<'a> = HashMap<&'a BlockId, (&'a FlowBlock, &'a Measure)>;

fn index_blocks<'a>(blocks: &'a [FlowBlock], measures: &'a [Measure]) -> BlockIndex<'a> {
    blocks
        .iter()
        .zip(measures)
        .map(|(b, m)| (b.id(), (b, m)))
        .collect()
}

fn text_source<'a>(fragment: &Fragment, index: &BlockIndex<'a>) -> Option<(usize, usize, TextSource<'a>)> {
    match fragment {
        Fragment::Para(f) => match index.get(&f.block_id)? {
            (FlowBlock::Paragraph(p), Measure::Paragraph(m)) => Some((
                f.from_line,
                f.to_line,
                TextSource {
                    paragraph: p,
                    measure: m,
                    first_line_offset: f.first_line_offset.unwrap_or(0.0),
                },
            )),
            _ => None,
        },
        Fragment::ListItem(f) => match index.get(&f.block_id)? {
            (FlowBlock::List(list), Measure::List(m)) => {
                let item = list.items.iter().find(|i| i.id == f.item_id)?;
                let item_measure = m.items.iter().find(|i| i.item_id == f.item_id)?;
                Some((
                    f.from_line,
                    f.to_line,
                    TextSource {
                        paragraph: &item.paragraph,
                        measure: &item_measure.paragraph,
                        first_line_offset: 0.0,
                    },
                ))
            }
            _ => None,
        },
        _ => None,
    }
}

/// Document position of a run-relative offset.
fn position_at(paragraph: &ParagraphBlock, run: usize, offset: usize) -> Option<usize> {
    match paragraph.runs.get(run) {
        Some(r) => r.pm_start.map(|start| start + offset),
        // An end offset one past the last run.
        None => paragraph.runs.last().and_then(|r| r.pm_end),
    }
}

/// Half-open document range covered by a line.
fn line_range(paragraph: &ParagraphBlock, line: &Line) -> Option<(usize, usize)> {
    let start = position_at(paragraph, line.from_run, line.from_char)?;
    let end = position_at(paragraph, line.to_run, line.to_char)?;
    Some((start, end.max(start)))
}

fn box_range(block: &FlowBlock) -> Option<(usize, usize)> {
    match block {
        FlowBlock::Image(b) => b.pm_start.zip(b.pm_end),
        FlowBlock::Drawing(b) => b.pm_start.zip(b.pm_end),
        _ => None,
    }
}

/// Finds the fragment that shows document position `pos`.
///
/// A position at the very end of a paragraph belongs to its last line.
pub fn get_fragment_at_position(
    layout: &Layout,
    blocks: &[FlowBlock],
    measures: &[Measure],
    pos: usize,
) -> Option<FragmentHit> {
    let index = index_blocks(blocks, measures);

    for (page_index, page) in layout.pages.iter().enumerate() {
        for (fragment_index, fragment) in page.fragments.iter().enumerate() {
            let hit = |line_index| FragmentHit {
                page_index,
                fragment_index,
                block_id: fragment.block_id().clone(),
                line_index,
            };

            if let Some((from, to, source)) = text_source(fragment, &index) {
                let last = source.measure.lines.len().saturating_sub(1);
                for line_index in from..to.min(source.measure.lines.len()) {
                    let Some((start, end)) = line_range(source.paragraph, &source.measure.lines[line_index]) else {
                        continue;
                    };
                    if (start <= pos && pos < end) || (line_index == last && pos == end) {
                        return Some(hit(Some(line_index)));
                    }
                }
                continue;
            }

            let range = index.get(fragment.block_id()).and_then(|(b, _)| box_range(b));
            if let Some((start, end)) = range {
                if start <= pos && pos < end.max(start + 1) {
                    return Some(hit(None));
                }
            }
        }
    }
    None
}

/// Rectangles covering the document range `from..to`, in page order.
pub fn selection_to_rects(
    layout: &Layout,
    blocks: &[FlowBlock],
    measures: &[Measure],
    from: usize,
    to: usize,
) -> Vec<SelectionRect> {
    if to <= from {
        return Vec::new();
    }
    let index = index_blocks(blocks, measures);
    let mut rects = Vec::new();

    for (page_index, page) in layout.pages.iter().enumerate() {
        for fragment in &page.fragments {
            if let Some((first, last, source)) = text_source(fragment, &index) {
                let mut y = fragment.y();
                for line_index in first..last.min(source.measure.lines.len()) {
                    let line = &source.measure.lines[line_index];
                    let line_top = y;
                    y += line.line_height;
                    let Some((start, end)) = line_range(source.paragraph, line) else {
                        continue;
                    };
                    let (sel_start, sel_end) = (from.max(start), to.min(end));
                    if sel_start >= sel_end {
                        continue;
                    }

                    let chars = (end - start).max(1) as f32;
                    let x_at = |p: usize| line.width * (p - start) as f32 / chars;
                    let indent = if line_index == 0 { source.first_line_offset } else { 0.0 };
                    let left = fragment.x() + indent + x_at(sel_start);
                    let right = fragment.x() + indent + x_at(sel_end);
                    rects.push(SelectionRect {
                        page_index,
                        rect: Rect::new(left, line_top, right - left, line.line_height),
                    });
                }
                continue;
            }

            let range = index.get(fragment.block_id()).and_then(|(b, _)| box_range(b));
            if let Some((start, end)) = range {
                if from < end && start < to {
                    let height = match fragment {
                        Fragment::Image(f) => f.height,
                        Fragment::Drawing(f) => f.height,
                        Fragment::Table(f) => f.height,
                        _ => 0.0,
                    };
                    rects.push(SelectionRect {
                        page_index,
                        rect: Rect::new(fragment.x(), fragment.y(), fragment.width(), height),
                    });
                }
            }
        }
    }
    rects
}
