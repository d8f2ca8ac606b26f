//! The document layout pass.
//!
//! [`layout_document`] walks the blocks once, front to back, handing each to
//! its layouter. Section breaks are resolved by the [`SectionState`](crate::sections::SectionState)
//! inside the layout context; everything else only moves the cursor.

use crate::LayoutError;
use crate::floats::{PreRegisteredAnchor, collect_pre_registered_anchors};
use crate::interface::{EPSILON, LayoutContext};
use crate::nodes::image::place_anchored_box;
use crate::nodes::{layout_drawing, layout_image, layout_list, layout_paragraph, layout_table};
use crate::options::LayoutOptions;
use crate::sections::compute_next_section_props_at_break;
use quire_types::blocks::{ParagraphBlock, SectionBreakBlock, VerticalAlign};
use quire_types::layout::{DrawingFragment, ImageFragment};
use quire_types::measure::ParagraphMeasure;
use quire_types::{BlockId, FlowBlock, Fragment, Layout, Measure, Page};
use std::collections::HashMap;

/// Lays out `blocks` into pages.
///
/// `measures[i]` must be the measure of `blocks[i]`. The result is fully
/// determined by the inputs.
pub fn layout_document(
    blocks: &[FlowBlock],
    measures: &[Measure],
    options: &LayoutOptions,
) -> Result<Layout, LayoutError> {
    validate_inputs(blocks, measures)?;

    let mut ctx = LayoutContext::new(options);
    let anchors = collect_pre_registered_anchors(blocks, measures);
    let mut pre_registered = vec![false; blocks.len()];
    for anchor in &anchors {
        pre_registered[anchor.block_index] = true;
    }

    for (index, (block, measure)) in blocks.iter().zip(measures).enumerate() {
        if pre_registered[index] {
            continue;
        }
        place_hosted_anchors(&mut ctx, blocks, measures, &anchors, index)?;

        match (block, measure) {
            (FlowBlock::Paragraph(p), Measure::Paragraph(m)) => {
                if is_break_artifact(blocks, index, p) {
                    log::debug!("Skipping empty paragraph {} between page and section break", p.id);
                    continue;
                }
                if p.attrs.keep_next {
                    keep_with_next(&mut ctx, p, m, next_flowed_measure(blocks, measures, index))?;
                }
                layout_paragraph(&mut ctx, p, m)?;
            }
            (FlowBlock::List(l), Measure::List(m)) => layout_list(&mut ctx, l, m)?,
            (FlowBlock::Image(i), Measure::Image(m)) => layout_image(&mut ctx, block, i, m)?,
            (FlowBlock::Drawing(d), Measure::Drawing(m)) => layout_drawing(&mut ctx, block, d, m)?,
            (FlowBlock::Table(t), Measure::Table(m)) => layout_table(&mut ctx, t, m)?,
            (FlowBlock::SectionBreak(s), Measure::SectionBreak) => apply_section_break(&mut ctx, blocks, index, s)?,
            (FlowBlock::PageBreak(_), Measure::PageBreak) => {
                ctx.ensure_page()?;
                ctx.start_new_page()?;
            }
            (FlowBlock::ColumnBreak(_), Measure::ColumnBreak) => {
                ctx.ensure_page()?;
                ctx.advance_column()?;
            }
            _ => return Err(kind_mismatch(index, block, measure)),
        }
    }

    ctx.ensure_page()?;
    let mut pages = ctx.paginator.into_pages();
    prune_trailing_empty_pages(&mut pages);

    let by_id = measures_by_id(blocks, measures);
    for page in &mut pages {
        apply_vertical_alignment(page, &by_id);
    }

    log::debug!("Laid out {} blocks on {} pages", blocks.len(), pages.len());
    Ok(Layout {
        page_size: options.page_size,
        pages,
        columns: options.columns,
    })
}

fn validate_inputs(blocks: &[FlowBlock], measures: &[Measure]) -> Result<(), LayoutError> {
    if blocks.len() != measures.len() {
        return Err(LayoutError::MeasureCountMismatch {
            blocks: blocks.len(),
            measures: measures.len(),
        });
    }
    match blocks
        .iter()
        .zip(measures)
        .position(|(b, m)| b.kind() != m.kind())
    {
        Some(index) => Err(kind_mismatch(index, &blocks[index], &measures[index])),
        None => Ok(()),
    }
}

fn kind_mismatch(index: usize, block: &FlowBlock, measure: &Measure) -> LayoutError {
    LayoutError::MeasureKindMismatch {
        index,
        block_id: block.id().to_string(),
        expected: block.kind().as_str(),
        actual: measure.kind().as_str(),
    }
}

/// An empty paragraph directly between a page break and a section break is
/// an import artifact with nothing to show.
fn is_break_artifact(blocks: &[FlowBlock], index: usize, paragraph: &ParagraphBlock) -> bool {
    paragraph.is_empty()
        && index > 0
        && matches!(blocks.get(index - 1), Some(FlowBlock::PageBreak(_)))
        && matches!(blocks.get(index + 1), Some(FlowBlock::SectionBreak(_)))
}

/// Places the page- and margin-anchored objects hosted by the block at `host`
/// before it, so the host sees their exclusion zones from its first line.
fn place_hosted_anchors(
    ctx: &mut LayoutContext<'_>,
    blocks: &[FlowBlock],
    measures: &[Measure],
    anchors: &[PreRegisteredAnchor],
    host: usize,
) -> Result<(), LayoutError> {
    for anchor in anchors.iter().filter(|a| a.host_index == host) {
        let block = &blocks[anchor.block_index];
        let behind_doc = block.anchor().is_some_and(|a| a.behind_doc);
        let fragment = match (block, &measures[anchor.block_index]) {
            (FlowBlock::Image(image), Measure::Image(m)) => {
                let rect = place_anchored_box(ctx, block, m)?;
                Fragment::Image(ImageFragment {
                    block_id: image.id.clone(),
                    x: rect.x,
                    y: rect.y,
                    width: rect.width,
                    height: rect.height,
                    is_anchored: true,
                    behind_doc,
                })
            }
            (FlowBlock::Drawing(drawing), Measure::Drawing(m)) => {
                let rect = place_anchored_box(ctx, block, m)?;
                Fragment::Drawing(DrawingFragment {
                    block_id: drawing.id.clone(),
                    drawing_kind: drawing.drawing_kind,
                    x: rect.x,
                    y: rect.y,
                    width: rect.width,
                    height: rect.height,
                    rotation: drawing.rotation,
                    z_index: drawing.z_index,
                    is_anchored: true,
                    behind_doc,
                })
            }
            (other, measure) => return Err(kind_mismatch(anchor.block_index, other, measure)),
        };
        ctx.push_fragment(fragment);
    }
    Ok(())
}

/// The measure of the first block after `index` that takes up room in the
/// flow. Anchored objects are skipped; a break ends the search.
fn next_flowed_measure<'m>(blocks: &[FlowBlock], measures: &'m [Measure], index: usize) -> Option<&'m Measure> {
    blocks
        .iter()
        .zip(measures)
        .skip(index + 1)
        .find(|(block, _)| block.anchor().is_none())
        .filter(|(block, _)| !block.is_break())
        .map(|(_, measure)| measure)
}

/// Moves a keep-with-next paragraph to the next column when it and the first
/// line of the following block would not share this one.
fn keep_with_next(
    ctx: &mut LayoutContext<'_>,
    block: &ParagraphBlock,
    measure: &ParagraphMeasure,
    next: Option<&Measure>,
) -> Result<(), LayoutError> {
    let next_line = match next {
        Some(Measure::Paragraph(m)) => m.lines.first().map(|l| l.line_height),
        Some(Measure::List(m)) => m
            .items
            .first()
            .and_then(|i| i.paragraph.lines.first())
            .map(|l| l.line_height),
        Some(Measure::Table(m)) => m.rows.first().map(|r| r.height),
        _ => None,
    };
    let Some(next_line) = next_line else {
        return Ok(());
    };

    let needed = block.attrs.spacing.before + measure.total_height + block.attrs.spacing.after + next_line;
    let column_height = ctx.ensure_page()?.column_height();
    if !ctx.is_at_column_top() && !ctx.fits(needed) && needed <= column_height + EPSILON {
        log::debug!("Moving {} to keep it with the next block", block.id);
        ctx.advance_column()?;
    }
    Ok(())
}

fn apply_section_break(
    ctx: &mut LayoutContext<'_>,
    blocks: &[FlowBlock],
    index: usize,
    block: &SectionBreakBlock,
) -> Result<(), LayoutError> {
    let next = compute_next_section_props_at_break(blocks, index, ctx.sections.latest(), ctx.options);
    let has_pages = ctx.paginator.has_pages();
    let decision = ctx.sections.schedule_section_break(block, next, has_pages);

    if decision.force_page_break {
        ctx.force_page_break()?;
        if let Some(parity) = decision.required_parity {
            let number = ctx.page_number();
            if !parity.matches(number) {
                log::debug!("Page {} has the wrong parity for {:?}; inserting a blank page", number, parity);
                ctx.start_new_page()?;
            }
        }
    } else if decision.force_mid_page_region && has_pages {
        ctx.start_mid_page_region()?;
    }
    Ok(())
}

/// Drops empty pages from the end, always keeping the first page.
fn prune_trailing_empty_pages(pages: &mut Vec<Page>) {
    while pages.len() > 1 && pages.last().is_some_and(Page::is_empty) {
        pages.pop();
    }
}

pub(crate) fn measures_by_id<'a>(blocks: &'a [FlowBlock], measures: &'a [Measure]) -> HashMap<&'a BlockId, &'a Measure> {
    blocks.iter().map(FlowBlock::id).zip(measures).collect()
}

/// Vertical extent of a fragment.
pub(crate) fn fragment_height(fragment: &Fragment, measures: &HashMap<&BlockId, &Measure>) -> f32 {
    match fragment {
        Fragment::Para(f) => match measures.get(&f.block_id) {
            Some(Measure::Paragraph(m)) => m.lines_height(f.from_line, f.to_line),
            _ => 0.0,
        },
        Fragment::ListItem(f) => match measures.get(&f.block_id) {
            Some(Measure::List(m)) => m
                .items
                .iter()
                .find(|i| i.item_id == f.item_id)
                .map(|i| i.paragraph.lines_height(f.from_line, f.to_line))
                .unwrap_or(0.0),
            _ => 0.0,
        },
        Fragment::Image(f) => f.height,
        Fragment::Drawing(f) => f.height,
        Fragment::Table(f) => f.height,
    }
}

/// Shifts the flowed content of a page to its vertical alignment. `both` is
/// treated as `center`. Anchored fragments keep their position.
fn apply_vertical_alignment(page: &mut Page, measures: &HashMap<&BlockId, &Measure>) {
    let align = page.v_align.unwrap_or_default();
    if align == VerticalAlign::Top {
        return;
    }
    let (Some(size), Some(margins)) = (page.size, page.margins) else {
        return;
    };

    let bounds = page
        .fragments
        .iter()
        .filter(|f| !f.is_anchored())
        .map(|f| (f.y(), f.y() + fragment_height(f, measures)))
        .reduce(|(top, bottom), (t, b)| (top.min(t), bottom.max(b)));
    let Some((top, bottom)) = bounds else {
        return;
    };

    let content_top = margins.top;
    let content_bottom = size.h - margins.bottom;
    let slack = (content_bottom - content_top) - (bottom - top);
    if slack <= 0.0 {
        return;
    }
    let target = match align {
        VerticalAlign::Top => return,
        VerticalAlign::Center | VerticalAlign::Both => content_top + slack / 2.0,
        VerticalAlign::Bottom => content_top + slack,
    };
    let dy = target - top;
    for fragment in page.fragments.iter_mut().filter(|f| !f.is_anchored()) {
        fragment.translate_y(dy);
    }
}
