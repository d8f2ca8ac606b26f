use crate::LayoutError;
use crate::interface::{EPSILON, LayoutContext};
use quire_types::blocks::{ParagraphAttrs, ParagraphBlock};
use quire_types::layout::ParaFragment;
use quire_types::measure::{Line, ParagraphMeasure};
use quire_types::Fragment;
use std::borrow::Cow;

/// A run of consecutive lines placed together in one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LineSlice {
    pub from_line: usize,
    pub to_line: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Flows `lines` down the current column, around floats and across column and
/// page boundaries, calling `emit` once per slice.
///
/// A slice ends where the column runs out or where the band left free by
/// floats changes width. A line taller than a whole column is placed on its
/// own at the top of one so the flow always makes progress.
pub(crate) fn flow_lines<'a, F>(
    ctx: &mut LayoutContext<'a>,
    lines: &[Line],
    keep_together: bool,
    mut emit: F,
) -> Result<(), LayoutError>
where
    F: FnMut(&mut LayoutContext<'a>, LineSlice),
{
    ctx.ensure_page()?;

    if keep_together && !ctx.is_at_column_top() {
        let total: f32 = lines.iter().map(|l| l.line_height).sum();
        if !ctx.fits(total) && total <= ctx.state()?.column_height() + EPSILON {
            log::debug!("Keeping {} lines together in the next column", lines.len());
            ctx.advance_column()?;
        }
    }

    if lines.is_empty() {
        let state = ctx.state()?;
        let slice = LineSlice {
            from_line: 0,
            to_line: 0,
            x: state.column_x(),
            y: state.cursor_y,
            width: state.columns.width,
            height: 0.0,
        };
        emit(ctx, slice);
        return Ok(());
    }

    let mut from = 0;
    while from < lines.len() {
        let (page, column, column_x, y, bottom) = {
            let s = ctx.state()?;
            (s.page_index, s.column_index, s.column_x(), s.cursor_y, s.content_bottom)
        };
        let first_height = lines[from].line_height;

        if let Some(clear) = ctx.floats.clear_y(y, first_height, column, page) {
            if clear + first_height > bottom + EPSILON {
                ctx.advance_column()?;
            } else {
                ctx.set_cursor_y(clear);
            }
            continue;
        }

        let band = ctx.floats.available_width(y, first_height, column, page);
        let mut to = from;
        let mut used = 0.0;
        let mut band_changed = false;
        while to < lines.len() {
            let h = lines[to].line_height;
            if y + used + h > bottom + EPSILON {
                break;
            }
            if to > from && ctx.floats.available_width(y + used, h, column, page) != band {
                band_changed = true;
                break;
            }
            used += h;
            to += 1;
        }

        if to == from {
            if !ctx.is_at_column_top() {
                ctx.advance_column()?;
                continue;
            }
            to = from + 1;
            used = first_height;
        }

        emit(
            ctx,
            LineSlice {
                from_line: from,
                to_line: to,
                x: column_x + band.0,
                y,
                width: band.1,
                height: used,
            },
        );
        ctx.advance_cursor(used);
        from = to;

        if from < lines.len() && !band_changed {
            ctx.advance_column()?;
        }
    }
    Ok(())
}

/// Offset of the first line relative to the continuation lines.
///
/// In first-line-indent mode the first line starts at the marker's text start
/// and continuation lines at the left indent; otherwise the offset is the
/// first-line indent less the hanging indent.
pub(crate) fn first_line_offset(attrs: &ParagraphAttrs, marker_width: f32) -> Option<f32> {
    let indent = &attrs.indent;
    match &attrs.list_marker {
        Some(marker) if marker.first_line_indent_mode => {
            let text_start = marker
                .text_start_px
                .unwrap_or(indent.left + indent.first_line + marker_width);
            Some(text_start - indent.left)
        }
        _ => {
            let offset = indent.first_line - indent.hanging;
            (offset != 0.0).then_some(offset)
        }
    }
}

/// Re-measures the paragraph when a float leaves it less room at the cursor
/// than the column it was measured for.
fn narrowed_measure<'m>(
    ctx: &LayoutContext<'_>,
    block: &ParagraphBlock,
    measure: &'m ParagraphMeasure,
) -> Result<Cow<'m, ParagraphMeasure>, LayoutError> {
    let Some(remeasure) = ctx.options.remeasure_paragraph.as_deref() else {
        return Ok(Cow::Borrowed(measure));
    };
    let Some(first) = measure.lines.first() else {
        return Ok(Cow::Borrowed(measure));
    };
    let state = ctx.state()?;
    let (_, width) = ctx.floats.available_width(
        state.cursor_y,
        first.line_height,
        state.column_index,
        state.page_index,
    );
    if width >= 1.0 && width + EPSILON < state.columns.width {
        if let Some(narrow) = remeasure(block, width) {
            log::debug!("Re-measured paragraph {} at {:.1}px", block.id, width);
            return Ok(Cow::Owned(narrow));
        }
    }
    Ok(Cow::Borrowed(measure))
}

pub fn layout_paragraph(
    ctx: &mut LayoutContext<'_>,
    block: &ParagraphBlock,
    measure: &ParagraphMeasure,
) -> Result<(), LayoutError> {
    ctx.ensure_page()?;
    let attrs = &block.attrs;
    if attrs.spacing.before > 0.0 && !ctx.is_at_column_top() {
        ctx.advance_cursor(attrs.spacing.before);
    }

    let measure = narrowed_measure(ctx, block, measure)?;
    let marker_width = measure.marker.map(|m| m.marker_width);
    let offset = first_line_offset(attrs, marker_width.unwrap_or(0.0));
    let line_count = measure.lines.len();

    flow_lines(ctx, &measure.lines, attrs.keep_lines, |ctx, slice| {
        let first = slice.from_line == 0;
        ctx.push_fragment(Fragment::Para(ParaFragment {
            block_id: block.id.clone(),
            x: slice.x,
            y: slice.y,
            width: slice.width,
            from_line: slice.from_line,
            to_line: slice.to_line,
            continues_from_prev: !first,
            continues_on_next: slice.to_line < line_count,
            marker_width: marker_width.filter(|_| first),
            first_line_offset: offset.filter(|_| first),
        }));
    })?;

    if attrs.spacing.after > 0.0 {
        ctx.advance_cursor(attrs.spacing.after);
    }
    Ok(())
}
