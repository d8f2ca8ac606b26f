//! Table pagination.
//!
//! Rows are placed whole where they fit. A row that does not fit is split at
//! the column bottom when the row-break policy allows it, and is always split
//! when it is taller than a whole page's content box, which keeps the
//! pagination finite.

use crate::LayoutError;
use crate::floats::compute_anchor_y;
use crate::interface::{EPSILON, LayoutContext};
use quire_types::blocks::{TableBlock, TableRowBreak};
use quire_types::layout::{PartialRow, TableFragment};
use quire_types::measure::TableMeasure;
use quire_types::Fragment;

/// Row heights and split rules of one table.
struct TablePagination<'t> {
    block: &'t TableBlock,
    measure: &'t TableMeasure,
    policy: TableRowBreak,
    header_count: usize,
    header_height: f32,
}

/// The rows of one fragment.
#[derive(Debug, Clone, PartialEq)]
struct RowSlice {
    to_row: usize,
    height: f32,
    partial: Option<PartialRow>,
}

impl<'t> TablePagination<'t> {
    fn new(block: &'t TableBlock, measure: &'t TableMeasure, default_policy: Option<TableRowBreak>) -> Self {
        let header_count = block.header_row_count().min(measure.rows.len());
        Self {
            block,
            measure,
            policy: block
                .table_row_break
                .or(default_policy)
                .unwrap_or(TableRowBreak::Allow),
            header_count,
            header_height: (0..header_count).map(|i| measure.row_height(i)).sum(),
        }
    }

    fn row_count(&self) -> usize {
        self.measure.rows.len()
    }

    fn can_split(&self, row: usize) -> bool {
        self.policy == TableRowBreak::Allow && !self.block.rows.get(row).is_some_and(|r| r.cant_split)
    }

    /// Fills `available` starting at `row`, of which `offset` has already been
    /// shown.
    fn fill(&self, row: usize, offset: f32, available: f32, content_height: f32, force: bool) -> RowSlice {
        let mut to = row;
        let mut used = 0.0;
        let mut partial = None;

        while to < self.row_count() {
            let shown = if to == row { offset } else { 0.0 };
            let remaining = self.measure.row_height(to) - shown;
            if used + remaining <= available + EPSILON {
                used += remaining;
                to += 1;
                continue;
            }

            let space = available - used;
            let oversized = self.measure.row_height(to) > content_height + EPSILON;
            let nothing_placed = to == row && used <= 0.0;
            if space > EPSILON && (self.can_split(to) || oversized || (force && nothing_placed)) {
                if oversized && !self.can_split(to) {
                    log::debug!(
                        "Row {} of table {} is taller than the page and must split",
                        to,
                        self.block.id
                    );
                }
                partial = Some(PartialRow {
                    row_index: to,
                    offset_from: shown,
                    offset_to: shown + space,
                });
                used += space;
            }
            break;
        }

        RowSlice {
            to_row: to,
            height: used,
            partial,
        }
    }
}

pub fn layout_table(ctx: &mut LayoutContext<'_>, block: &TableBlock, measure: &TableMeasure) -> Result<(), LayoutError> {
    if block.anchor.is_some_and(|a| a.is_anchored) {
        return layout_anchored_table(ctx, block, measure);
    }

    let pagination = TablePagination::new(block, measure, ctx.options.table_row_break);
    let row_count = pagination.row_count();
    if row_count == 0 {
        let state = ctx.ensure_page()?;
        let (x, y) = (state.column_x(), state.cursor_y);
        ctx.push_fragment(Fragment::Table(empty_fragment(block, measure, x, y)));
        return Ok(());
    }

    let mut row = 0;
    let mut offset = 0.0;
    let mut first = true;

    loop {
        let (x, y, available, content_height, at_top) = {
            let state = ctx.ensure_page()?;
            (
                state.column_x(),
                state.cursor_y,
                state.available_height(),
                state.content_height(),
                state.is_at_column_top(),
            )
        };

        let mut repeat = if !first && row >= pagination.header_count {
            pagination.header_count
        } else {
            0
        };
        let next_remaining = measure.row_height(row) - offset;
        if repeat > 0 && pagination.header_height + next_remaining > available + EPSILON {
            repeat = 0;
        }
        let header_height = if repeat > 0 { pagination.header_height } else { 0.0 };

        let slice = pagination.fill(row, offset, available - header_height, content_height, at_top);
        if slice.to_row == row && slice.partial.is_none() {
            if at_top && content_height <= EPSILON {
                // A fresh column would be just as empty.
                return Err(LayoutError::Generic(format!(
                    "Table {} has no vertical room to place row {}",
                    block.id, row
                )));
            }
            ctx.advance_column()?;
            continue;
        }

        let (next_row, next_offset) = match slice.partial {
            Some(p) => (p.row_index, p.offset_to),
            None => (slice.to_row, 0.0),
        };
        let continues = next_row < row_count;

        ctx.push_fragment(Fragment::Table(TableFragment {
            block_id: block.id.clone(),
            x,
            y,
            width: measure.total_width,
            height: header_height + slice.height,
            from_row: row,
            start_row_offset: offset,
            to_row: slice.to_row,
            partial_row: slice.partial,
            repeat_header_count: repeat,
            continues_from_prev: !first,
            continues_on_next: continues,
            is_anchored: false,
        }));
        ctx.advance_cursor(header_height + slice.height);

        if !continues {
            return Ok(());
        }
        row = next_row;
        offset = next_offset;
        first = false;
        ctx.advance_column()?;
    }
}

fn layout_anchored_table(
    ctx: &mut LayoutContext<'_>,
    block: &TableBlock,
    measure: &TableMeasure,
) -> Result<(), LayoutError> {
    let anchor = block.anchor.unwrap_or_default();
    let state = ctx.ensure_page()?;
    let y = compute_anchor_y(
        &anchor,
        measure.total_height,
        state.top,
        state.content_bottom,
        state.page_size.h,
        state.cursor_y,
    );
    let (column, page) = (state.column_index, state.page_index);
    let rect = ctx.floats.register_table(block, measure, y, column, page);

    let mut fragment = empty_fragment(block, measure, rect.x, rect.y);
    fragment.height = measure.total_height;
    fragment.to_row = measure.rows.len();
    fragment.is_anchored = true;
    ctx.push_fragment(Fragment::Table(fragment));
    Ok(())
}

fn empty_fragment(block: &TableBlock, measure: &TableMeasure, x: f32, y: f32) -> TableFragment {
    TableFragment {
        block_id: block.id.clone(),
        x,
        y,
        width: measure.total_width,
        height: 0.0,
        from_row: 0,
        start_row_offset: 0.0,
        to_row: 0,
        partial_row: None,
        repeat_header_count: 0,
        continues_from_prev: false,
        continues_on_next: false,
        is_anchored: false,
    }
}
