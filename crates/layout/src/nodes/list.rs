use super::paragraph::flow_lines;
use crate::LayoutError;
use crate::interface::LayoutContext;
use quire_types::blocks::ListBlock;
use quire_types::layout::ListItemFragment;
use quire_types::measure::ListMeasure;
use quire_types::Fragment;

/// Lays out every item of a list as its own paragraph. The item text starts
/// at the measured left indent; the marker sits in the space before it.
pub fn layout_list(ctx: &mut LayoutContext<'_>, block: &ListBlock, measure: &ListMeasure) -> Result<(), LayoutError> {
    if block.items.len() != measure.items.len() {
        log::warn!(
            "List {} has {} items but {} item measures; extra entries are ignored",
            block.id,
            block.items.len(),
            measure.items.len()
        );
    }

    for (item, item_measure) in block.items.iter().zip(&measure.items) {
        ctx.ensure_page()?;
        let attrs = &item.paragraph.attrs;
        if attrs.spacing.before > 0.0 && !ctx.is_at_column_top() {
            ctx.advance_cursor(attrs.spacing.before);
        }

        let lines = &item_measure.paragraph.lines;
        let indent = item_measure.indent_left;
        flow_lines(ctx, lines, attrs.keep_lines, |ctx, slice| {
            ctx.push_fragment(Fragment::ListItem(ListItemFragment {
                block_id: block.id.clone(),
                item_id: item.id.clone(),
                x: slice.x + indent,
                y: slice.y,
                width: (slice.width - indent).max(0.0),
                from_line: slice.from_line,
                to_line: slice.to_line,
                marker_width: item_measure.marker_width,
                continues_from_prev: slice.from_line > 0,
                continues_on_next: slice.to_line < lines.len(),
            }));
        })?;

        if attrs.spacing.after > 0.0 {
            ctx.advance_cursor(attrs.spacing.after);
        }
    }
    Ok(())
}
