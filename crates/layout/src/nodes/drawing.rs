use super::image::{place_anchored_box, place_inline_box};
use crate::LayoutError;
use crate::interface::LayoutContext;
use quire_types::blocks::DrawingBlock;
use quire_types::layout::DrawingFragment;
use quire_types::measure::BoxMeasure;
use quire_types::{FlowBlock, Fragment};

/// Lays out a vector shape, shape group or text box. `flow` must wrap `block`.
pub fn layout_drawing(
    ctx: &mut LayoutContext<'_>,
    flow: &FlowBlock,
    block: &DrawingBlock,
    measure: &BoxMeasure,
) -> Result<(), LayoutError> {
    let (x, y, width, height, is_anchored, behind_doc) = match flow.anchor() {
        Some(anchor) => {
            let rect = place_anchored_box(ctx, flow, measure)?;
            (rect.x, rect.y, rect.width, rect.height, true, anchor.behind_doc)
        }
        None => {
            let placed = place_inline_box(ctx, measure)?;
            (placed.x, placed.y, placed.width, placed.height, false, false)
        }
    };

    ctx.push_fragment(Fragment::Drawing(DrawingFragment {
        block_id: block.id.clone(),
        drawing_kind: block.drawing_kind,
        x,
        y,
        width,
        height,
        rotation: block.rotation,
        z_index: block.z_index,
        is_anchored,
        behind_doc,
    }));
    Ok(())
}
