use super::paragraph::flow_lines;
use crate::LayoutError;
use crate::floats::compute_anchor_y;
use crate::interface::LayoutContext;
use quire_types::blocks::ImageBlock;
use quire_types::layout::ImageFragment;
use quire_types::measure::{BoxMeasure, Line};
use quire_types::{FlowBlock, Fragment, Rect};

/// Where an inline box landed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct InlineBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Flows a box like a single line, scaled down to the column width when it is
/// wider than the column.
pub(crate) fn place_inline_box(ctx: &mut LayoutContext<'_>, measure: &BoxMeasure) -> Result<InlineBox, LayoutError> {
    let column_width = ctx.ensure_page()?.columns.width;
    let (width, height) = if measure.width > column_width && measure.width > 0.0 {
        let scale = column_width / measure.width;
        (column_width, measure.height * scale)
    } else {
        (measure.width, measure.height)
    };

    let line = Line {
        width,
        line_height: height,
        ..Default::default()
    };
    let mut placed = InlineBox {
        x: 0.0,
        y: 0.0,
        width,
        height,
    };
    flow_lines(ctx, &[line], false, |_, slice| {
        placed.x = slice.x;
        placed.y = slice.y;
    })?;
    Ok(placed)
}

/// Positions an anchored image or drawing on the current page and registers
/// its exclusion zone. The cursor does not move.
pub(crate) fn place_anchored_box(
    ctx: &mut LayoutContext<'_>,
    block: &FlowBlock,
    measure: &BoxMeasure,
) -> Result<Rect, LayoutError> {
    let anchor = block.anchor().copied().unwrap_or_default();
    let state = ctx.ensure_page()?;
    let y = compute_anchor_y(
        &anchor,
        measure.height,
        state.top,
        state.content_bottom,
        state.page_size.h,
        state.cursor_y,
    );
    let (column, page) = (state.column_index, state.page_index);
    let rect = ctx.floats.register_drawing(block, measure, y, column, page);
    log::debug!(
        "Anchored {} at ({:.1}, {:.1}) on page {}",
        block.id(),
        rect.x,
        rect.y,
        page + 1
    );
    Ok(rect)
}

/// Lays out an image block. `flow` must wrap `block`.
pub fn layout_image(
    ctx: &mut LayoutContext<'_>,
    flow: &FlowBlock,
    block: &ImageBlock,
    measure: &BoxMeasure,
) -> Result<(), LayoutError> {
    let fragment = match flow.anchor() {
        Some(anchor) => {
            let rect = place_anchored_box(ctx, flow, measure)?;
            ImageFragment {
                block_id: block.id.clone(),
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                is_anchored: true,
                behind_doc: anchor.behind_doc,
            }
        }
        None => {
            let placed = place_inline_box(ctx, measure)?;
            ImageFragment {
                block_id: block.id.clone(),
                x: placed.x,
                y: placed.y,
                width: placed.width,
                height: placed.height,
                is_anchored: false,
                behind_doc: false,
            }
        }
    };
    ctx.push_fragment(Fragment::Image(fragment));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{image, small_page_options};
    use quire_types::blocks::{AlignH, AlignV, Anchor, VRelativeFrom, Wrap, WrapKind};

    fn only_image(ctx: LayoutContext<'_>) -> (usize, ImageFragment) {
        ctx.paginator
            .into_pages()
            .into_iter()
            .enumerate()
            .find_map(|(i, p)| {
                p.fragments.into_iter().find_map(|f| match f {
                    Fragment::Image(img) => Some((i, img)),
                    _ => None,
                })
            })
            .unwrap()
    }

    #[test]
    fn test_wide_inline_image_scales_to_column() {
        // Content box is 360px wide.
        let options = small_page_options(500.0);
        let mut ctx = LayoutContext::new(&options);
        let flow = image("img", None);
        let FlowBlock::Image(block) = &flow else { unreachable!() };
        let measure = BoxMeasure { width: 720.0, height: 200.0 };

        layout_image(&mut ctx, &flow, block, &measure).unwrap();
        assert_eq!(ctx.cursor_y(), 20.0 + 100.0);

        let (page, frag) = only_image(ctx);
        assert_eq!(page, 0);
        assert_eq!((frag.x, frag.y, frag.width, frag.height), (20.0, 20.0, 360.0, 100.0));
        assert!(!frag.is_anchored);
    }

    #[test]
    fn test_inline_image_moves_to_next_page_when_full() {
        let options = small_page_options(100.0);
        let mut ctx = LayoutContext::new(&options);
        ctx.ensure_page().unwrap();
        ctx.advance_cursor(60.0);
        let flow = image("img", None);
        let FlowBlock::Image(block) = &flow else { unreachable!() };

        layout_image(&mut ctx, &flow, block, &BoxMeasure { width: 50.0, height: 50.0 }).unwrap();
        let (page, frag) = only_image(ctx);
        assert_eq!((page, frag.y), (1, 20.0));
    }

    #[test]
    fn test_anchored_image_does_not_move_cursor() {
        let options = small_page_options(500.0);
        let mut ctx = LayoutContext::new(&options);
        let anchor = Anchor {
            is_anchored: true,
            v_relative_from: VRelativeFrom::Margin,
            align_v: Some(AlignV::Bottom),
            align_h: Some(AlignH::Right),
            ..Default::default()
        };
        let mut flow = image("img", Some(anchor));
        if let FlowBlock::Image(b) = &mut flow {
            b.wrap = Some(Wrap {
                kind: WrapKind::Square,
                ..Default::default()
            });
        }
        let FlowBlock::Image(block) = &flow else { unreachable!() };

        layout_image(&mut ctx, &flow, block, &BoxMeasure { width: 60.0, height: 40.0 }).unwrap();
        assert_eq!(ctx.cursor_y(), 20.0);
        assert_eq!(ctx.floats.zones().len(), 1);

        let (_, frag) = only_image(ctx);
        assert!(frag.is_anchored);
        assert_eq!((frag.x, frag.y), (20.0 + 360.0 - 60.0, 520.0 - 40.0));
    }
}
