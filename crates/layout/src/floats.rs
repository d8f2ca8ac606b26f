//! Anchored objects and the regions they take away from text flow.
//!
//! Coordinates are page coordinates, `x` from the left page edge and `y` from
//! the top page edge, shifted left by the origin of the band being laid out
//! (zero for body pages).

use crate::columns::NormalizedColumns;
use quire_types::blocks::{
    AlignH, AlignV, Anchor, HRelativeFrom, TableBlock, VRelativeFrom, Wrap, WrapKind, WrapText,
};
use quire_types::measure::{BoxMeasure, TableMeasure};
use quire_types::{FlowBlock, Margins, Measure, Rect};

/// Text narrower than this next to a float is not worth placing.
const MIN_FLOW_WIDTH: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionZone {
    pub page_index: usize,
    /// Object bounds grown by the wrap distances.
    pub rect: Rect,
    pub wrap: Wrap,
}

#[derive(Debug, Clone)]
pub struct FloatingObjectManager {
    columns: NormalizedColumns,
    margins: Margins,
    page_width: f32,
    /// Page x of the local coordinate origin, when laying out inside a band
    /// narrower than the page.
    origin_x: f32,
    zones: Vec<ExclusionZone>,
}

impl Default for FloatingObjectManager {
    fn default() -> Self {
        Self {
            columns: NormalizedColumns::single(0.0),
            margins: Margins::zero(),
            page_width: 0.0,
            origin_x: 0.0,
            zones: Vec::new(),
        }
    }
}

impl FloatingObjectManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-anchors the manager on new column geometry. Registered zones are
    /// kept; they belong to the page they were registered on.
    pub fn set_layout_context(&mut self, columns: NormalizedColumns, margins: Margins, page_width: f32) {
        self.columns = columns;
        self.margins = margins;
        self.page_width = page_width;
    }

    pub fn set_origin_x(&mut self, origin_x: f32) {
        self.origin_x = origin_x;
    }

    pub fn zones(&self) -> &[ExclusionZone] {
        &self.zones
    }

    /// Places an anchored image or drawing whose top edge is `anchor_y` and
    /// returns its bounds.
    pub fn register_drawing(
        &mut self,
        block: &FlowBlock,
        measure: &BoxMeasure,
        anchor_y: f32,
        column_index: usize,
        page_index: usize,
    ) -> Rect {
        let anchor = block.anchor().copied().unwrap_or_default();
        self.register(
            &anchor,
            block.wrap(),
            measure.width,
            measure.height,
            anchor_y,
            column_index,
            page_index,
        )
    }

    pub fn register_table(
        &mut self,
        block: &TableBlock,
        measure: &TableMeasure,
        anchor_y: f32,
        column_index: usize,
        page_index: usize,
    ) -> Rect {
        let anchor = block.anchor.filter(|a| a.is_anchored).unwrap_or_default();
        self.register(
            &anchor,
            block.wrap.as_ref(),
            measure.total_width,
            measure.total_height,
            anchor_y,
            column_index,
            page_index,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn register(
        &mut self,
        anchor: &Anchor,
        wrap: Option<&Wrap>,
        width: f32,
        height: f32,
        anchor_y: f32,
        column_index: usize,
        page_index: usize,
    ) -> Rect {
        let x = self.compute_anchor_x(anchor, column_index, width);
        let rect = Rect::new(x, anchor_y, width, height);

        if let Some(wrap) = wrap.filter(|w| w.excludes_text() && !anchor.behind_doc) {
            self.zones.push(ExclusionZone {
                page_index,
                rect: Rect::new(
                    rect.x - wrap.dist_left,
                    rect.y - wrap.dist_top,
                    rect.width + wrap.dist_left + wrap.dist_right,
                    rect.height + wrap.dist_top + wrap.dist_bottom,
                ),
                wrap: *wrap,
            });
        }
        rect
    }

    /// Left edge of an anchored object in local coordinates.
    pub fn compute_anchor_x(&self, anchor: &Anchor, column_index: usize, object_width: f32) -> f32 {
        compute_anchor_x(
            anchor,
            column_index,
            &self.columns,
            object_width,
            &self.margins,
            self.page_width,
        ) - self.origin_x
    }

    /// The horizontal band text may use at `y..y + height` in a column, as an
    /// offset from the column's left edge and a width.
    pub fn available_width(&self, y: f32, height: f32, column_index: usize, page_index: usize) -> (f32, f32) {
        let col_left = self.column_left(column_index);
        let col_right = col_left + self.columns.width;
        let mut left = col_left;
        let mut right = col_right;

        for zone in self.zones_in_band(y, height, col_left, col_right, page_index) {
            if zone.wrap.kind == WrapKind::TopAndBottom {
                return (0.0, 0.0);
            }
            let zone_left = zone.rect.x;
            let zone_right = zone.rect.right();
            match zone.wrap.text {
                WrapText::Left => right = right.min(zone_left),
                WrapText::Right => left = left.max(zone_right),
                WrapText::BothSides | WrapText::Largest => {
                    if zone_left - left >= right - zone_right {
                        right = right.min(zone_left);
                    } else {
                        left = left.max(zone_right);
                    }
                }
            }
        }

        (left - col_left, (right - left).max(0.0))
    }

    /// When floats leave no usable width at `y..y + height`, the first y below
    /// the blocking zones.
    pub fn clear_y(&self, y: f32, height: f32, column_index: usize, page_index: usize) -> Option<f32> {
        let (_, width) = self.available_width(y, height, column_index, page_index);
        if width >= MIN_FLOW_WIDTH {
            return None;
        }
        let col_left = self.column_left(column_index);
        let col_right = col_left + self.columns.width;
        self.zones_in_band(y, height, col_left, col_right, page_index)
            .map(|z| z.rect.bottom())
            .reduce(f32::max)
            .filter(|bottom| *bottom > y)
    }

    fn column_left(&self, column_index: usize) -> f32 {
        self.margins.left - self.origin_x + self.columns.offset_of(column_index)
    }

    fn zones_in_band(
        &self,
        y: f32,
        height: f32,
        left: f32,
        right: f32,
        page_index: usize,
    ) -> impl Iterator<Item = &ExclusionZone> {
        // A zero-height probe still has to see the zone it sits in.
        let bottom = y + height.max(0.01);
        self.zones.iter().filter(move |z| {
            z.page_index == page_index
                && z.rect.overlaps_band(y, bottom)
                && z.rect.x < right
                && z.rect.right() > left
        })
    }
}

/// Resolves the left edge of an anchored object.
///
/// An explicit alignment wins over the offset; without one the offset is
/// taken from the left edge of the frame named by `h_relative_from`.
pub fn compute_anchor_x(
    anchor: &Anchor,
    column_index: usize,
    columns: &NormalizedColumns,
    object_width: f32,
    margins: &Margins,
    page_width: f32,
) -> f32 {
    let (frame_left, frame_width) = match anchor.h_relative_from {
        HRelativeFrom::Column => (margins.left + columns.offset_of(column_index), columns.width),
        HRelativeFrom::Margin => (margins.left, page_width - margins.horizontal()),
        HRelativeFrom::Page => (0.0, page_width),
    };
    match anchor.align_h {
        Some(AlignH::Left) => frame_left,
        Some(AlignH::Center) => frame_left + (frame_width - object_width) / 2.0,
        Some(AlignH::Right) => frame_left + frame_width - object_width,
        None => frame_left + anchor.offset_h,
    }
}

/// Resolves the top edge of an anchored object.
///
/// Margin-relative anchors align within the content box `content_top..content_bottom`,
/// page-relative ones within the physical page. Paragraph-relative anchors
/// are offset from `paragraph_y`.
pub fn compute_anchor_y(
    anchor: &Anchor,
    object_height: f32,
    content_top: f32,
    content_bottom: f32,
    page_height: f32,
    paragraph_y: f32,
) -> f32 {
    let (frame_top, frame_height) = match anchor.v_relative_from {
        VRelativeFrom::Paragraph => return paragraph_y + anchor.offset_v,
        VRelativeFrom::Margin => (content_top, content_bottom - content_top),
        VRelativeFrom::Page => (0.0, page_height),
    };
    match anchor.align_v {
        Some(AlignV::Top) => frame_top,
        Some(AlignV::Center) => frame_top + (frame_height - object_height) / 2.0,
        Some(AlignV::Bottom) => frame_top + frame_height - object_height,
        None => frame_top + anchor.offset_v,
    }
}

/// A page- or margin-anchored object placed ahead of its host paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreRegisteredAnchor {
    pub block_index: usize,
    pub host_index: usize,
}

/// Finds anchored images and drawings positioned against the margin box or the
/// page. Each is hosted by the nearest paragraph before it, or failing that the
/// next paragraph. A host is never searched for across a page, column or
/// section break. Objects with no paragraph to host them are left to the main
/// pass.
pub fn collect_pre_registered_anchors(blocks: &[FlowBlock], measures: &[Measure]) -> Vec<PreRegisteredAnchor> {
    let is_paragraph = |i: usize| matches!(blocks.get(i), Some(FlowBlock::Paragraph(_)));
    let is_break = |i: usize| {
        matches!(
            blocks.get(i),
            Some(FlowBlock::PageBreak(_) | FlowBlock::ColumnBreak(_) | FlowBlock::SectionBreak(_))
        )
    };
    blocks
        .iter()
        .zip(measures)
        .enumerate()
        .filter(|(_, (block, measure))| {
            matches!(
                (block, measure),
                (FlowBlock::Image(_), Measure::Image(_)) | (FlowBlock::Drawing(_), Measure::Drawing(_))
            ) && block.anchor().is_some_and(Anchor::is_page_level)
        })
        .filter_map(|(index, _)| {
            let host = (0..index)
                .rev()
                .take_while(|&i| !is_break(i))
                .find(|&i| is_paragraph(i))
                .or_else(|| {
                    (index + 1..blocks.len())
                        .take_while(|&i| !is_break(i))
                        .find(|&i| is_paragraph(i))
                })?;
            Some(PreRegisteredAnchor {
                block_index: index,
                host_index: host,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{anchored_drawing, column_break, page_break, paragraph, paragraph_measure};

    fn manager() -> FloatingObjectManager {
        let mut m = FloatingObjectManager::new();
        m.set_layout_context(
            NormalizedColumns {
                count: 1,
                gap: 0.0,
                width: 600.0,
            },
            Margins::all(100.0),
            800.0,
        );
        m
    }

    fn anchor(h: HRelativeFrom, align: Option<AlignH>, offset: f32) -> Anchor {
        Anchor {
            is_anchored: true,
            h_relative_from: h,
            align_h: align,
            offset_h: offset,
            ..Default::default()
        }
    }

    #[test]
    fn test_anchor_x_frames() {
        let cols = NormalizedColumns {
            count: 2,
            gap: 20.0,
            width: 290.0,
        };
        let margins = Margins::all(100.0);
        let x = |a: Anchor, col| compute_anchor_x(&a, col, &cols, 50.0, &margins, 800.0);

        assert_eq!(x(anchor(HRelativeFrom::Column, None, 10.0), 1), 420.0);
        assert_eq!(x(anchor(HRelativeFrom::Column, Some(AlignH::Right), 0.0), 0), 340.0);
        assert_eq!(x(anchor(HRelativeFrom::Margin, Some(AlignH::Center), 0.0), 1), 375.0);
        assert_eq!(x(anchor(HRelativeFrom::Page, Some(AlignH::Right), 99.0), 0), 750.0);
        assert_eq!(x(anchor(HRelativeFrom::Page, None, 15.0), 0), 15.0);
    }

    #[test]
    fn test_anchor_y_frames() {
        let mut a = Anchor {
            is_anchored: true,
            v_relative_from: VRelativeFrom::Margin,
            align_v: Some(AlignV::Bottom),
            ..Default::default()
        };
        assert_eq!(compute_anchor_y(&a, 100.0, 96.0, 960.0, 1056.0, 300.0), 860.0);
        a.v_relative_from = VRelativeFrom::Page;
        a.align_v = Some(AlignV::Center);
        assert_eq!(compute_anchor_y(&a, 56.0, 96.0, 960.0, 1056.0, 300.0), 500.0);
        a.v_relative_from = VRelativeFrom::Paragraph;
        a.offset_v = 12.0;
        assert_eq!(compute_anchor_y(&a, 56.0, 96.0, 960.0, 1056.0, 300.0), 312.0);
    }

    #[test]
    fn test_square_wrap_narrows_band() {
        let mut m = manager();
        let block = anchored_drawing("d", Anchor {
            is_anchored: true,
            align_h: Some(AlignH::Left),
            ..Default::default()
        }, WrapKind::Square);
        let rect = m.register_drawing(&block, &BoxMeasure { width: 200.0, height: 100.0 }, 150.0, 0, 0);
        assert_eq!(rect, Rect::new(100.0, 150.0, 200.0, 100.0));

        // Text moves to the right of a left-aligned float.
        assert_eq!(m.available_width(160.0, 20.0, 0, 0), (200.0, 400.0));
        // Outside the band, or on another page, nothing changes.
        assert_eq!(m.available_width(260.0, 20.0, 0, 0), (0.0, 600.0));
        assert_eq!(m.available_width(160.0, 20.0, 0, 1), (0.0, 600.0));
        assert_eq!(m.clear_y(160.0, 20.0, 0, 0), None);
    }

    #[test]
    fn test_top_and_bottom_blocks_band() {
        let mut m = manager();
        let block = anchored_drawing("d", Anchor {
            is_anchored: true,
            ..Default::default()
        }, WrapKind::TopAndBottom);
        m.register_drawing(&block, &BoxMeasure { width: 50.0, height: 80.0 }, 200.0, 0, 0);

        assert_eq!(m.available_width(210.0, 10.0, 0, 0).1, 0.0);
        assert_eq!(m.clear_y(190.0, 20.0, 0, 0), Some(280.0));
    }

    #[test]
    fn test_behind_doc_and_none_register_nothing() {
        let mut m = manager();
        let behind = anchored_drawing("a", Anchor {
            is_anchored: true,
            behind_doc: true,
            ..Default::default()
        }, WrapKind::Square);
        let plain = anchored_drawing("b", Anchor {
            is_anchored: true,
            ..Default::default()
        }, WrapKind::None);
        let size = BoxMeasure { width: 50.0, height: 50.0 };
        m.register_drawing(&behind, &size, 100.0, 0, 0);
        m.register_drawing(&plain, &size, 100.0, 0, 0);
        assert!(m.zones().is_empty());
    }

    #[test]
    fn test_pre_registered_hosts() {
        let page_anchor = Anchor {
            is_anchored: true,
            v_relative_from: VRelativeFrom::Page,
            ..Default::default()
        };
        let para_anchor = Anchor {
            is_anchored: true,
            ..Default::default()
        };
        let blocks = vec![
            anchored_drawing("d0", page_anchor, WrapKind::Square),
            paragraph("p1", "one"),
            anchored_drawing("d2", page_anchor, WrapKind::Square),
            anchored_drawing("d3", para_anchor, WrapKind::Square),
            paragraph("p4", "two"),
        ];
        let boxed = || Measure::Drawing(BoxMeasure { width: 10.0, height: 10.0 });
        let measures = vec![
            boxed(),
            Measure::Paragraph(paragraph_measure(&[20.0])),
            boxed(),
            boxed(),
            Measure::Paragraph(paragraph_measure(&[20.0])),
        ];

        let found = collect_pre_registered_anchors(&blocks, &measures);
        assert_eq!(
            found,
            vec![
                PreRegisteredAnchor { block_index: 0, host_index: 1 },
                PreRegisteredAnchor { block_index: 2, host_index: 1 },
            ]
        );
    }

    #[test]
    fn test_pre_registered_host_stays_behind_breaks() {
        let page_anchor = Anchor {
            is_anchored: true,
            v_relative_from: VRelativeFrom::Page,
            ..Default::default()
        };
        let blocks = vec![
            paragraph("p0", "before"),
            page_break("pb"),
            anchored_drawing("d2", page_anchor, WrapKind::Square),
            paragraph("p3", "after"),
            column_break("cb"),
            anchored_drawing("d5", page_anchor, WrapKind::Square),
            page_break("pb2"),
            paragraph("p7", "last"),
        ];
        let boxed = || Measure::Drawing(BoxMeasure { width: 10.0, height: 10.0 });
        let measures = vec![
            Measure::Paragraph(paragraph_measure(&[20.0])),
            Measure::PageBreak,
            boxed(),
            Measure::Paragraph(paragraph_measure(&[20.0])),
            Measure::ColumnBreak,
            boxed(),
            Measure::PageBreak,
            Measure::Paragraph(paragraph_measure(&[20.0])),
        ];

        // d5 has no paragraph between its breaks and is left to the main pass.
        let found = collect_pre_registered_anchors(&blocks, &measures);
        assert_eq!(found, vec![PreRegisteredAnchor { block_index: 2, host_index: 3 }]);
    }
}
