//! Section properties and how section breaks change them.
//!
//! Section properties are end-tagged: a break describes the section it ends.
//! [`compute_next_section_props_at_break`] resolves what applies *after* a
//! break, and [`SectionState`] holds it as pending until the next page is
//! created, except where a break forces an earlier change.

use crate::LayoutError;
use crate::columns::normalize_columns;
use crate::numbering::format_page_number;
use crate::options::LayoutOptions;
use crate::paginator::{PageGeometry, PageLifecycle};
use quire_types::blocks::{
    HeaderFooterRefs, NumberFormat, SectionBreakBlock, SectionNumbering, SectionType, VerticalAlign,
};
use quire_types::layout::{Page, SectionRefs};
use quire_types::{ColumnLayout, FlowBlock, Margins, MeasureConstraints, Orientation, PageSize};

#[derive(Debug, Clone, PartialEq)]
pub struct SectionProps {
    pub section_index: usize,
    pub margins: Margins,
    pub page_size: PageSize,
    pub orientation: Option<Orientation>,
    pub columns: Option<ColumnLayout>,
    pub v_align: Option<VerticalAlign>,
    pub numbering: SectionNumbering,
    pub header_refs: Option<HeaderFooterRefs>,
    pub footer_refs: Option<HeaderFooterRefs>,
}

impl SectionProps {
    /// Properties of the document before any section break.
    pub fn from_options(options: &LayoutOptions) -> Self {
        let metadata = options.section_metadata(0);
        Self {
            section_index: 0,
            margins: options.margins,
            page_size: options.page_size,
            orientation: None,
            columns: options.columns,
            v_align: None,
            numbering: metadata.and_then(|m| m.numbering).unwrap_or_default(),
            header_refs: metadata.and_then(|m| m.header_refs.clone()),
            footer_refs: metadata.and_then(|m| m.footer_refs.clone()),
        }
    }

    /// Page size with the orientation applied.
    pub fn oriented_page_size(&self) -> PageSize {
        match self.orientation {
            Some(orientation) => self.page_size.oriented(orientation),
            None => self.page_size,
        }
    }

    pub fn column_width(&self) -> f32 {
        let size = self.oriented_page_size();
        let content_width = size.w - self.margins.horizontal();
        normalize_columns(self.columns, content_width).width.max(0.0)
    }

    /// Declared properties of `block` layered over `self`. Numbering is not
    /// inherited; header/footer refs fall back to the section metadata and
    /// then to `self`.
    fn overlay(&self, block: &SectionBreakBlock, section_index: usize, options: &LayoutOptions) -> Self {
        let metadata = options.section_metadata(section_index);
        Self {
            section_index,
            margins: block
                .margins
                .map(|m| m.apply_to(self.margins))
                .unwrap_or(self.margins),
            page_size: block.page_size.unwrap_or(self.page_size),
            orientation: block.orientation.or(self.orientation),
            columns: block.columns.or(self.columns),
            v_align: block.v_align.or(self.v_align),
            numbering: block
                .numbering
                .or_else(|| metadata.and_then(|m| m.numbering))
                .unwrap_or_default(),
            header_refs: block
                .header_refs
                .clone()
                .or_else(|| metadata.and_then(|m| m.header_refs.clone()))
                .or_else(|| self.header_refs.clone()),
            footer_refs: block
                .footer_refs
                .clone()
                .or_else(|| metadata.and_then(|m| m.footer_refs.clone()))
                .or_else(|| self.footer_refs.clone()),
        }
    }

    fn columns_differ(&self, other: &SectionProps) -> bool {
        let norm = |c: Option<ColumnLayout>| {
            let c = c.unwrap_or_default();
            (c.count.max(1), c.gap.max(0.0))
        };
        let (a, b) = (norm(self.columns), norm(other.columns));
        a.0 != b.0 || (a.0 > 1 && (a.1 - b.1).abs() > f32::EPSILON)
    }
}

/// Resolves the properties that apply after the section break at `index`.
///
/// The break's own properties describe the section it ends, so the next
/// DOCX-sourced break is consulted. A break that opens the first section,
/// carries a resolved section index, or was synthesised by the importer
/// already describes what follows it. When no later DOCX break exists the
/// break falls back to its own properties.
pub fn compute_next_section_props_at_break(
    blocks: &[FlowBlock],
    index: usize,
    base: &SectionProps,
    options: &LayoutOptions,
) -> SectionProps {
    let Some(FlowBlock::SectionBreak(block)) = blocks.get(index) else {
        return base.clone();
    };

    let section_index = match (block.attrs.section_index, block.attrs.is_first_section) {
        (Some(i), _) => i,
        (None, true) => 0,
        (None, false) => base.section_index + 1,
    };

    let pre_resolved =
        block.attrs.section_index.is_some() || block.attrs.is_first_section || !block.is_docx_sourced();
    let source = if pre_resolved {
        block
    } else {
        blocks[index + 1..]
            .iter()
            .find_map(|b| match b {
                FlowBlock::SectionBreak(s) if s.is_docx_sourced() => Some(s),
                _ => None,
            })
            .unwrap_or(block)
    };

    base.overlay(source, section_index, options)
}

/// Width every block is measured at: the column width of the section it
/// belongs to.
pub fn compute_measure_constraints(blocks: &[FlowBlock], options: &LayoutOptions) -> Vec<MeasureConstraints> {
    let mut props = SectionProps::from_options(options);
    blocks
        .iter()
        .enumerate()
        .map(|(i, block)| {
            if matches!(block, FlowBlock::SectionBreak(_)) {
                props = compute_next_section_props_at_break(blocks, i, &props, options);
            }
            MeasureConstraints::width(props.column_width())
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn matches(self, page_number: u32) -> bool {
        match self {
            Parity::Even => page_number % 2 == 0,
            Parity::Odd => page_number % 2 == 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BreakDecision {
    pub force_page_break: bool,
    pub force_mid_page_region: bool,
    pub required_parity: Option<Parity>,
}

/// Section state threaded through a layout pass.
///
/// `active` is what the current page was laid out with; `pending` takes effect
/// on the next page.
#[derive(Debug, Clone)]
pub struct SectionState {
    pub active: SectionProps,
    pub pending: Option<SectionProps>,
    header_height: f32,
    footer_height: f32,
    section_aware: bool,
    counter: u32,
    last_page_number: u32,
    pending_restart: Option<u32>,
}

impl SectionState {
    pub fn new(options: &LayoutOptions) -> Self {
        let active = SectionProps::from_options(options);
        let section_aware = options.flags.numbering_section_aware;
        let pending_restart = active.numbering.start.filter(|_| section_aware);
        Self {
            active,
            pending: None,
            header_height: options
                .header_content_heights
                .map(|h| h.max())
                .unwrap_or(0.0),
            footer_height: options
                .footer_content_heights
                .map(|h| h.max())
                .unwrap_or(0.0),
            section_aware,
            counter: 1,
            last_page_number: 1,
            pending_restart,
        }
    }

    /// The most recently scheduled properties.
    pub fn latest(&self) -> &SectionProps {
        self.pending.as_ref().unwrap_or(&self.active)
    }

    pub fn schedule_section_break(
        &mut self,
        block: &SectionBreakBlock,
        next: SectionProps,
        has_pages: bool,
    ) -> BreakDecision {
        if block.attrs.is_first_section && !has_pages {
            log::debug!("Section {} applies immediately", next.section_index);
            if self.section_aware {
                self.pending_restart = next.numbering.start;
            }
            self.active = next;
            self.pending = None;
            return BreakDecision::default();
        }

        match block.kind() {
            _ if block.attrs.require_page_boundary => self.force_page(next, None),
            SectionType::NextPage => self.force_page(next, None),
            SectionType::EvenPage => self.force_page(next, Some(Parity::Even)),
            SectionType::OddPage => self.force_page(next, Some(Parity::Odd)),
            SectionType::Continuous if self.active.columns_differ(&next) => {
                self.active.columns = next.columns;
                self.pending = Some(next);
                BreakDecision {
                    force_mid_page_region: true,
                    ..Default::default()
                }
            }
            SectionType::Continuous => {
                self.pending = Some(next);
                BreakDecision::default()
            }
        }
    }

    fn force_page(&mut self, next: SectionProps, required_parity: Option<Parity>) -> BreakDecision {
        self.pending = Some(next);
        BreakDecision {
            force_page_break: true,
            force_mid_page_region: false,
            required_parity,
        }
    }

    fn activate(&mut self, next: SectionProps) {
        if self.section_aware && next.section_index != self.active.section_index {
            if let Some(start) = next.numbering.start {
                self.pending_restart = Some(start);
            }
        }
        self.active = next;
    }

    /// Margins of the active section with room reserved for header and footer
    /// content taller than their nominal distance.
    pub fn effective_margins(&self) -> Margins {
        let mut margins = self.active.margins;
        if self.header_height > 0.0 {
            margins.top = margins.top.max(margins.header.unwrap_or(0.0) + self.header_height);
        }
        if self.footer_height > 0.0 {
            margins.bottom = margins
                .bottom
                .max(margins.footer.unwrap_or(0.0) + self.footer_height);
        }
        margins
    }

    fn number_format(&self) -> NumberFormat {
        if self.section_aware {
            self.active.numbering.format.unwrap_or_default()
        } else {
            NumberFormat::Decimal
        }
    }
}

impl PageLifecycle for SectionState {
    fn on_before_page_geometry_finalized(&mut self) {
        if let Some(next) = self.pending.take() {
            self.activate(next);
        }
    }

    fn page_geometry(&self) -> Result<PageGeometry, LayoutError> {
        let size = self.active.oriented_page_size();
        if !(size.w > 0.0 && size.h > 0.0 && size.w.is_finite() && size.h.is_finite()) {
            return Err(LayoutError::InvalidPageSize {
                width: size.w,
                height: size.h,
            });
        }
        let margins = self.effective_margins();
        let content_width = size.w - margins.horizontal();
        if content_width <= 0.0 || !content_width.is_finite() {
            return Err(LayoutError::NonPositiveContentWidth {
                width: content_width,
                section_index: self.active.section_index,
            });
        }
        let content_height = size.h - margins.top - margins.bottom;
        if content_height <= 0.0 || !content_height.is_finite() {
            return Err(LayoutError::NonPositiveContentHeight {
                height: content_height,
                section_index: self.active.section_index,
            });
        }
        Ok(PageGeometry {
            size,
            margins,
            columns: normalize_columns(self.active.columns, content_width),
            orientation: self.active.orientation,
            v_align: self.active.v_align,
        })
    }

    fn on_after_page_created(&mut self, page: &mut Page) {
        if let Some(start) = self.pending_restart.take() {
            self.counter = start;
        }
        self.last_page_number = self.counter;
        page.number_text = format_page_number(self.counter, self.number_format());
        page.section_index = self.active.section_index;
        if self.active.header_refs.is_some() || self.active.footer_refs.is_some() {
            page.section_refs = Some(SectionRefs {
                header_refs: self.active.header_refs.clone(),
                footer_refs: self.active.footer_refs.clone(),
            });
        }
        self.counter += 1;
    }

    fn on_page_discarded(&mut self, _page: &Page) {
        self.counter = self.last_page_number;
    }
}
