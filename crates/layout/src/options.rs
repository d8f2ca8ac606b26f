use crate::config::FeatureFlags;
use quire_types::blocks::{ParagraphBlock, SectionMetadata, TableRowBreak};
use quire_types::measure::ParagraphMeasure;
use quire_types::{ColumnLayout, Margins, PageSize};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Re-measures a paragraph at a narrower width, used when a float leaves less
/// room than the width the paragraph was measured at. Returning `None` keeps
/// the original measure.
pub type RemeasureFn = Arc<dyn Fn(&ParagraphBlock, f32) -> Option<ParagraphMeasure> + Send + Sync>;

/// Measured content height of each header or footer variant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeaderFooterHeights {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub even: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odd: Option<f32>,
}

impl HeaderFooterHeights {
    /// The tallest variant, or zero when none is known.
    pub fn max(&self) -> f32 {
        [self.default, self.first, self.even, self.odd]
            .into_iter()
            .flatten()
            .filter(|h| h.is_finite())
            .fold(0.0, f32::max)
    }
}

/// The page frame page- and margin-relative anchors resolve against when it
/// differs from the layout page, e.g. inside a header band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorFrame {
    pub page_width: f32,
    pub margins: Margins,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutOptions {
    pub page_size: PageSize,
    pub margins: Margins,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<ColumnLayout>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub section_metadata: Vec<SectionMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_content_heights: Option<HeaderFooterHeights>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer_content_heights: Option<HeaderFooterHeights>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_row_break: Option<TableRowBreak>,
    #[serde(skip)]
    pub remeasure_paragraph: Option<RemeasureFn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_frame: Option<AnchorFrame>,
    #[serde(skip)]
    pub flags: FeatureFlags,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            page_size: PageSize::LETTER,
            margins: Margins::default(),
            columns: None,
            section_metadata: Vec::new(),
            header_content_heights: None,
            footer_content_heights: None,
            table_row_break: None,
            remeasure_paragraph: None,
            anchor_frame: None,
            flags: FeatureFlags::default(),
        }
    }
}

impl LayoutOptions {
    pub fn content_width(&self) -> f32 {
        self.page_size.w - self.margins.horizontal()
    }

    pub fn section_metadata(&self, section_index: usize) -> Option<&SectionMetadata> {
        self.section_metadata
            .iter()
            .find(|m| m.section_index == section_index)
    }
}

impl fmt::Debug for LayoutOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutOptions")
            .field("page_size", &self.page_size)
            .field("margins", &self.margins)
            .field("columns", &self.columns)
            .field("section_metadata", &self.section_metadata)
            .field("header_content_heights", &self.header_content_heights)
            .field("footer_content_heights", &self.footer_content_heights)
            .field("table_row_break", &self.table_row_break)
            .field(
                "remeasure_paragraph",
                &self.remeasure_paragraph.as_ref().map(|_| "<fn>"),
            )
            .field("anchor_frame", &self.anchor_frame)
            .field("flags", &self.flags)
            .finish()
    }
}
