//! Output of the pagination engine.
//!
//! A [`Layout`] is rebuilt from scratch on every layout call; nothing in here
//! is patched incrementally.

use crate::blocks::{DrawingKind, HeaderFooterRefs, VerticalAlign};
use crate::geometry::{ColumnLayout, Margins, Orientation, PageSize};
use crate::ids::BlockId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub page_size: PageSize,
    pub pages: Vec<Page>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<ColumnLayout>,
}

impl Layout {
    pub fn fragment_count(&self) -> usize {
        self.pages.iter().map(|p| p.fragments.len()).sum()
    }

    /// Index of the first page holding a fragment of `block_id`.
    pub fn page_of_block(&self, block_id: &BlockId) -> Option<usize> {
        self.pages
            .iter()
            .position(|p| p.fragments.iter().any(|f| f.block_id() == block_id))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRefs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_refs: Option<HeaderFooterRefs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer_refs: Option<HeaderFooterRefs>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Physical, 1-based page number.
    pub number: u32,
    pub fragments: Vec<Fragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margins: Option<Margins>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<PageSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v_align: Option<VerticalAlign>,
    /// Display page number, formatted per the section's numbering.
    #[serde(default)]
    pub number_text: String,
    #[serde(default)]
    pub section_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_refs: Option<SectionRefs>,
}

impl Page {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            fragments: Vec::new(),
            margins: None,
            size: None,
            orientation: None,
            v_align: None,
            number_text: number.to_string(),
            section_index: 0,
            section_refs: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Fragment {
    Para(ParaFragment),
    #[serde(rename = "list-item")]
    ListItem(ListItemFragment),
    Image(ImageFragment),
    Drawing(DrawingFragment),
    Table(TableFragment),
}

impl Fragment {
    pub fn block_id(&self) -> &BlockId {
        match self {
            Fragment::Para(f) => &f.block_id,
            Fragment::ListItem(f) => &f.block_id,
            Fragment::Image(f) => &f.block_id,
            Fragment::Drawing(f) => &f.block_id,
            Fragment::Table(f) => &f.block_id,
        }
    }

    pub fn x(&self) -> f32 {
        match self {
            Fragment::Para(f) => f.x,
            Fragment::ListItem(f) => f.x,
            Fragment::Image(f) => f.x,
            Fragment::Drawing(f) => f.x,
            Fragment::Table(f) => f.x,
        }
    }

    pub fn y(&self) -> f32 {
        match self {
            Fragment::Para(f) => f.y,
            Fragment::ListItem(f) => f.y,
            Fragment::Image(f) => f.y,
            Fragment::Drawing(f) => f.y,
            Fragment::Table(f) => f.y,
        }
    }

    pub fn width(&self) -> f32 {
        match self {
            Fragment::Para(f) => f.width,
            Fragment::ListItem(f) => f.width,
            Fragment::Image(f) => f.width,
            Fragment::Drawing(f) => f.width,
            Fragment::Table(f) => f.width,
        }
    }

    pub fn translate_y(&mut self, dy: f32) {
        match self {
            Fragment::Para(f) => f.y += dy,
            Fragment::ListItem(f) => f.y += dy,
            Fragment::Image(f) => f.y += dy,
            Fragment::Drawing(f) => f.y += dy,
            Fragment::Table(f) => f.y += dy,
        }
    }

    /// Floating fragments positioned by an anchor rather than the flow.
    pub fn is_anchored(&self) -> bool {
        match self {
            Fragment::Para(_) | Fragment::ListItem(_) => false,
            Fragment::Image(f) => f.is_anchored,
            Fragment::Drawing(f) => f.is_anchored,
            Fragment::Table(f) => f.is_anchored,
        }
    }

    pub fn behind_doc(&self) -> bool {
        match self {
            Fragment::Image(f) => f.behind_doc,
            Fragment::Drawing(f) => f.behind_doc,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParaFragment {
    pub block_id: BlockId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub from_line: usize,
    pub to_line: usize,
    #[serde(default)]
    pub continues_from_prev: bool,
    #[serde(default)]
    pub continues_on_next: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_width: Option<f32>,
    /// Horizontal offset of the first line relative to continuation lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_line_offset: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemFragment {
    pub block_id: BlockId,
    pub item_id: BlockId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub from_line: usize,
    pub to_line: usize,
    pub marker_width: f32,
    #[serde(default)]
    pub continues_from_prev: bool,
    #[serde(default)]
    pub continues_on_next: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFragment {
    pub block_id: BlockId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub is_anchored: bool,
    #[serde(default)]
    pub behind_doc: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingFragment {
    pub block_id: BlockId,
    pub drawing_kind: DrawingKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    #[serde(default)]
    pub is_anchored: bool,
    #[serde(default)]
    pub behind_doc: bool,
}

/// The slice of a single row that lands in a fragment when the row itself is
/// split across columns or pages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialRow {
    pub row_index: usize,
    pub offset_from: f32,
    pub offset_to: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFragment {
    pub block_id: BlockId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// First row that ends in this fragment.
    pub from_row: usize,
    /// Portion of `from_row` already rendered by the previous fragment.
    #[serde(default)]
    pub start_row_offset: f32,
    /// One past the last row that ends in this fragment.
    pub to_row: usize,
    /// A row that starts or continues here and ends in a later fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_row: Option<PartialRow>,
    #[serde(default)]
    pub repeat_header_count: usize,
    #[serde(default)]
    pub continues_from_prev: bool,
    #[serde(default)]
    pub continues_on_next: bool,
    #[serde(default)]
    pub is_anchored: bool,
}

/// Result of laying out a header or footer part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderFooterLayout {
    /// Content height used to reserve space on body pages.
    pub height: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub pages: Vec<Page>,
}
