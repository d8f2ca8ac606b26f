//! The flow block model consumed by the layout engine.
//!
//! Blocks arrive in document order from the import/editing layer. Each block
//! kind has a matching [`Measure`](crate::measure::Measure) variant produced by
//! the external measurer.

use crate::geometry::{ColumnLayout, Margins, Orientation, PageSize};
use crate::ids::BlockId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FlowBlock {
    Paragraph(ParagraphBlock),
    List(ListBlock),
    Image(ImageBlock),
    Drawing(DrawingBlock),
    Table(TableBlock),
    SectionBreak(SectionBreakBlock),
    PageBreak(BreakBlock),
    ColumnBreak(BreakBlock),
}

/// Discriminant of a [`FlowBlock`], used in error messages and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Paragraph,
    List,
    Image,
    Drawing,
    Table,
    SectionBreak,
    PageBreak,
    ColumnBreak,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::List => "list",
            BlockKind::Image => "image",
            BlockKind::Drawing => "drawing",
            BlockKind::Table => "table",
            BlockKind::SectionBreak => "sectionBreak",
            BlockKind::PageBreak => "pageBreak",
            BlockKind::ColumnBreak => "columnBreak",
        }
    }
}

impl FlowBlock {
    pub fn id(&self) -> &BlockId {
        match self {
            FlowBlock::Paragraph(b) => &b.id,
            FlowBlock::List(b) => &b.id,
            FlowBlock::Image(b) => &b.id,
            FlowBlock::Drawing(b) => &b.id,
            FlowBlock::Table(b) => &b.id,
            FlowBlock::SectionBreak(b) => &b.id,
            FlowBlock::PageBreak(b) | FlowBlock::ColumnBreak(b) => &b.id,
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            FlowBlock::Paragraph(_) => BlockKind::Paragraph,
            FlowBlock::List(_) => BlockKind::List,
            FlowBlock::Image(_) => BlockKind::Image,
            FlowBlock::Drawing(_) => BlockKind::Drawing,
            FlowBlock::Table(_) => BlockKind::Table,
            FlowBlock::SectionBreak(_) => BlockKind::SectionBreak,
            FlowBlock::PageBreak(_) => BlockKind::PageBreak,
            FlowBlock::ColumnBreak(_) => BlockKind::ColumnBreak,
        }
    }

    /// Break blocks never produce fragments.
    pub fn is_break(&self) -> bool {
        matches!(
            self,
            FlowBlock::SectionBreak(_) | FlowBlock::PageBreak(_) | FlowBlock::ColumnBreak(_)
        )
    }

    /// The anchor of a floating image, drawing or table, if it is anchored.
    pub fn anchor(&self) -> Option<&Anchor> {
        let anchor = match self {
            FlowBlock::Image(b) => b.anchor.as_ref(),
            FlowBlock::Drawing(b) => b.anchor.as_ref(),
            FlowBlock::Table(b) => b.anchor.as_ref(),
            _ => None,
        };
        anchor.filter(|a| a.is_anchored)
    }

    pub fn wrap(&self) -> Option<&Wrap> {
        match self {
            FlowBlock::Image(b) => b.wrap.as_ref(),
            FlowBlock::Drawing(b) => b.wrap.as_ref(),
            FlowBlock::Table(b) => b.wrap.as_ref(),
            _ => None,
        }
    }
}

// --- Paragraphs ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphBlock {
    pub id: BlockId,
    #[serde(default)]
    pub runs: Vec<Run>,
    #[serde(default)]
    pub attrs: ParagraphAttrs,
}

impl ParagraphBlock {
    /// A paragraph without any visible text.
    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.is_empty() && r.token.is_none())
    }

    /// Character count of every run, in order.
    pub fn run_lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.runs.iter().map(|r| r.text.chars().count())
    }

    pub fn has_page_tokens(&self) -> bool {
        self.runs.iter().any(|r| r.token.is_some())
    }
}

/// A styled span of text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Field token whose text is resolved after pagination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<FieldToken>,
    /// Document position of the first character of the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm_start: Option<usize>,
    /// Document position one past the last character of the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm_end: Option<usize>,
}

impl Run {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldToken {
    PageNumber,
    TotalPageCount,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphAttrs {
    #[serde(default)]
    pub indent: Indent,
    #[serde(default)]
    pub spacing: Spacing,
    /// Keep every line of the paragraph in one column when possible.
    #[serde(default)]
    pub keep_lines: bool,
    #[serde(default)]
    pub keep_next: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_marker: Option<ListMarkerAttrs>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Indent {
    #[serde(default)]
    pub left: f32,
    #[serde(default)]
    pub right: f32,
    #[serde(default)]
    pub first_line: f32,
    #[serde(default)]
    pub hanging: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Spacing {
    #[serde(default)]
    pub before: f32,
    #[serde(default)]
    pub after: f32,
}

/// Placement of a numbering marker in front of the first line.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMarkerAttrs {
    #[serde(default)]
    pub marker_text: String,
    /// The first line starts at `text_start_px`; continuation lines at the
    /// paragraph's left indent.
    #[serde(default)]
    pub first_line_indent_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_start_px: Option<f32>,
}

// --- Lists ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListBlock {
    pub id: BlockId,
    #[serde(default)]
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub id: BlockId,
    #[serde(default)]
    pub marker: String,
    pub paragraph: ParagraphBlock,
}

// --- Floating objects ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HRelativeFrom {
    #[default]
    Column,
    Margin,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VRelativeFrom {
    #[default]
    Paragraph,
    Margin,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlignH {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlignV {
    Top,
    Center,
    Bottom,
}

/// Attachment rule of a floating object.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchor {
    #[serde(default)]
    pub is_anchored: bool,
    #[serde(default)]
    pub h_relative_from: HRelativeFrom,
    #[serde(default)]
    pub v_relative_from: VRelativeFrom,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align_h: Option<AlignH>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align_v: Option<AlignV>,
    #[serde(default)]
    pub offset_h: f32,
    #[serde(default)]
    pub offset_v: f32,
    #[serde(default)]
    pub behind_doc: bool,
}

impl Anchor {
    /// Anchors positioned against the margin box or the page rather than
    /// their host paragraph.
    pub fn is_page_level(&self) -> bool {
        self.is_anchored && self.v_relative_from != VRelativeFrom::Paragraph
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WrapKind {
    #[default]
    None,
    Square,
    Tight,
    Through,
    TopAndBottom,
    Inline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WrapText {
    #[default]
    BothSides,
    Left,
    Right,
    Largest,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wrap {
    #[serde(default)]
    pub kind: WrapKind,
    #[serde(default)]
    pub text: WrapText,
    #[serde(default)]
    pub dist_top: f32,
    #[serde(default)]
    pub dist_bottom: f32,
    #[serde(default)]
    pub dist_left: f32,
    #[serde(default)]
    pub dist_right: f32,
}

impl Wrap {
    /// Whether text flow has to avoid the object at all.
    pub fn excludes_text(&self) -> bool {
        !matches!(self.kind, WrapKind::None | WrapKind::Inline)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBlock {
    pub id: BlockId,
    #[serde(default)]
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Anchor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap: Option<Wrap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm_start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm_end: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrawingKind {
    #[default]
    VectorShape,
    ShapeGroup,
    TextBox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingBlock {
    pub id: BlockId,
    #[serde(default)]
    pub drawing_kind: DrawingKind,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Anchor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap: Option<Wrap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm_start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm_end: Option<usize>,
}

// --- Tables ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TableRowBreak {
    Avoid,
    Allow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableBlock {
    pub id: BlockId,
    #[serde(default)]
    pub rows: Vec<TableRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_row_break: Option<TableRowBreak>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Anchor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap: Option<Wrap>,
}

impl TableBlock {
    /// Number of leading rows repeated at the top of continuation fragments.
    pub fn header_row_count(&self) -> usize {
        self.rows.iter().take_while(|r| r.repeat_header).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub id: BlockId,
    #[serde(default)]
    pub cells: Vec<TableCell>,
    #[serde(default)]
    pub cant_split: bool,
    #[serde(default)]
    pub repeat_header: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub id: BlockId,
    #[serde(default)]
    pub blocks: Vec<ParagraphBlock>,
    #[serde(default = "one")]
    pub colspan: usize,
    #[serde(default = "one")]
    pub rowspan: usize,
}

fn one() -> usize {
    1
}

// --- Breaks ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakBlock {
    pub id: BlockId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionType {
    #[default]
    Continuous,
    NextPage,
    EvenPage,
    OddPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerticalAlign {
    #[default]
    Top,
    Center,
    Bottom,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NumberFormat {
    #[default]
    Decimal,
    LowerRoman,
    UpperRoman,
    LowerLetter,
    UpperLetter,
    NumberInDash,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SectionNumbering {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<NumberFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
}

/// Margins declared on a section break; absent sides keep their current value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SectionMargins {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<f32>,
}

impl SectionMargins {
    /// Overlays the declared sides onto `base`.
    pub fn apply_to(&self, base: Margins) -> Margins {
        Margins {
            top: self.top.unwrap_or(base.top),
            right: self.right.unwrap_or(base.right),
            bottom: self.bottom.unwrap_or(base.bottom),
            left: self.left.unwrap_or(base.left),
            header: self.header.or(base.header),
            footer: self.footer.or(base.footer),
        }
    }
}

/// Header or footer part ids per page variant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeaderFooterRefs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub even: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odd: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionSource {
    #[default]
    Docx,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionBreakAttrs {
    /// Set when the importer already resolved which section this break opens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_index: Option<usize>,
    #[serde(default)]
    pub is_first_section: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SectionSource>,
    /// A continuous break that still needs a page boundary (title page,
    /// header/footer changes).
    #[serde(default)]
    pub require_page_boundary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionBreakBlock {
    pub id: BlockId,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub section_type: Option<SectionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margins: Option<SectionMargins>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<PageSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<ColumnLayout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v_align: Option<VerticalAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numbering: Option<SectionNumbering>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_refs: Option<HeaderFooterRefs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer_refs: Option<HeaderFooterRefs>,
    #[serde(default)]
    pub attrs: SectionBreakAttrs,
}

impl SectionBreakBlock {
    pub fn new(id: impl Into<BlockId>) -> Self {
        Self {
            id: id.into(),
            section_type: None,
            margins: None,
            page_size: None,
            orientation: None,
            columns: None,
            v_align: None,
            numbering: None,
            header_refs: None,
            footer_refs: None,
            attrs: SectionBreakAttrs::default(),
        }
    }

    pub fn kind(&self) -> SectionType {
        self.section_type.unwrap_or_default()
    }

    pub fn is_docx_sourced(&self) -> bool {
        self.attrs.source.unwrap_or_default() == SectionSource::Docx
    }
}

/// Per-section metadata supplied alongside the blocks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionMetadata {
    pub section_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_refs: Option<HeaderFooterRefs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer_refs: Option<HeaderFooterRefs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numbering: Option<SectionNumbering>,
    #[serde(default)]
    pub title_page: bool,
}
