//! Measurements produced by the external text measurer.
//!
//! A measure is immutable once produced; re-measuring yields a new value.

use crate::blocks::BlockKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Measure {
    Paragraph(ParagraphMeasure),
    List(ListMeasure),
    Image(BoxMeasure),
    Drawing(BoxMeasure),
    Table(TableMeasure),
    SectionBreak,
    PageBreak,
    ColumnBreak,
}

impl Measure {
    pub fn kind(&self) -> BlockKind {
        match self {
            Measure::Paragraph(_) => BlockKind::Paragraph,
            Measure::List(_) => BlockKind::List,
            Measure::Image(_) => BlockKind::Image,
            Measure::Drawing(_) => BlockKind::Drawing,
            Measure::Table(_) => BlockKind::Table,
            Measure::SectionBreak => BlockKind::SectionBreak,
            Measure::PageBreak => BlockKind::PageBreak,
            Measure::ColumnBreak => BlockKind::ColumnBreak,
        }
    }

    pub fn total_height(&self) -> f32 {
        match self {
            Measure::Paragraph(m) => m.total_height,
            Measure::List(m) => m.total_height,
            Measure::Image(m) | Measure::Drawing(m) => m.height,
            Measure::Table(m) => m.total_height,
            Measure::SectionBreak | Measure::PageBreak | Measure::ColumnBreak => 0.0,
        }
    }
}

/// One measured line. The `from`/`to` pairs address run index and character
/// offset within that run; `to` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub from_run: usize,
    pub from_char: usize,
    pub to_run: usize,
    pub to_char: usize,
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
    pub line_height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerMeasure {
    pub marker_width: f32,
    pub marker_text_width: f32,
    #[serde(default)]
    pub gutter_width: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphMeasure {
    pub lines: Vec<Line>,
    pub total_height: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<MarkerMeasure>,
}

impl ParagraphMeasure {
    /// Sum of the heights of lines `from..to`.
    pub fn lines_height(&self, from: usize, to: usize) -> f32 {
        self.lines
            .get(from..to.min(self.lines.len()))
            .map(|lines| lines.iter().map(|l| l.line_height).sum())
            .unwrap_or(0.0)
    }

    pub fn max_line_width(&self) -> f32 {
        self.lines.iter().map(|l| l.width).fold(0.0, f32::max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemMeasure {
    pub item_id: crate::ids::BlockId,
    pub marker_width: f32,
    #[serde(default)]
    pub indent_left: f32,
    pub paragraph: ParagraphMeasure,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMeasure {
    pub items: Vec<ListItemMeasure>,
    pub total_height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoxMeasure {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableCellMeasure {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableRowMeasure {
    pub height: f32,
    #[serde(default)]
    pub cells: Vec<TableCellMeasure>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMeasure {
    pub rows: Vec<TableRowMeasure>,
    #[serde(default)]
    pub column_widths: Vec<f32>,
    pub total_width: f32,
    pub total_height: f32,
}

impl TableMeasure {
    pub fn row_height(&self, index: usize) -> f32 {
        self.rows.get(index).map(|r| r.height).unwrap_or(0.0)
    }
}
