use crate::options::LayoutOptions;
use quire_types::blocks::{
    Anchor, BreakBlock, DrawingBlock, DrawingKind, ImageBlock, ListBlock, ListItem, ParagraphAttrs,
    ParagraphBlock, Run, SectionBreakBlock, SectionType, TableBlock, TableCell, TableRow, Wrap, WrapKind,
};
use quire_types::layout::ParaFragment;
use quire_types::measure::{
    Line, ListItemMeasure, ListMeasure, ParagraphMeasure, TableCellMeasure, TableMeasure, TableRowMeasure,
};
use quire_types::{FlowBlock, Fragment, Margins, Measure, PageSize};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn paragraph_block(id: &str, text: &str) -> ParagraphBlock {
    ParagraphBlock {
        id: id.into(),
        runs: if text.is_empty() { Vec::new() } else { vec![Run::text(text)] },
        attrs: ParagraphAttrs::default(),
    }
}

pub fn paragraph(id: &str, text: &str) -> FlowBlock {
    FlowBlock::Paragraph(paragraph_block(id, text))
}

pub fn line(height: f32) -> Line {
    Line {
        line_height: height,
        width: 100.0,
        ..Default::default()
    }
}

/// A paragraph measure with one line per entry of `heights`.
pub fn paragraph_measure(heights: &[f32]) -> ParagraphMeasure {
    ParagraphMeasure {
        lines: heights.iter().copied().map(line).collect(),
        total_height: heights.iter().sum(),
        marker: None,
    }
}

/// A single-run paragraph starting at document position `pm_start`, broken
/// into lines of `line_chars` characters each.
pub fn positioned_paragraph(
    id: &str,
    text: &str,
    pm_start: usize,
    line_chars: &[usize],
    line_width: f32,
    line_height: f32,
) -> (FlowBlock, Measure) {
    let len = text.chars().count();
    let mut run = Run::text(text);
    run.pm_start = Some(pm_start);
    run.pm_end = Some(pm_start + len);

    let mut offset = 0;
    let lines = line_chars
        .iter()
        .map(|&n| {
            let l = Line {
                from_run: 0,
                from_char: offset,
                to_run: 0,
                to_char: offset + n,
                width: line_width,
                line_height,
                ..Default::default()
            };
            offset += n;
            l
        })
        .collect::<Vec<_>>();
    let total_height = line_height * lines.len() as f32;

    let block = ParagraphBlock {
        id: id.into(),
        runs: vec![run],
        attrs: ParagraphAttrs::default(),
    };
    (
        FlowBlock::Paragraph(block),
        Measure::Paragraph(ParagraphMeasure {
            lines,
            total_height,
            marker: None,
        }),
    )
}

pub fn list_block(id: &str, items: &[&str]) -> ListBlock {
    ListBlock {
        id: id.into(),
        items: items
            .iter()
            .enumerate()
            .map(|(i, text)| ListItem {
                id: format!("{id}-{i}").into(),
                marker: format!("{}.", i + 1),
                paragraph: paragraph_block(&format!("{id}-{i}-p"), text),
            })
            .collect(),
    }
}

pub fn list_measure(block: &ListBlock, lines: &[&[f32]], indent_left: f32) -> ListMeasure {
    let items: Vec<_> = block
        .items
        .iter()
        .zip(lines)
        .map(|(item, heights)| ListItemMeasure {
            item_id: item.id.clone(),
            marker_width: 18.0,
            indent_left,
            paragraph: paragraph_measure(heights),
        })
        .collect();
    let total_height = items.iter().map(|i| i.paragraph.total_height).sum();
    ListMeasure { items, total_height }
}

pub fn image(id: &str, anchor: Option<Anchor>) -> FlowBlock {
    FlowBlock::Image(ImageBlock {
        id: id.into(),
        src: format!("{id}.png"),
        anchor,
        wrap: None,
        pm_start: None,
        pm_end: None,
    })
}

pub fn anchored_drawing(id: &str, anchor: Anchor, wrap: WrapKind) -> FlowBlock {
    FlowBlock::Drawing(DrawingBlock {
        id: id.into(),
        drawing_kind: DrawingKind::VectorShape,
        rotation: 0.0,
        z_index: None,
        anchor: Some(anchor),
        wrap: Some(Wrap {
            kind: wrap,
            ..Default::default()
        }),
        pm_start: None,
        pm_end: None,
    })
}

pub fn section_break(id: &str, kind: SectionType) -> SectionBreakBlock {
    let mut block = SectionBreakBlock::new(id);
    block.section_type = Some(kind);
    block
}

pub fn page_break(id: &str) -> FlowBlock {
    FlowBlock::PageBreak(BreakBlock { id: id.into() })
}

pub fn column_break(id: &str) -> FlowBlock {
    FlowBlock::ColumnBreak(BreakBlock { id: id.into() })
}

pub fn table(id: &str, rows: usize) -> TableBlock {
    TableBlock {
        id: id.into(),
        rows: (0..rows)
            .map(|r| TableRow {
                id: format!("{id}-r{r}").into(),
                cells: vec![TableCell {
                    id: format!("{id}-r{r}-c0").into(),
                    blocks: vec![paragraph_block(&format!("{id}-r{r}-p"), "cell")],
                    colspan: 1,
                    rowspan: 1,
                }],
                cant_split: false,
                repeat_header: false,
            })
            .collect(),
        table_row_break: None,
        anchor: None,
        wrap: None,
    }
}

pub fn table_measure(row_heights: &[f32], width: f32) -> TableMeasure {
    TableMeasure {
        rows: row_heights
            .iter()
            .map(|&h| TableRowMeasure {
                height: h,
                cells: vec![TableCellMeasure { width, height: h }],
            })
            .collect(),
        column_widths: vec![width],
        total_width: width,
        total_height: row_heights.iter().sum(),
    }
}

/// A 400px wide page with 20px margins and `content_height` of room.
pub fn small_page_options(content_height: f32) -> LayoutOptions {
    LayoutOptions {
        page_size: PageSize::new(400.0, content_height + 40.0),
        margins: Margins::all(20.0),
        ..Default::default()
    }
}

pub fn para_fragment(id: &str, y: f32) -> Fragment {
    Fragment::Para(ParaFragment {
        block_id: id.into(),
        x: 0.0,
        y,
        width: 100.0,
        from_line: 0,
        to_line: 1,
        continues_from_prev: false,
        continues_on_next: false,
        marker_width: None,
        first_line_offset: None,
    })
}
