mod common;

use common::{TestResult, init_logger, lines_measure, page_break, page_number_paragraph, paragraph};
use quire::header_footer::{HeaderFooterPart, HeaderFooterParts, Variant};
use quire::layout::{HeaderFooterConstraints, LayoutOptions, layout_document};
use quire::types::blocks::{HeaderFooterRefs, SectionMetadata};
use quire::types::{FlowBlock, Measure};
use quire::HeaderFooterResolver;

fn part(blocks: Vec<FlowBlock>, lines: usize) -> HeaderFooterPart {
    let measures = blocks.iter().map(|_| lines_measure(lines)).collect();
    HeaderFooterPart { blocks, measures }
}

fn parts() -> HeaderFooterParts {
    HeaderFooterParts::from([
        ("hdr".to_string(), part(vec![paragraph("hdr-p", "Running head")], 1)),
        ("hdr-first".to_string(), part(vec![paragraph("hdr-first-p", "Title page head")], 2)),
        ("ftr".to_string(), part(vec![page_number_paragraph("ftr-p")], 1)),
    ])
}

fn options(title_page: bool) -> LayoutOptions {
    LayoutOptions {
        section_metadata: vec![SectionMetadata {
            section_index: 0,
            header_refs: Some(HeaderFooterRefs {
                default: Some("hdr".into()),
                first: Some("hdr-first".into()),
                ..Default::default()
            }),
            footer_refs: Some(HeaderFooterRefs {
                default: Some("ftr".into()),
                ..Default::default()
            }),
            title_page,
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn three_pages(options: &LayoutOptions) -> quire::types::Layout {
    let blocks = vec![
        paragraph("a", "one"),
        page_break("pb1"),
        paragraph("b", "two"),
        page_break("pb2"),
        paragraph("c", "three"),
    ];
    let measures = vec![
        lines_measure(1),
        Measure::PageBreak,
        lines_measure(1),
        Measure::PageBreak,
        lines_measure(1),
    ];
    layout_document(&blocks, &measures, options).unwrap()
}

fn footer_text(part: &quire::header_footer::ResolvedPart) -> String {
    match &part.blocks[0] {
        FlowBlock::Paragraph(p) => p.runs.iter().map(|r| r.text.as_str()).collect(),
        _ => String::new(),
    }
}

#[test]
fn test_each_page_gets_its_variant() -> TestResult {
    init_logger();
    let options = options(true);
    let layout = three_pages(&options);
    let mut resolver = HeaderFooterResolver::new(&options);
    let pages = resolver.resolve(&layout, &parts(), &options)?;

    assert_eq!(pages.len(), 3);
    let headers: Vec<_> = pages
        .iter()
        .map(|p| p.header.as_ref().map(|h| (h.variant, h.layout.height)))
        .collect();
    assert_eq!(
        headers,
        vec![
            Some((Variant::First, 40.0)),
            Some((Variant::Default, 20.0)),
            Some((Variant::Default, 20.0)),
        ]
    );

    let footers: Vec<String> = pages
        .iter()
        .filter_map(|p| p.footer.as_ref())
        .map(footer_text)
        .collect();
    assert_eq!(footers, vec!["Page 1", "Page 2", "Page 3"]);
    Ok(())
}

#[test]
fn test_single_digit_pages_share_layouts() -> TestResult {
    let options = options(true);
    let layout = three_pages(&options);
    let mut resolver = HeaderFooterResolver::new(&options);
    resolver.resolve(&layout, &parts(), &options)?;

    let stats = resolver.cache().stats();
    // hdr-first, hdr and ftr are laid out once each.
    assert_eq!((stats.hits, stats.misses), (3, 3));
    Ok(())
}

#[test]
fn test_without_title_page_first_variant_is_unused() -> TestResult {
    let options = options(false);
    let layout = three_pages(&options);
    let pages = HeaderFooterResolver::new(&options).resolve(&layout, &parts(), &options)?;
    assert_eq!(pages[0].header.as_ref().map(|h| h.part_id.as_str()), Some("hdr"));
    Ok(())
}

#[test]
fn test_missing_part_is_skipped() -> TestResult {
    let options = options(true);
    let layout = three_pages(&options);
    let mut only_footer = parts();
    only_footer.remove("hdr");
    only_footer.remove("hdr-first");

    let pages = HeaderFooterResolver::new(&options).resolve(&layout, &only_footer, &options)?;
    assert!(pages.iter().all(|p| p.header.is_none() && p.footer.is_some()));
    Ok(())
}

#[test]
fn test_field_substitution_can_be_disabled() -> TestResult {
    let mut options = options(true);
    options.flags.header_footer_page_tokens = false;
    let layout = three_pages(&options);
    let pages = HeaderFooterResolver::new(&options).resolve(&layout, &parts(), &options)?;
    let footer = pages[1].footer.as_ref().map(footer_text);
    assert_eq!(footer.as_deref(), Some("Page 0"));
    Ok(())
}

#[test]
fn test_content_heights_per_variant() -> TestResult {
    let options = LayoutOptions::default();
    let refs = HeaderFooterRefs {
        default: Some("hdr".into()),
        first: Some("hdr-first".into()),
        even: Some("missing".into()),
        odd: None,
    };
    let mut resolver = HeaderFooterResolver::new(&options);
    let heights = resolver.content_heights(&refs, &parts(), &HeaderFooterConstraints::new(624.0, 96.0), &options)?;

    assert_eq!(heights.default, Some(20.0));
    assert_eq!(heights.first, Some(40.0));
    assert_eq!(heights.even, None);
    assert_eq!(heights.max(), 40.0);
    Ok(())
}
