//! Per-page header and footer resolution.
//!
//! After the body is paginated every page knows its section's header/footer
//! references. This module picks the variant each page shows, lays the part
//! out through the shared [`HeaderFooterLayoutCache`] and fills in its
//! page-number fields.

use crate::error::QuireError;
use crate::tokens::substitute_block;
use quire_layout::{HeaderFooterConstraints, HeaderFooterHeights, HeaderFooterLayoutCache, LayoutOptions};
use quire_types::blocks::HeaderFooterRefs;
use quire_types::{FlowBlock, HeaderFooterLayout, Layout, Margins, Measure, Page};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Band extent used when margins leave no room for a header or footer band.
const MIN_BAND_EXTENT: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeaderFooterKind {
    Header,
    Footer,
}

/// Which of a section's variants a page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Variant {
    First,
    Even,
    Odd,
    Default,
}

/// The content of one header or footer part, keyed by its reference id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HeaderFooterPart {
    pub blocks: Vec<FlowBlock>,
    pub measures: Vec<Measure>,
}

pub type HeaderFooterParts = HashMap<String, HeaderFooterPart>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPart {
    pub part_id: String,
    pub variant: Variant,
    pub layout: HeaderFooterLayout,
    /// The part's blocks with page-number fields filled in for this page.
    pub blocks: Vec<FlowBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDecorations {
    pub page_index: usize,
    pub header: Option<ResolvedPart>,
    pub footer: Option<ResolvedPart>,
}

/// Picks the reference a page shows.
///
/// The first page of a section shows the `first` variant when the section has
/// a title page. Otherwise even and odd physical pages prefer their own
/// variant, falling back to `default`.
pub fn select_variant(refs: &HeaderFooterRefs, page_number: u32, first_of_section: bool, title_page: bool) -> Option<(Variant, &str)> {
    if first_of_section && title_page {
        if let Some(id) = refs.first.as_deref() {
            return Some((Variant::First, id));
        }
    }
    let parity = if page_number % 2 == 0 {
        refs.even.as_deref().map(|id| (Variant::Even, id))
    } else {
        refs.odd.as_deref().map(|id| (Variant::Odd, id))
    };
    parity.or_else(|| refs.default.as_deref().map(|id| (Variant::Default, id)))
}

pub struct HeaderFooterResolver {
    cache: HeaderFooterLayoutCache,
}

impl HeaderFooterResolver {
    pub fn new(options: &LayoutOptions) -> Self {
        Self {
            cache: HeaderFooterLayoutCache::from_options(options),
        }
    }

    pub fn cache(&self) -> &HeaderFooterLayoutCache {
        &self.cache
    }

    /// Resolves the header and footer of every page of `layout`.
    pub fn resolve(
        &mut self,
        layout: &Layout,
        parts: &HeaderFooterParts,
        options: &LayoutOptions,
    ) -> Result<Vec<PageDecorations>, QuireError> {
        let page_count = layout.pages.len().to_string();
        let mut out = Vec::with_capacity(layout.pages.len());

        for (index, page) in layout.pages.iter().enumerate() {
            let first_of_section = index == 0 || layout.pages[index - 1].section_index != page.section_index;
            let title_page = options
                .section_metadata(page.section_index)
                .map(|m| m.title_page);

            let mut decorations = PageDecorations {
                page_index: index,
                header: None,
                footer: None,
            };
            for kind in [HeaderFooterKind::Header, HeaderFooterKind::Footer] {
                let refs = page.section_refs.as_ref().and_then(|r| match kind {
                    HeaderFooterKind::Header => r.header_refs.as_ref(),
                    HeaderFooterKind::Footer => r.footer_refs.as_ref(),
                });
                let Some(refs) = refs else { continue };
                // Without metadata a section shows its first-page variant
                // whenever it has one.
                let title_page = title_page.unwrap_or(refs.first.is_some());
                let Some((variant, part_id)) = select_variant(refs, page.number, first_of_section, title_page)
                else {
                    continue;
                };
                let Some(part) = parts.get(part_id) else {
                    log::warn!("Page {} refers to missing {:?} part '{}'", page.number, kind, part_id);
                    continue;
                };

                let constraints = band_constraints(kind, page, layout, options);
                let part_layout = self.cache.get_or_layout(
                    &part.blocks,
                    &part.measures,
                    &constraints,
                    options,
                    &page.number_text,
                )?;
                let mut blocks = part.blocks.clone();
                if options.flags.header_footer_page_tokens {
                    for block in &mut blocks {
                        substitute_block(block, &page.number_text, &page_count);
                    }
                }

                let resolved = ResolvedPart {
                    part_id: part_id.to_string(),
                    variant,
                    layout: part_layout,
                    blocks,
                };
                match kind {
                    HeaderFooterKind::Header => decorations.header = Some(resolved),
                    HeaderFooterKind::Footer => decorations.footer = Some(resolved),
                }
            }
            out.push(decorations);
        }
        Ok(out)
    }

    /// Content height of each variant in `refs`, for
    /// `LayoutOptions::header_content_heights` and its footer twin.
    pub fn content_heights(
        &mut self,
        refs: &HeaderFooterRefs,
        parts: &HeaderFooterParts,
        constraints: &HeaderFooterConstraints,
        options: &LayoutOptions,
    ) -> Result<HeaderFooterHeights, QuireError> {
        let mut height_of = |id: Option<&str>| -> Result<Option<f32>, QuireError> {
            let Some(part) = id.and_then(|id| parts.get(id)) else {
                return Ok(None);
            };
            let layout = self
                .cache
                .get_or_layout(&part.blocks, &part.measures, constraints, options, "1")?;
            Ok(Some(layout.height))
        };
        Ok(HeaderFooterHeights {
            default: height_of(refs.default.as_deref())?,
            first: height_of(refs.first.as_deref())?,
            even: height_of(refs.even.as_deref())?,
            odd: height_of(refs.odd.as_deref())?,
        })
    }
}

fn band_constraints(kind: HeaderFooterKind, page: &Page, layout: &Layout, options: &LayoutOptions) -> HeaderFooterConstraints {
    let size = page.size.unwrap_or(layout.page_size);
    let margins: Margins = page.margins.unwrap_or(options.margins);
    let height = match kind {
        HeaderFooterKind::Header => margins.top - margins.header.unwrap_or(0.0),
        HeaderFooterKind::Footer => margins.bottom - margins.footer.unwrap_or(0.0),
    };
    HeaderFooterConstraints {
        width: (size.w - margins.horizontal()).max(MIN_BAND_EXTENT),
        height: height.max(MIN_BAND_EXTENT),
        page_width: Some(size.w),
        margins: Some(margins),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs() -> HeaderFooterRefs {
        HeaderFooterRefs {
            default: Some("default".into()),
            first: Some("first".into()),
            even: Some("even".into()),
            odd: None,
        }
    }

    #[test]
    fn test_variant_selection() {
        let refs = refs();
        assert_eq!(select_variant(&refs, 1, true, true), Some((Variant::First, "first")));
        assert_eq!(select_variant(&refs, 1, true, false), Some((Variant::Default, "default")));
        assert_eq!(select_variant(&refs, 2, false, true), Some((Variant::Even, "even")));
        assert_eq!(select_variant(&refs, 3, false, true), Some((Variant::Default, "default")));
        assert_eq!(select_variant(&HeaderFooterRefs::default(), 1, true, true), None);
    }
}
