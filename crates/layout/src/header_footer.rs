//! Header and footer layout.
//!
//! A header or footer part is laid out like a tiny document whose page is the
//! band it occupies. Its content height then decides how much room body pages
//! reserve for it.

use crate::LayoutError;
use crate::cache::content_hash;
use crate::engine::{fragment_height, layout_document, measures_by_id};
use crate::options::{AnchorFrame, LayoutOptions};
use quire_types::{FlowBlock, HeaderFooterLayout, Margins, Measure, PageSize};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Behind-text decorations further than this from the band are ignored when
/// measuring it, unless four times the band height is larger.
const DECORATION_REACH: f32 = 192.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderFooterConstraints {
    pub width: f32,
    pub height: f32,
    /// Width of the body page, for page-relative anchors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_width: Option<f32>,
    /// Margins of the body page, for margin-relative anchors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margins: Option<Margins>,
}

impl HeaderFooterConstraints {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            page_width: None,
            margins: None,
        }
    }

    fn validate(&self) -> Result<(), LayoutError> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if valid(self.width) && valid(self.height) {
            Ok(())
        } else {
            Err(LayoutError::InvalidHeaderFooterConstraints {
                width: self.width,
                height: self.height,
            })
        }
    }

    fn layout_options(&self, base: &LayoutOptions) -> LayoutOptions {
        let anchor_frame = match (self.page_width, self.margins) {
            (Some(page_width), Some(margins)) => Some(AnchorFrame { page_width, margins }),
            (Some(page_width), None) => Some(AnchorFrame {
                page_width,
                margins: Margins::zero(),
            }),
            (None, _) => None,
        };
        LayoutOptions {
            page_size: PageSize::new(self.width, self.height),
            margins: Margins::zero(),
            columns: None,
            section_metadata: Vec::new(),
            header_content_heights: None,
            footer_content_heights: None,
            table_row_break: base.table_row_break,
            remeasure_paragraph: base.remeasure_paragraph.clone(),
            anchor_frame,
            flags: base.flags,
        }
    }
}

/// Lays out a header or footer part inside its band.
pub fn layout_header_footer(
    blocks: &[FlowBlock],
    measures: &[Measure],
    constraints: &HeaderFooterConstraints,
) -> Result<HeaderFooterLayout, LayoutError> {
    layout_header_footer_with(blocks, measures, constraints, &LayoutOptions::default())
}

/// Like [`layout_header_footer`], taking the row-break policy, re-measure
/// callback and flags from `base`.
pub fn layout_header_footer_with(
    blocks: &[FlowBlock],
    measures: &[Measure],
    constraints: &HeaderFooterConstraints,
    base: &LayoutOptions,
) -> Result<HeaderFooterLayout, LayoutError> {
    constraints.validate()?;
    let layout = layout_document(blocks, measures, &constraints.layout_options(base))?;

    let by_id = measures_by_id(blocks, measures);
    let reach = DECORATION_REACH.max(4.0 * constraints.height);
    let extent = layout
        .pages
        .iter()
        .flat_map(|p| &p.fragments)
        .filter(|f| {
            let decorative = f.is_anchored() && f.behind_doc() && f.y().abs() > reach;
            if decorative {
                log::debug!("Ignoring decorative {} at y={:.1} for band height", f.block_id(), f.y());
            }
            !decorative
        })
        .map(|f| (f.y(), f.y() + fragment_height(f, &by_id)))
        .reduce(|(top, bottom), (t, b)| (top.min(t), bottom.max(b)));

    let (min_y, max_y) = extent.unwrap_or((0.0, 0.0));
    Ok(HeaderFooterLayout {
        height: (max_y - min_y).max(0.0),
        min_y,
        max_y,
        pages: layout.pages,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderFooterCacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Memoised header/footer layouts.
///
/// Entries are keyed by part content, band constraints and a page-number
/// bucket. With digit bucketing every page number of the same digit count
/// shares an entry, since a page-number field only changes the layout when
/// its width does.
#[derive(Debug, Default)]
pub struct HeaderFooterLayoutCache {
    entries: HashMap<(u64, String), HeaderFooterLayout>,
    stats: HeaderFooterCacheStats,
    digit_bucketing: bool,
    debug: bool,
}

impl HeaderFooterLayoutCache {
    pub fn new(digit_bucketing: bool) -> Self {
        Self {
            digit_bucketing,
            ..Default::default()
        }
    }

    pub fn from_options(options: &LayoutOptions) -> Self {
        Self {
            digit_bucketing: options.flags.hf_digit_bucketing,
            debug: options.flags.debug_hf_cache,
            ..Default::default()
        }
    }

    /// The bucket a page number falls in.
    pub fn bucket_key(&self, number_text: &str) -> String {
        if self.digit_bucketing {
            format!("d{}", number_text.chars().count())
        } else {
            number_text.to_string()
        }
    }

    pub fn get_or_layout(
        &mut self,
        blocks: &[FlowBlock],
        measures: &[Measure],
        constraints: &HeaderFooterConstraints,
        base: &LayoutOptions,
        number_text: &str,
    ) -> Result<HeaderFooterLayout, LayoutError> {
        let key = (part_key(blocks, constraints), self.bucket_key(number_text));
        if let Some(layout) = self.entries.get(&key) {
            self.stats.hits += 1;
            if self.debug {
                log::debug!("Header/footer cache hit for bucket {}", key.1);
            }
            return Ok(layout.clone());
        }

        self.stats.misses += 1;
        if self.debug {
            log::debug!("Header/footer cache miss for bucket {}", key.1);
        }
        let layout = layout_header_footer_with(blocks, measures, constraints, base)?;
        self.entries.insert(key, layout.clone());
        Ok(layout)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> HeaderFooterCacheStats {
        self.stats
    }
}

fn part_key(blocks: &[FlowBlock], constraints: &HeaderFooterConstraints) -> u64 {
    let mut s = DefaultHasher::new();
    for block in blocks {
        content_hash(block, &mut s);
    }
    constraints.width.to_bits().hash(&mut s);
    constraints.height.to_bits().hash(&mut s);
    constraints.page_width.map(f32::to_bits).hash(&mut s);
    s.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{anchored_drawing, paragraph, paragraph_measure};
    use quire_types::blocks::{Anchor, VRelativeFrom, WrapKind};
    use quire_types::measure::BoxMeasure;

    #[test]
    fn test_rejects_non_positive_band() {
        let err = layout_header_footer(&[], &[], &HeaderFooterConstraints::new(0.0, 50.0));
        assert!(matches!(err, Err(LayoutError::InvalidHeaderFooterConstraints { .. })));
        let err = layout_header_footer(&[], &[], &HeaderFooterConstraints::new(400.0, f32::NAN));
        assert!(err.is_err());
    }

    #[test]
    fn test_height_sums_line_extents() {
        let blocks = vec![paragraph("h1", "Title"), paragraph("h2", "Subtitle")];
        let measures = vec![
            Measure::Paragraph(paragraph_measure(&[20.0])),
            Measure::Paragraph(paragraph_measure(&[14.0, 14.0])),
        ];
        let layout = layout_header_footer(&blocks, &measures, &HeaderFooterConstraints::new(600.0, 100.0)).unwrap();
        assert_eq!(layout.height, 48.0);
        assert_eq!((layout.min_y, layout.max_y), (0.0, 48.0));
        assert_eq!(layout.pages.len(), 1);
    }

    #[test]
    fn test_far_behind_doc_decoration_is_excluded() {
        let height = 100.0;
        let decoration = anchored_drawing(
            "watermark",
            Anchor {
                is_anchored: true,
                v_relative_from: VRelativeFrom::Page,
                offset_v: height + 5.0 * height,
                behind_doc: true,
                ..Default::default()
            },
            WrapKind::None,
        );
        let blocks = vec![paragraph("h", "Header"), decoration];
        let measures = vec![
            Measure::Paragraph(paragraph_measure(&[20.0])),
            Measure::Drawing(BoxMeasure { width: 300.0, height: 300.0 }),
        ];

        let layout =
            layout_header_footer(&blocks, &measures, &HeaderFooterConstraints::new(600.0, height)).unwrap();
        assert_eq!(layout.height, 20.0);
        let rendered = layout.pages[0]
            .fragments
            .iter()
            .any(|f| f.block_id().as_str() == "watermark");
        assert!(rendered);
    }

    #[test]
    fn test_cache_buckets_by_digit_count() {
        let blocks = vec![paragraph("f", "Page")];
        let measures = vec![Measure::Paragraph(paragraph_measure(&[12.0]))];
        let constraints = HeaderFooterConstraints::new(600.0, 60.0);
        let base = LayoutOptions::default();

        let mut cache = HeaderFooterLayoutCache::new(true);
        for n in ["1", "2", "9", "10", "11"] {
            cache.get_or_layout(&blocks, &measures, &constraints, &base, n).unwrap();
        }
        assert_eq!(cache.stats(), HeaderFooterCacheStats { hits: 3, misses: 2 });
        assert_eq!(cache.len(), 2);

        let mut exact = HeaderFooterLayoutCache::new(false);
        for n in ["1", "2", "2"] {
            exact.get_or_layout(&blocks, &measures, &constraints, &base, n).unwrap();
        }
        assert_eq!(exact.stats(), HeaderFooterCacheStats { hits: 1, misses: 2 });
        assert_eq!(exact.bucket_key("iv"), "iv");
    }
}
