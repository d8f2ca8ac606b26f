use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("Got {measures} measures for {blocks} blocks.")]
    MeasureCountMismatch { blocks: usize, measures: usize },
    #[error("Block {index} ({block_id}) is a {expected} but its measure is a {actual}.")]
    MeasureKindMismatch {
        index: usize,
        block_id: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("Section {section_index} leaves a content width of {width:.2} after margins.")]
    NonPositiveContentWidth { width: f32, section_index: usize },
    #[error("Section {section_index} leaves a content height of {height:.2} after margins and header/footer bands.")]
    NonPositiveContentHeight { height: f32, section_index: usize },
    #[error("Invalid page size {width:.2}x{height:.2}.")]
    InvalidPageSize { width: f32, height: f32 },
    #[error("Header/footer constraints must be positive and finite, got {width}x{height}.")]
    InvalidHeaderFooterConstraints { width: f32, height: f32 },
    #[error("Generic layout error: {0}")]
    Generic(String),
}

pub mod cache;
pub mod columns;
pub mod config;
pub mod dirty;
pub mod engine;
pub mod floats;
pub mod header_footer;
pub mod interface;
pub mod line_cache;
pub mod nodes;
pub mod numbering;
pub mod options;
pub mod paginator;
pub mod query;
pub mod sections;

pub use self::cache::{CacheStats, Fingerprint, MeasureCache, fingerprint};
pub use self::columns::{NormalizedColumns, normalize_columns};
pub use self::config::{FeatureFlags, LayoutConfig};
pub use self::dirty::{DirtyRange, DirtyReason, DirtyTracker, OPEN_END};
pub use self::engine::layout_document;
pub use self::floats::FloatingObjectManager;
pub use self::header_footer::{HeaderFooterConstraints, HeaderFooterLayoutCache, layout_header_footer};
pub use self::interface::LayoutContext;
pub use self::line_cache::{LineInfo, ParagraphLineCache, ParagraphLines};
pub use self::numbering::format_page_number;
pub use self::options::{AnchorFrame, HeaderFooterHeights, LayoutOptions, RemeasureFn};
pub use self::query::{FragmentHit, SelectionRect, get_fragment_at_position, selection_to_rects};
pub use self::sections::{SectionProps, compute_measure_constraints, compute_next_section_props_at_break};

#[cfg(test)]
mod test_utils;
