pub mod error;
pub mod header_footer;
pub mod incremental;
pub mod passes;
pub mod tokens;

pub use error::QuireError;
pub use header_footer::{HeaderFooterParts, HeaderFooterPart, HeaderFooterResolver, PageDecorations};
pub use incremental::{FnMeasurer, IncrementalLayout, IncrementalResult, Measurer, diff_blocks};
pub use passes::{PassKind, PassManager};
pub use tokens::resolve_page_tokens;

// Re-export the layout crates so callers need a single dependency
pub use quire_layout as layout;
pub use quire_types as types;
