pub mod blocks;
pub mod geometry;
pub mod ids;
pub mod layout;
pub mod measure;

pub use blocks::{BlockKind, FlowBlock};
pub use geometry::{ColumnLayout, Margins, MeasureConstraints, Orientation, PageSize, Rect, Size};
pub use ids::BlockId;
pub use layout::{Fragment, HeaderFooterLayout, Layout, Page};
pub use measure::Measure;
