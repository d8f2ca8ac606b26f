//! Block layouters.
//!
//! Each layouter places one block at the cursor of a [`LayoutContext`](crate::interface::LayoutContext),
//! moving on to later columns and pages when the block overflows.

pub mod drawing;
pub mod image;
pub mod list;
pub mod paragraph;
pub mod table;

pub use drawing::layout_drawing;
pub use image::layout_image;
pub use list::layout_list;
pub use paragraph::layout_paragraph;
pub use table::layout_table;
