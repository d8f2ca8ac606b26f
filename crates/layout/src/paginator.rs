//! Page and column cursor state.
//!
//! The paginator only knows how to create pages and move the cursor between
//! columns and pages. What a new page looks like is decided by a
//! [`PageLifecycle`] implementation, which is called in two phases around
//! every page it creates.

use crate::LayoutError;
use crate::columns::NormalizedColumns;
use quire_types::blocks::VerticalAlign;
use quire_types::layout::Page;
use quire_types::{Fragment, Margins, Orientation, PageSize};

/// Geometry of a page about to be created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub size: PageSize,
    /// Effective margins, after header/footer reservation.
    pub margins: Margins,
    pub columns: NormalizedColumns,
    pub orientation: Option<Orientation>,
    pub v_align: Option<VerticalAlign>,
}

impl PageGeometry {
    pub fn content_width(&self) -> f32 {
        self.size.w - self.margins.horizontal()
    }
}

pub trait PageLifecycle {
    /// Called before the geometry of a new page is read. Pending state
    /// becomes active here.
    fn on_before_page_geometry_finalized(&mut self);

    fn page_geometry(&self) -> Result<PageGeometry, LayoutError>;

    /// Called once the page exists, to stamp its display number and section.
    fn on_after_page_created(&mut self, page: &mut Page);

    /// Called when an empty page is dropped so it can be created again with
    /// different properties.
    fn on_page_discarded(&mut self, page: &Page);
}

/// A y at which the column layout of the page changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintBoundary {
    pub y: f32,
    pub columns: NormalizedColumns,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    pub page_index: usize,
    pub column_index: usize,
    pub cursor_y: f32,
    /// Top of the content box.
    pub top: f32,
    pub content_bottom: f32,
    pub content_left: f32,
    pub page_size: PageSize,
    pub columns: NormalizedColumns,
    pub constraint_boundaries: Vec<ConstraintBoundary>,
    pub active_constraint_index: Option<usize>,
    /// Top of the current column region.
    pub region_top: f32,
    /// Lowest cursor reached by any column of the current region.
    pub region_max_y: f32,
}

impl PageState {
    fn new(page_index: usize, geometry: &PageGeometry) -> Self {
        let top = geometry.margins.top;
        Self {
            page_index,
            column_index: 0,
            cursor_y: top,
            top,
            content_bottom: geometry.size.h - geometry.margins.bottom,
            content_left: geometry.margins.left,
            page_size: geometry.size,
            columns: geometry.columns,
            constraint_boundaries: Vec::new(),
            active_constraint_index: None,
            region_top: top,
            region_max_y: top,
        }
    }

    pub fn column_x(&self) -> f32 {
        self.content_left + self.columns.offset_of(self.column_index)
    }

    pub fn available_height(&self) -> f32 {
        (self.content_bottom - self.cursor_y).max(0.0)
    }

    /// Height of a column from the top of the current region.
    pub fn column_height(&self) -> f32 {
        (self.content_bottom - self.region_top).max(0.0)
    }

    /// Height of the whole content box.
    pub fn content_height(&self) -> f32 {
        (self.content_bottom - self.top).max(0.0)
    }

    pub fn is_at_column_top(&self) -> bool {
        (self.cursor_y - self.region_top).abs() < 0.1
    }
}

#[derive(Debug, Default)]
pub struct Paginator {
    pages: Vec<Page>,
    state: Option<PageState>,
}

impl Paginator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pages(&self) -> bool {
        !self.pages.is_empty()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn into_pages(self) -> Vec<Page> {
        self.pages
    }

    pub fn state(&self) -> Option<&PageState> {
        self.state.as_ref()
    }

    pub fn state_mut(&mut self) -> Option<&mut PageState> {
        self.state.as_mut()
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.pages.last()
    }

    /// Creates the first page if none exists yet.
    pub fn ensure_page(&mut self, hooks: &mut impl PageLifecycle) -> Result<bool, LayoutError> {
        if self.pages.is_empty() {
            self.start_new_page(hooks)?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn start_new_page(&mut self, hooks: &mut impl PageLifecycle) -> Result<(), LayoutError> {
        hooks.on_before_page_geometry_finalized();
        let geometry = hooks.page_geometry()?;

        let mut page = Page::new(self.pages.len() as u32 + 1);
        page.margins = Some(geometry.margins);
        page.size = Some(geometry.size);
        page.orientation = geometry.orientation;
        page.v_align = geometry.v_align;
        hooks.on_after_page_created(&mut page);

        log::debug!(
            "Page {} ({}): {}x{} with {} column(s)",
            page.number,
            page.number_text,
            geometry.size.w,
            geometry.size.h,
            geometry.columns.count
        );

        self.pages.push(page);
        self.state = Some(PageState::new(self.pages.len() - 1, &geometry));
        Ok(())
    }

    /// Drops the current page when it holds no fragments and creates it again,
    /// so pending properties land on it instead of on an extra page. Returns
    /// false when the page has content.
    pub fn replace_empty_page(&mut self, hooks: &mut impl PageLifecycle) -> Result<bool, LayoutError> {
        if !self.pages.last().is_some_and(Page::is_empty) {
            return Ok(false);
        }
        if let Some(page) = self.pages.pop() {
            hooks.on_page_discarded(&page);
        }
        self.state = None;
        self.start_new_page(hooks)?;
        Ok(true)
    }

    /// Moves to the top of the next column, or to a new page from the last
    /// column.
    pub fn advance_column(&mut self, hooks: &mut impl PageLifecycle) -> Result<(), LayoutError> {
        let Some(state) = self.state.as_mut() else {
            return self.start_new_page(hooks);
        };
        if state.column_index + 1 < state.columns.count as usize {
            state.region_max_y = state.region_max_y.max(state.cursor_y);
            state.column_index += 1;
            state.cursor_y = state.region_top;
            return Ok(());
        }
        self.start_new_page(hooks)
    }

    /// Starts a new column region below everything placed so far on the page.
    pub fn start_mid_page_region(&mut self, columns: NormalizedColumns) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let top = state.region_max_y.max(state.cursor_y);
        state.constraint_boundaries.push(ConstraintBoundary { y: top, columns });
        state.active_constraint_index = Some(state.constraint_boundaries.len() - 1);
        state.columns = columns;
        state.column_index = 0;
        state.region_top = top;
        state.region_max_y = top;
        state.cursor_y = top;
    }

    pub fn push_fragment(&mut self, fragment: Fragment) {
        if let Some(page) = self.pages.last_mut() {
            page.fragments.push(fragment);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::normalize_columns;
    use quire_types::ColumnLayout;

    /// Numbers pages sequentially and records the hook order.
    struct Recorder {
        geometry: PageGeometry,
        counter: u32,
        calls: Vec<&'static str>,
    }

    impl Recorder {
        fn new(columns: u32) -> Self {
            let size = PageSize::new(600.0, 800.0);
            let margins = Margins::all(50.0);
            Self {
                geometry: PageGeometry {
                    size,
                    margins,
                    columns: normalize_columns(
                        Some(ColumnLayout {
                            count: columns,
                            gap: 20.0,
                        }),
                        500.0,
                    ),
                    orientation: None,
                    v_align: None,
                },
                counter: 1,
                calls: Vec::new(),
            }
        }
    }

    impl PageLifecycle for Recorder {
        fn on_before_page_geometry_finalized(&mut self) {
            self.calls.push("before");
        }

        fn page_geometry(&self) -> Result<PageGeometry, LayoutError> {
            Ok(self.geometry)
        }

        fn on_after_page_created(&mut self, page: &mut Page) {
            self.calls.push("after");
            page.number_text = format!("#{}", self.counter);
            self.counter += 1;
        }

        fn on_page_discarded(&mut self, _page: &Page) {
            self.calls.push("discarded");
            self.counter -= 1;
        }
    }

    #[test]
    fn test_ensure_page_is_idempotent() {
        let mut hooks = Recorder::new(1);
        let mut p = Paginator::new();
        assert!(p.ensure_page(&mut hooks).unwrap());
        assert!(!p.ensure_page(&mut hooks).unwrap());
        assert_eq!(p.pages().len(), 1);
        assert_eq!(hooks.calls, vec!["before", "after"]);
        assert_eq!(p.pages()[0].number_text, "#1");
        assert_eq!(p.state().unwrap().cursor_y, 50.0);
    }

    #[test]
    fn test_advance_column_then_page() {
        let mut hooks = Recorder::new(2);
        let mut p = Paginator::new();
        p.ensure_page(&mut hooks).unwrap();
        p.state_mut().unwrap().cursor_y = 300.0;

        p.advance_column(&mut hooks).unwrap();
        let state = p.state().unwrap();
        assert_eq!(state.column_index, 1);
        assert_eq!(state.cursor_y, 50.0);
        assert_eq!(state.column_x(), 50.0 + 240.0 + 20.0);
        assert_eq!(state.region_max_y, 300.0);

        p.advance_column(&mut hooks).unwrap();
        assert_eq!(p.pages().len(), 2);
        assert_eq!(p.state().unwrap().column_index, 0);
        assert_eq!(p.state().unwrap().page_index, 1);
    }

    #[test]
    fn test_mid_page_region_starts_below_tallest_column() {
        let mut hooks = Recorder::new(2);
        let mut p = Paginator::new();
        p.ensure_page(&mut hooks).unwrap();
        p.state_mut().unwrap().cursor_y = 400.0;
        p.advance_column(&mut hooks).unwrap();
        p.state_mut().unwrap().cursor_y = 250.0;

        let single = NormalizedColumns::single(500.0);
        p.start_mid_page_region(single);
        let state = p.state().unwrap();
        assert_eq!(state.cursor_y, 400.0);
        assert_eq!(state.region_top, 400.0);
        assert_eq!(state.column_index, 0);
        assert_eq!(
            state.constraint_boundaries,
            vec![ConstraintBoundary { y: 400.0, columns: single }]
        );
        assert_eq!(state.active_constraint_index, Some(0));
    }

    #[test]
    fn test_replace_empty_page_reuses_slot() {
        let mut hooks = Recorder::new(1);
        let mut p = Paginator::new();
        p.ensure_page(&mut hooks).unwrap();
        assert!(p.replace_empty_page(&mut hooks).unwrap());
        assert_eq!(p.pages().len(), 1);
        assert_eq!(p.pages()[0].number_text, "#1");

        p.push_fragment(crate::test_utils::para_fragment("p", 50.0));
        assert!(!p.replace_empty_page(&mut hooks).unwrap());
        assert_eq!(p.pages().len(), 1);
    }
}
