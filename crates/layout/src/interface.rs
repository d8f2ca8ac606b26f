use crate::LayoutError;
use crate::columns::normalize_columns;
use crate::floats::FloatingObjectManager;
use crate::options::LayoutOptions;
use crate::paginator::{PageState, Paginator};
use crate::sections::SectionState;
use quire_types::Fragment;

/// Floating point slack when checking whether content fits.
pub const EPSILON: f32 = 0.01;

/// Mutable state of one layout pass, handed to every block layouter.
pub struct LayoutContext<'a> {
    pub paginator: Paginator,
    pub sections: SectionState,
    pub floats: FloatingObjectManager,
    pub options: &'a LayoutOptions,
}

impl<'a> LayoutContext<'a> {
    pub fn new(options: &'a LayoutOptions) -> Self {
        Self {
            paginator: Paginator::new(),
            sections: SectionState::new(options),
            floats: FloatingObjectManager::new(),
            options,
        }
    }

    /// The current page state, creating the first page if needed.
    pub fn ensure_page(&mut self) -> Result<&PageState, LayoutError> {
        if self.paginator.ensure_page(&mut self.sections)? {
            self.sync_floats();
        }
        self.state()
    }

    pub fn start_new_page(&mut self) -> Result<(), LayoutError> {
        self.paginator.start_new_page(&mut self.sections)?;
        self.sync_floats();
        Ok(())
    }

    pub fn advance_column(&mut self) -> Result<(), LayoutError> {
        let page_before = self.paginator.state().map(|s| s.page_index);
        self.paginator.advance_column(&mut self.sections)?;
        if self.paginator.state().map(|s| s.page_index) != page_before {
            self.sync_floats();
        }
        Ok(())
    }

    /// Moves to a fresh page for a forced break. An empty current page is
    /// reused with the pending properties instead of leaving it blank.
    pub fn force_page_break(&mut self) -> Result<(), LayoutError> {
        if !self.paginator.has_pages() {
            self.ensure_page()?;
            return Ok(());
        }
        if !self.paginator.replace_empty_page(&mut self.sections)? {
            self.paginator.start_new_page(&mut self.sections)?;
        }
        self.sync_floats();
        Ok(())
    }

    /// Switches to the active section's columns below the content placed so
    /// far on the current page.
    pub fn start_mid_page_region(&mut self) -> Result<(), LayoutError> {
        self.ensure_page()?;
        let content_width = self
            .paginator
            .current_page()
            .and_then(|p| Some(p.size?.w - p.margins?.horizontal()))
            .unwrap_or(0.0);
        let columns = normalize_columns(self.sections.active.columns, content_width);
        self.paginator.start_mid_page_region(columns);
        self.sync_floats();
        Ok(())
    }

    pub fn state(&self) -> Result<&PageState, LayoutError> {
        self.paginator
            .state()
            .ok_or_else(|| LayoutError::Generic("no page has been created".into()))
    }

    pub fn state_mut(&mut self) -> Result<&mut PageState, LayoutError> {
        self.paginator
            .state_mut()
            .ok_or_else(|| LayoutError::Generic("no page has been created".into()))
    }

    pub fn cursor_y(&self) -> f32 {
        self.paginator.state().map(|s| s.cursor_y).unwrap_or(0.0)
    }

    pub fn set_cursor_y(&mut self, y: f32) {
        if let Some(state) = self.paginator.state_mut() {
            state.cursor_y = y;
        }
    }

    pub fn advance_cursor(&mut self, dy: f32) {
        if let Some(state) = self.paginator.state_mut() {
            state.cursor_y += dy;
        }
    }

    pub fn available_height(&self) -> f32 {
        self.paginator
            .state()
            .map(PageState::available_height)
            .unwrap_or(0.0)
    }

    pub fn is_at_column_top(&self) -> bool {
        self.paginator
            .state()
            .is_none_or(PageState::is_at_column_top)
    }

    pub fn fits(&self, height: f32) -> bool {
        height <= self.available_height() + EPSILON
    }

    pub fn page_number(&self) -> u32 {
        self.paginator.current_page().map(|p| p.number).unwrap_or(0)
    }

    pub fn push_fragment(&mut self, fragment: Fragment) {
        self.paginator.push_fragment(fragment);
    }

    /// Points the float manager at the current column geometry.
    fn sync_floats(&mut self) {
        let (Some(state), Some(page)) = (self.paginator.state(), self.paginator.current_page()) else {
            return;
        };
        let (margins, page_width, origin_x) = match self.options.anchor_frame {
            Some(frame) => (frame.margins, frame.page_width, frame.margins.left),
            None => (page.margins.unwrap_or_default(), state.page_size.w, 0.0),
        };
        self.floats.set_layout_context(state.columns, margins, page_width);
        self.floats.set_origin_x(origin_x);
    }
}
