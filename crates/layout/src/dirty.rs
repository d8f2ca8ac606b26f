//! Bookkeeping of pages and blocks invalidated by edits.
//!
//! Explicit page marks are the source of truth for viewport queries. Ranges
//! are kept alongside them as metadata; only open-ended ranges ("this page and
//! everything after") contribute pages of their own.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Marks a dimension a range does not apply to.
pub const NOT_APPLICABLE: i64 = -1;
/// End page of an open-ended range.
pub const OPEN_END: i64 = i64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DirtyReason {
    Edit,
    Resize,
    Scroll,
    Pagination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirtyRange {
    pub start_page: i64,
    pub end_page: i64,
    pub start_block: i64,
    pub end_block: i64,
    pub reason: DirtyReason,
}

impl DirtyRange {
    pub fn pages(start: i64, end: i64, reason: DirtyReason) -> Self {
        Self {
            start_page: start,
            end_page: end,
            start_block: NOT_APPLICABLE,
            end_block: NOT_APPLICABLE,
            reason,
        }
    }

    pub fn blocks(start: i64, end: i64, reason: DirtyReason) -> Self {
        Self {
            start_page: NOT_APPLICABLE,
            end_page: NOT_APPLICABLE,
            start_block: start,
            end_block: end,
            reason,
        }
    }

    pub fn is_open_ended(&self) -> bool {
        self.end_page == OPEN_END
    }

    fn has_pages(&self) -> bool {
        self.start_page >= 0
    }

    fn has_blocks(&self) -> bool {
        self.start_block >= 0
    }

    fn can_merge(&self, other: &DirtyRange) -> bool {
        if self.reason != other.reason
            || self.has_pages() != other.has_pages()
            || self.has_blocks() != other.has_blocks()
        {
            return false;
        }
        let pages_touch = !self.has_pages()
            || touches(self.start_page, self.end_page, other.start_page, other.end_page);
        let blocks_touch = !self.has_blocks()
            || touches(
                self.start_block,
                self.end_block,
                other.start_block,
                other.end_block,
            );
        pages_touch && blocks_touch
    }

    fn merged(self, other: &DirtyRange) -> DirtyRange {
        let mut out = self;
        if self.has_pages() {
            out.start_page = self.start_page.min(other.start_page);
            out.end_page = self.end_page.max(other.end_page);
        }
        if self.has_blocks() {
            out.start_block = self.start_block.min(other.start_block);
            out.end_block = self.end_block.max(other.end_block);
        }
        out
    }
}

/// Overlapping or adjacent inclusive intervals.
fn touches(start1: i64, end1: i64, start2: i64, end2: i64) -> bool {
    start1 <= end2.saturating_add(1) && start2 <= end1.saturating_add(1)
}

#[derive(Debug, Default, Clone)]
pub struct DirtyTracker {
    pages: BTreeSet<i64>,
    ranges: Vec<DirtyRange>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_page_dirty(&mut self, page: i64, reason: DirtyReason) {
        if page < 0 {
            log::warn!("Ignoring dirty mark for negative page index {}", page);
            return;
        }
        self.pages.insert(page);
        self.add_range(DirtyRange::pages(page, page, reason));
    }

    /// Marks the inclusive block range `start..=end`.
    pub fn mark_blocks_dirty(&mut self, start: i64, end: i64, reason: DirtyReason) {
        if start < 0 || end < start {
            log::warn!("Ignoring invalid dirty block range {}..={}", start, end);
            return;
        }
        self.add_range(DirtyRange::blocks(start, end, reason));
    }

    /// Marks `start_page` and every page after it.
    pub fn mark_dirty_from(&mut self, start_page: i64, reason: DirtyReason) {
        if start_page < 0 {
            log::warn!("Ignoring open-ended dirty mark from page {}", start_page);
            return;
        }
        self.add_range(DirtyRange::pages(start_page, OPEN_END, reason));
    }

    pub fn is_page_dirty(&self, page: i64) -> bool {
        self.pages.contains(&page)
            || self
                .ranges
                .iter()
                .any(|r| r.is_open_ended() && r.start_page <= page)
    }

    /// Dirty pages within the inclusive viewport, sorted and unique.
    pub fn get_dirty_pages_in_viewport(&self, viewport_start: i64, viewport_end: i64) -> Vec<i64> {
        if viewport_end < viewport_start {
            return Vec::new();
        }
        let mut pages: BTreeSet<i64> = self
            .pages
            .range(viewport_start..=viewport_end)
            .copied()
            .collect();
        for range in self.ranges.iter().filter(|r| r.is_open_ended()) {
            let from = range.start_page.max(viewport_start);
            pages.extend(from..=viewport_end);
        }
        pages.into_iter().collect()
    }

    pub fn get_dirty_ranges(&self) -> Vec<DirtyRange> {
        self.ranges.clone()
    }

    /// Clears the given pages and drops ranges that no longer cover anything.
    ///
    /// An open-ended range survives unless its start page was cleared. A finite
    /// page range survives while any page it covers is still dirty.
    pub fn clear_dirty(&mut self, pages: &[i64]) {
        for page in pages {
            self.pages.remove(page);
        }
        let remaining = &self.pages;
        self.ranges.retain(|range| {
            if !range.has_pages() {
                true
            } else if range.is_open_ended() {
                !pages.contains(&range.start_page)
            } else {
                remaining
                    .range(range.start_page..=range.end_page)
                    .next()
                    .is_some()
            }
        });
    }

    pub fn has_dirty(&self) -> bool {
        !self.pages.is_empty() || !self.ranges.is_empty()
    }

    pub fn clear_all(&mut self) {
        self.pages.clear();
        self.ranges.clear();
    }

    fn add_range(&mut self, mut range: DirtyRange) {
        // A merge can bridge two existing ranges, so rescan until stable.
        let mut i = 0;
        while i < self.ranges.len() {
            if self.ranges[i].can_merge(&range) {
                let existing = self.ranges.remove(i);
                range = range.merged(&existing);
                i = 0;
            } else {
                i += 1;
            }
        }
        self.ranges.push(range);
    }
}
