//! Incremental re-layout.
//!
//! Every call lays the whole document out again; what is incremental is the
//! measuring. Blocks whose content and constraints were seen before are served
//! from the measurement cache, so the external measurer only runs for edited
//! blocks. The dirty tracker and line cache are updated from the diff so the
//! view knows which pages to repaint.

use crate::error::QuireError;
use crate::tokens::{has_tokens, resolve_page_tokens};
use quire_layout::{
    DirtyReason, DirtyTracker, LayoutConfig, LayoutOptions, MeasureCache, ParagraphLineCache,
    ParagraphLines, compute_measure_constraints, fingerprint, layout_document,
};
use quire_types::{FlowBlock, Layout, Measure, MeasureConstraints};
use std::collections::BTreeSet;
use std::future::Future;

/// Upper bound on lay-out/resolve rounds for page-number fields.
const MAX_TOKEN_PASSES: usize = 3;

/// The external text measurer.
pub trait Measurer {
    fn measure(
        &self,
        block: &FlowBlock,
        constraints: MeasureConstraints,
    ) -> impl Future<Output = Result<Measure, QuireError>>;
}

/// Adapts a synchronous closure to [`Measurer`].
pub struct FnMeasurer<F>(pub F);

impl<F> Measurer for FnMeasurer<F>
where
    F: Fn(&FlowBlock, MeasureConstraints) -> Result<Measure, QuireError>,
{
    fn measure(
        &self,
        block: &FlowBlock,
        constraints: MeasureConstraints,
    ) -> impl Future<Output = Result<Measure, QuireError>> {
        std::future::ready((self.0)(block, constraints))
    }
}

/// The span of blocks that differ between two versions of a document.
///
/// `start` is the first differing index; `prev_end` and `next_end` are the
/// exclusive ends of the differing span in each version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDiff {
    pub start: usize,
    pub prev_end: usize,
    pub next_end: usize,
}

impl BlockDiff {
    pub fn changes_count(&self) -> bool {
        self.prev_end - self.start != self.next_end - self.start
    }
}

/// Compares blocks by id and content from both ends. Returns `None` when the
/// documents are identical.
pub fn diff_blocks(prev: &[FlowBlock], next: &[FlowBlock]) -> Option<BlockDiff> {
    let prefix = prev.iter().zip(next).take_while(|(a, b)| a == b).count();
    if prefix == prev.len() && prefix == next.len() {
        return None;
    }
    let max_suffix = prev.len().min(next.len()) - prefix;
    let suffix = prev
        .iter()
        .rev()
        .zip(next.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();
    Some(BlockDiff {
        start: prefix,
        prev_end: prev.len() - suffix,
        next_end: next.len() - suffix,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncrementalResult {
    pub layout: Layout,
    /// The blocks the layout was computed from, with page-number fields
    /// resolved.
    pub blocks: Vec<FlowBlock>,
    pub measures: Vec<Measure>,
    /// Dirty page indices after this call, sorted.
    pub dirty_pages: Vec<i64>,
    /// How many times the external measurer ran.
    pub measured: usize,
}

/// Layout state carried from one edit to the next.
#[derive(Debug, Default)]
pub struct IncrementalLayout {
    cache: MeasureCache,
    dirty: DirtyTracker,
    lines: ParagraphLineCache,
    version: u64,
    measured: usize,
}

impl IncrementalLayout {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            cache: MeasureCache::new(config),
            ..Default::default()
        }
    }

    pub fn measure_cache(&self) -> &MeasureCache {
        &self.cache
    }

    pub fn measure_cache_mut(&mut self) -> &mut MeasureCache {
        &mut self.cache
    }

    pub fn dirty_tracker(&self) -> &DirtyTracker {
        &self.dirty
    }

    /// The view clears pages here once it has repainted them.
    pub fn dirty_tracker_mut(&mut self) -> &mut DirtyTracker {
        &mut self.dirty
    }

    pub fn line_cache(&self) -> &ParagraphLineCache {
        &self.lines
    }

    /// Layout version, bumped on every call.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub async fn layout<M: Measurer>(
        &mut self,
        prev_blocks: &[FlowBlock],
        prev_layout: Option<&Layout>,
        next_blocks: &[FlowBlock],
        options: &LayoutOptions,
        measurer: &M,
    ) -> Result<IncrementalResult, QuireError> {
        self.measured = 0;
        let diff = diff_blocks(prev_blocks, next_blocks);
        if let Some(d) = diff {
            log::debug!(
                "Blocks {}..{} changed (previously {}..{})",
                d.start,
                d.next_end,
                d.start,
                d.prev_end
            );
        }

        let constraints = compute_measure_constraints(next_blocks, options);
        let mut blocks = next_blocks.to_vec();
        let mut measures = Vec::with_capacity(blocks.len());
        for (block, c) in blocks.iter().zip(&constraints) {
            measures.push(self.measure_one(block, *c, measurer).await?);
        }
        let mut layout = layout_document(&blocks, &measures, options)?;

        let mut resolved = BTreeSet::new();
        if options.flags.body_page_tokens && blocks.iter().any(has_tokens) {
            let debug = options.flags.debug_page_tokens;
            let mut stable = false;
            for _ in 0..MAX_TOKEN_PASSES {
                let tokens = resolve_page_tokens(&blocks, &layout, debug);
                if tokens.is_stable() {
                    stable = true;
                    break;
                }
                blocks = tokens.blocks;
                for &i in &tokens.changed {
                    measures[i] = self.measure_one(&blocks[i], constraints[i], measurer).await?;
                    resolved.insert(i);
                }
                layout = layout_document(&blocks, &measures, options)?;
            }
            if !stable && debug {
                log::debug!("Page-number fields still moving after {} passes", MAX_TOKEN_PASSES);
            }
        }

        self.version += 1;
        self.track_dirty_pages(diff, prev_layout, &blocks, &layout);
        self.update_lines(diff, &blocks, &measures, &resolved);
        if options.flags.debug_layout_version {
            log::debug!(
                "Layout version {}: {} pages, {} blocks measured, {} cached lines",
                self.version,
                layout.pages.len(),
                self.measured,
                self.lines.len()
            );
        }

        let last_page = layout.pages.len() as i64 - 1;
        Ok(IncrementalResult {
            dirty_pages: self.dirty.get_dirty_pages_in_viewport(0, last_page),
            layout,
            blocks,
            measures,
            measured: self.measured,
        })
    }

    async fn measure_one<M: Measurer>(
        &mut self,
        block: &FlowBlock,
        constraints: MeasureConstraints,
        measurer: &M,
    ) -> Result<Measure, QuireError> {
        match block {
            FlowBlock::SectionBreak(_) => return Ok(Measure::SectionBreak),
            FlowBlock::PageBreak(_) => return Ok(Measure::PageBreak),
            FlowBlock::ColumnBreak(_) => return Ok(Measure::ColumnBreak),
            _ => {}
        }

        let key = fingerprint(block, constraints);
        if let Some(hit) = self.cache.get(key) {
            return Ok(hit.clone());
        }

        self.measured += 1;
        let measure = measurer.measure(block, constraints).await?;
        if measure.kind() != block.kind() {
            return Err(QuireError::MeasureKind {
                block_id: block.id().to_string(),
                expected: block.kind().as_str(),
                actual: measure.kind().as_str(),
            });
        }
        self.cache.set(key, measure.clone());
        Ok(measure)
    }

    fn track_dirty_pages(
        &mut self,
        diff: Option<BlockDiff>,
        prev_layout: Option<&Layout>,
        blocks: &[FlowBlock],
        layout: &Layout,
    ) {
        if let Some(d) = diff {
            if d.next_end > d.start {
                self.dirty
                    .mark_blocks_dirty(d.start as i64, d.next_end as i64 - 1, DirtyReason::Edit);
                for block in &blocks[d.start..d.next_end] {
                    if let Some(page) = layout.page_of_block(block.id()) {
                        self.dirty.mark_page_dirty(page as i64, DirtyReason::Edit);
                    }
                }
            } else {
                // Pure deletion: the page now holding the first following
                // block lost content.
                let page = blocks
                    .get(d.start)
                    .and_then(|b| layout.page_of_block(b.id()))
                    .unwrap_or(layout.pages.len().saturating_sub(1));
                self.dirty.mark_page_dirty(page as i64, DirtyReason::Edit);
            }
        }

        match prev_layout {
            Some(prev) if prev.pages.len() != layout.pages.len() => {
                let first = (0..prev.pages.len().max(layout.pages.len()))
                    .find(|&i| prev.pages.get(i) != layout.pages.get(i))
                    .unwrap_or(0);
                log::debug!(
                    "Page count changed from {} to {}, repaginating from page {}",
                    prev.pages.len(),
                    layout.pages.len(),
                    first
                );
                self.dirty.mark_dirty_from(first as i64, DirtyReason::Pagination);
            }
            Some(_) => {}
            None => self.dirty.mark_dirty_from(0, DirtyReason::Pagination),
        }
    }

    fn update_lines(
        &mut self,
        diff: Option<BlockDiff>,
        blocks: &[FlowBlock],
        measures: &[Measure],
        resolved: &BTreeSet<usize>,
    ) {
        if let Some(d) = diff {
            if d.changes_count() {
                self.lines.mark_dirty_from(d.start);
            } else {
                self.lines.mark_dirty_range(d.start, d.next_end);
            }
        }
        for &i in resolved {
            self.lines.mark_dirty(i);
        }

        for (i, (block, measure)) in blocks.iter().zip(measures).enumerate() {
            if let (FlowBlock::Paragraph(p), Measure::Paragraph(m)) = (block, measure) {
                if self.lines.is_dirty(i) {
                    self.lines
                        .set_lines(i, ParagraphLines::from_measure(p, m, self.version));
                }
            }
        }
        let pruned = self.lines.prune_dirty();
        if pruned > 0 {
            log::debug!("Dropped {} stale line entries", pruned);
        }
    }
}
