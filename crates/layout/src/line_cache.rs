//! Per-paragraph cache of line-break results.
//!
//! Entries are keyed by paragraph *index*, not block id. Structural edits that
//! shift indices must be followed by [`ParagraphLineCache::mark_dirty_from`].

use quire_types::blocks::ParagraphBlock;
use quire_types::measure::ParagraphMeasure;
use std::collections::HashMap;

/// One cached line, addressed by character offsets local to the paragraph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineInfo {
    pub start: usize,
    /// Exclusive.
    pub end: usize,
    pub width: f32,
    pub height: f32,
    /// Top of the line relative to the top of the paragraph.
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphLines {
    pub lines: Vec<LineInfo>,
    /// Document version the lines were computed against.
    pub version: u64,
    pub dirty: bool,
}

impl ParagraphLines {
    pub fn from_measure(block: &ParagraphBlock, measure: &ParagraphMeasure, version: u64) -> Self {
        let mut run_starts = Vec::with_capacity(block.runs.len() + 1);
        let mut acc = 0;
        for len in block.run_lengths() {
            run_starts.push(acc);
            acc += len;
        }
        run_starts.push(acc);
        let offset = |run: usize, ch: usize| run_starts.get(run).copied().unwrap_or(acc) + ch;

        let mut y = 0.0;
        let lines = measure
            .lines
            .iter()
            .map(|line| {
                let info = LineInfo {
                    start: offset(line.from_run, line.from_char),
                    end: offset(line.to_run, line.to_char),
                    width: line.width,
                    height: line.line_height,
                    y,
                };
                y += line.line_height;
                info
            })
            .collect();

        Self {
            lines,
            version,
            dirty: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct ParagraphLineCache {
    entries: HashMap<usize, ParagraphLines>,
}

impl ParagraphLineCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_lines(&self, index: usize) -> Option<&ParagraphLines> {
        self.entries.get(&index)
    }

    /// Stores fresh lines. The stored entry is always clean, whatever the
    /// `dirty` flag of the input says.
    pub fn set_lines(&mut self, index: usize, mut lines: ParagraphLines) {
        lines.dirty = false;
        self.entries.insert(index, lines);
    }

    pub fn mark_dirty(&mut self, index: usize) {
        if let Some(entry) = self.entries.get_mut(&index) {
            entry.dirty = true;
        }
    }

    /// Marks every entry at or after `start`.
    pub fn mark_dirty_from(&mut self, start: usize) {
        self.entries
            .iter_mut()
            .filter(|(idx, _)| **idx >= start)
            .for_each(|(_, entry)| entry.dirty = true);
    }

    /// Marks entries in the half-open range `start..end`.
    pub fn mark_dirty_range(&mut self, start: usize, end: usize) {
        self.entries
            .iter_mut()
            .filter(|(idx, _)| (start..end).contains(*idx))
            .for_each(|(_, entry)| entry.dirty = true);
    }

    /// Missing entries count as dirty.
    pub fn is_dirty(&self, index: usize) -> bool {
        self.entries.get(&index).is_none_or(|e| e.dirty)
    }

    pub fn find_line_containing(&self, index: usize, local_offset: usize) -> Option<&LineInfo> {
        let entry = self.clean_entry(index)?;
        find_line_position(&entry.lines, local_offset).map(|i| &entry.lines[i])
    }

    pub fn find_line_index(&self, index: usize, local_offset: usize) -> Option<usize> {
        let entry = self.clean_entry(index)?;
        find_line_position(&entry.lines, local_offset)
    }

    pub fn remove(&mut self, index: usize) -> Option<ParagraphLines> {
        self.entries.remove(&index)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Marks entries computed against another version as dirty. Returns how
    /// many entries changed state.
    pub fn validate_version(&mut self, current_version: u64) -> usize {
        let mut changed = 0;
        for entry in self.entries.values_mut() {
            if entry.version != current_version && !entry.dirty {
                entry.dirty = true;
                changed += 1;
            }
        }
        changed
    }

    /// Evicts every dirty entry. Returns how many were removed.
    pub fn prune_dirty(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.dirty);
        before - self.entries.len()
    }

    fn clean_entry(&self, index: usize) -> Option<&ParagraphLines> {
        self.entries.get(&index).filter(|e| !e.dirty)
    }
}

/// Linear scan; offsets past the last line clamp to the last line.
fn find_line_position(lines: &[LineInfo], offset: usize) -> Option<usize> {
    if lines.is_empty() {
        return None;
    }
    let found = lines.iter().position(|line| offset < line.end);
    Some(found.unwrap_or(lines.len() - 1))
}
