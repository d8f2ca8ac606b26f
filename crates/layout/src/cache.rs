//! Content-addressed memoisation of measurement results.
//!
//! The key is a fingerprint of what a block *looks like* (text, run styles,
//! attributes) plus the constraints it was measured under. Ids and document
//! positions are not part of the key, so two identical paragraphs share a
//! measurement.

use crate::config::LayoutConfig;
use quire_types::{FlowBlock, Measure, MeasureConstraints};
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

/// Keys that identify a block without affecting how it renders.
const IDENTITY_KEYS: [&str; 3] = ["id", "pmStart", "pmEnd"];

// --- Cache Keys ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Computes the cache key for measuring `block` under `constraints`.
pub fn fingerprint(block: &FlowBlock, constraints: MeasureConstraints) -> Fingerprint {
    let mut s = DefaultHasher::new();
    content_hash(block, &mut s);
    constraints.max_width.to_bits().hash(&mut s);
    constraints.max_height.map(f32::to_bits).hash(&mut s);
    Fingerprint(s.finish())
}

/// Hashes the rendered content of a block, ignoring identity fields.
pub fn content_hash<H: Hasher>(block: &FlowBlock, state: &mut H) {
    match serde_json::to_value(block) {
        Ok(mut value) => {
            strip_identity(&mut value);
            value.to_string().hash(state);
        }
        Err(e) => {
            // Unreachable for the derived impls; fall back to the id so the
            // block is never conflated with another one.
            log::warn!("Could not fingerprint block {}: {}", block.id(), e);
            block.id().hash(state);
        }
    }
}

fn strip_identity(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for key in IDENTITY_KEYS {
                map.remove(key);
            }
            map.values_mut().for_each(strip_identity);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_identity),
        _ => {}
    }
}

// --- Stats ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub invalidations: u64,
    pub clears: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

// --- The Cache ---

#[derive(Debug)]
struct Entry {
    measure: Measure,
    last_used: u64,
}

/// Memoises measurements by [`Fingerprint`], evicting the least recently used
/// entry once `LayoutConfig::cache_capacity` is exceeded.
#[derive(Debug)]
pub struct MeasureCache {
    entries: HashMap<Fingerprint, Entry>,
    recency: BTreeMap<u64, Fingerprint>,
    tick: u64,
    capacity: usize,
    stats: CacheStats,
}

impl Default for MeasureCache {
    fn default() -> Self {
        Self::new(&LayoutConfig::default())
    }
}

impl MeasureCache {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            tick: 0,
            capacity: config.cache_capacity.max(1),
            stats: CacheStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&mut self, key: Fingerprint) -> Option<&Measure> {
        self.tick += 1;
        match self.entries.get_mut(&key) {
            Some(entry) => {
                self.recency.remove(&entry.last_used);
                entry.last_used = self.tick;
                self.recency.insert(self.tick, key);
                self.stats.hits += 1;
                Some(&entry.measure)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn set(&mut self, key: Fingerprint, measure: Measure) {
        self.tick += 1;
        self.stats.sets += 1;
        if let Some(old) = self.entries.insert(
            key,
            Entry {
                measure,
                last_used: self.tick,
            },
        ) {
            self.recency.remove(&old.last_used);
        }
        self.recency.insert(self.tick, key);

        while self.entries.len() > self.capacity {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            self.entries.remove(&oldest);
            self.stats.evictions += 1;
        }
    }

    /// Drops a single entry. Returns whether anything was removed.
    pub fn invalidate(&mut self, key: Fingerprint) -> bool {
        match self.entries.remove(&key) {
            Some(entry) => {
                self.recency.remove(&entry.last_used);
                self.stats.invalidations += 1;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
        self.stats.clears += 1;
    }

    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
