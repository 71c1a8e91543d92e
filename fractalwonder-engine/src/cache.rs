//! Bounded LRU cache of finished chunk results, keyed by
//! [`fractalwonder_core::ChunkFingerprint`].
//!
//! The teacher repo has no cache of its own — in the browser, a freshly
//! spawned worker pool simply recomputes whatever tiles are visible. This
//! module is designed directly from the behavior this spec calls for: a
//! capacity-bounded map with strict least-recently-used eviction, plus a
//! region-invalidation hook for the (currently optional) pan-reuse case.

use std::collections::HashMap;

use fractalwonder_core::{ChunkFingerprint, PixelRect};

/// A chunk's fully rendered bitmap, ready to blit onto the output surface.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkResult {
    pub bounds: PixelRect,
    pub rgba8: Vec<u8>,
}

impl ChunkResult {
    pub fn new(bounds: PixelRect, rgba8: Vec<u8>) -> Self {
        debug_assert_eq!(rgba8.len(), bounds.area() as usize * 4);
        Self { bounds, rgba8 }
    }
}

struct Entry {
    result: ChunkResult,
    last_access: u64,
}

/// Bounded, strictly-LRU cache mapping a chunk fingerprint to its rendered
/// bitmap. `capacity` should sit in the 100-200 range; enforcement starts
/// as soon as the map would exceed it.
pub struct ChunkCache {
    capacity: usize,
    entries: HashMap<ChunkFingerprint, Entry>,
    clock: u64,
    hits: u64,
    misses: u64,
}

impl ChunkCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            clock: 0,
            hits: 0,
            misses: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Look up a chunk, bumping its recency on a hit.
    pub fn get(&mut self, key: &ChunkFingerprint) -> Option<ChunkResult> {
        let now = self.tick();
        if let Some(entry) = self.entries.get_mut(key) {
            entry.last_access = now;
            self.hits += 1;
            Some(entry.result.clone())
        } else {
            self.misses += 1;
            None
        }
    }

    pub fn has(&self, key: &ChunkFingerprint) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert a chunk, evicting the least-recently-used entry first if the
    /// cache is already at capacity.
    pub fn set(&mut self, key: ChunkFingerprint, result: ChunkResult) {
        let now = self.tick();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_lru();
        }
        self.entries.insert(
            key,
            Entry {
                result,
                last_access: now,
            },
        );
    }

    fn evict_lru(&mut self) {
        if let Some(oldest_key) = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(k, _)| k.clone())
        {
            self.entries.remove(&oldest_key);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop every cached chunk whose bounds overlap `region`. Not required
    /// by the current fingerprint design (center changes already produce
    /// distinct keys), but kept for hosts that want to evict a specific
    /// screen area directly.
    pub fn invalidate_region(&mut self, region: PixelRect) {
        self.entries.retain(|_, entry| !rects_overlap(entry.result.bounds, region));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

fn rects_overlap(a: PixelRect, b: PixelRect) -> bool {
    a.x < b.x + b.width && a.x + a.width > b.x && a.y < b.y + b.height && a.y + a.height > b.y
}
