//! Most-recently-used snapshot cache.

use std::collections::VecDeque;
use std::sync::Arc;

use super::Snapshot;

/// Bounded cache of rendered snapshots keyed by sanitized text and width.
///
/// Widths strictly within `tolerance` of a cached entry that round up to the
/// same pixel width count as equal. Entries are kept most recent first; a
/// capacity of zero disables caching.
#[derive(Debug)]
pub struct SnapshotCache {
    capacity: usize,
    tolerance: f32,
    entries: VecDeque<Arc<Snapshot>>,
}

impl SnapshotCache {
    pub fn new(capacity: usize, tolerance: f32) -> Self {
        Self {
            capacity,
            tolerance,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, width: f32, text: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|s| s.text == text && self.same_width(s.width, width))
    }

    fn same_width(&self, cached: f32, requested: f32) -> bool {
        (cached - requested).abs() < self.tolerance
            && cached.ceil() as u32 == requested.ceil() as u32
    }

    /// Looks up a snapshot and marks it most recently used.
    pub fn get(&mut self, width: f32, text: &str) -> Option<Arc<Snapshot>> {
        let index = self.position(width, text)?;
        let hit = self.entries.remove(index)?;
        self.entries.push_front(Arc::clone(&hit));
        Some(hit)
    }

    /// Stores `snapshot`, replacing any entry with the same key and evicting
    /// the least recently used entry when full.
    pub fn insert(&mut self, snapshot: Arc<Snapshot>) {
        if self.capacity == 0 {
            return;
        }
        if let Some(index) = self.position(snapshot.width, &snapshot.text) {
            self.entries.remove(index);
        }
        while self.entries.len() >= self.capacity {
            if let Some(evicted) = self.entries.pop_back() {
                tracing::trace!(width = evicted.width, "evicting cached snapshot");
            }
        }
        self.entries.push_front(snapshot);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
