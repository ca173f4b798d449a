#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A bounded ring buffer of satisfying assignments.
//!
//! Every model is stored once. Entries are addressed by a monotonically increasing
//! sequence number; an entry stays readable until `capacity` newer models have been
//! inserted, at which point its slot is overwritten and its membership entry dropped.
//! Readers that keep sequence numbers can therefore detect eviction without being
//! notified.

use rustc_hash::FxHashSet;
use std::sync::Arc;

/// Default number of cached models.
pub const DEFAULT_CAPACITY: usize = 100_000;

/// Models found by earlier solver calls, deduplicated.
#[derive(Debug, Clone)]
pub struct SolutionCache {
    slots: Vec<Arc<[i32]>>,
    capacity: usize,
    members: FxHashSet<Arc<[i32]>>,
    inserted: u64,
}

impl Default for SolutionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SolutionCache {
    /// A cache holding at most `capacity` models (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            capacity: capacity.max(1),
            members: FxHashSet::default(),
            inserted: 0,
        }
    }

    /// Maximum number of stored models.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of models currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// `true` if no model is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Smallest sequence number that is still readable.
    #[must_use]
    pub const fn oldest_sequence(&self) -> u64 {
        self.inserted.saturating_sub(self.capacity as u64)
    }

    /// `true` if `model` is stored.
    #[must_use]
    pub fn contains(&self, model: &[i32]) -> bool {
        self.members.contains(model)
    }

    /// Stores `model`, evicting the oldest entry when full.
    ///
    /// # Returns
    /// The sequence number of the new entry, or `None` if the model was already cached.
    pub fn insert(&mut self, model: &[i32]) -> Option<u64> {
        if self.members.contains(model) {
            return None;
        }
        let entry: Arc<[i32]> = Arc::from(model);
        let seq = self.inserted;
        let slot = self.slot(seq);
        if slot < self.slots.len() {
            let old = std::mem::replace(&mut self.slots[slot], Arc::clone(&entry));
            self.members.remove(&old);
        } else {
            self.slots.push(Arc::clone(&entry));
        }
        self.members.insert(entry);
        self.inserted += 1;
        Some(seq)
    }

    /// The model with sequence number `seq`, unless it was evicted.
    #[must_use]
    pub fn get(&self, seq: u64) -> Option<&[i32]> {
        if seq >= self.inserted || seq < self.oldest_sequence() {
            return None;
        }
        self.slots.get(self.slot(seq)).map(AsRef::as_ref)
    }

    /// Live entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[i32])> {
        (self.oldest_sequence()..self.inserted)
            .filter_map(move |seq| self.get(seq).map(|m| (seq, m)))
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn slot(&self, seq: u64) -> usize {
        (seq % self.capacity as u64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_dedups() {
        let mut cache = SolutionCache::new(4);
        assert_eq!(cache.insert(&[1, -2]), Some(0));
        assert_eq!(cache.insert(&[1, -2]), None);
        assert_eq!(cache.insert(&[-1, -2]), Some(1));
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&[-1, -2]));
    }

    #[test]
    fn test_eviction() {
        let mut cache = SolutionCache::new(2);
        cache.insert(&[1]);
        cache.insert(&[2]);
        cache.insert(&[3]);

        assert_eq!(cache.get(0), None);
        assert_eq!(cache.get(1), Some(&[2][..]));
        assert_eq!(cache.get(2), Some(&[3][..]));
        assert_eq!(cache.get(3), None);
        assert!(!cache.contains(&[1]));
        assert_eq!(cache.len(), 2);

        // An evicted model can be inserted again.
        assert_eq!(cache.insert(&[1]), Some(3));
        let seqs: Vec<u64> = cache.iter().map(|(s, _)| s).collect();
        assert_eq!(seqs, vec![2, 3]);
    }
}
