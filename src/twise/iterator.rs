#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Enumeration of the `t`-wise combinations of presence conditions.
//!
//! [`Lexicographic`] walks the `t`-subsets of `0..n` in lexicographic order and can be
//! positioned at any index. [`SingleIterator`] maps those subsets onto one group of
//! conditions and merges each subset into a combined condition, silently skipping
//! subsets whose conditions contradict each other. [`MergeIterator`] interleaves several
//! groups round-robin.

use crate::twise::combiner::Combiner;
use crate::twise::presence::PresenceCondition;

/// A restartable, finite sequence of combined presence conditions.
pub trait CombinationIterator: Iterator<Item = PresenceCondition> {
    /// Number of raw combinations, including the ones skipped as contradictory.
    fn size(&self) -> u64;

    /// Index of the combination returned last.
    fn index(&self) -> u64;

    /// Starts over from the first combination.
    fn reset(&mut self);
}

/// `n` choose `k`, saturating at `u64::MAX`.
#[must_use]
pub fn binomial(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        result = result * (n - i) as u128 / (i + 1) as u128;
        if result > u128::from(u64::MAX) {
            return u64::MAX;
        }
    }
    u64::try_from(result).unwrap_or(u64::MAX)
}

/// Lexicographic `t`-subsets of `0..n`.
#[derive(Debug, Clone)]
pub struct Lexicographic {
    t: usize,
    n: usize,
    current: Vec<usize>,
    /// `current` was handed out and must be advanced first.
    advance: bool,
    /// Index of the next subset to hand out.
    next_index: u64,
    size: u64,
}

impl Lexicographic {
    /// Every `t`-subset of `0..n`.
    #[must_use]
    pub fn new(t: usize, n: usize) -> Self {
        let size = if t == 0 { 0 } else { binomial(n, t) };
        Self {
            t,
            n,
            current: (0..t).collect(),
            advance: false,
            next_index: 0,
            size,
        }
    }

    /// Number of subsets, saturating.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Index of the subset the next call to [`Self::next_subset`] returns.
    #[must_use]
    pub const fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Restarts at the first subset.
    pub fn reset(&mut self) {
        self.current = (0..self.t).collect();
        self.advance = false;
        self.next_index = 0;
    }

    /// Positions the iterator so that the next subset is the one at `index`.
    pub fn set_index(&mut self, index: u64) {
        self.next_index = index.min(self.size);
        self.advance = false;
        if self.next_index == self.size {
            return;
        }
        let mut rest = self.next_index;
        let mut value = 0;
        for i in 0..self.t {
            loop {
                let count = binomial(self.n - value - 1, self.t - i - 1);
                if rest < count {
                    break;
                }
                rest -= count;
                value += 1;
            }
            self.current[i] = value;
            value += 1;
        }
    }

    /// The next subset, or `None` once all have been returned.
    pub fn next_subset(&mut self) -> Option<&[usize]> {
        if self.next_index >= self.size {
            return None;
        }
        if self.advance {
            let t = self.t;
            let mut i = t - 1;
            while self.current[i] == self.n - t + i {
                i -= 1;
            }
            self.current[i] += 1;
            for j in i + 1..t {
                self.current[j] = self.current[j - 1] + 1;
            }
        }
        self.advance = true;
        self.next_index += 1;
        Some(&self.current)
    }
}

/// Combinations of `t` conditions from one group.
#[derive(Debug, Clone)]
pub struct SingleIterator {
    conditions: Vec<PresenceCondition>,
    subsets: Lexicographic,
    combiner: Combiner,
}

impl SingleIterator {
    /// Combinations of `t` conditions taken from one list.
    #[must_use]
    pub fn new(t: usize, num_vars: usize, conditions: Vec<PresenceCondition>) -> Self {
        Self {
            subsets: Lexicographic::new(t, conditions.len()),
            conditions,
            combiner: Combiner::new(num_vars),
        }
    }

    /// Resumes from the combination at `index`.
    pub fn set_index(&mut self, index: u64) {
        self.subsets.set_index(index);
    }
}

impl Iterator for SingleIterator {
    type Item = PresenceCondition;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let subset = self.subsets.next_subset()?;
            let picked: Vec<&PresenceCondition> = subset.iter().map(|&i| &self.conditions[i]).collect();
            let combined = self.combiner.combine(&picked);
            if !combined.is_empty() {
                return Some(combined);
            }
        }
    }
}

impl CombinationIterator for SingleIterator {
    fn size(&self) -> u64 {
        self.subsets.size()
    }

    fn index(&self) -> u64 {
        self.subsets.next_index().saturating_sub(1)
    }

    fn reset(&mut self) {
        self.subsets.reset();
    }
}

/// Round-robin over one [`SingleIterator`] per group.
#[derive(Debug, Clone)]
pub struct MergeIterator {
    iterators: Vec<SingleIterator>,
    exhausted: Vec<bool>,
    /// Iterator that produced the last combination.
    current: usize,
    size: u64,
}

impl MergeIterator {
    /// Combinations from every group, interleaved.
    #[must_use]
    pub fn new(t: usize, num_vars: usize, groups: Vec<Vec<PresenceCondition>>) -> Self {
        let iterators: Vec<SingleIterator> = groups
            .into_iter()
            .map(|group| SingleIterator::new(t, num_vars, group))
            .collect();
        let size = iterators.iter().map(CombinationIterator::size).fold(0, u64::saturating_add);
        Self {
            exhausted: vec![false; iterators.len()],
            current: iterators.len().saturating_sub(1),
            iterators,
            size,
        }
    }
}

impl Iterator for MergeIterator {
    type Item = PresenceCondition;

    fn next(&mut self) -> Option<Self::Item> {
        let count = self.iterators.len();
        for _ in 0..count {
            self.current = (self.current + 1) % count;
            if self.exhausted[self.current] {
                continue;
            }
            match self.iterators[self.current].next() {
                Some(condition) => return Some(condition),
                None => self.exhausted[self.current] = true,
            }
        }
        None
    }
}

impl CombinationIterator for MergeIterator {
    fn size(&self) -> u64 {
        self.size
    }

    fn index(&self) -> u64 {
        self.iterators[..self.current]
            .iter()
            .map(CombinationIterator::size)
            .fold(self.iterators.get(self.current).map_or(0, CombinationIterator::index), u64::saturating_add)
    }

    fn reset(&mut self) {
        self.iterators.iter_mut().for_each(CombinationIterator::reset);
        self.exhausted.iter_mut().for_each(|e| *e = false);
        self.current = self.iterators.len().saturating_sub(1);
    }
}
