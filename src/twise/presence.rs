#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Presence conditions and their preparation against the core/dead literals.

use crate::sat::literal_list::LiteralList;
use crate::sat::model::{contains_all, position};
use rustc_hash::FxHashSet;
use std::ops::Index;

/// Alternative ways of realising one interaction. A configuration covers the condition
/// if it contains every literal of at least one alternative.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PresenceCondition(Vec<LiteralList>);

impl PresenceCondition {
    /// Creates a condition, dropping repeated alternatives but keeping the first
    /// occurrence order.
    #[must_use]
    pub fn new<I: IntoIterator<Item = LiteralList>>(alternatives: I) -> Self {
        let mut seen = FxHashSet::default();
        Self(
            alternatives
                .into_iter()
                .filter(|alternative| seen.insert(alternative.clone()))
                .collect(),
        )
    }

    /// The alternatives, any of which satisfies the condition.
    #[must_use]
    pub fn alternatives(&self) -> &[LiteralList] {
        &self.0
    }

    /// Number of alternatives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` for a condition without alternatives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the alternatives.
    pub fn iter(&self) -> impl Iterator<Item = &LiteralList> {
        self.0.iter()
    }

    /// Keeps only the alternatives for which `keep` returns `true`.
    pub fn retain<F: FnMut(&LiteralList) -> bool>(&mut self, keep: F) {
        self.0.retain(keep);
    }

    /// `true` if `model` contains some alternative completely.
    #[must_use]
    pub fn is_covered_by(&self, model: &[i32]) -> bool {
        self.0.iter().any(|alternative| contains_all(model, alternative))
    }
}

impl Index<usize> for PresenceCondition {
    type Output = LiteralList;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl From<LiteralList> for PresenceCondition {
    fn from(alternative: LiteralList) -> Self {
        Self(vec![alternative])
    }
}

impl FromIterator<LiteralList> for PresenceCondition {
    fn from_iter<T: IntoIterator<Item = LiteralList>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a PresenceCondition {
    type Item = &'a LiteralList;
    type IntoIter = std::slice::Iter<'a, LiteralList>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// One group per literal list, each literal its own single-literal condition.
#[must_use]
pub fn literal_groups(groups: &[LiteralList]) -> Vec<Vec<PresenceCondition>> {
    groups
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|&l| PresenceCondition::from(LiteralList::new([l])))
                .collect()
        })
        .collect()
}

/// A single group holding both literals of every variable that is neither core nor
/// dead.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn default_groups(num_vars: usize, core_dead: &LiteralList) -> Vec<Vec<PresenceCondition>> {
    let literals: LiteralList = (1..=num_vars as i32)
        .filter(|&v| !core_dead.contains(v) && !core_dead.contains(-v))
        .flat_map(|v| [v, -v])
        .collect();
    let group = literals
        .iter()
        .map(|&l| PresenceCondition::from(LiteralList::new([l])))
        .collect();
    vec![group]
}

/// Cleans `groups` against the core/dead literals.
///
/// Alternatives contradicting a forced literal are removed, conditions realised by the
/// forced literals alone or left without alternatives are dropped, and a condition that
/// already appeared earlier, in any group, is dropped as well.
#[must_use]
pub fn prepare_groups(
    groups: Vec<Vec<PresenceCondition>>,
    core_dead: &LiteralList,
    num_vars: usize,
) -> Vec<Vec<PresenceCondition>> {
    let mut forced = vec![0; num_vars];
    for &l in core_dead {
        forced[position(l)] = l;
    }
    let mut seen = FxHashSet::default();

    groups
        .into_iter()
        .map(|group| {
            group
                .into_iter()
                .filter_map(|mut condition| {
                    condition.retain(|alternative| !alternative.iter().any(|&l| forced[position(l)] == -l));
                    if condition.is_empty() || condition.is_covered_by(&forced) {
                        return None;
                    }
                    seen.insert(condition.clone()).then_some(condition)
                })
                .collect()
        })
        .collect()
}
