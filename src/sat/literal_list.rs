#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Sorted, duplicate-free sets of signed literals.
//!
//! `LiteralList` is the currency of the analysis layers: clauses of a [`Cnf`](crate::sat::cnf::Cnf),
//! alternatives of a presence condition, core/dead sets and atomic-set groups. Literals are
//! kept sorted by variable and then by sign so that equality and hashing depend only on content.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::ops::Index;

/// An ordered set of non-zero DIMACS literals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct LiteralList(Vec<i32>);

fn literal_order(a: &i32, b: &i32) -> std::cmp::Ordering {
    a.unsigned_abs().cmp(&b.unsigned_abs()).then(a.cmp(b))
}

impl LiteralList {
    /// Builds a list from arbitrary literals, dropping zeros and duplicates.
    #[must_use]
    pub fn new<I: IntoIterator<Item = i32>>(literals: I) -> Self {
        let mut lits = literals.into_iter().filter(|&l| l != 0).collect_vec();
        lits.sort_unstable_by(literal_order);
        lits.dedup();
        Self(lits)
    }

    /// Builds a list from the set positions of a model (`model[i]` is `±(i + 1)` or 0).
    #[must_use]
    pub fn from_model(model: &[i32]) -> Self {
        Self(model.iter().copied().filter(|&l| l != 0).collect())
    }

    /// Number of literals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when the list holds no literal.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The literals as a slice.
    #[must_use]
    pub fn literals(&self) -> &[i32] {
        &self.0
    }

    /// Iterates over the literals.
    pub fn iter(&self) -> std::slice::Iter<'_, i32> {
        self.0.iter()
    }

    /// `true` if `literal` is contained.
    #[must_use]
    pub fn contains(&self, literal: i32) -> bool {
        self.0.binary_search_by(|other| literal_order(other, &literal)).is_ok()
    }

    /// `true` if every literal of `other` is contained.
    #[must_use]
    pub fn contains_all(&self, other: &Self) -> bool {
        other.iter().all(|&l| self.contains(l))
    }

    /// `true` if some literal of `other` occurs negated in `self`.
    #[must_use]
    pub fn has_conflicts(&self, other: &Self) -> bool {
        other.iter().any(|&l| self.contains(-l))
    }

    /// `true` if the list contains a literal and its complement.
    #[must_use]
    pub fn is_tautology(&self) -> bool {
        self.0.windows(2).any(|w| w[0] == -w[1])
    }

    /// The list with every literal complemented.
    #[must_use]
    pub fn negate(&self) -> Self {
        Self::new(self.0.iter().map(|&l| -l))
    }

    /// Literals of `self` not contained in `other`.
    #[must_use]
    pub fn without(&self, other: &Self) -> Self {
        Self(self.0.iter().copied().filter(|&l| !other.contains(l)).collect())
    }

    /// Variables of the list, ascending.
    pub fn variables(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().map(|l| l.unsigned_abs()).dedup()
    }
}

impl Index<usize> for LiteralList {
    type Output = i32;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl From<Vec<i32>> for LiteralList {
    fn from(literals: Vec<i32>) -> Self {
        Self::new(literals)
    }
}

impl From<&[i32]> for LiteralList {
    fn from(literals: &[i32]) -> Self {
        Self::new(literals.iter().copied())
    }
}

impl FromIterator<i32> for LiteralList {
    fn from_iter<T: IntoIterator<Item = i32>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a LiteralList {
    type Item = &'a i32;
    type IntoIter = std::slice::Iter<'a, i32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Display for LiteralList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.iter().join(", "))
    }
}
