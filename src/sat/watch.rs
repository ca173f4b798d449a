#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::clause::Clause;
use crate::sat::literal::Literal;
use smallvec::SmallVec;
use std::ops::{Index, IndexMut};

/// Indices of the clauses watching one literal.
pub type WatchList = SmallVec<[usize; 6]>;

/// Per-literal lists of the clauses watching that literal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatchedLiterals(Vec<WatchList>);

impl WatchedLiterals {
    /// Empty lists for both literals of `num_vars` variables.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(vec![SmallVec::new(); 2 * (num_vars + 1)])
    }

    /// Registers the clause at `idx` under its first two literals.
    pub fn add_clause<L: Literal>(&mut self, clause: &Clause<L>, idx: usize) {
        let a = clause[0];
        let b = clause[1];

        debug_assert_ne!(a, b);

        self[a].push(idx);
        self[b].push(idx);
    }

    /// Detaches the watch list of `lit` so it can be edited while clauses are updated.
    pub fn take<L: Literal>(&mut self, lit: L) -> WatchList {
        std::mem::take(&mut self[lit])
    }

    /// Drops every entry for which `keep` is false.
    pub fn retain<F: FnMut(usize) -> bool>(&mut self, mut keep: F) {
        for list in &mut self.0 {
            list.retain(|c| keep(*c));
        }
    }
}

impl<L: Literal> Index<L> for WatchedLiterals {
    type Output = WatchList;

    fn index(&self, index: L) -> &Self::Output {
        &self.0[index.index()]
    }
}

impl<L: Literal> IndexMut<L> for WatchedLiterals {
    fn index_mut(&mut self, index: L) -> &mut Self::Output {
        &mut self.0[index.index()]
    }
}
