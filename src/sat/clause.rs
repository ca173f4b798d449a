#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Clauses as stored by the CDCL engine.

use crate::sat::literal::{DoubleLiteral, Literal};
use core::ops::{Index, IndexMut};
use smallvec::SmallVec;

/// A disjunction of engine literals.
///
/// The first two literals are the watched ones. Learnt clauses carry their literal
/// block distance, which drives clause-database reduction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Clause<L: Literal = DoubleLiteral> {
    /// Literals of the clause.
    pub literals: SmallVec<[L; 4]>,
    /// Literal block distance (0 for original clauses).
    pub lbd: u32,
    /// `true` for clauses derived by conflict analysis.
    pub learnt: bool,
    /// Set once the clause has been removed from the database.
    pub deleted: bool,
}

impl<L: Literal> Clause<L> {
    /// Creates an original clause.
    pub fn new<I: IntoIterator<Item = L>>(literals: I) -> Self {
        Self {
            literals: literals.into_iter().collect(),
            lbd: 0,
            learnt: false,
            deleted: false,
        }
    }

    /// Creates a learnt clause with the given LBD.
    pub fn learnt<I: IntoIterator<Item = L>>(literals: I, lbd: u32) -> Self {
        Self {
            literals: literals.into_iter().collect(),
            lbd,
            learnt: true,
            deleted: false,
        }
    }

    /// Number of literals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// `true` for the empty clause.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// `true` for a single literal.
    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.len() == 1
    }

    /// Iterates over the literals.
    pub fn iter(&self) -> impl Iterator<Item = &L> {
        self.literals.iter()
    }

    /// Swaps two literal positions, used to move watches.
    pub fn swap(&mut self, i: usize, j: usize) {
        self.literals.swap(i, j);
    }

    /// Marks the clause deleted and releases its literals.
    pub fn delete(&mut self) {
        self.deleted = true;
        self.literals = SmallVec::new();
    }
}

impl<L: Literal> Index<usize> for Clause<L> {
    type Output = L;

    fn index(&self, index: usize) -> &Self::Output {
        &self.literals[index]
    }
}

impl<L: Literal> IndexMut<usize> for Clause<L> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.literals[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let clause: Clause = Clause::new([1, 2, 3].map(DoubleLiteral::from));
        assert_eq!(clause.len(), 3);
        assert!(!clause.learnt);
        assert!(!clause.is_unit());
    }

    #[test]
    fn test_swap() {
        let mut clause: Clause = Clause::new([1, 2, 3].map(DoubleLiteral::from));
        clause.swap(0, 2);
        assert_eq!(clause[0], DoubleLiteral::from(3));
        assert_eq!(clause[2], DoubleLiteral::from(1));
    }

    #[test]
    fn test_delete() {
        let mut clause: Clause = Clause::learnt([1, -2].map(DoubleLiteral::from), 2);
        assert!(clause.learnt);
        clause.delete();
        assert!(clause.deleted);
        assert!(clause.is_empty());
    }
}
