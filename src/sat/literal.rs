#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Solver-internal literal encoding.
//!
//! The public API of the crate speaks DIMACS-style signed `i32` literals. Inside the
//! CDCL engine literals are packed into a dense unsigned code so they can index
//! watch lists and assignment tables directly.

use core::ops::{Neg, Not};
use std::fmt::Debug;
use std::hash::Hash;

/// A propositional variable, numbered from 1.
pub type Variable = u32;

/// Common interface of literal encodings used by the engine.
pub trait Literal: Copy + Debug + Eq + Hash + Default + Ord {
    /// Creates the literal of `var` with the given polarity (`true` = positive).
    fn new(var: Variable, polarity: bool) -> Self;

    /// The variable of the literal.
    fn variable(self) -> Variable;

    /// `true` for a positive literal.
    fn polarity(self) -> bool;

    /// The complementary literal.
    #[must_use]
    fn negated(self) -> Self;

    /// Dense index suitable for per-literal tables of length `2 * (num_vars + 1)`.
    fn index(self) -> usize;

    /// `true` for a negative literal.
    fn is_negative(self) -> bool {
        !self.polarity()
    }

    /// Converts a non-zero DIMACS literal.
    #[must_use]
    fn from_i32(value: i32) -> Self {
        Self::new(value.unsigned_abs(), value.is_positive())
    }

    /// Converts back to a DIMACS literal.
    fn to_i32(self) -> i32 {
        let var = i32::try_from(self.variable()).unwrap_or(i32::MAX);
        if self.polarity() { var } else { -var }
    }
}

/// Literal stored as `2 * var` (positive) or `2 * var + 1` (negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DoubleLiteral(u32);

impl Literal for DoubleLiteral {
    fn new(var: Variable, polarity: bool) -> Self {
        Self(var * 2 + u32::from(!polarity))
    }

    fn variable(self) -> Variable {
        self.0 >> 1
    }

    fn polarity(self) -> bool {
        self.0 & 1 == 0
    }

    fn negated(self) -> Self {
        Self(self.0 ^ 1)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl Neg for DoubleLiteral {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl Not for DoubleLiteral {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

impl From<i32> for DoubleLiteral {
    fn from(value: i32) -> Self {
        Self::from_i32(value)
    }
}

impl From<DoubleLiteral> for i32 {
    fn from(value: DoubleLiteral) -> Self {
        value.to_i32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_neg() {
        assert_eq!(
            DoubleLiteral::new(1, false).negated(),
            DoubleLiteral::new(1, true)
        );
        assert_eq!(-DoubleLiteral::new(4, true), DoubleLiteral::new(4, false));
        assert_eq!(!DoubleLiteral::new(4, false), DoubleLiteral::new(4, true));
    }

    #[test]
    fn test_i32_round_trip() {
        for value in [1, -1, 7, -42] {
            let lit = DoubleLiteral::from(value);
            assert_eq!(i32::from(lit), value);
            assert_eq!(lit.variable(), value.unsigned_abs());
            assert_eq!(lit.polarity(), value > 0);
        }
    }

    #[test]
    fn test_index_is_dense() {
        assert_eq!(DoubleLiteral::from(1).index(), 2);
        assert_eq!(DoubleLiteral::from(-1).index(), 3);
        assert_eq!(DoubleLiteral::from(2).index(), 4);
        assert!(DoubleLiteral::from(-3).is_negative());
    }
}
