#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::literal::{Literal, Variable};
use bit_vec::BitVec;

/// Remembers the last polarity of every variable.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SavedPhases(BitVec);

impl SavedPhases {
    /// All phases start negative.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(BitVec::from_elem(num_vars + 1, false))
    }

    /// Remembers the polarity of `lit`.
    pub fn save(&mut self, lit: impl Literal) {
        self.0.set(lit.variable() as usize, lit.polarity());
    }

    /// Saved polarity of `var`, `false` if never saved.
    #[must_use]
    pub fn get(&self, var: Variable) -> bool {
        self.0.get(var as usize).unwrap_or(false)
    }

    /// Forgets every saved polarity.
    pub fn reset(&mut self) {
        self.0.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::DoubleLiteral;

    #[test]
    fn test_save_and_reset() {
        let mut phases = SavedPhases::new(3);
        assert!(!phases.get(2));
        phases.save(DoubleLiteral::from(2));
        assert!(phases.get(2));
        phases.save(DoubleLiteral::from(-2));
        assert!(!phases.get(2));
        phases.save(DoubleLiteral::from(3));
        phases.reset();
        assert!(!phases.get(3));
    }
}
