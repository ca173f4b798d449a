#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The assignment trail: every assigned literal in assignment order, together with
//! its decision level and the reason it was assigned.

use crate::sat::assignment::Assignment;
use crate::sat::literal::{Literal, Variable};
use std::ops::Index;

/// Why a literal was assigned.
#[derive(Debug, Clone, PartialEq, Eq, Default, Copy, Hash, PartialOrd, Ord)]
pub enum Reason {
    /// Chosen by the search (or an assumption).
    #[default]
    Decision,
    /// Fact at level 0 with no stored antecedent.
    Unit,
    /// Implied by the clause at this index; the literal sits at position 0 of it.
    Clause(usize),
}

/// One assigned literal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Step<L: Literal> {
    /// The literal made true.
    pub lit: L,
    /// Decision level of the assignment.
    pub decision_level: usize,
    /// What caused the assignment.
    pub reason: Reason,
}

/// Every assigned literal in assignment order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trail<L: Literal> {
    t: Vec<Step<L>>,
    /// Propagation head: steps before it have been propagated.
    pub curr_idx: usize,
    level_starts: Vec<usize>,
    lit_to_level: Vec<usize>,
    lit_to_reason: Vec<Reason>,
}

impl<L: Literal> Index<usize> for Trail<L> {
    type Output = Step<L>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.t[index]
    }
}

impl<L: Literal> Trail<L> {
    /// An empty trail for `num_vars` variables.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            t: Vec::with_capacity(num_vars),
            curr_idx: 0,
            level_starts: Vec::new(),
            lit_to_level: vec![0; num_vars + 1],
            lit_to_reason: vec![Reason::Decision; num_vars + 1],
        }
    }

    /// The current decision level.
    #[must_use]
    pub fn decision_level(&self) -> usize {
        self.level_starts.len()
    }

    /// Opens a new decision level.
    pub fn new_decision_level(&mut self) {
        self.level_starts.push(self.t.len());
    }

    /// Number of assigned literals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.t.len()
    }

    /// `true` if nothing is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Steps in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = &Step<L>> {
        self.t.iter()
    }

    /// Level at which `var` was assigned.
    #[must_use]
    pub fn level(&self, var: Variable) -> usize {
        self.lit_to_level[var as usize]
    }

    /// Reason recorded for `var`.
    #[must_use]
    pub fn reason(&self, var: Variable) -> Reason {
        self.lit_to_reason[var as usize]
    }

    /// Records `lit` at the current level. The caller assigns it.
    pub fn push(&mut self, lit: L, reason: Reason) {
        let decision_level = self.decision_level();
        let var = lit.variable() as usize;
        self.lit_to_level[var] = decision_level;
        self.lit_to_reason[var] = reason;
        self.t.push(Step {
            lit,
            decision_level,
            reason,
        });
    }

    /// Undoes every level above `level`, unassigning the literals in reverse order and
    /// handing each to `on_unassign`.
    pub fn backstep_to<F: FnMut(L)>(&mut self, a: &mut Assignment, level: usize, mut on_unassign: F) {
        if level >= self.decision_level() {
            return;
        }

        let truncate_at = self.level_starts[level];
        for step in self.t.drain(truncate_at..).rev() {
            let var = step.lit.variable();
            a.unassign(var);
            self.lit_to_reason[var as usize] = Reason::Decision;
            on_unassign(step.lit);
        }
        self.level_starts.truncate(level);
        self.curr_idx = self.curr_idx.min(truncate_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::DoubleLiteral;

    #[test]
    fn test_levels() {
        let mut trail: Trail<DoubleLiteral> = Trail::new(3);
        let mut a = Assignment::new(3);

        trail.push(DoubleLiteral::from(1), Reason::Unit);
        a.assign(DoubleLiteral::from(1));
        trail.new_decision_level();
        trail.push(DoubleLiteral::from(-2), Reason::Decision);
        a.assign(DoubleLiteral::from(-2));
        trail.push(DoubleLiteral::from(3), Reason::Clause(0));
        a.assign(DoubleLiteral::from(3));

        assert_eq!(trail.decision_level(), 1);
        assert_eq!(trail.level(3), 1);
        assert_eq!(trail.reason(3), Reason::Clause(0));
        assert_eq!(trail.len(), 3);

        let mut undone = Vec::new();
        trail.backstep_to(&mut a, 0, |l| undone.push(l));

        assert_eq!(undone, vec![DoubleLiteral::from(3), DoubleLiteral::from(-2)]);
        assert_eq!(trail.len(), 1);
        assert_eq!(trail.decision_level(), 0);
        assert!(a.is_assigned(1));
        assert!(!a.is_assigned(2));
    }
}
