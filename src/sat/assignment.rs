#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Current truth values of the engine's variables.

use crate::sat::literal::{Literal, Variable};
use core::ops::Index;

/// Value of one variable.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Default, Hash, PartialOrd, Ord)]
pub enum VarState {
    /// No value yet.
    #[default]
    Unassigned,
    /// Set to the given value.
    Assigned(bool),
}

impl VarState {
    /// `true` for a set variable.
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        matches!(self, Self::Assigned(_))
    }

    /// `true` for an unset variable.
    #[must_use]
    pub const fn is_unassigned(self) -> bool {
        !self.is_assigned()
    }
}

/// Dense assignment table indexed by variable (slot 0 unused).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment {
    states: Vec<VarState>,
    assigned: usize,
}

impl Index<Variable> for Assignment {
    type Output = VarState;

    fn index(&self, index: Variable) -> &Self::Output {
        &self.states[index as usize]
    }
}

impl Assignment {
    /// All of `num_vars` variables unassigned.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            states: vec![VarState::Unassigned; num_vars + 1],
            assigned: 0,
        }
    }

    /// Number of variables.
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.states.len() - 1
    }

    /// Makes `lit` true.
    pub fn assign(&mut self, lit: impl Literal) {
        let slot = &mut self.states[lit.variable() as usize];
        if slot.is_unassigned() {
            self.assigned += 1;
        }
        *slot = VarState::Assigned(lit.polarity());
    }

    /// Clears the value of `var`.
    pub fn unassign(&mut self, var: Variable) {
        let slot = &mut self.states[var as usize];
        if slot.is_assigned() {
            self.assigned -= 1;
        }
        *slot = VarState::Unassigned;
    }

    /// Value of `var`, or `None` while unassigned.
    #[must_use]
    pub fn var_value(&self, var: Variable) -> Option<bool> {
        match self.states.get(var as usize) {
            Some(VarState::Assigned(b)) => Some(*b),
            _ => None,
        }
    }

    /// Truth value of `lit`, or `None` while its variable is unassigned.
    #[must_use]
    pub fn literal_value(&self, lit: impl Literal) -> Option<bool> {
        self.var_value(lit.variable()).map(|b| b == lit.polarity())
    }

    /// `true` if `var` has a value.
    #[must_use]
    pub fn is_assigned(&self, var: Variable) -> bool {
        self[var].is_assigned()
    }

    /// `true` once every variable has a value.
    #[must_use]
    pub fn all_assigned(&self) -> bool {
        self.assigned + 1 == self.states.len()
    }

    /// The assignment as a model (`±var` per position, 0 when unassigned).
    #[must_use]
    pub fn model(&self) -> Vec<i32> {
        self.states
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, s)| {
                let var = i32::try_from(i).unwrap_or(i32::MAX);
                match s {
                    VarState::Assigned(true) => var,
                    VarState::Assigned(false) => -var,
                    VarState::Unassigned => 0,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::DoubleLiteral;

    #[test]
    fn test_assign_and_values() {
        let mut a = Assignment::new(3);
        a.assign(DoubleLiteral::from(-2));
        assert_eq!(a.var_value(2), Some(false));
        assert_eq!(a.literal_value(DoubleLiteral::from(2)), Some(false));
        assert_eq!(a.literal_value(DoubleLiteral::from(-2)), Some(true));
        assert_eq!(a.literal_value(DoubleLiteral::from(1)), None);
        assert_eq!(a.model(), vec![0, -2, 0]);
    }

    #[test]
    fn test_all_assigned() {
        let mut a = Assignment::new(2);
        a.assign(DoubleLiteral::from(1));
        a.assign(DoubleLiteral::from(1));
        assert!(!a.all_assigned());
        a.assign(DoubleLiteral::from(-2));
        assert!(a.all_assigned());
        a.unassign(1);
        assert!(!a.all_assigned());
        assert!(a[1].is_unassigned());
    }
}
