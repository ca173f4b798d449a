#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Branching heuristics.
//!
//! The engine asks its heuristic for the next unassigned variable on every decision
//! and reports every unassignment back so lazily maintained structures can recover.

use crate::sat::assignment::Assignment;
use crate::sat::literal::Variable;
use ordered_float::OrderedFloat;
use std::collections::BinaryHeap;
use std::ops::Index;

/// Chooses the next decision variable.
pub trait VariableSelection {
    /// Next unassigned variable, or `None` when everything is assigned.
    fn pick(&mut self, assignment: &Assignment) -> Option<Variable>;

    /// Rewards the variables involved in a conflict.
    fn bumps<T: IntoIterator<Item = Variable>>(&mut self, vars: T);

    /// Ages all activities after a conflict.
    fn decay(&mut self);

    /// Notifies the heuristic that `var` became unassigned.
    fn on_unassign(&mut self, var: Variable);
}

const DEFAULT_DECAY: f64 = 0.95;
const RESCALE_LIMIT: f64 = 1e100;

/// Variable state independent decaying sum.
///
/// Activities are kept in a binary heap with lazy deletion: stale entries are skipped
/// when popped, and unassigned variables are pushed again.
#[derive(Debug, Clone, Default)]
pub struct Vsids {
    activity: Vec<f64>,
    increment: f64,
    heap: BinaryHeap<(OrderedFloat<f64>, Variable)>,
}

impl Index<Variable> for Vsids {
    type Output = f64;

    fn index(&self, index: Variable) -> &Self::Output {
        &self.activity[index as usize]
    }
}

impl Vsids {
    /// Zero activity for every variable.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        let heap = (1..=num_vars)
            .filter_map(|v| Variable::try_from(v).ok())
            .map(|v| (OrderedFloat(0.0), v))
            .collect();
        Self {
            activity: vec![0.0; num_vars + 1],
            increment: 1.0,
            heap,
        }
    }

    /// Raises the activity of `var`.
    pub fn bump(&mut self, var: Variable) {
        let slot = &mut self.activity[var as usize];
        *slot += self.increment;
        if *slot > RESCALE_LIMIT {
            for a in &mut self.activity {
                *a *= 1e-100;
            }
            self.increment *= 1e-100;
            let activity = &self.activity;
            let rescaled: BinaryHeap<_> = self
                .heap
                .drain()
                .map(|(_, v)| (OrderedFloat(activity[v as usize]), v))
                .collect();
            self.heap = rescaled;
        }
        self.heap
            .push((OrderedFloat(self.activity[var as usize]), var));
    }
}

impl VariableSelection for Vsids {
    #[allow(clippy::float_cmp)]
    fn pick(&mut self, assignment: &Assignment) -> Option<Variable> {
        while let Some((OrderedFloat(act), var)) = self.heap.pop() {
            if assignment.is_assigned(var) {
                continue;
            }
            if act != self.activity[var as usize] {
                continue;
            }
            return Some(var);
        }
        // All heap entries were stale; fall back to a scan.
        (1..self.activity.len())
            .filter_map(|v| Variable::try_from(v).ok())
            .find(|&v| !assignment.is_assigned(v))
    }

    fn bumps<T: IntoIterator<Item = Variable>>(&mut self, vars: T) {
        for var in vars {
            self.bump(var);
        }
    }

    fn decay(&mut self) {
        self.increment /= DEFAULT_DECAY;
    }

    fn on_unassign(&mut self, var: Variable) {
        self.heap
            .push((OrderedFloat(self.activity[var as usize]), var));
    }
}

/// Picks variables in a fixed order.
///
/// A cursor remembers how far the order has been consumed; unassigning a variable
/// moves the cursor back to it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FixedOrder {
    order: Vec<Variable>,
    positions: Vec<usize>,
    cursor: usize,
}

impl FixedOrder {
    /// The natural order `1..=num_vars`.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        let order = (1..=num_vars)
            .filter_map(|v| Variable::try_from(v).ok())
            .collect();
        Self::with_order(num_vars, order)
    }

    /// An explicit order. Variables missing from `order` are appended in natural order.
    #[must_use]
    pub fn with_order(num_vars: usize, order: Vec<Variable>) -> Self {
        let mut positions = vec![usize::MAX; num_vars + 1];
        let mut full = Vec::with_capacity(num_vars);
        for var in order {
            let slot = var as usize;
            if slot == 0 || slot > num_vars || positions[slot] != usize::MAX {
                continue;
            }
            positions[slot] = full.len();
            full.push(var);
        }
        for slot in 1..=num_vars {
            if positions[slot] == usize::MAX {
                positions[slot] = full.len();
                full.push(Variable::try_from(slot).unwrap_or(Variable::MAX));
            }
        }
        Self {
            order: full,
            positions,
            cursor: 0,
        }
    }

    /// The current order.
    #[must_use]
    pub fn order(&self) -> &[Variable] {
        &self.order
    }

    /// Shuffles the order in place.
    pub fn shuffle(&mut self, rng: &mut fastrand::Rng) {
        rng.shuffle(&mut self.order);
        for (i, v) in self.order.iter().enumerate() {
            self.positions[*v as usize] = i;
        }
        self.cursor = 0;
    }
}

impl VariableSelection for FixedOrder {
    fn pick(&mut self, assignment: &Assignment) -> Option<Variable> {
        while let Some(&var) = self.order.get(self.cursor) {
            if !assignment.is_assigned(var) {
                return Some(var);
            }
            self.cursor += 1;
        }
        None
    }

    fn bumps<T: IntoIterator<Item = Variable>>(&mut self, _: T) {}

    fn decay(&mut self) {}

    fn on_unassign(&mut self, var: Variable) {
        self.cursor = self.cursor.min(self.positions[var as usize]);
    }
}
