#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The satisfiability oracle used by every analysis.
//!
//! An [`Oracle`] owns an incremental [`Cdcl`] engine loaded with a [`Cnf`] and an
//! assumption stack. [`Oracle::solve`] answers whether the formula is satisfiable with
//! every literal on the stack forced true. Timeouts are ordinary results.
//!
//! ```
//! use sat_sampler::sat::cnf::Cnf;
//! use sat_sampler::sat::oracle::{Oracle, SatResult};
//!
//! let cnf = Cnf::from_clauses(2, [vec![1, 2], vec![-1]]).unwrap();
//! let mut oracle = Oracle::new(&cnf).unwrap();
//! {
//!     let mut scope = oracle.scope();
//!     scope.assumptions_mut().push(-2);
//!     assert_eq!(scope.solve(), SatResult::Unsatisfiable);
//! }
//! assert!(oracle.assumptions().is_empty());
//! ```

use crate::error::{Result, SamplerError};
use crate::sat::cdcl::{Cdcl, SolveStats, SolveStatus};
use crate::sat::cnf::Cnf;
use crate::sat::literal::Variable;
use crate::sat::literal_list::LiteralList;
use crate::sat::model::Model;
use crate::sat::selection::SelectionStrategy;
use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};
use tracing::trace;

/// Answer of a single oracle call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SatResult {
    /// A model satisfying the formula and all assumptions.
    Satisfiable(Model),
    /// No model satisfies the formula together with the assumptions.
    Unsatisfiable,
    /// The time budget ran out; nothing is known.
    Timeout,
}

impl SatResult {
    /// `true` for a model.
    #[must_use]
    pub const fn is_satisfiable(&self) -> bool {
        matches!(self, Self::Satisfiable(_))
    }

    /// `true` for a proof of unsatisfiability.
    #[must_use]
    pub const fn is_unsatisfiable(&self) -> bool {
        matches!(self, Self::Unsatisfiable)
    }

    /// The model, if any.
    #[must_use]
    pub fn into_model(self) -> Option<Model> {
        match self {
            Self::Satisfiable(model) => Some(model),
            Self::Unsatisfiable | Self::Timeout => None,
        }
    }
}

/// The assumption stack: literals treated as true by the next solve.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assumptions(Vec<i32>);

impl Assumptions {
    /// An empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Pushes a non-zero literal.
    pub fn push(&mut self, literal: i32) {
        debug_assert_ne!(literal, 0);
        self.0.push(literal);
    }

    /// Pushes every literal in order.
    pub fn push_all<I: IntoIterator<Item = i32>>(&mut self, literals: I) {
        for l in literals {
            self.push(l);
        }
    }

    /// Removes and returns the top literal.
    pub fn pop(&mut self) -> Option<i32> {
        self.0.pop()
    }

    /// Removes the top `count` literals.
    pub fn pop_n(&mut self, count: usize) {
        self.0.truncate(self.0.len().saturating_sub(count));
    }

    /// Replaces the top literal.
    pub fn replace_last(&mut self, literal: i32) {
        if let Some(last) = self.0.last_mut() {
            *last = literal;
        } else {
            self.push(literal);
        }
    }

    /// Truncates the stack to `len` literals.
    pub fn clear_to(&mut self, len: usize) {
        self.0.truncate(len);
    }

    /// Empties the stack.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Literal at `index`, counted from the bottom.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<i32> {
        self.0.get(index).copied()
    }

    /// Overwrites the literal at `index`.
    pub fn set(&mut self, index: usize, literal: i32) {
        self.0[index] = literal;
    }

    /// The top literal.
    #[must_use]
    pub fn peek(&self) -> Option<i32> {
        self.0.last().copied()
    }

    /// Number of pushed literals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if nothing is pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The stack from bottom to top.
    #[must_use]
    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    /// Literals at positions `from..to`.
    #[must_use]
    pub fn range(&self, from: usize, to: usize) -> &[i32] {
        &self.0[from..to]
    }

    /// Sets `var` to `value`, overwriting an existing assumption on `var`.
    pub fn assign(&mut self, var: Variable, value: bool) {
        let var = i32::try_from(var).unwrap_or(i32::MAX);
        let literal = if value { var } else { -var };
        if let Some(slot) = self.0.iter_mut().find(|l| l.abs() == var) {
            *slot = literal;
        } else {
            self.push(literal);
        }
    }

    /// Drops the assumption on `var`, if any.
    pub fn unassign(&mut self, var: Variable) {
        if let Some(i) = self.0.iter().position(|l| l.unsigned_abs() == var) {
            self.0.remove(i);
        }
    }

    /// Value assumed for `var`, if any.
    #[must_use]
    pub fn value_of(&self, var: Variable) -> Option<bool> {
        self.0
            .iter()
            .find(|l| l.unsigned_abs() == var)
            .map(|&l| l > 0)
    }
}

/// Restores the assumption stack to its length at creation when dropped.
#[derive(Debug)]
pub struct AssumptionScope<'a> {
    oracle: &'a mut Oracle,
    len: usize,
}

impl Deref for AssumptionScope<'_> {
    type Target = Oracle;

    fn deref(&self) -> &Self::Target {
        self.oracle
    }
}

impl DerefMut for AssumptionScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.oracle
    }
}

impl Drop for AssumptionScope<'_> {
    fn drop(&mut self) {
        self.oracle.assumptions.clear_to(self.len);
    }
}

/// A SAT solver answering satisfiability queries under a stack of assumptions.
///
/// Learnt clauses are kept across calls. Every call can be bounded by a timeout.
#[derive(Debug, Clone)]
pub struct Oracle {
    engine: Cdcl,
    assumptions: Assumptions,
    timeout: Option<Duration>,
    last_solution: Option<Model>,
    history: VecDeque<Model>,
    history_limit: usize,
}

impl Oracle {
    /// Loads every clause of `cnf` into a fresh engine.
    ///
    /// # Errors
    ///
    /// `SamplerError::VariableOutOfRange` if a clause mentions an unknown variable.
    pub fn new(cnf: &Cnf) -> Result<Self> {
        let mut oracle = Self::with_num_vars(cnf.num_vars());
        oracle.add_clauses(cnf.iter())?;
        Ok(oracle)
    }

    /// An oracle over `num_vars` unconstrained variables.
    #[must_use]
    pub fn with_num_vars(num_vars: usize) -> Self {
        Self {
            engine: Cdcl::new(num_vars),
            assumptions: Assumptions::new(),
            timeout: None,
            last_solution: None,
            history: VecDeque::new(),
            history_limit: 0,
        }
    }

    /// Number of variables.
    #[must_use]
    pub const fn num_vars(&self) -> usize {
        self.engine.num_vars()
    }

    /// Adds a clause permanently.
    ///
    /// # Returns
    /// `false` if the formula became unsatisfiable.
    ///
    /// # Errors
    ///
    /// `SamplerError::VariableOutOfRange` if the clause mentions an unknown variable.
    pub fn add_clause(&mut self, clause: &LiteralList) -> Result<bool> {
        let num_vars = self.num_vars();
        if let Some(&literal) = clause.iter().find(|l| l.unsigned_abs() as usize > num_vars) {
            return Err(SamplerError::VariableOutOfRange { literal, num_vars });
        }
        Ok(self.engine.add_clause(clause.literals()))
    }

    /// Adds several clauses permanently.
    ///
    /// # Errors
    ///
    /// See [`Oracle::add_clause`].
    pub fn add_clauses<'a, I: IntoIterator<Item = &'a LiteralList>>(&mut self, clauses: I) -> Result<bool> {
        let mut ok = true;
        for clause in clauses {
            ok &= self.add_clause(clause)?;
        }
        Ok(ok)
    }

    /// The assumption stack.
    #[must_use]
    pub const fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    /// Mutable access to the assumption stack.
    pub fn assumptions_mut(&mut self) -> &mut Assumptions {
        &mut self.assumptions
    }

    /// Opens a scope that truncates the assumption stack back to its current length
    /// when dropped.
    pub fn scope(&mut self) -> AssumptionScope<'_> {
        let len = self.assumptions.len();
        AssumptionScope { oracle: self, len }
    }

    /// Active polarity strategy.
    #[must_use]
    pub const fn selection_strategy(&self) -> &SelectionStrategy {
        self.engine.strategy()
    }

    /// Installs a polarity strategy for the following calls.
    pub fn set_selection_strategy(&mut self, strategy: SelectionStrategy) {
        self.engine.set_strategy(strategy);
    }

    /// Fixed variable order used by the non-default strategies.
    #[must_use]
    pub fn order(&self) -> &[Variable] {
        self.engine.order()
    }

    /// Replaces the fixed variable order.
    pub fn set_order(&mut self, order: Vec<Variable>) {
        self.engine.set_order(order);
    }

    /// Resets the variable order to `1..=n`.
    pub fn set_order_fix(&mut self) {
        let order = (1..=self.num_vars())
            .filter_map(|v| Variable::try_from(v).ok())
            .collect();
        self.engine.set_order(order);
    }

    /// Shuffles the fixed variable order.
    pub fn shuffle_order(&mut self, rng: &mut fastrand::Rng) {
        self.engine.shuffle_order(rng);
    }

    /// Budget of each call, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Sets the time budget of every following solve call.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Solves under the current assumptions.
    pub fn solve(&mut self) -> SatResult {
        let deadline = self.timeout.map(|t| Instant::now() + t);
        match self.engine.solve(self.assumptions.as_slice(), deadline) {
            SolveStatus::Sat => {
                let model = self.engine.model().to_vec();
                if self.history_limit > 0 {
                    if self.history.len() == self.history_limit {
                        self.history.pop_back();
                    }
                    self.history.push_front(model.clone());
                }
                self.last_solution = Some(model.clone());
                SatResult::Satisfiable(model)
            }
            SolveStatus::Unsat => SatResult::Unsatisfiable,
            SolveStatus::Interrupted => {
                trace!(assumptions = self.assumptions.len(), "solver call timed out");
                SatResult::Timeout
            }
        }
    }

    /// Solves and returns the model, or `None` on unsatisfiability or timeout.
    pub fn find_solution(&mut self) -> Option<Model> {
        self.solve().into_model()
    }

    /// The model of the most recent satisfiable call.
    #[must_use]
    pub fn last_solution(&self) -> Option<&[i32]> {
        self.last_solution.as_deref()
    }

    /// Keeps the last `limit` models found by [`Oracle::solve`], newest first.
    pub fn remember_solution_history(&mut self, limit: usize) {
        self.history_limit = limit;
        self.history.clear();
    }

    /// Remembered models, oldest first.
    pub fn solution_history(&self) -> impl Iterator<Item = &Model> {
        self.history.iter()
    }

    /// Engine counters.
    #[must_use]
    pub const fn stats(&self) -> &SolveStats {
        self.engine.stats()
    }
}
