#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Partial configurations built up by the t-wise generator.
//!
//! A [`Configuration`] is a model over all variables whose core and dead positions are
//! fixed from the start. Every other literal it receives is recorded in selection order;
//! the configuration is complete once every free variable is set.
//!
//! Each configuration also keeps the sequence numbers of the cached models that agree
//! with its literals. Those models prove that literals can be added without a solver
//! call, and one of them completes the configuration on demand.

use crate::error::{Result, SamplerError};
use crate::mig::Mig;
use crate::mig::traversal::{Edge, Visit, traverse};
use crate::sat::literal_list::LiteralList;
use crate::sat::model::{Model, is_compatible, position, reset_conflicts};
use crate::sat::oracle::{Oracle, SatResult};
use crate::sat::selection::SelectionStrategy;
use crate::sat::solution_cache::SolutionCache;
use tracing::{trace, warn};

/// The solution cache together with the sequence numbers inserted since the last
/// [`Solutions::take_fresh`].
#[derive(Debug, Clone, Default)]
pub struct Solutions {
    cache: SolutionCache,
    fresh: Vec<u64>,
}

impl Solutions {
    /// A store keeping at most `capacity` models.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: SolutionCache::new(capacity),
            fresh: Vec::new(),
        }
    }

    /// The underlying cache.
    #[must_use]
    pub const fn cache(&self) -> &SolutionCache {
        &self.cache
    }

    /// Direct access to the cache. Insertions made through it are not reported as fresh.
    pub fn cache_mut(&mut self) -> &mut SolutionCache {
        &mut self.cache
    }

    /// Caches `model` unless it is already known.
    pub fn record(&mut self, model: &[i32]) {
        if let Some(seq) = self.cache.insert(model) {
            self.fresh.push(seq);
        }
    }

    /// Sequence numbers of the models recorded since the previous call.
    pub fn take_fresh(&mut self) -> Vec<u64> {
        std::mem::take(&mut self.fresh)
    }
}

/// Everything a configuration needs to consult while growing.
#[derive(Debug)]
pub struct Context {
    /// Oracle with the core/dead literals pushed as assumptions.
    pub oracle: Oracle,
    /// Implication graph used for propagation, if built.
    pub mig: Option<Mig>,
    /// Models found so far.
    pub solutions: Solutions,
    /// Generator for every random choice of the sampler.
    pub rng: fastrand::Rng,
}

/// A partial configuration growing towards a full model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    literals: Model,
    /// Non-forced literals in the order they were set.
    solution_literals: Vec<i32>,
    num_variable_literals: usize,
    /// Cached models agreeing with `literals`, oldest first.
    compatible: Vec<u64>,
    frozen: bool,
}

impl Configuration {
    /// An empty configuration holding only the core/dead literals.
    #[must_use]
    pub fn new(num_vars: usize, core_dead: &LiteralList) -> Self {
        let mut literals = vec![0; num_vars];
        for &l in core_dead {
            literals[position(l)] = l;
        }
        Self {
            literals,
            solution_literals: Vec::new(),
            num_variable_literals: num_vars - core_dead.len(),
            compatible: Vec::new(),
            frozen: false,
        }
    }

    /// The configuration as a model, `0` where unset.
    #[must_use]
    pub fn literals(&self) -> &[i32] {
        &self.literals
    }

    /// Literals set by the sampler, in the order they were set.
    #[must_use]
    pub fn solution_literals(&self) -> &[i32] {
        &self.solution_literals
    }

    /// Number of non-forced literals set.
    #[must_use]
    pub fn count_literals(&self) -> usize {
        self.solution_literals.len()
    }

    /// `true` once every variable is set.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.solution_literals.len() == self.num_variable_literals
    }

    /// `true` once the configuration takes no further literals.
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// `true` if some literal of `literals` is set to the opposite value.
    #[must_use]
    pub fn has_conflicts(&self, literals: &LiteralList) -> bool {
        !is_compatible(&self.literals, literals)
    }

    /// `true` if every literal of `literals` is set.
    #[must_use]
    pub fn contains_all(&self, literals: &LiteralList) -> bool {
        crate::sat::model::contains_all(&self.literals, literals)
    }

    /// Sets every unset literal of `literals`. With a graph, their strong consequences
    /// are set as well.
    pub fn set_literals(&mut self, ctx: &mut Context, literals: &[i32]) {
        let mut start = Vec::with_capacity(literals.len());
        for &l in literals {
            if self.literals[position(l)] == 0 {
                self.literals[position(l)] = l;
                self.note_literal(l, ctx.solutions.cache());
                start.push(l);
            }
        }
        if let Some(mig) = &ctx.mig {
            let traversal = traverse(mig, &mut self.literals, &start, |edge, _, _| match edge {
                Edge::Strong => Visit::Select,
                Edge::Weak => Visit::Continue,
            });
            for l in traversal.selected {
                self.note_literal(l, ctx.solutions.cache());
            }
        }
    }

    /// Sets every literal implied by the current ones.
    ///
    /// With a graph, strong consequences are taken from it and the oracle is only asked
    /// about literals reached over weak edges. Without one, every free variable on which
    /// two differently steered models agree is tested. Literals whose test times out stay
    /// unset.
    ///
    /// # Errors
    ///
    /// `SamplerError::InvalidConfiguration` if the current literals have no model.
    pub fn propagate(&mut self, ctx: &mut Context) -> Result<()> {
        if self.is_complete() {
            return Ok(());
        }
        let previous_strategy = ctx.oracle.selection_strategy().clone();
        let result = if ctx.mig.is_some() {
            self.propagate_graph(ctx)
        } else {
            self.propagate_solver(ctx)
        };
        ctx.oracle.set_selection_strategy(previous_strategy);
        result
    }

    fn propagate_graph(&mut self, ctx: &mut Context) -> Result<()> {
        let Some(mig) = &ctx.mig else {
            return Ok(());
        };
        let mut oracle = ctx.oracle.scope();
        let solutions = &mut ctx.solutions;
        let rng = &mut ctx.rng;
        let mut unknown: Option<Model> = None;
        let mut unsatisfiable = false;

        let start = self.solution_literals.clone();
        let traversal = traverse(mig, &mut self.literals, &start, |edge, literal, model| {
            if edge == Edge::Strong {
                if let Some(unknown) = unknown.as_mut() {
                    oracle.assumptions_mut().push(literal);
                    unknown[position(literal)] = 0;
                }
                return Visit::Select;
            }

            if unknown.is_none() {
                oracle
                    .assumptions_mut()
                    .push_all(model.iter().copied().filter(|&l| l != 0));
                oracle.set_selection_strategy(SelectionStrategy::Original);
                let mut first = match oracle.solve() {
                    SatResult::Satisfiable(first) => first,
                    SatResult::Unsatisfiable => {
                        unsatisfiable = true;
                        return Visit::Cancel;
                    }
                    SatResult::Timeout => {
                        warn!("propagation timed out, keeping strong consequences only");
                        return Visit::Cancel;
                    }
                };
                solutions.record(&first);
                oracle.shuffle_order(rng);
                oracle.set_selection_strategy(SelectionStrategy::InverseFixed(first.clone()));
                if let SatResult::Satisfiable(second) = oracle.solve() {
                    solutions.record(&second);
                    reset_conflicts(&mut first, &second);
                }
                for (value, &set) in first.iter_mut().zip(model) {
                    if set != 0 {
                        *value = 0;
                    }
                }
                unknown = Some(first);
            }

            let Some(unknown) = unknown.as_mut() else {
                return Visit::Continue;
            };
            let i = position(literal);
            if unknown[i] != literal {
                return Visit::Continue;
            }
            oracle.assumptions_mut().push(-literal);
            match oracle.solve() {
                SatResult::Unsatisfiable => {
                    oracle.assumptions_mut().replace_last(literal);
                    unknown[i] = 0;
                    Visit::Select
                }
                SatResult::Timeout => {
                    oracle.assumptions_mut().pop();
                    unknown[i] = 0;
                    Visit::Continue
                }
                SatResult::Satisfiable(model) => {
                    oracle.assumptions_mut().pop();
                    solutions.record(&model);
                    reset_conflicts(unknown, &model);
                    oracle.shuffle_order(rng);
                    Visit::Continue
                }
            }
        });
        drop(oracle);

        for l in traversal.selected {
            self.note_literal(l, ctx.solutions.cache());
        }
        if unsatisfiable {
            return Err(SamplerError::InvalidConfiguration(
                "propagation found no model for the configuration".into(),
            ));
        }
        Ok(())
    }

    fn propagate_solver(&mut self, ctx: &mut Context) -> Result<()> {
        let mut oracle = ctx.oracle.scope();
        self.set_up_oracle(&mut oracle);
        oracle.set_selection_strategy(SelectionStrategy::Original);

        let mut first = match oracle.solve() {
            SatResult::Satisfiable(first) => first,
            SatResult::Unsatisfiable => {
                return Err(SamplerError::InvalidConfiguration(
                    "propagation found no model for the configuration".into(),
                ));
            }
            SatResult::Timeout => {
                warn!("propagation timed out");
                return Ok(());
            }
        };
        ctx.solutions.record(&first);
        oracle.set_selection_strategy(SelectionStrategy::InverseFixed(first.clone()));
        if let SatResult::Satisfiable(second) = oracle.solve() {
            ctx.solutions.record(&second);
            reset_conflicts(&mut first, &second);
        }
        for (value, &set) in first.iter_mut().zip(&self.literals) {
            if set != 0 {
                *value = 0;
            }
        }

        for i in 0..first.len() {
            let literal = first[i];
            if literal == 0 {
                continue;
            }
            oracle.assumptions_mut().push(-literal);
            match oracle.solve() {
                SatResult::Unsatisfiable => {
                    oracle.assumptions_mut().replace_last(literal);
                    self.literals[i] = literal;
                    self.note_literal(literal, ctx.solutions.cache());
                }
                SatResult::Timeout => {
                    oracle.assumptions_mut().pop();
                }
                SatResult::Satisfiable(model) => {
                    oracle.assumptions_mut().pop();
                    ctx.solutions.record(&model);
                    reset_conflicts(&mut first, &model);
                    oracle.shuffle_order(&mut ctx.rng);
                }
            }
        }
        Ok(())
    }

    /// Completes the configuration with the newest compatible cached model, or with a
    /// fresh model from the oracle. Stays incomplete if the oracle finds none.
    pub fn auto_complete(&mut self, ctx: &mut Context) {
        if self.is_complete() {
            return;
        }
        let model = match self.newest_compatible(ctx.solutions.cache()) {
            Some(model) => Some(model.to_vec()),
            None => {
                let mut oracle = ctx.oracle.scope();
                self.set_up_oracle(&mut oracle);
                oracle.find_solution()
            }
        };
        let Some(model) = model else {
            trace!("no model to complete the configuration with");
            return;
        };
        ctx.solutions.record(&model);
        for (value, &m) in self.literals.iter_mut().zip(&model) {
            if *value == 0 {
                *value = m;
                self.solution_literals.push(m);
            }
        }
        self.compatible.clear();
    }

    /// A full model extending the configuration.
    ///
    /// If the oracle times out, only the literals set so far are returned.
    ///
    /// # Errors
    ///
    /// `SamplerError::InvalidConfiguration` if no model extends the configuration.
    pub fn complete_solution(&self, ctx: &mut Context) -> Result<LiteralList> {
        if self.is_complete() {
            return Ok(LiteralList::from_model(&self.literals));
        }
        if let Some(model) = self.newest_compatible(ctx.solutions.cache()) {
            return Ok(LiteralList::from_model(model));
        }
        let mut oracle = self.scoped(&mut ctx.oracle);
        match oracle.solve() {
            SatResult::Satisfiable(model) => Ok(LiteralList::from_model(&model)),
            SatResult::Unsatisfiable => Err(SamplerError::InvalidConfiguration(
                "no model extends the configuration".into(),
            )),
            SatResult::Timeout => {
                warn!(
                    set = self.count_literals(),
                    "completion timed out, returning a partial configuration"
                );
                Ok(LiteralList::from_model(&self.literals))
            }
        }
    }

    /// `true` if some model extends the configuration.
    pub fn is_valid(&self, oracle: &mut Oracle) -> bool {
        let previous_strategy = oracle.selection_strategy().clone();
        let valid = {
            let mut scoped = self.scoped(oracle);
            scoped.set_selection_strategy(SelectionStrategy::Original);
            scoped.solve().is_satisfiable()
        };
        oracle.set_selection_strategy(previous_strategy);
        valid
    }

    /// Pushes the configuration's literals onto the assumption stack: every literal once
    /// complete, only the non-forced ones otherwise.
    pub fn set_up_oracle(&self, oracle: &mut Oracle) {
        if self.is_complete() {
            oracle.assumptions_mut().push_all(self.literals.iter().copied());
        } else {
            oracle
                .assumptions_mut()
                .push_all(self.solution_literals.iter().copied());
        }
    }

    fn scoped<'a>(&self, oracle: &'a mut Oracle) -> crate::sat::oracle::AssumptionScope<'a> {
        let mut scope = oracle.scope();
        self.set_up_oracle(&mut scope);
        scope
    }

    /// `true` if a cached model agreeing with the configuration also agrees with
    /// `literals`.
    #[must_use]
    pub fn fits_cached(&self, cache: &SolutionCache, literals: &LiteralList) -> bool {
        self.compatible
            .iter()
            .filter_map(|&seq| cache.get(seq))
            .any(|model| is_compatible(model, literals))
    }

    /// Rebuilds the index of compatible cached models from scratch.
    pub fn update_compatible(&mut self, cache: &SolutionCache) {
        if self.frozen {
            return;
        }
        self.compatible = cache
            .iter()
            .filter(|(_, model)| self.agrees_with(model))
            .map(|(seq, _)| seq)
            .collect();
    }

    /// Notifies the configuration of a newly cached model.
    pub fn on_cache_insert(&mut self, seq: u64, model: &[i32]) {
        if !self.frozen && self.agrees_with(model) {
            self.compatible.push(seq);
        }
    }

    /// Drops the bookkeeping only needed while the configuration grows.
    pub fn freeze(&mut self) {
        self.frozen = true;
        self.compatible = Vec::new();
    }

    fn agrees_with(&self, model: &[i32]) -> bool {
        self.solution_literals
            .iter()
            .all(|&l| model[position(l)] != -l)
    }

    fn newest_compatible<'c>(&self, cache: &'c SolutionCache) -> Option<&'c [i32]> {
        self.compatible.iter().rev().find_map(|&seq| cache.get(seq))
    }

    /// Records a literal that was just set in `literals`.
    fn note_literal(&mut self, literal: i32, cache: &SolutionCache) {
        self.solution_literals.push(literal);
        let i = position(literal);
        self.compatible
            .retain(|&seq| cache.get(seq).is_some_and(|model| model[i] != -literal));
    }
}
