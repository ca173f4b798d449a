#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Decision strategies.
//!
//! A [`SelectionStrategy`] decides the polarity of every decision; the [`Brancher`]
//! combines it with a variable heuristic. The default strategy uses VSIDS with saved
//! phases. Every other strategy walks the (shufflable) fixed variable order.

use crate::sat::assignment::Assignment;
use crate::sat::literal::{DoubleLiteral, Literal, Variable};
use crate::sat::model::position;
use crate::sat::phase_saving::SavedPhases;
use crate::sat::variable_selection::{FixedOrder, VariableSelection, Vsids};

/// How the engine picks the polarity of a decision.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SelectionStrategy {
    /// VSIDS with phase saving.
    #[default]
    Original,
    /// Follow the polarities of a reference model.
    Fixed(Vec<i32>),
    /// Take the opposite of the reference model's polarities.
    InverseFixed(Vec<i32>),
    /// Uniformly random polarities.
    Random {
        /// Seed for the polarity generator.
        seed: u64,
    },
    /// Variable `v` is chosen positive with probability `distribution[v - 1]`.
    WeightedRandom {
        /// Per-variable probability of a positive decision.
        distribution: Vec<f64>,
        /// Seed for the polarity generator.
        seed: u64,
    },
    /// Always decide positive.
    Positive,
    /// Always decide negative.
    Negative,
}

/// Variable heuristics plus the active polarity strategy.
#[derive(Debug, Clone)]
pub struct Brancher {
    strategy: SelectionStrategy,
    vsids: Vsids,
    order: FixedOrder,
    phases: SavedPhases,
    rng: fastrand::Rng,
    /// Seed the polarity generator was last reset to.
    seeded: Option<u64>,
}

impl Brancher {
    /// VSIDS with phase saving over `num_vars` variables.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            strategy: SelectionStrategy::Original,
            vsids: Vsids::new(num_vars),
            order: FixedOrder::new(num_vars),
            phases: SavedPhases::new(num_vars),
            rng: fastrand::Rng::with_seed(0),
            seeded: None,
        }
    }

    /// Active polarity strategy.
    #[must_use]
    pub const fn strategy(&self) -> &SelectionStrategy {
        &self.strategy
    }

    /// Installs `strategy`.
    ///
    /// A random strategy reseeds the polarity generator only if its seed differs from
    /// the last one applied, so reinstalling a strategy continues its stream.
    pub fn set_strategy(&mut self, strategy: SelectionStrategy) {
        match &strategy {
            SelectionStrategy::Random { seed } | SelectionStrategy::WeightedRandom { seed, .. }
                if self.seeded != Some(*seed) =>
            {
                self.rng.seed(*seed);
                self.seeded = Some(*seed);
            }
            _ => {}
        }
        self.strategy = strategy;
    }

    /// The fixed variable order.
    #[must_use]
    pub fn order(&self) -> &[Variable] {
        self.order.order()
    }

    /// Replaces the fixed variable order.
    pub fn set_order(&mut self, num_vars: usize, order: Vec<Variable>) {
        self.order = FixedOrder::with_order(num_vars, order);
    }

    /// Shuffles the fixed variable order.
    pub fn shuffle_order(&mut self, rng: &mut fastrand::Rng) {
        self.order.shuffle(rng);
    }

    /// The next decision literal, or `None` once everything is assigned.
    pub fn decide(&mut self, assignment: &Assignment) -> Option<DoubleLiteral> {
        let var = match self.strategy {
            SelectionStrategy::Original => self.vsids.pick(assignment)?,
            _ => self.order.pick(assignment)?,
        };
        let polarity = match &self.strategy {
            SelectionStrategy::Original => self.phases.get(var),
            SelectionStrategy::Fixed(model) => model_value(model, var) > 0,
            SelectionStrategy::InverseFixed(model) => model_value(model, var) < 0,
            SelectionStrategy::Random { .. } => self.rng.bool(),
            SelectionStrategy::WeightedRandom { distribution, .. } => {
                let p = distribution
                    .get(var as usize - 1)
                    .copied()
                    .unwrap_or(0.5);
                self.rng.f64() < p
            }
            SelectionStrategy::Positive => true,
            SelectionStrategy::Negative => false,
        };
        Some(DoubleLiteral::new(var, polarity))
    }

    /// Bumps the activities of the variables seen in a conflict.
    pub fn on_conflict(&mut self, vars: &[Variable]) {
        self.vsids.bumps(vars.iter().copied());
        self.vsids.decay();
    }

    /// Records the phase of an unassigned literal and reopens its variable.
    pub fn on_unassign(&mut self, lit: DoubleLiteral) {
        self.phases.save(lit);
        self.vsids.on_unassign(lit.variable());
        self.order.on_unassign(lit.variable());
    }
}

fn model_value(model: &[i32], var: Variable) -> i32 {
    let var = i32::try_from(var).unwrap_or(i32::MAX);
    model.get(position(var)).copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_strategies_follow_model() {
        let a = Assignment::new(3);
        let mut brancher = Brancher::new(3);
        brancher.set_strategy(SelectionStrategy::Fixed(vec![-1, 2, 3]));
        brancher.set_order(3, vec![1, 2, 3]);
        assert_eq!(brancher.decide(&a), Some(DoubleLiteral::from(-1)));

        brancher.set_strategy(SelectionStrategy::InverseFixed(vec![-1, 2, 3]));
        assert_eq!(brancher.decide(&a), Some(DoubleLiteral::from(1)));
    }

    #[test]
    fn test_constant_strategies() {
        let mut a = Assignment::new(2);
        let mut brancher = Brancher::new(2);
        brancher.set_strategy(SelectionStrategy::Positive);
        assert_eq!(brancher.decide(&a), Some(DoubleLiteral::from(1)));
        a.assign(DoubleLiteral::from(1));
        brancher.set_strategy(SelectionStrategy::Negative);
        assert_eq!(brancher.decide(&a), Some(DoubleLiteral::from(-2)));
        a.assign(DoubleLiteral::from(-2));
        assert_eq!(brancher.decide(&a), None);
    }

    #[test]
    fn test_weighted_extremes() {
        let a = Assignment::new(2);
        let mut brancher = Brancher::new(2);
        brancher.set_strategy(SelectionStrategy::WeightedRandom {
            distribution: vec![1.0, 0.0],
            seed: 3,
        });
        assert_eq!(brancher.decide(&a), Some(DoubleLiteral::from(1)));
    }

    #[test]
    fn test_original_uses_saved_phase() {
        let a = Assignment::new(1);
        let mut brancher = Brancher::new(1);
        assert_eq!(brancher.decide(&a), Some(DoubleLiteral::from(-1)));
        brancher.on_unassign(DoubleLiteral::from(1));
        assert_eq!(brancher.decide(&a), Some(DoubleLiteral::from(1)));
    }

    #[test]
    fn test_reinstalled_random_strategy_continues_its_stream() {
        let a = Assignment::new(1);
        let draw = |brancher: &mut Brancher, n: usize| -> Vec<DoubleLiteral> {
            (0..n).filter_map(|_| brancher.decide(&a)).collect()
        };

        let mut straight = Brancher::new(1);
        straight.set_strategy(SelectionStrategy::Random { seed: 7 });
        let expected = draw(&mut straight, 32);

        let mut interrupted = Brancher::new(1);
        interrupted.set_strategy(SelectionStrategy::Random { seed: 7 });
        let mut drawn = draw(&mut interrupted, 16);
        interrupted.set_strategy(SelectionStrategy::Positive);
        interrupted.set_strategy(SelectionStrategy::Random { seed: 7 });
        drawn.extend(draw(&mut interrupted, 16));
        assert_eq!(drawn, expected);

        interrupted.set_strategy(SelectionStrategy::Random { seed: 8 });
        let mut fresh = Brancher::new(1);
        fresh.set_strategy(SelectionStrategy::Random { seed: 8 });
        assert_eq!(draw(&mut interrupted, 16), draw(&mut fresh, 16));
    }
}
