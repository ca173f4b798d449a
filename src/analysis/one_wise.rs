#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! One-wise samples: every variable takes its cover polarity in some configuration.
//!
//! Each round builds one configuration. The remaining variables are visited from the
//! back; each cover literal is pushed and kept if the formula stays satisfiable, or
//! replaced by its negation otherwise. The model of the last satisfiable call holds
//! every kept literal, so it covers at least the first one kept. Variables whose cover
//! literal fails before anything was kept in a round can never be covered.

use crate::analysis::backbone::remember;
use crate::error::{Result, SamplerError};
use crate::sat::literal::Variable;
use crate::sat::literal_list::LiteralList;
use crate::sat::model::{Model, position};
use crate::sat::oracle::{Oracle, SatResult};
use crate::sat::selection::SelectionStrategy;
use crate::sat::solution_cache::SolutionCache;
use clap::ValueEnum;
use tracing::{debug, warn};

/// Polarity each variable has to take in at least one configuration.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, Default, ValueEnum)]
pub enum CoverStrategy {
    /// Every variable selected at least once.
    Positive,
    /// Every variable deselected at least once.
    #[default]
    Negative,
}

impl CoverStrategy {
    /// The literal of `var` this strategy wants covered.
    #[must_use]
    pub const fn literal(self, var: i32) -> i32 {
        match self {
            Self::Positive => var,
            Self::Negative => -var,
        }
    }

    const fn selection(self) -> SelectionStrategy {
        match self {
            Self::Positive => SelectionStrategy::Positive,
            Self::Negative => SelectionStrategy::Negative,
        }
    }
}

/// Result of [`one_wise`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OneWise {
    /// Complete configurations, in the order they were built.
    pub configurations: Vec<LiteralList>,
    /// Variables whose cover literal contradicts the formula.
    pub uncoverable: Vec<Variable>,
    /// Variables dropped because a solver call timed out.
    pub undecided: Vec<Variable>,
}

/// Builds configurations until every variable of `variables` (all variables if `None`)
/// is covered with the polarity chosen by `strategy`, proven uncoverable, or undecided.
///
/// The assumption stack and the selection strategy are restored before returning.
/// Every model found is added to `cache`.
///
/// # Errors
///
/// `SamplerError::Unsatisfiable` if the formula has no model under the current
/// assumptions.
pub fn one_wise(
    oracle: &mut Oracle,
    variables: Option<&[Variable]>,
    strategy: CoverStrategy,
    mut cache: Option<&mut SolutionCache>,
) -> Result<OneWise> {
    let num_vars = oracle.num_vars();
    let mut remaining: Vec<i32> = match variables {
        Some(variables) => variables
            .iter()
            .filter(|&&v| v != 0 && (v as usize) <= num_vars)
            .filter_map(|&v| i32::try_from(v).ok())
            .collect(),
        None => (1..=num_vars).filter_map(|v| i32::try_from(v).ok()).collect(),
    };
    remaining.sort_unstable();
    remaining.dedup();

    let previous_strategy = oracle.selection_strategy().clone();
    oracle.set_selection_strategy(strategy.selection());
    let result = cover(oracle, remaining, strategy, &mut cache);
    oracle.set_selection_strategy(previous_strategy);

    if let Ok(sample) = &result {
        debug!(
            configurations = sample.configurations.len(),
            uncoverable = sample.uncoverable.len(),
            undecided = sample.undecided.len(),
            "one-wise sampling finished"
        );
    }
    result
}

fn cover(
    oracle: &mut Oracle,
    mut remaining: Vec<i32>,
    strategy: CoverStrategy,
    cache: &mut Option<&mut SolutionCache>,
) -> Result<OneWise> {
    let mut sample = OneWise::default();
    let mut last = match oracle.solve() {
        SatResult::Satisfiable(model) => Some(model),
        SatResult::Unsatisfiable => return Err(SamplerError::Unsatisfiable),
        SatResult::Timeout => {
            warn!("first solver call timed out, every variable is undecided");
            sample.undecided = remaining.iter().map(|v| v.unsigned_abs()).collect();
            return Ok(sample);
        }
    };
    if let Some(model) = &last {
        remember(cache, model);
    }

    let mut timed_out = Vec::new();
    let mut scope = oracle.scope();
    let start = scope.assumptions().len();
    while !remaining.is_empty() {
        let mut dropped = vec![false; remaining.len()];
        let mut kept = false;
        for i in (0..remaining.len()).rev() {
            let literal = strategy.literal(remaining[i]);
            scope.assumptions_mut().push(literal);
            if last.as_ref().is_some_and(|m: &Model| m[position(literal)] == literal) {
                kept = true;
                continue;
            }
            match scope.solve() {
                SatResult::Satisfiable(model) => {
                    remember(cache, &model);
                    last = Some(model);
                    kept = true;
                }
                SatResult::Unsatisfiable => {
                    scope.assumptions_mut().replace_last(-literal);
                    if !kept {
                        dropped[i] = true;
                        sample.uncoverable.push(literal.unsigned_abs());
                    }
                }
                SatResult::Timeout => {
                    scope.assumptions_mut().pop();
                    dropped[i] = true;
                    timed_out.push(remaining[i]);
                }
            }
        }
        scope.assumptions_mut().clear_to(start);

        let Some(model) = last.take() else {
            break;
        };
        let mut index = 0;
        remaining.retain(|&var| {
            let literal = strategy.literal(var);
            let keep = !dropped[index] && model[position(literal)] != literal;
            index += 1;
            keep
        });
        sample.configurations.push(LiteralList::new(model));
    }

    // A later configuration may still cover a variable whose own call timed out.
    let mut undecided: Vec<Variable> = timed_out
        .into_iter()
        .filter(|&var| {
            let literal = strategy.literal(var);
            !sample
                .configurations
                .iter()
                .any(|c| c.literals().contains(&literal))
        })
        .map(i32::unsigned_abs)
        .collect();
    undecided.sort_unstable();
    sample.undecided = undecided;
    sample.uncoverable.sort_unstable();
    Ok(sample)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::cnf::Cnf;
    use crate::test_util::{all_models, is_satisfiable_with, random_cnf};
    use std::time::Duration;

    fn check_against_brute_force(cnf: &Cnf, sample: &OneWise, strategy: CoverStrategy) {
        for configuration in &sample.configurations {
            assert!(cnf.verify(configuration.literals()));
        }
        for var in 1..=i32::try_from(cnf.num_vars()).unwrap() {
            let literal = strategy.literal(var);
            let covered = sample
                .configurations
                .iter()
                .any(|c| c.literals().contains(&literal));
            let uncoverable = sample.uncoverable.contains(&var.unsigned_abs());
            let undecided = sample.undecided.contains(&var.unsigned_abs());
            assert_eq!(
                usize::from(covered) + usize::from(uncoverable) + usize::from(undecided),
                1,
                "variable {var} in {sample:?}"
            );
            if uncoverable {
                assert!(!is_satisfiable_with(cnf, &[literal]));
            }
        }
    }

    #[test]
    fn test_negative_cover() {
        let cnf = Cnf::from_clauses(3, [vec![1, 2], vec![-3]]).unwrap();
        let mut oracle = Oracle::new(&cnf).unwrap();
        let sample = one_wise(&mut oracle, None, CoverStrategy::Negative, None).unwrap();

        check_against_brute_force(&cnf, &sample, CoverStrategy::Negative);
        assert_eq!(sample.configurations.len(), 2);
        assert!(sample.uncoverable.is_empty());
    }

    #[test]
    fn test_positive_cover_reports_dead_variables() {
        let cnf = Cnf::from_clauses(3, [vec![-3], vec![-1, -2]]).unwrap();
        let mut oracle = Oracle::new(&cnf).unwrap();
        let sample = one_wise(&mut oracle, None, CoverStrategy::Positive, None).unwrap();

        check_against_brute_force(&cnf, &sample, CoverStrategy::Positive);
        assert_eq!(sample.uncoverable, vec![3]);
        assert_eq!(sample.configurations.len(), 2);
    }

    #[test]
    fn test_selected_variables_only() {
        let cnf = Cnf::from_clauses(4, [vec![1, 2, 3, 4]]).unwrap();
        let mut oracle = Oracle::new(&cnf).unwrap();
        let sample = one_wise(&mut oracle, Some(&[2, 2, 9, 0]), CoverStrategy::Positive, None).unwrap();

        assert_eq!(sample.configurations.len(), 1);
        assert!(sample.configurations[0].literals().contains(&2));
    }

    #[test]
    fn test_stack_and_strategy_are_restored() {
        let cnf = Cnf::from_clauses(3, [vec![-1, 2], vec![2, 3]]).unwrap();
        let mut oracle = Oracle::new(&cnf).unwrap();
        oracle.assumptions_mut().push(1);
        let sample = one_wise(&mut oracle, None, CoverStrategy::Negative, None).unwrap();

        assert_eq!(oracle.assumptions().as_slice(), &[1]);
        assert_eq!(oracle.selection_strategy(), &SelectionStrategy::Original);
        assert_eq!(sample.uncoverable, vec![1, 2]);
        assert!(sample.configurations.iter().all(|c| c.literals().contains(&1)));
    }

    #[test]
    fn test_unsatisfiable() {
        let cnf = Cnf::from_clauses(1, [vec![1], vec![-1]]).unwrap();
        let mut oracle = Oracle::new(&cnf).unwrap();
        let err = one_wise(&mut oracle, None, CoverStrategy::Positive, None).unwrap_err();
        assert!(matches!(err, SamplerError::Unsatisfiable));
    }

    #[test]
    fn test_models_are_cached() {
        let cnf = Cnf::from_clauses(3, [vec![-1, -2], vec![-2, -3]]).unwrap();
        let mut oracle = Oracle::new(&cnf).unwrap();
        let mut cache = SolutionCache::new(16);
        let sample = one_wise(&mut oracle, None, CoverStrategy::Positive, Some(&mut cache)).unwrap();

        for configuration in &sample.configurations {
            assert!(cache.contains(configuration.literals()));
        }
    }

    #[test]
    fn test_matches_brute_force() {
        let mut rng = fastrand::Rng::with_seed(21);
        for round in 0..120 {
            let num_clauses = rng.usize(2..12);
            let cnf = random_cnf(&mut rng, 7, num_clauses, 3);
            let strategy = if round % 2 == 0 {
                CoverStrategy::Positive
            } else {
                CoverStrategy::Negative
            };
            let mut oracle = Oracle::new(&cnf).unwrap();
            let result = one_wise(&mut oracle, None, strategy, None);
            if all_models(&cnf).is_empty() {
                assert!(result.is_err());
                continue;
            }
            let sample = result.unwrap();
            assert!(sample.undecided.is_empty());
            assert!(sample.configurations.len() <= 7);
            check_against_brute_force(&cnf, &sample, strategy);
            assert!(oracle.assumptions().is_empty());
        }
    }

    #[test]
    fn test_zero_timeout_drops_variables_as_undecided() {
        let mut rng = fastrand::Rng::with_seed(8);
        for round in 0..80 {
            let num_clauses = rng.usize(4..14);
            let cnf = random_cnf(&mut rng, 6, num_clauses, 3);
            if all_models(&cnf).is_empty() {
                continue;
            }
            let strategy = if round % 2 == 0 {
                CoverStrategy::Positive
            } else {
                CoverStrategy::Negative
            };
            let mut oracle = Oracle::new(&cnf).unwrap();
            oracle.set_timeout(Some(Duration::ZERO));
            let sample = one_wise(&mut oracle, None, strategy, None).unwrap();

            check_against_brute_force(&cnf, &sample, strategy);
            assert!(oracle.assumptions().is_empty());
        }
    }
}
