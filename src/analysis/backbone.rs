#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Core and dead literal inference.
//!
//! Two models that disagree on a variable prove it is not forced. Starting from a model
//! and a second model steered towards the opposite polarities, only the variables on
//! which both agree remain candidates. Each candidate is tested by assuming its
//! negation:
//!
//! - unsatisfiable: the literal is forced. The negated assumption is replaced by the
//!   literal itself and stays on the stack, shrinking the following searches.
//! - satisfiable: the new model removes every candidate it disagrees with.
//! - timeout: the candidate is skipped and reported as undecided.

use crate::error::{Result, SamplerError};
use crate::sat::literal::Variable;
use crate::sat::literal_list::LiteralList;
use crate::sat::model::reset_conflicts;
use crate::sat::oracle::{Oracle, SatResult};
use crate::sat::selection::SelectionStrategy;
use crate::sat::solution_cache::SolutionCache;
use tracing::{debug, warn};

/// Result of [`core_dead`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Backbone {
    /// Core (positive) and dead (negative) literals.
    pub literals: LiteralList,
    /// Variables whose test timed out.
    pub undecided: Vec<Variable>,
}

/// Computes the core and dead literals of the oracle's formula under its current
/// assumptions.
///
/// The forced literals are left pushed on the assumption stack. Every model found on
/// the way is added to `cache`.
///
/// # Errors
///
/// `SamplerError::Unsatisfiable` if the formula has no model under the current
/// assumptions.
pub fn core_dead(
    oracle: &mut Oracle,
    rng: &mut fastrand::Rng,
    mut cache: Option<&mut SolutionCache>,
) -> Result<Backbone> {
    let previous_strategy = oracle.selection_strategy().clone();

    let mut reference = match oracle.solve() {
        SatResult::Satisfiable(model) => model,
        SatResult::Unsatisfiable => return Err(SamplerError::Unsatisfiable),
        SatResult::Timeout => {
            warn!("first solver call timed out, every variable is undecided");
            return Ok(Backbone {
                literals: LiteralList::default(),
                undecided: (1..=oracle.num_vars())
                    .filter_map(|v| Variable::try_from(v).ok())
                    .collect(),
            });
        }
    };
    remember(&mut cache, &reference);

    oracle.set_selection_strategy(SelectionStrategy::InverseFixed(reference.clone()));
    if let SatResult::Satisfiable(model) = oracle.solve() {
        reset_conflicts(&mut reference, &model);
        remember(&mut cache, &model);
    }

    let mut found = Vec::new();
    let mut undecided = Vec::new();
    for i in 0..reference.len() {
        let literal = reference[i];
        if literal == 0 {
            continue;
        }
        oracle.assumptions_mut().push(-literal);
        match oracle.solve() {
            SatResult::Unsatisfiable => {
                oracle.assumptions_mut().replace_last(literal);
                found.push(literal);
            }
            SatResult::Timeout => {
                oracle.assumptions_mut().pop();
                undecided.push(literal.unsigned_abs());
            }
            SatResult::Satisfiable(model) => {
                oracle.assumptions_mut().pop();
                reset_conflicts(&mut reference, &model);
                remember(&mut cache, &model);
                oracle.shuffle_order(rng);
            }
        }
    }

    oracle.set_selection_strategy(previous_strategy);
    debug!(
        forced = found.len(),
        undecided = undecided.len(),
        "core/dead analysis finished"
    );
    Ok(Backbone {
        literals: LiteralList::new(found),
        undecided,
    })
}

pub(crate) fn remember(cache: &mut Option<&mut SolutionCache>, model: &[i32]) {
    if let Some(cache) = cache.as_deref_mut() {
        cache.insert(model);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::cnf::Cnf;
    use crate::test_util::{all_models, random_cnf};
    use std::time::Duration;

    fn backbone_of(cnf: &Cnf) -> Backbone {
        let mut oracle = Oracle::new(cnf).unwrap();
        core_dead(&mut oracle, &mut fastrand::Rng::with_seed(1), None).unwrap()
    }

    #[test]
    fn test_no_forced_literals() {
        let cnf = Cnf::from_clauses(3, [vec![1, 2], vec![-1, 3]]).unwrap();
        let backbone = backbone_of(&cnf);
        assert!(backbone.literals.is_empty());
        assert!(backbone.undecided.is_empty());
    }

    #[test]
    fn test_forced_chain() {
        let cnf = Cnf::from_clauses(2, [vec![1], vec![-1, 2]]).unwrap();
        assert_eq!(backbone_of(&cnf).literals.literals(), &[1, 2]);
    }

    #[test]
    fn test_forced_literals_stay_pushed() {
        let cnf = Cnf::from_clauses(3, [vec![-3], vec![1, 2]]).unwrap();
        let mut oracle = Oracle::new(&cnf).unwrap();
        {
            let mut scope = oracle.scope();
            let backbone = core_dead(&mut scope, &mut fastrand::Rng::with_seed(1), None).unwrap();
            assert_eq!(backbone.literals.literals(), &[-3]);
            assert_eq!(scope.assumptions().as_slice(), &[-3]);
        }
        assert!(oracle.assumptions().is_empty());
    }

    #[test]
    fn test_unsatisfiable() {
        let cnf = Cnf::from_clauses(1, [vec![1], vec![-1]]).unwrap();
        let mut oracle = Oracle::new(&cnf).unwrap();
        let err = core_dead(&mut oracle, &mut fastrand::Rng::with_seed(1), None).unwrap_err();
        assert!(matches!(err, SamplerError::Unsatisfiable));
    }

    #[test]
    fn test_models_are_cached() {
        let cnf = Cnf::from_clauses(3, [vec![1, 2]]).unwrap();
        let mut oracle = Oracle::new(&cnf).unwrap();
        let mut cache = SolutionCache::new(16);
        core_dead(&mut oracle, &mut fastrand::Rng::with_seed(1), Some(&mut cache)).unwrap();
        assert!(cache.len() >= 2);
        assert!(cache.iter().all(|(_, m)| cnf.verify(m)));
    }

    #[test]
    fn test_matches_brute_force() {
        let mut rng = fastrand::Rng::with_seed(5);
        for _ in 0..100 {
            let num_clauses = rng.usize(3..12);
            let cnf = random_cnf(&mut rng, 7, num_clauses, 3);
            let models = all_models(&cnf);
            let mut oracle = Oracle::new(&cnf).unwrap();
            let result = core_dead(&mut oracle, &mut rng, None);
            if models.is_empty() {
                assert!(result.is_err());
                continue;
            }
            let expected: Vec<i32> = (0..7)
                .map(|i| models[0][i])
                .filter(|&l| models.iter().all(|m| m.contains(&l)))
                .collect();
            assert_eq!(result.unwrap().literals.literals(), expected.as_slice());
        }
    }

    #[test]
    fn test_timeout_keeps_proven_literals() {
        // 1 is forced through a conflict, 3 by a unit clause.
        let cnf = Cnf::from_clauses(3, [vec![1, 2], vec![1, -2], vec![3]]).unwrap();
        let mut oracle = Oracle::new(&cnf).unwrap();
        oracle.set_selection_strategy(SelectionStrategy::Positive);
        oracle.set_timeout(Some(Duration::ZERO));

        let backbone = core_dead(&mut oracle, &mut fastrand::Rng::with_seed(1), None).unwrap();
        assert_eq!(backbone.literals.literals(), &[3]);
        assert_eq!(backbone.undecided, vec![1]);
        assert_eq!(oracle.selection_strategy(), &SelectionStrategy::Positive);

        oracle.set_timeout(None);
        oracle.assumptions_mut().clear();
        let backbone = core_dead(&mut oracle, &mut fastrand::Rng::with_seed(1), None).unwrap();
        assert_eq!(backbone.literals.literals(), &[1, 3]);
        assert!(backbone.undecided.is_empty());
    }

    #[test]
    fn test_first_call_timeout_leaves_everything_undecided() {
        let cnf = Cnf::from_clauses(2, [vec![1, 2], vec![1, -2]]).unwrap();
        let mut oracle = Oracle::new(&cnf).unwrap();
        oracle.set_selection_strategy(SelectionStrategy::Negative);
        oracle.set_timeout(Some(Duration::ZERO));

        let backbone = core_dead(&mut oracle, &mut fastrand::Rng::with_seed(1), None).unwrap();
        assert!(backbone.literals.is_empty());
        assert_eq!(backbone.undecided, vec![1, 2]);
        assert!(oracle.assumptions().is_empty());
    }

    #[test]
    fn test_zero_timeout_never_claims_free_literals() {
        let mut rng = fastrand::Rng::with_seed(17);
        for _ in 0..80 {
            let num_clauses = rng.usize(3..12);
            let cnf = random_cnf(&mut rng, 7, num_clauses, 3);
            let models = all_models(&cnf);
            if models.is_empty() {
                continue;
            }
            let mut oracle = Oracle::new(&cnf).unwrap();
            oracle.set_timeout(Some(Duration::ZERO));
            let backbone = core_dead(&mut oracle, &mut rng, None).unwrap();
            for &l in &backbone.literals {
                assert!(models.iter().all(|m| m.contains(&l)));
            }
            for v in &backbone.undecided {
                assert!(!backbone.literals.variables().any(|w| w == *v));
            }
        }
    }
}
