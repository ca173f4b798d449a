#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Random configurations, used to warm up the solution cache.

use crate::sat::model::Model;
use crate::sat::oracle::{Oracle, SatResult};
use crate::sat::selection::SelectionStrategy;
use tracing::debug;

/// Draws up to `count` models with random polarities and a freshly shuffled variable
/// order per model. Duplicates are possible.
///
/// Stops early if the formula turns out to be unsatisfiable. Timed out calls count
/// towards `count` without producing a model.
pub fn random_configurations(oracle: &mut Oracle, count: usize, rng: &mut fastrand::Rng) -> Vec<Model> {
    let previous_strategy = oracle.selection_strategy().clone();
    oracle.set_selection_strategy(SelectionStrategy::Random { seed: rng.u64(..) });

    let mut models = Vec::with_capacity(count);
    for _ in 0..count {
        oracle.shuffle_order(rng);
        match oracle.solve() {
            SatResult::Satisfiable(model) => models.push(model),
            SatResult::Unsatisfiable => break,
            SatResult::Timeout => {}
        }
    }

    oracle.set_selection_strategy(previous_strategy);
    oracle.set_order_fix();
    debug!(requested = count, found = models.len(), "random sampling finished");
    models
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::cnf::Cnf;

    #[test]
    fn test_models_are_valid_and_varied() {
        let cnf = Cnf::from_clauses(6, [vec![1, 2], vec![-3, 4], vec![-5, -6]]).unwrap();
        let mut oracle = Oracle::new(&cnf).unwrap();
        let models = random_configurations(&mut oracle, 20, &mut fastrand::Rng::with_seed(4));

        assert_eq!(models.len(), 20);
        assert!(models.iter().all(|m| cnf.verify(m)));
        let distinct: std::collections::BTreeSet<&Model> = models.iter().collect();
        assert!(distinct.len() > 1);
        assert_eq!(oracle.selection_strategy(), &SelectionStrategy::Original);
    }

    #[test]
    fn test_unsatisfiable_stops() {
        let cnf = Cnf::from_clauses(1, [vec![1], vec![-1]]).unwrap();
        let mut oracle = Oracle::new(&cnf).unwrap();
        assert!(random_configurations(&mut oracle, 5, &mut fastrand::Rng::with_seed(4)).is_empty());
    }

    #[test]
    fn test_same_seed_same_models() {
        let cnf = Cnf::from_clauses(5, [vec![1, 2, 3], vec![-4, 5]]).unwrap();
        let draw = || {
            let mut oracle = Oracle::new(&cnf).unwrap();
            random_configurations(&mut oracle, 8, &mut fastrand::Rng::with_seed(12))
        };
        assert_eq!(draw(), draw());
    }
}
