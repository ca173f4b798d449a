#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Atomic-set inference.
//!
//! An atomic set is a maximal group of literals that are true together in every model.
//! The first group holds the core and dead literals. Every other variable lands in
//! exactly one of the remaining groups, each group led by the lowest variable in it.
//!
//! Pairs are filtered against a bounded history of models before the solver is asked:
//! one model in which `x` and `y` do not move together rules the pair out.

use crate::analysis::backbone::remember;
use crate::sat::literal::Variable;
use crate::sat::literal_list::LiteralList;
use crate::sat::model::{Model, reset_conflicts};
use crate::sat::oracle::{Oracle, SatResult};
use crate::sat::selection::SelectionStrategy;
use crate::sat::solution_cache::SolutionCache;
use tracing::{debug, warn};

/// Number of models kept for pair filtering.
const HISTORY_LIMIT: usize = 1000;

/// Result of [`atomic_sets`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AtomicSets {
    /// Core/dead literals first, then one group per remaining atomic set.
    pub groups: Vec<LiteralList>,
    /// Variables for which at least one solver call timed out.
    pub undecided: Vec<Variable>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Open,
    /// Implied by the current leader in one direction.
    Candidate,
    Done,
}

/// Partitions the variables of the oracle's formula into atomic sets.
///
/// The assumption stack is restored before returning. An unsatisfiable formula yields
/// no groups; if already the first solver call times out, there are no groups either
/// and every variable is undecided.
pub fn atomic_sets(
    oracle: &mut Oracle,
    rng: &mut fastrand::Rng,
    mut cache: Option<&mut SolutionCache>,
) -> AtomicSets {
    let mut scope = oracle.scope();
    let previous_strategy = scope.selection_strategy().clone();
    let mut undecided = Vec::new();

    scope.set_selection_strategy(SelectionStrategy::Positive);
    let model1 = match scope.solve() {
        SatResult::Satisfiable(model) => model,
        SatResult::Unsatisfiable => {
            scope.set_selection_strategy(previous_strategy);
            return AtomicSets::default();
        }
        SatResult::Timeout => {
            scope.set_selection_strategy(previous_strategy);
            warn!("first solver call timed out, every variable is undecided");
            return AtomicSets {
                groups: Vec::new(),
                undecided: (1..=scope.num_vars())
                    .filter_map(|v| Variable::try_from(v).ok())
                    .collect(),
            };
        }
    };
    remember(&mut cache, &model1);
    scope.remember_solution_history(HISTORY_LIMIT);

    scope.set_selection_strategy(SelectionStrategy::Negative);
    let model2 = scope.find_solution().unwrap_or_else(|| model1.clone());
    remember(&mut cache, &model2);
    scope.set_selection_strategy(SelectionStrategy::Positive);

    let n = model1.len();
    let mut status = vec![Status::Open; n];
    let mut reference = model1.clone();
    reset_conflicts(&mut reference, &model2);

    for i in 0..n {
        let x = reference[i];
        if x == 0 {
            continue;
        }
        scope.assumptions_mut().push(-x);
        match scope.solve() {
            SatResult::Unsatisfiable => {
                status[i] = Status::Done;
                scope.assumptions_mut().replace_last(x);
            }
            SatResult::Timeout => {
                scope.assumptions_mut().pop();
                undecided.push(x.unsigned_abs());
            }
            SatResult::Satisfiable(model) => {
                scope.assumptions_mut().pop();
                reset_conflicts(&mut reference, &model);
                remember(&mut cache, &model);
                scope.shuffle_order(rng);
            }
        }
    }
    let mut forced = scope.assumptions().as_slice().to_vec();

    scope.set_selection_strategy(SelectionStrategy::Random { seed: rng.u64(..) });
    let mut groups = partition(
        &mut scope,
        &model1,
        &mut status,
        rng,
        &mut cache,
        &mut undecided,
        &mut forced,
    );
    groups.insert(0, LiteralList::new(forced));

    scope.remember_solution_history(0);
    scope.set_selection_strategy(previous_strategy);
    if !undecided.is_empty() {
        warn!(count = undecided.len(), "atomic-set tests timed out");
    }
    undecided.sort_unstable();
    undecided.dedup();
    debug!(groups = groups.len(), "atomic-set analysis finished");
    AtomicSets { groups, undecided }
}

/// Groups the open variables leader by leader, starting at the lowest one.
///
/// A leader whose negation turns out to be unsatisfiable is forced. That can only
/// happen after its earlier test timed out. It is moved to `forced`, stays pushed for
/// the later leaders and its candidates are reopened.
fn partition(
    oracle: &mut Oracle,
    model1: &[i32],
    status: &mut [Status],
    rng: &mut fastrand::Rng,
    cache: &mut Option<&mut SolutionCache>,
    undecided: &mut Vec<Variable>,
    forced: &mut Vec<i32>,
) -> Vec<LiteralList> {
    let mut scope = oracle.scope();
    let n = model1.len();
    let mut fixed = scope.assumptions().len();
    let mut groups = Vec::new();

    for i in 0..n {
        if status[i] != Status::Open {
            continue;
        }
        status[i] = Status::Done;

        let mut x_model: Model = model1.to_vec();
        let mx0 = x_model[i];
        scope.assumptions_mut().push(mx0);

        for j in i + 1..n {
            let my0 = x_model[j];
            if my0 == 0 || status[j] != Status::Open {
                continue;
            }
            let linked = scope
                .solution_history()
                .all(|s| (mx0 == s[i]) == (my0 == s[j]));
            if !linked {
                continue;
            }

            scope.assumptions_mut().push(-my0);
            match scope.solve() {
                SatResult::Unsatisfiable => status[j] = Status::Candidate,
                SatResult::Timeout => undecided.push(my0.unsigned_abs()),
                SatResult::Satisfiable(model) => {
                    reset_conflicts(&mut x_model, &model);
                    remember(cache, &model);
                    scope.shuffle_order(rng);
                }
            }
            scope.assumptions_mut().pop();
        }

        scope.assumptions_mut().pop();
        scope.assumptions_mut().push(-mx0);

        match scope.solve() {
            SatResult::Unsatisfiable => {
                reopen_candidates(&mut status[i + 1..]);
                scope.assumptions_mut().replace_last(mx0);
                fixed += 1;
                forced.push(mx0);
                undecided.retain(|&v| v != mx0.unsigned_abs());
                continue;
            }
            SatResult::Timeout => {
                reopen_candidates(&mut status[i + 1..]);
                undecided.push(mx0.unsigned_abs());
            }
            SatResult::Satisfiable(model) => {
                remember(cache, &model);
                x_model = model;
            }
        }

        for j in i + 1..n {
            if status[j] != Status::Candidate {
                continue;
            }
            let my0 = x_model[j];
            // The candidate must flip along with the leader.
            if my0 == 0 || my0 == model1[j] {
                status[j] = Status::Open;
                continue;
            }
            scope.assumptions_mut().push(-my0);
            match scope.solve() {
                SatResult::Unsatisfiable => {
                    status[j] = Status::Done;
                    scope.assumptions_mut().replace_last(my0);
                }
                SatResult::Timeout => {
                    status[j] = Status::Open;
                    scope.assumptions_mut().pop();
                    undecided.push(my0.unsigned_abs());
                }
                SatResult::Satisfiable(model) => {
                    status[j] = Status::Open;
                    reset_conflicts(&mut x_model, &model);
                    remember(cache, &model);
                    scope.shuffle_order(rng);
                    scope.assumptions_mut().pop();
                }
            }
        }

        let len = scope.assumptions().len();
        groups.push(LiteralList::from(scope.assumptions().range(fixed, len)));
        scope.assumptions_mut().clear_to(fixed);
    }

    groups
}

fn reopen_candidates(status: &mut [Status]) {
    for s in status {
        if *s == Status::Candidate {
            *s = Status::Open;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::cnf::Cnf;
    use crate::test_util::{all_models, random_cnf};
    use std::time::Duration;

    fn sets_of(cnf: &Cnf) -> AtomicSets {
        let mut oracle = Oracle::new(cnf).unwrap();
        let sets = atomic_sets(&mut oracle, &mut fastrand::Rng::with_seed(3), None);
        assert!(oracle.assumptions().is_empty());
        sets
    }

    #[test]
    fn test_equivalent_variables() {
        // 1 <-> 2, 3 free, 4 dead.
        let cnf = Cnf::from_clauses(4, [vec![-1, 2], vec![1, -2], vec![-4]]).unwrap();
        let sets = sets_of(&cnf);
        assert_eq!(sets.groups[0].literals(), &[-4]);
        assert_eq!(sets.groups.len(), 3);
        assert!(sets.groups[1..].iter().any(|g| g.variables().collect::<Vec<_>>() == vec![1, 2]));
        assert!(sets.groups[1..].iter().any(|g| g.variables().collect::<Vec<_>>() == vec![3]));
    }

    #[test]
    fn test_opposite_polarity() {
        // 1 <-> -2
        let cnf = Cnf::from_clauses(2, [vec![1, 2], vec![-1, -2]]).unwrap();
        let sets = sets_of(&cnf);
        assert!(sets.groups[0].is_empty());
        assert_eq!(sets.groups.len(), 2);
        let group = &sets.groups[1];
        assert_eq!(group.len(), 2);
        assert!(group.literals() == [-1, 2] || group.literals() == [1, -2]);
    }

    #[test]
    fn test_unsatisfiable_has_no_groups() {
        let cnf = Cnf::from_clauses(1, [vec![1], vec![-1]]).unwrap();
        assert!(sets_of(&cnf).groups.is_empty());
    }

    #[test]
    fn test_groups_partition_and_agree_with_models() {
        let mut rng = fastrand::Rng::with_seed(9);
        for _ in 0..60 {
            let num_clauses = rng.usize(2..10);
            let cnf = random_cnf(&mut rng, 6, num_clauses, 2);
            let models = all_models(&cnf);
            if models.is_empty() {
                continue;
            }
            let sets = sets_of(&cnf);

            let mut vars: Vec<u32> = sets.groups.iter().flat_map(LiteralList::variables).collect();
            vars.sort_unstable();
            assert_eq!(vars, (1..=6).collect::<Vec<_>>());

            for group in &sets.groups[1..] {
                for m in &models {
                    let first = m.contains(&group[0]);
                    assert!(group.iter().all(|l| m.contains(l) == first));
                }
            }
            for &l in &sets.groups[0] {
                assert!(models.iter().all(|m| m.contains(&l)));
            }
        }
    }

    #[test]
    fn test_forced_leader_joins_forced_literals() {
        // 1 is forced, but only by case analysis on 2.
        let cnf = Cnf::from_clauses(2, [vec![1, 2], vec![1, -2]]).unwrap();
        let mut oracle = Oracle::new(&cnf).unwrap();
        let model = oracle.find_solution().unwrap();
        let mut status = vec![Status::Open; 2];
        let mut undecided = vec![1];
        let mut forced = Vec::new();

        let groups = partition(
            &mut oracle,
            &model,
            &mut status,
            &mut fastrand::Rng::with_seed(3),
            &mut None,
            &mut undecided,
            &mut forced,
        );

        assert_eq!(forced, vec![1]);
        assert!(undecided.is_empty());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].variables().collect::<Vec<_>>(), vec![2]);
        assert!(oracle.assumptions().is_empty());
    }

    #[test]
    fn test_zero_timeout_keeps_groups_sound() {
        let mut rng = fastrand::Rng::with_seed(21);
        let mut saw_undecided = false;
        for _ in 0..60 {
            let num_clauses = rng.usize(3..12);
            let cnf = random_cnf(&mut rng, 6, num_clauses, 3);
            let models = all_models(&cnf);
            if models.is_empty() {
                continue;
            }
            let mut oracle = Oracle::new(&cnf).unwrap();
            oracle.set_timeout(Some(Duration::ZERO));
            let sets = atomic_sets(&mut oracle, &mut fastrand::Rng::with_seed(3), None);
            assert!(oracle.assumptions().is_empty());
            saw_undecided |= !sets.undecided.is_empty();

            if sets.groups.is_empty() {
                assert_eq!(sets.undecided, (1..=6).collect::<Vec<_>>());
                continue;
            }
            let mut vars: Vec<u32> = sets.groups.iter().flat_map(LiteralList::variables).collect();
            vars.sort_unstable();
            assert_eq!(vars, (1..=6).collect::<Vec<_>>());
            for &l in &sets.groups[0] {
                assert!(models.iter().all(|m| m.contains(&l)));
            }
            for group in &sets.groups[1..] {
                for m in &models {
                    let first = m.contains(&group[0]);
                    assert!(group.iter().all(|l| m.contains(l) == first));
                }
            }
        }
        assert!(saw_undecided);
    }
}
