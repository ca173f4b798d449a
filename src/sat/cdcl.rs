#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Conflict-driven clause learning engine.
//!
//! The engine is incremental: clauses can be added between calls to [`Cdcl::solve`],
//! and every call takes its own list of assumptions. Learnt clauses survive across
//! calls since they are implied by the clause database alone.
//!
//! Assumptions are decided first, one decision level each. An assumption that is
//! already true opens an empty level so that level `i` always belongs to assumption
//! `i`; an assumption that is already false ends the call with
//! [`SolveStatus::Unsat`].

use crate::sat::assignment::Assignment;
use crate::sat::clause::Clause;
use crate::sat::conflict_analysis::{Analyser, Conflict};
use crate::sat::literal::{DoubleLiteral, Literal, Variable};
use crate::sat::restarter::{Luby, Restarter};
use crate::sat::selection::{Brancher, SelectionStrategy};
use crate::sat::trail::{Reason, Trail};
use crate::sat::watch::WatchedLiterals;
use std::time::Instant;

/// Decisions between two deadline checks.
const DEADLINE_CHECK_INTERVAL: usize = 1024;

/// Result of a single engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveStatus {
    /// A model was found; read it with `model`.
    Sat,
    /// No model under the assumptions.
    Unsat,
    /// The deadline passed before the call finished.
    Interrupted,
}

/// Counters accumulated over the lifetime of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolveStats {
    /// Calls to `solve`.
    pub solves: usize,
    /// Conflicts found during search.
    pub conflicts: usize,
    /// Branching decisions, assumptions excluded.
    pub decisions: usize,
    /// Literals assigned by unit propagation.
    pub propagations: usize,
    /// Restarts triggered by the restart policy.
    pub restarts: usize,
    /// Clauses learnt from conflicts.
    pub learnt_clauses: usize,
    /// Learnt clauses dropped by database reduction.
    pub removed_clauses: usize,
}

/// Conflict-driven clause-learning engine solving under assumptions.
#[derive(Debug, Clone)]
pub struct Cdcl<R: Restarter = Luby<100>> {
    num_vars: usize,
    assignment: Assignment,
    trail: Trail<DoubleLiteral>,
    clauses: Vec<Clause>,
    free_slots: Vec<usize>,
    watches: WatchedLiterals,
    analyser: Analyser,
    brancher: Brancher,
    restarter: R,
    num_learnts: usize,
    max_learnts: usize,
    ok: bool,
    model: Vec<i32>,
    stats: SolveStats,
}

impl<R: Restarter> Cdcl<R> {
    /// An empty clause database over `num_vars` variables.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            num_vars,
            assignment: Assignment::new(num_vars),
            trail: Trail::new(num_vars),
            clauses: Vec::new(),
            free_slots: Vec::new(),
            watches: WatchedLiterals::new(num_vars),
            analyser: Analyser::new(num_vars),
            brancher: Brancher::new(num_vars),
            restarter: R::new(),
            num_learnts: 0,
            max_learnts: 0,
            ok: true,
            model: Vec::new(),
            stats: SolveStats::default(),
        }
    }

    /// Number of variables.
    #[must_use]
    pub const fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// `false` once the clause database is known to be unsatisfiable.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.ok
    }

    /// Counters since creation.
    #[must_use]
    pub const fn stats(&self) -> &SolveStats {
        &self.stats
    }

    /// Model of the last satisfiable call (empty otherwise).
    #[must_use]
    pub fn model(&self) -> &[i32] {
        &self.model
    }

    /// Active polarity strategy.
    #[must_use]
    pub const fn strategy(&self) -> &SelectionStrategy {
        self.brancher.strategy()
    }

    /// Installs a polarity strategy for the following calls.
    pub fn set_strategy(&mut self, strategy: SelectionStrategy) {
        self.brancher.set_strategy(strategy);
    }

    /// Fixed variable order used by the non-default strategies.
    #[must_use]
    pub fn order(&self) -> &[Variable] {
        self.brancher.order()
    }

    /// Replaces the fixed variable order.
    pub fn set_order(&mut self, order: Vec<Variable>) {
        self.brancher.set_order(self.num_vars, order);
    }

    /// Shuffles the fixed variable order.
    pub fn shuffle_order(&mut self, rng: &mut fastrand::Rng) {
        self.brancher.shuffle_order(rng);
    }

    /// Adds a clause of DIMACS literals.
    ///
    /// Literals must be within `1..=num_vars`. Tautologies are ignored.
    ///
    /// # Returns
    /// `false` if the clause database became unsatisfiable.
    pub fn add_clause(&mut self, literals: &[i32]) -> bool {
        if !self.ok {
            return false;
        }
        self.backtrack(0);

        let mut lits: Vec<DoubleLiteral> = literals.iter().map(|&l| DoubleLiteral::from(l)).collect();
        lits.sort_unstable();
        lits.dedup();
        if lits.windows(2).any(|w| w[0].variable() == w[1].variable()) {
            return true;
        }
        if lits
            .iter()
            .any(|&l| self.assignment.literal_value(l) == Some(true))
        {
            return true;
        }
        lits.retain(|&l| self.assignment.literal_value(l).is_none());

        match lits.len() {
            0 => self.ok = false,
            1 => {
                self.enqueue(lits[0], Reason::Unit);
                if self.propagate().is_some() {
                    self.ok = false;
                }
            }
            _ => {
                let idx = self.store(Clause::new(lits));
                self.watches.add_clause(&self.clauses[idx], idx);
            }
        }
        self.ok
    }

    /// Searches for a model extending `assumptions`.
    ///
    /// The engine is back at level 0 when the call returns. On [`SolveStatus::Sat`]
    /// the model is available through [`Cdcl::model`].
    pub fn solve(&mut self, assumptions: &[i32], deadline: Option<Instant>) -> SolveStatus {
        self.stats.solves += 1;
        self.model.clear();
        if !self.ok {
            return SolveStatus::Unsat;
        }
        self.backtrack(0);
        if self.propagate().is_some() {
            self.ok = false;
            return SolveStatus::Unsat;
        }
        if self.max_learnts == 0 {
            self.max_learnts = (self.clauses.len() / 3).max(1000);
        }

        let assumptions: Vec<DoubleLiteral> = assumptions.iter().map(|&l| DoubleLiteral::from(l)).collect();
        let mut decisions_since_check = 0_usize;

        loop {
            if let Some(conflict) = self.propagate() {
                self.stats.conflicts += 1;
                if self.trail.decision_level() == 0 {
                    self.ok = false;
                    return SolveStatus::Unsat;
                }
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    self.backtrack(0);
                    return SolveStatus::Interrupted;
                }

                match self.analyser.analyse(&self.clauses, &self.trail, conflict) {
                    Conflict::Ground => {
                        self.backtrack(0);
                        self.ok = false;
                        return SolveStatus::Unsat;
                    }
                    Conflict::Unit(lit) => {
                        self.backtrack(0);
                        self.enqueue(lit, Reason::Unit);
                    }
                    Conflict::Learned {
                        clause,
                        backtrack_level,
                    } => {
                        self.backtrack(backtrack_level);
                        let asserting = clause[0];
                        let idx = self.store(clause);
                        self.watches.add_clause(&self.clauses[idx], idx);
                        self.num_learnts += 1;
                        self.stats.learnt_clauses += 1;
                        self.enqueue(asserting, Reason::Clause(idx));
                    }
                }
                self.brancher.on_conflict(&self.analyser.to_bump);

                if self.restarter.should_restart() {
                    self.stats.restarts += 1;
                    self.backtrack(0);
                    if self.num_learnts > self.max_learnts {
                        self.reduce_db();
                    }
                }
                continue;
            }

            let level = self.trail.decision_level();
            if let Some(&assumption) = assumptions.get(level) {
                match self.assignment.literal_value(assumption) {
                    Some(true) => self.trail.new_decision_level(),
                    Some(false) => {
                        self.backtrack(0);
                        return SolveStatus::Unsat;
                    }
                    None => {
                        self.trail.new_decision_level();
                        self.enqueue(assumption, Reason::Decision);
                    }
                }
                continue;
            }

            decisions_since_check += 1;
            if decisions_since_check >= DEADLINE_CHECK_INTERVAL {
                decisions_since_check = 0;
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    self.backtrack(0);
                    return SolveStatus::Interrupted;
                }
            }

            match self.brancher.decide(&self.assignment) {
                None => {
                    self.model = self.assignment.model();
                    self.backtrack(0);
                    return SolveStatus::Sat;
                }
                Some(lit) => {
                    self.stats.decisions += 1;
                    self.trail.new_decision_level();
                    self.enqueue(lit, Reason::Decision);
                }
            }
        }
    }

    fn enqueue(&mut self, lit: DoubleLiteral, reason: Reason) {
        self.assignment.assign(lit);
        self.trail.push(lit, reason);
    }

    fn backtrack(&mut self, level: usize) {
        let brancher = &mut self.brancher;
        self.trail
            .backstep_to(&mut self.assignment, level, |lit| brancher.on_unassign(lit));
    }

    fn store(&mut self, clause: Clause) -> usize {
        if let Some(idx) = self.free_slots.pop() {
            self.clauses[idx] = clause;
            idx
        } else {
            self.clauses.push(clause);
            self.clauses.len() - 1
        }
    }

    /// Unit propagation over the watch lists.
    ///
    /// # Returns
    /// The index of a falsified clause, if any.
    fn propagate(&mut self) -> Option<usize> {
        while self.trail.curr_idx < self.trail.len() {
            let p = self.trail[self.trail.curr_idx].lit;
            self.trail.curr_idx += 1;
            self.stats.propagations += 1;

            let false_lit = !p;
            let mut ws = self.watches.take(false_lit);
            let mut conflict = None;
            let mut i = 0;
            let mut j = 0;

            while i < ws.len() {
                let idx = ws[i];
                i += 1;
                let clause = &mut self.clauses[idx];
                if clause.deleted {
                    continue;
                }
                if clause[0] == false_lit {
                    clause.swap(0, 1);
                }
                let first = clause[0];
                if self.assignment.literal_value(first) == Some(true) {
                    ws[j] = idx;
                    j += 1;
                    continue;
                }

                if let Some(k) = (2..clause.len())
                    .find(|&k| self.assignment.literal_value(clause[k]) != Some(false))
                {
                    clause.swap(1, k);
                    self.watches[clause[1]].push(idx);
                    continue;
                }

                ws[j] = idx;
                j += 1;
                if self.assignment.literal_value(first) == Some(false) {
                    conflict = Some(idx);
                    while i < ws.len() {
                        ws[j] = ws[i];
                        j += 1;
                        i += 1;
                    }
                } else {
                    self.assignment.assign(first);
                    self.trail.push(first, Reason::Clause(idx));
                }
            }

            ws.truncate(j);
            self.watches[false_lit] = ws;

            if conflict.is_some() {
                self.trail.curr_idx = self.trail.len();
                return conflict;
            }
        }
        None
    }

    /// Deletes the less useful half of the learnt clauses.
    ///
    /// Only called at level 0. Clauses with an LBD of at most 2 are kept.
    fn reduce_db(&mut self) {
        let mut candidates: Vec<usize> = self
            .clauses
            .iter()
            .enumerate()
            .filter(|(_, c)| c.learnt && !c.deleted && c.lbd > 2)
            .filter(|(i, c)| !self.is_locked(*i, c))
            .map(|(i, _)| i)
            .collect();
        candidates.sort_by_key(|&i| std::cmp::Reverse(self.clauses[i].lbd));

        let remove = candidates.len() / 2;
        for &idx in &candidates[..remove] {
            self.clauses[idx].delete();
            self.free_slots.push(idx);
        }
        self.num_learnts -= remove;
        self.stats.removed_clauses += remove;

        let clauses = &self.clauses;
        self.watches.retain(|idx| !clauses[idx].deleted);
        self.max_learnts += self.max_learnts / 10;
    }

    fn is_locked(&self, idx: usize, clause: &Clause) -> bool {
        let first = clause[0];
        self.trail.reason(first.variable()) == Reason::Clause(idx)
            && self.assignment.literal_value(first) == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::restarter::Never;

    fn engine(num_vars: usize, clauses: &[&[i32]]) -> Cdcl {
        let mut cdcl = Cdcl::new(num_vars);
        for c in clauses {
            cdcl.add_clause(c);
        }
        cdcl
    }

    fn satisfies(model: &[i32], clauses: &[&[i32]]) -> bool {
        clauses
            .iter()
            .all(|c| c.iter().any(|&l| model[l.unsigned_abs() as usize - 1] == l))
    }

    fn brute_force(num_vars: usize, clauses: &[&[i32]], assumptions: &[i32]) -> bool {
        (0..1_u32 << num_vars).any(|bits| {
            let model: Vec<i32> = (1..=num_vars)
                .map(|v| {
                    let v32 = i32::try_from(v).unwrap();
                    if bits & (1 << (v - 1)) == 0 { -v32 } else { v32 }
                })
                .collect();
            satisfies(&model, clauses) && assumptions.iter().all(|&a| model.contains(&a))
        })
    }

    #[test]
    fn test_simple_sat() {
        let clauses: &[&[i32]] = &[&[1, 2], &[-1, 3], &[-3, -2]];
        let mut cdcl = engine(3, clauses);
        assert_eq!(cdcl.solve(&[], None), SolveStatus::Sat);
        assert!(satisfies(cdcl.model(), clauses));
    }

    #[test]
    fn test_unit_conflict() {
        let mut cdcl = engine(1, &[&[1]]);
        assert!(!cdcl.add_clause(&[-1]));
        assert_eq!(cdcl.solve(&[], None), SolveStatus::Unsat);
        assert!(!cdcl.is_ok());
    }

    #[test]
    fn test_empty_clause() {
        let mut cdcl = engine(2, &[&[1, 2]]);
        assert!(!cdcl.add_clause(&[]));
        assert_eq!(cdcl.solve(&[], None), SolveStatus::Unsat);
    }

    #[test]
    fn test_pigeonhole_unsat() {
        // Three pigeons, two holes: p(i, h) = 2 * i + h + 1.
        let clauses: &[&[i32]] = &[
            &[1, 2],
            &[3, 4],
            &[5, 6],
            &[-1, -3],
            &[-1, -5],
            &[-3, -5],
            &[-2, -4],
            &[-2, -6],
            &[-4, -6],
        ];
        let mut cdcl = engine(6, clauses);
        assert_eq!(cdcl.solve(&[], None), SolveStatus::Unsat);
    }

    #[test]
    fn test_assumptions() {
        let clauses: &[&[i32]] = &[&[-1, 2], &[-2, 3]];
        let mut cdcl = engine(3, clauses);

        assert_eq!(cdcl.solve(&[1], None), SolveStatus::Sat);
        assert_eq!(&cdcl.model()[..3], &[1, 2, 3]);

        assert_eq!(cdcl.solve(&[1, -3], None), SolveStatus::Unsat);
        assert!(cdcl.is_ok());

        // Repeated and already implied assumptions.
        assert_eq!(cdcl.solve(&[3, 3, -1], None), SolveStatus::Sat);
        assert_eq!(cdcl.model()[0], -1);
    }

    #[test]
    fn test_expired_deadline() {
        let clauses: &[&[i32]] = &[
            &[1, 2],
            &[3, 4],
            &[5, 6],
            &[-1, -3],
            &[-1, -5],
            &[-3, -5],
            &[-2, -4],
            &[-2, -6],
            &[-4, -6],
        ];
        let mut cdcl = engine(6, clauses);
        assert_eq!(cdcl.solve(&[], Some(Instant::now())), SolveStatus::Interrupted);
        assert!(cdcl.is_ok());
    }

    #[test]
    fn test_random_formulas_against_brute_force() {
        let mut rng = fastrand::Rng::with_seed(11);
        for _ in 0..200 {
            let num_vars = 6;
            let owned: Vec<Vec<i32>> = (0..rng.usize(10..30))
                .map(|_| {
                    (0..3)
                        .map(|_| {
                            let v = rng.i32(1..=6);
                            if rng.bool() { v } else { -v }
                        })
                        .collect()
                })
                .collect();
            let clauses: Vec<&[i32]> = owned.iter().map(Vec::as_slice).collect();
            let assumptions = [rng.i32(1..=6), -rng.i32(1..=6)];

            let mut cdcl: Cdcl<Never> = Cdcl::new(num_vars);
            for c in &clauses {
                cdcl.add_clause(c);
            }
            let expected = brute_force(num_vars, &clauses, &[]);
            let status = cdcl.solve(&[], None);
            assert_eq!(status == SolveStatus::Sat, expected);
            if expected {
                assert!(satisfies(cdcl.model(), &clauses));
            }

            let expected = brute_force(num_vars, &clauses, &assumptions);
            let status = cdcl.solve(&assumptions, None);
            assert_eq!(status == SolveStatus::Sat, expected);
            if expected {
                assert!(satisfies(cdcl.model(), &clauses));
                assert!(assumptions.iter().all(|a| cdcl.model().contains(a)));
            }
        }
    }

    #[test]
    fn test_strategies_produce_models() {
        let clauses: &[&[i32]] = &[&[1, 2, 3], &[-1, -2]];
        let mut cdcl = engine(3, clauses);

        cdcl.set_strategy(SelectionStrategy::Positive);
        assert_eq!(cdcl.solve(&[], None), SolveStatus::Sat);
        assert_eq!(cdcl.model(), &[1, -2, 3]);

        cdcl.set_strategy(SelectionStrategy::Negative);
        assert_eq!(cdcl.solve(&[], None), SolveStatus::Sat);
        assert!(satisfies(cdcl.model(), clauses));
        assert_eq!(cdcl.model()[0], -1);
        assert_eq!(cdcl.model()[1], -2);
    }
}
