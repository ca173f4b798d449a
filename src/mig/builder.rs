#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Construction of a [`Mig`] from a CNF.
//!
//! The phases run in a fixed order:
//!
//! 1. satisfiability check, an unsatisfiable formula is an error;
//! 2. core/dead inference, forced literals are marked on both vertices of their variable;
//! 3. clause cleaning, clauses satisfied by a core literal are dropped and dead literals
//!    removed from the others;
//! 4. optionally, solver-backed detection of strong edges hidden in complex clauses;
//! 5. clause insertion, binary clauses become strong edges and longer clauses complex
//!    clauses, optionally skipping complex clauses implied by what was inserted before;
//! 6. optionally, transitive closure of the strong edges;
//! 7. finishing, all lists sorted and deduplicated and self-loops removed.

use crate::analysis::backbone::core_dead;
use crate::error::{Result, SamplerError};
use crate::mig::vertex::{Status, Vertex, literal_of, vertex_index};
use crate::mig::Mig;
use crate::sat::cnf::Cnf;
use crate::sat::literal_list::LiteralList;
use crate::sat::model::position;
use crate::sat::oracle::{Oracle, SatResult};
use bit_vec::BitVec;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Models kept by the oracle to filter candidate implications.
const HISTORY_LIMIT: usize = 1000;

/// Options of [`build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigConfig {
    /// Close the strong edges transitively. Expensive on large formulas.
    pub strong_closure: bool,
    /// Ask the solver for implications hidden in complex clauses.
    pub detect_strong: bool,
    /// Skip complex clauses implied by the clauses inserted before them.
    pub check_redundancy: bool,
    /// Budget of each individual solver call.
    pub timeout: Option<Duration>,
    /// Seed for the variable order shuffles between solver calls.
    pub seed: u64,
}

impl Default for MigConfig {
    fn default() -> Self {
        Self {
            strong_closure: true,
            detect_strong: false,
            check_redundancy: false,
            timeout: None,
            seed: 0,
        }
    }
}

/// Builds the implication graph of `cnf`.
///
/// # Errors
///
/// `SamplerError::Unsatisfiable` if `cnf` has no model.
pub fn build(cnf: &Cnf, config: &MigConfig) -> Result<Mig> {
    MigBuilder::new(cnf, config)?.run()
}

struct MigBuilder<'a> {
    cnf: &'a Cnf,
    config: &'a MigConfig,
    oracle: Oracle,
    rng: fastrand::Rng,
    status: Vec<Status>,
    strong: Vec<Vec<i32>>,
    complex: Vec<Vec<usize>>,
    clauses: Vec<LiteralList>,
    interned: FxHashMap<LiteralList, usize>,
    /// Forced literal of each variable, or 0.
    forced: Vec<i32>,
}

impl<'a> MigBuilder<'a> {
    fn new(cnf: &'a Cnf, config: &'a MigConfig) -> Result<Self> {
        let num_vertices = 2 * cnf.num_vars();
        let mut oracle = Oracle::new(cnf)?;
        oracle.set_timeout(config.timeout);
        oracle.remember_solution_history(HISTORY_LIMIT);
        Ok(Self {
            cnf,
            config,
            oracle,
            rng: fastrand::Rng::with_seed(config.seed),
            status: vec![Status::Normal; num_vertices],
            strong: vec![Vec::new(); num_vertices],
            complex: vec![Vec::new(); num_vertices],
            clauses: Vec::new(),
            interned: FxHashMap::default(),
            forced: vec![0; cnf.num_vars()],
        })
    }

    fn run(mut self) -> Result<Mig> {
        info!(
            variables = self.cnf.num_vars(),
            clauses = self.cnf.len(),
            "building implication graph"
        );
        self.sat_check()?;
        self.find_core_dead()?;
        let cleaned = self.clean_clauses();
        debug!(clauses = cleaned.len(), "clauses cleaned");

        if self.config.detect_strong {
            self.add_clauses(&cleaned, false)?;
            self.bfs_strong();
            self.bfs_weak();
        }
        self.add_clauses(&cleaned, self.config.check_redundancy)?;
        if self.config.strong_closure {
            self.bfs_strong();
        }

        let mig = self.finish();
        info!(
            strong_edges = mig.count_strong_edges(),
            complex_clauses = mig.all_complex_clauses().len(),
            "implication graph finished"
        );
        Ok(mig)
    }

    fn sat_check(&mut self) -> Result<()> {
        match self.oracle.solve() {
            SatResult::Unsatisfiable => Err(SamplerError::Unsatisfiable),
            SatResult::Timeout => {
                warn!("satisfiability check timed out, continuing without a witness");
                Ok(())
            }
            SatResult::Satisfiable(_) => Ok(()),
        }
    }

    /// Leaves the forced literals pushed on the oracle for the later phases.
    fn find_core_dead(&mut self) -> Result<()> {
        let backbone = core_dead(&mut self.oracle, &mut self.rng, None)?;
        if !backbone.undecided.is_empty() {
            warn!(
                count = backbone.undecided.len(),
                "core/dead tests timed out, affected variables stay normal"
            );
        }
        for &literal in &backbone.literals {
            self.mark_forced(literal);
        }
        debug!(forced = backbone.literals.len(), "core/dead literals marked");
        Ok(())
    }

    fn mark_forced(&mut self, literal: i32) {
        self.status[vertex_index(literal)] = Status::Core;
        self.status[vertex_index(-literal)] = Status::Dead;
        self.forced[position(literal)] = literal;
    }

    fn clean_clauses(&self) -> Vec<LiteralList> {
        let mut cleaned: Vec<LiteralList> = self
            .cnf
            .iter()
            .filter(|clause| !clause.iter().any(|&l| self.forced[position(l)] == l))
            .map(|clause| {
                clause
                    .iter()
                    .copied()
                    .filter(|&l| self.forced[position(l)] != -l)
                    .collect()
            })
            .collect();
        cleaned.sort_unstable_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        cleaned.dedup();
        cleaned
    }

    fn add_clauses(&mut self, clauses: &[LiteralList], check_redundancy: bool) -> Result<()> {
        self.clauses.clear();
        self.interned.clear();
        self.complex.iter_mut().for_each(Vec::clear);

        if !check_redundancy {
            for clause in clauses {
                self.add_clause(clause);
            }
            return Ok(());
        }

        let mut redundancy = Oracle::with_num_vars(self.cnf.num_vars());
        redundancy.set_timeout(self.config.timeout);
        for &literal in self.forced.iter().filter(|&&l| l != 0) {
            redundancy.add_clause(&LiteralList::new([literal]))?;
        }
        for (index, targets) in self.strong.iter().enumerate() {
            let source = literal_of(index);
            for &target in targets {
                redundancy.add_clause(&LiteralList::new([-source, target]))?;
            }
        }

        let mut removed = 0_usize;
        for clause in clauses {
            if clause.len() < 3 || !is_redundant(&mut redundancy, clause) {
                redundancy.add_clause(clause)?;
                self.add_clause(clause);
            } else {
                removed += 1;
            }
        }
        debug!(removed, "redundant complex clauses skipped");
        Ok(())
    }

    fn add_clause(&mut self, clause: &LiteralList) {
        match clause.literals() {
            [] => {}
            &[literal] => self.mark_forced(literal),
            &[a, b] => {
                self.strong[vertex_index(-a)].push(b);
                self.strong[vertex_index(-b)].push(a);
            }
            literals => {
                let next = self.clauses.len();
                let index = *self.interned.entry(clause.clone()).or_insert(next);
                if index == next {
                    self.clauses.push(clause.clone());
                }
                for &l in literals {
                    self.complex[vertex_index(-l)].push(index);
                }
            }
        }
    }

    /// Replaces every strong edge list by everything reachable from its vertex.
    fn bfs_strong(&mut self) {
        let mut queue = VecDeque::new();
        for index in 0..self.strong.len() {
            if self.status[index] != Status::Normal {
                continue;
            }
            let mut mark = BitVec::from_elem(self.strong.len(), false);
            mark.set(index, true);
            queue.extend(self.strong[index].iter().copied());

            let mut reached = Vec::new();
            while let Some(literal) = queue.pop_front() {
                let next = vertex_index(literal);
                if mark[next] {
                    continue;
                }
                mark.set(next, true);
                reached.push(literal);
                queue.extend(self.strong[next].iter().copied());
            }
            self.strong[index] = reached;
        }
    }

    /// Tests every literal of a vertex's complex clauses as a possible strong edge.
    fn bfs_weak(&mut self) {
        let mut found = 0_usize;
        for index in 0..self.strong.len() {
            if self.status[index] != Status::Normal {
                continue;
            }
            let source = literal_of(index);
            let known = &self.strong[index];
            let mut candidates: Vec<i32> = self.complex[index]
                .iter()
                .flat_map(|&c| self.clauses[c].iter().copied())
                .filter(|&l| {
                    l.unsigned_abs() != source.unsigned_abs()
                        && self.status[vertex_index(l)] == Status::Normal
                        && !known.contains(&l)
                })
                .collect();
            candidates.sort_unstable();
            candidates.dedup();
            candidates.retain(|&l| {
                !self
                    .oracle
                    .solution_history()
                    .any(|m| m[position(source)] == source && m[position(l)] == -l)
            });
            if candidates.is_empty() {
                continue;
            }

            let mut implied = Vec::new();
            {
                let mut scope = self.oracle.scope();
                scope.assumptions_mut().push(source);
                let mut next = 0;
                while next < candidates.len() {
                    let candidate = candidates[next];
                    next += 1;
                    scope.assumptions_mut().push(-candidate);
                    match scope.solve() {
                        SatResult::Unsatisfiable => implied.push(candidate),
                        SatResult::Satisfiable(model) => {
                            let rest = candidates.split_off(next);
                            candidates.extend(rest.into_iter().filter(|&l| model[position(l)] == l));
                            scope.shuffle_order(&mut self.rng);
                        }
                        SatResult::Timeout => {}
                    }
                    scope.assumptions_mut().pop();
                }
            }

            found += implied.len();
            for target in implied {
                self.strong[index].push(target);
                self.strong[vertex_index(-target)].push(-source);
            }
        }
        debug!(found, "hidden strong edges detected");
    }

    fn finish(self) -> Mig {
        let mut order: Vec<usize> = (0..self.clauses.len()).collect();
        order.sort_unstable_by(|&a, &b| self.clauses[a].cmp(&self.clauses[b]));
        let mut remap = vec![0; order.len()];
        for (new, &old) in order.iter().enumerate() {
            remap[old] = new;
        }
        let complex_clauses = order.iter().map(|&i| self.clauses[i].clone()).collect();

        let vertices = self
            .strong
            .iter()
            .zip(&self.complex)
            .zip(&self.status)
            .enumerate()
            .map(|(index, ((strong, complex), &status))| {
                let literal = literal_of(index);
                let mut complex: Vec<usize> = complex.iter().map(|&c| remap[c]).collect();
                complex.sort_unstable();
                complex.dedup();
                Vertex {
                    literal,
                    status,
                    strong_edges: strong.iter().copied().filter(|&l| l != literal).collect(),
                    complex_clauses: complex,
                }
            })
            .collect();

        Mig {
            num_vars: self.cnf.num_vars(),
            vertices,
            complex_clauses,
        }
    }
}

fn is_redundant(redundancy: &mut Oracle, clause: &LiteralList) -> bool {
    let mut scope = redundancy.scope();
    scope.assumptions_mut().push_all(clause.iter().map(|&l| -l));
    scope.solve().is_unsatisfiable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{all_models, random_cnf};

    fn configs() -> Vec<MigConfig> {
        let mut all = Vec::new();
        for strong_closure in [false, true] {
            for detect_strong in [false, true] {
                for check_redundancy in [false, true] {
                    all.push(MigConfig {
                        strong_closure,
                        detect_strong,
                        check_redundancy,
                        ..MigConfig::default()
                    });
                }
            }
        }
        all
    }

    #[test]
    fn test_binary_implications() {
        // (1 | 2), (-1 | 3)
        let cnf = Cnf::from_clauses(3, [vec![1, 2], vec![-1, 3]]).unwrap();
        let mig = build(&cnf, &MigConfig::default()).unwrap();

        assert!(mig.core_dead().is_empty());
        assert_eq!(mig.strong_edges(-1).literals(), &[2]);
        assert_eq!(mig.strong_edges(1).literals(), &[3]);
        assert_eq!(mig.strong_edges(-2).literals(), &[1, 3]);
        assert_eq!(mig.strong_edges(-3).literals(), &[-1, 2]);
        assert!(mig.strong_edges(2).is_empty());
        assert!(mig.strong_edges(3).is_empty());
    }

    #[test]
    fn test_without_closure() {
        let cnf = Cnf::from_clauses(3, [vec![1, 2], vec![-1, 3]]).unwrap();
        let config = MigConfig {
            strong_closure: false,
            ..MigConfig::default()
        };
        let mig = build(&cnf, &config).unwrap();
        assert_eq!(mig.strong_edges(-3).literals(), &[-1]);
    }

    #[test]
    fn test_forced_chain() {
        // (1), (-1 | 2)
        let cnf = Cnf::from_clauses(2, [vec![1], vec![-1, 2]]).unwrap();
        let mig = build(&cnf, &MigConfig::default()).unwrap();

        for var in [1, 2] {
            assert_eq!(mig.status(var), Status::Core);
            assert_eq!(mig.status(-var), Status::Dead);
        }
        assert!(mig.vertices().iter().all(|v| v.complex_clause_indices().is_empty()));
        assert!(mig.vertices().iter().all(|v| v.strong_edges().is_empty()));
        assert_eq!(mig.core_dead().literals(), &[1, 2]);
    }

    #[test]
    fn test_unsatisfiable() {
        let cnf = Cnf::from_clauses(2, [vec![1], vec![-1, 2], vec![-2]]).unwrap();
        let err = build(&cnf, &MigConfig::default()).unwrap_err();
        assert!(matches!(err, SamplerError::Unsatisfiable));
    }

    #[test]
    fn test_clauses_cleaned_by_core() {
        // 4 is core: (4 | 1 | 2) disappears, (-4 | 1 | 2 | 3) shrinks.
        let cnf = Cnf::from_clauses(4, [vec![4], vec![4, 1, 2], vec![-4, 1, 2, 3]]).unwrap();
        let mig = build(&cnf, &MigConfig::default()).unwrap();
        assert_eq!(mig.all_complex_clauses(), &[LiteralList::new([1, 2, 3])]);
        assert!(mig.complex_clauses(4).next().is_none());
    }

    #[test]
    fn test_detect_strong() {
        // 1 -> 2 only follows from resolving the two complex clauses.
        let cnf = Cnf::from_clauses(3, [vec![-1, 2, 3], vec![-1, 2, -3]]).unwrap();
        let plain = build(&cnf, &MigConfig::default()).unwrap();
        assert!(plain.strong_edges(1).is_empty());

        let config = MigConfig {
            detect_strong: true,
            ..MigConfig::default()
        };
        let mig = build(&cnf, &config).unwrap();
        assert!(mig.strong_edges(1).contains(2));
        assert!(mig.strong_edges(-2).contains(-1));
        assert!(!mig.strong_edges(1).contains(3));
    }

    #[test]
    fn test_check_redundancy() {
        let cnf = Cnf::from_clauses(4, [vec![-1, 2], vec![-1, 2, 3], vec![1, 3, 4]]).unwrap();
        let plain = build(&cnf, &MigConfig::default()).unwrap();
        assert_eq!(plain.all_complex_clauses().len(), 2);

        let config = MigConfig {
            check_redundancy: true,
            ..MigConfig::default()
        };
        let mig = build(&cnf, &config).unwrap();
        assert_eq!(mig.all_complex_clauses(), &[LiteralList::new([1, 3, 4])]);
        assert!(mig.complex_clauses(1).next().is_none());
        assert_eq!(mig.complex_clauses(-1).count(), 1);
    }

    #[test]
    fn test_strong_edges_hold_in_every_model() {
        let mut rng = fastrand::Rng::with_seed(8);
        for _ in 0..40 {
            let num_clauses = rng.usize(3..12);
            let cnf = random_cnf(&mut rng, 7, num_clauses, 3);
            let models = all_models(&cnf);
            if models.is_empty() {
                continue;
            }
            for config in configs() {
                let mig = build(&cnf, &config).unwrap();
                for vertex in mig.vertices() {
                    match vertex.status() {
                        Status::Core => assert!(models.iter().all(|m| m.contains(&vertex.literal()))),
                        Status::Dead => assert!(models.iter().all(|m| !m.contains(&vertex.literal()))),
                        Status::Normal => {
                            for &target in vertex.strong_edges() {
                                assert!(
                                    models
                                        .iter()
                                        .filter(|m| m.contains(&vertex.literal()))
                                        .all(|m| m.contains(&target)),
                                    "{} -> {target} in {cnf}",
                                    vertex.literal()
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_rebuild_is_identical() {
        let mut rng = fastrand::Rng::with_seed(13);
        for _ in 0..20 {
            let num_clauses = rng.usize(3..12);
            let cnf = random_cnf(&mut rng, 8, num_clauses, 4);
            if all_models(&cnf).is_empty() {
                continue;
            }
            for config in configs() {
                assert_eq!(build(&cnf, &config).unwrap(), build(&cnf, &config).unwrap());
            }
        }
    }

    #[test]
    fn test_no_self_loops_and_sorted() {
        let cnf = Cnf::from_clauses(3, [vec![-1, 2], vec![-2, 1], vec![1, 2, 3]]).unwrap();
        let mig = build(&cnf, &MigConfig::default()).unwrap();
        for vertex in mig.vertices() {
            assert!(!vertex.strong_edges().contains(vertex.literal()));
            assert!(vertex.complex_clause_indices().windows(2).all(|w| w[0] < w[1]));
        }
        assert_eq!(mig.strong_edges(1).literals(), &[2]);
        assert_eq!(mig.strong_edges(2).literals(), &[1]);
    }
}
