#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! First-UIP conflict analysis.

use crate::sat::clause::Clause;
use crate::sat::literal::{Literal, Variable};
use crate::sat::trail::{Reason, Trail};
use bit_vec::BitVec;
use itertools::Itertools;
use smallvec::SmallVec;

/// Outcome of analysing a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Conflict<L: Literal> {
    /// The conflict does not depend on any decision: the formula (under no
    /// assumptions) is unsatisfiable.
    #[default]
    Ground,
    /// The learnt clause is a single literal, asserted at level 0.
    Unit(L),
    /// A learnt clause whose first literal is asserting after backjumping to
    /// `backtrack_level`.
    Learned {
        /// The learnt clause.
        clause: Clause<L>,
        /// Level to backjump to.
        backtrack_level: usize,
    },
}

/// Reusable scratch space for conflict analysis.
#[derive(Debug, Clone, Default)]
pub struct Analyser {
    seen: BitVec,
    /// Variables touched by the last analysis, for activity bumping.
    pub to_bump: Vec<Variable>,
}

impl Analyser {
    /// Scratch space for `num_vars` variables.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            seen: BitVec::from_elem(num_vars + 1, false),
            to_bump: Vec::new(),
        }
    }

    /// Derives the first-UIP clause of the conflict on clause `conflict`.
    ///
    /// Literals fixed at level 0 are dropped from the learnt clause. The literal with
    /// the highest remaining level is moved to position 1 so that it is watched.
    pub fn analyse<L: Literal>(
        &mut self,
        clauses: &[Clause<L>],
        trail: &Trail<L>,
        conflict: usize,
    ) -> Conflict<L> {
        self.to_bump.clear();
        self.seen.clear();

        let conflict_level = clauses[conflict]
            .iter()
            .map(|l| trail.level(l.variable()))
            .max()
            .unwrap_or(0);
        if conflict_level == 0 {
            return Conflict::Ground;
        }

        let mut learnt: SmallVec<[L; 4]> = SmallVec::new();
        learnt.push(L::default());
        let mut path_c = 0_usize;
        let mut index = trail.len();
        let mut clause_idx = conflict;
        let mut skip_first = false;

        let uip = loop {
            for &q in clauses[clause_idx].iter().skip(usize::from(skip_first)) {
                let var = q.variable();
                let level = trail.level(var);
                if self.seen[var as usize] || level == 0 {
                    continue;
                }
                self.seen.set(var as usize, true);
                self.to_bump.push(var);
                if level >= conflict_level {
                    path_c += 1;
                } else {
                    learnt.push(q);
                }
            }

            let p = loop {
                if index == 0 {
                    return Conflict::Ground;
                }
                index -= 1;
                let lit = trail[index].lit;
                if self.seen[lit.variable() as usize] {
                    break lit;
                }
            };
            self.seen.set(p.variable() as usize, false);
            path_c = path_c.saturating_sub(1);
            if path_c == 0 {
                break p;
            }

            match trail.reason(p.variable()) {
                Reason::Clause(idx) => {
                    clause_idx = idx;
                    skip_first = true;
                }
                Reason::Decision | Reason::Unit => break p,
            }
        };

        learnt[0] = uip.negated();

        if learnt.len() == 1 {
            return Conflict::Unit(learnt[0]);
        }

        let (max_i, backtrack_level) = learnt
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, l)| (i, trail.level(l.variable())))
            .max_by_key(|&(_, level)| level)
            .unwrap_or((1, 0));
        learnt.swap(1, max_i);

        let lbd = learnt
            .iter()
            .map(|l| trail.level(l.variable()))
            .unique()
            .count();

        Conflict::Learned {
            clause: Clause::learnt(learnt, u32::try_from(lbd).unwrap_or(u32::MAX)),
            backtrack_level,
        }
    }
}
