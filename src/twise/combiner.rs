#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Merging `t` presence conditions into one.
//!
//! Picking one alternative from each condition and joining them yields one alternative
//! of the combined condition, unless two picks disagree on the polarity of a variable.
//! The search is an explicit depth-first walk with one signed occupancy counter per
//! variable: positive while only positive literals of the variable are held, negative
//! while only negative ones are.

use crate::sat::literal_list::LiteralList;
use crate::twise::presence::PresenceCondition;

/// Reusable scratch space for [`Combiner::combine`].
#[derive(Debug, Clone)]
pub struct Combiner {
    occupancy: Vec<i32>,
    literals: Vec<i32>,
}

impl Combiner {
    /// A combiner for literals over `num_vars` variables.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            occupancy: vec![0; num_vars + 1],
            literals: Vec::new(),
        }
    }

    /// Every consistent join of one alternative per condition, in the order of the
    /// alternatives.
    #[must_use]
    pub fn combine(&mut self, conditions: &[&PresenceCondition]) -> PresenceCondition {
        let mut combined = Vec::new();
        let t = conditions.len();
        if t == 0 || conditions.iter().any(|c| c.is_empty()) {
            return PresenceCondition::default();
        }

        // next[d] is the next alternative of conditions[d] to try.
        let mut next = vec![0; t];
        let mut depth = 0;
        loop {
            if depth == t {
                combined.push(LiteralList::new(self.literals.iter().copied()));
                depth -= 1;
                self.release(&conditions[depth][next[depth] - 1]);
                continue;
            }
            let condition = conditions[depth];
            if next[depth] == condition.len() {
                next[depth] = 0;
                if depth == 0 {
                    break;
                }
                depth -= 1;
                self.release(&conditions[depth][next[depth] - 1]);
                continue;
            }
            let alternative = &condition[next[depth]];
            next[depth] += 1;
            if self.occupy(alternative) {
                depth += 1;
            }
        }
        debug_assert!(self.literals.is_empty());
        PresenceCondition::new(combined)
    }

    fn occupy(&mut self, alternative: &LiteralList) -> bool {
        let conflict = alternative.iter().any(|&l| {
            let held = self.occupancy[l.unsigned_abs() as usize];
            held != 0 && (held < 0) != (l < 0)
        });
        if conflict {
            return false;
        }
        for &l in alternative {
            let slot = &mut self.occupancy[l.unsigned_abs() as usize];
            if *slot == 0 {
                self.literals.push(l);
            }
            *slot += l.signum();
        }
        true
    }

    fn release(&mut self, alternative: &LiteralList) {
        for &l in alternative.iter().rev() {
            let slot = &mut self.occupancy[l.unsigned_abs() as usize];
            *slot -= l.signum();
            if *slot == 0 {
                self.literals.pop();
            }
        }
    }
}
