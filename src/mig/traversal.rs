#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Walking the implication graph from a set of literals.
//!
//! [`traverse`] reports every unset literal reachable from the start literals to a
//! callback, which decides whether to select it into the model, skip it, or stop.
//! Strong consequences are reported first. Then complex clauses are inspected: a clause
//! with exactly one unset literal and all others false forces that literal, which is
//! reported as a strong consequence too. Only once nothing is forced anymore are the
//! unset literals of the remaining unsatisfied clauses reported as weak. A selected weak
//! literal restarts the strong phase from itself.

use crate::mig::Mig;
use crate::mig::vertex::vertex_index;
use crate::sat::model::position;
use bit_vec::BitVec;
use std::collections::VecDeque;

/// How a literal was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Implied by the current model in every model of the formula.
    Strong,
    /// Might be implied, depending on the rest of the assignment.
    Weak,
}

/// Decision of the callback for one reported literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visit {
    /// Ignore the literal.
    #[default]
    Continue,
    /// Set the literal in the model and traverse on from it.
    Select,
    /// Stop the traversal.
    Cancel,
}

/// Outcome of [`traverse`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Traversal {
    /// Literals selected into the model, in selection order.
    pub selected: Vec<i32>,
    /// `true` if the visitor stopped the traversal early.
    pub cancelled: bool,
}

/// Traverses `mig` from `start`, which must already be set in `model`.
///
/// `visit` receives the edge kind, the literal and the current model. Literals that are
/// already set are never reported, and each literal is reported as weak at most once.
pub fn traverse<F>(mig: &Mig, model: &mut [i32], start: &[i32], mut visit: F) -> Traversal
where
    F: FnMut(Edge, i32, &[i32]) -> Visit,
{
    let num_vertices = mig.vertices().len();
    let mut expanded = BitVec::from_elem(num_vertices, false);
    let mut weak_seen = BitVec::from_elem(num_vertices, false);
    let mut reached: Vec<i32> = Vec::new();
    let mut queue: VecDeque<i32> = start.iter().copied().collect();
    let mut result = Traversal::default();

    macro_rules! select {
        ($literal:expr) => {{
            let literal = $literal;
            model[position(literal)] = literal;
            result.selected.push(literal);
            queue.push_back(literal);
        }};
    }

    loop {
        while let Some(literal) = queue.pop_front() {
            let index = vertex_index(literal);
            if expanded[index] {
                continue;
            }
            expanded.set(index, true);
            reached.push(literal);
            for &target in mig.strong_edges(literal) {
                if model[position(target)] != 0 {
                    continue;
                }
                match visit(Edge::Strong, target, model) {
                    Visit::Continue => {}
                    Visit::Select => select!(target),
                    Visit::Cancel => {
                        result.cancelled = true;
                        return result;
                    }
                }
            }
        }

        let mut forced = None;
        'units: for &literal in &reached {
            for clause in mig.complex_clauses(literal) {
                if let Some(unit) = unit_literal(clause.literals(), model) {
                    forced = Some(unit);
                    break 'units;
                }
            }
        }
        if let Some(unit) = forced {
            match visit(Edge::Strong, unit, model) {
                Visit::Cancel => {
                    result.cancelled = true;
                    return result;
                }
                // The literal is implied either way.
                Visit::Continue | Visit::Select => select!(unit),
            }
            continue;
        }

        let mut weak_selected = false;
        'weak: for &literal in &reached {
            for clause in mig.complex_clauses(literal) {
                if is_satisfied(clause.literals(), model) {
                    continue;
                }
                for &candidate in clause {
                    let index = vertex_index(candidate);
                    if model[position(candidate)] != 0 || weak_seen[index] {
                        continue;
                    }
                    weak_seen.set(index, true);
                    match visit(Edge::Weak, candidate, model) {
                        Visit::Continue => {}
                        Visit::Select => {
                            select!(candidate);
                            weak_selected = true;
                            break 'weak;
                        }
                        Visit::Cancel => {
                            result.cancelled = true;
                            return result;
                        }
                    }
                }
            }
        }
        if !weak_selected {
            return result;
        }
    }
}

/// Strong and weak consequences of `start` without changing `model`.
#[must_use]
pub fn collect(mig: &Mig, model: &[i32], start: &[i32]) -> (Vec<i32>, Vec<i32>) {
    let mut scratch = model.to_vec();
    let mut strong = Vec::new();
    let mut weak = Vec::new();
    traverse(mig, &mut scratch, start, |edge, literal, _| {
        match edge {
            Edge::Strong => strong.push(literal),
            Edge::Weak => weak.push(literal),
        }
        Visit::Continue
    });
    (strong, weak)
}

fn is_satisfied(clause: &[i32], model: &[i32]) -> bool {
    clause.iter().any(|&l| model[position(l)] == l)
}

/// The only unset literal of an unsatisfied clause whose other literals are all false.
fn unit_literal(clause: &[i32], model: &[i32]) -> Option<i32> {
    let mut unset = None;
    for &l in clause {
        let value = model[position(l)];
        if value == l {
            return None;
        }
        if value == 0 {
            if unset.is_some() {
                return None;
            }
            unset = Some(l);
        }
    }
    unset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mig::builder::{MigConfig, build};
    use crate::sat::cnf::Cnf;

    fn model_with(num_vars: usize, literals: &[i32]) -> Vec<i32> {
        let mut model = vec![0; num_vars];
        for &l in literals {
            model[position(l)] = l;
        }
        model
    }

    #[test]
    fn test_strong_then_weak() {
        // 1 -> 2, (-1 | 3 | 4)
        let cnf = Cnf::from_clauses(4, [vec![-1, 2], vec![-1, 3, 4]]).unwrap();
        let mig = build(&cnf, &MigConfig::default()).unwrap();
        let (strong, weak) = collect(&mig, &model_with(4, &[1]), &[1]);
        assert_eq!(strong, vec![2]);
        assert_eq!(weak, vec![3, 4]);
    }

    #[test]
    fn test_unit_propagation_over_complex_clause() {
        // 1 -> 2, (-1 | -2 | 3 | 4) and 4 already false.
        let cnf = Cnf::from_clauses(4, [vec![-1, 2], vec![-1, -2, 3, 4]]).unwrap();
        let mig = build(&cnf, &MigConfig::default()).unwrap();
        let mut model = model_with(4, &[1, -4]);
        let result = traverse(&mig, &mut model, &[1], |_, _, _| Visit::Select);
        assert_eq!(result.selected, vec![2, 3]);
        assert!(!result.cancelled);
        assert_eq!(model, vec![1, 2, 3, -4]);
    }

    #[test]
    fn test_continue_leaves_model_untouched() {
        let cnf = Cnf::from_clauses(3, [vec![-1, 2], vec![-2, 3]]).unwrap();
        let mig = build(&cnf, &MigConfig::default()).unwrap();
        let mut model = model_with(3, &[1]);
        let result = traverse(&mig, &mut model, &[1], |_, _, _| Visit::Continue);
        assert!(result.selected.is_empty());
        assert_eq!(model, vec![1, 0, 0]);
    }

    #[test]
    fn test_select_follows_chain_without_closure() {
        let cnf = Cnf::from_clauses(3, [vec![-1, 2], vec![-2, 3]]).unwrap();
        let config = MigConfig {
            strong_closure: false,
            ..MigConfig::default()
        };
        let mig = build(&cnf, &config).unwrap();
        let mut model = model_with(3, &[1]);
        let result = traverse(&mig, &mut model, &[1], |_, _, _| Visit::Select);
        assert_eq!(result.selected, vec![2, 3]);
    }

    #[test]
    fn test_cancel() {
        let cnf = Cnf::from_clauses(3, [vec![-1, 2], vec![-1, 3]]).unwrap();
        let mig = build(&cnf, &MigConfig::default()).unwrap();
        let mut model = model_with(3, &[1]);
        let mut seen = 0;
        let result = traverse(&mig, &mut model, &[1], |_, _, _| {
            seen += 1;
            Visit::Cancel
        });
        assert!(result.cancelled);
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_weak_selection_restarts_strong_phase() {
        // (-1 | 2 | 3), 2 -> 4
        let cnf = Cnf::from_clauses(4, [vec![-1, 2, 3], vec![-2, 4]]).unwrap();
        let mig = build(&cnf, &MigConfig::default()).unwrap();
        let mut model = model_with(4, &[1]);
        let mut edges = Vec::new();
        let result = traverse(&mig, &mut model, &[1], |edge, literal, _| {
            edges.push((edge, literal));
            if literal == 3 { Visit::Continue } else { Visit::Select }
        });
        assert_eq!(result.selected, vec![2, 4]);
        assert_eq!(edges, vec![(Edge::Weak, 2), (Edge::Strong, 4)]);
    }
}
