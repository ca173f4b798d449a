//! Brute-force ground truth for tests on small formulas.

use crate::sat::cnf::Cnf;
use crate::sat::model::Model;

/// Every model of `cnf`, in binary counting order. Only for small universes.
pub fn all_models(cnf: &Cnf) -> Vec<Model> {
    let n = cnf.num_vars();
    assert!(n <= 16, "brute force on {n} variables");
    (0..1_u32 << n)
        .map(|bits| {
            (1..=n)
                .map(|v| {
                    let lit = i32::try_from(v).unwrap();
                    if bits & (1 << (v - 1)) == 0 { -lit } else { lit }
                })
                .collect::<Model>()
        })
        .filter(|m| cnf.verify(m))
        .collect()
}

/// `true` if some model of `cnf` contains every literal of `literals`.
pub fn is_satisfiable_with(cnf: &Cnf, literals: &[i32]) -> bool {
    all_models(cnf)
        .iter()
        .any(|m| literals.iter().all(|l| m.contains(l)))
}

/// A random formula with clauses of width 1 to `max_width`.
pub fn random_cnf(rng: &mut fastrand::Rng, num_vars: usize, num_clauses: usize, max_width: usize) -> Cnf {
    let top = i32::try_from(num_vars).unwrap();
    let clauses: Vec<Vec<i32>> = (0..num_clauses)
        .map(|_| {
            (0..rng.usize(1..=max_width))
                .map(|_| {
                    let v = rng.i32(1..=top);
                    if rng.bool() { v } else { -v }
                })
                .collect()
        })
        .collect();
    Cnf::from_clauses(num_vars, clauses).unwrap()
}
