//! Helpers for full or partial models.
//!
//! A model is a slice of length `n` where position `i` holds `i + 1`, `-(i + 1)` or `0`
//! when variable `i + 1` is unset.

use crate::sat::literal_list::LiteralList;

/// A model indexed by `variable - 1`.
pub type Model = Vec<i32>;

/// Position of `literal` inside a model.
#[inline]
#[must_use]
pub const fn position(literal: i32) -> usize {
    (literal.unsigned_abs() - 1) as usize
}

/// Unsets every position of `model` whose value differs from `other`.
///
/// Repeatedly applying this with fresh solutions shrinks `model` towards the set of
/// literals shared by all of them.
pub fn reset_conflicts(model: &mut [i32], other: &[i32]) {
    for (value, &o) in model.iter_mut().zip(other) {
        if *value != o {
            *value = 0;
        }
    }
}

/// `true` if no literal of `literals` is assigned the opposite value in `model`.
#[must_use]
pub fn is_compatible(model: &[i32], literals: &LiteralList) -> bool {
    literals
        .iter()
        .all(|&l| model.get(position(l)).is_none_or(|&v| v != -l))
}

/// `true` if every literal of `literals` is set in `model` with the same sign.
#[must_use]
pub fn contains_all(model: &[i32], literals: &LiteralList) -> bool {
    literals
        .iter()
        .all(|&l| model.get(position(l)).is_some_and(|&v| v == l))
}

/// Number of set positions.
#[must_use]
pub fn count_set(model: &[i32]) -> usize {
    model.iter().filter(|&&v| v != 0).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_conflicts() {
        let mut a = vec![1, -2, 3, 0];
        reset_conflicts(&mut a, &[1, 2, 3, 4]);
        assert_eq!(a, vec![1, 0, 3, 0]);
    }

    #[test]
    fn test_compatibility() {
        let model = vec![1, 0, -3];
        assert!(is_compatible(&model, &LiteralList::new([1, 2])));
        assert!(!is_compatible(&model, &LiteralList::new([3])));
        assert!(contains_all(&model, &LiteralList::new([1, -3])));
        assert!(!contains_all(&model, &LiteralList::new([1, 2])));
        assert_eq!(count_set(&model), 2);
    }
}
