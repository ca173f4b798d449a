#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Vertices of the implication graph, one per literal polarity.

use crate::sat::literal_list::LiteralList;
use serde::{Deserialize, Serialize};

/// Whether a literal is forced by the formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    /// Neither core nor dead.
    #[default]
    Normal,
    /// True in every model.
    Core,
    /// False in every model.
    Dead,
}

/// A literal together with what it implies.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Vertex {
    pub(crate) literal: i32,
    pub(crate) status: Status,
    /// Literals true in every model in which `literal` is true.
    pub(crate) strong_edges: LiteralList,
    /// Indices into the graph's complex clause table. Every referenced clause contains
    /// `-literal`.
    pub(crate) complex_clauses: Vec<usize>,
}

impl Vertex {
    /// Creates an unconnected vertex.
    #[must_use]
    pub fn new(literal: i32) -> Self {
        Self {
            literal,
            ..Self::default()
        }
    }

    /// Literal this vertex stands for.
    #[must_use]
    pub const fn literal(&self) -> i32 {
        self.literal
    }

    /// Variable of the literal.
    #[must_use]
    pub const fn variable(&self) -> u32 {
        self.literal.unsigned_abs()
    }

    /// Whether the literal is core, dead or neither.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// `true` for vertices whose literal is neither core nor dead.
    #[must_use]
    pub fn is_normal(&self) -> bool {
        self.status == Status::Normal
    }

    /// Literals implied by this one.
    #[must_use]
    pub const fn strong_edges(&self) -> &LiteralList {
        &self.strong_edges
    }

    /// Indices of the complex clauses containing the negated literal.
    #[must_use]
    pub fn complex_clause_indices(&self) -> &[usize] {
        &self.complex_clauses
    }
}

/// Position of the vertex for `literal`: `2·(|l|−1)`, plus one for negative literals.
///
/// # Panics
///
/// Panics in debug builds if `literal` is `0`.
#[must_use]
pub const fn vertex_index(literal: i32) -> usize {
    debug_assert!(literal != 0);
    ((literal.unsigned_abs() as usize - 1) << 1) | (literal < 0) as usize
}

/// Inverse of [`vertex_index`].
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub const fn literal_of(index: usize) -> i32 {
    let var = ((index >> 1) + 1) as i32;
    if index & 1 == 0 { var } else { -var }
}
