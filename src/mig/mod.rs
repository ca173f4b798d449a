#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Modal implication graph.
//!
//! The graph has one [`Vertex`] per literal polarity. A strong edge `a → b` states that
//! every model containing `a` also contains `b`. Clauses with three or more literals
//! that could not be reduced to strong edges are kept as complex clauses and attached to
//! the negation of each of their literals: once that literal is false the clause may
//! force one of the others, depending on the rest of the assignment.
//!
//! Graphs are built by [`builder::build`], persisted by [`io`] and walked by
//! [`traversal::traverse`].

/// Construction of the graph from a formula.
pub mod builder;
/// Binary persistence.
pub mod io;
/// Pairwise dependency report.
pub mod report;
/// Propagation along strong and weak edges.
pub mod traversal;
/// Vertices and their status.
pub mod vertex;

use crate::sat::literal_list::LiteralList;
use serde::{Deserialize, Serialize};
pub use vertex::{Status, Vertex, vertex_index};

/// A finished implication graph.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Mig {
    pub(crate) num_vars: usize,
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) complex_clauses: Vec<LiteralList>,
}

impl Mig {
    /// Size of the variable universe. The graph holds twice as many vertices.
    #[must_use]
    pub const fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Every vertex, indexed by literal.
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Vertex of `literal`.
    ///
    /// # Panics
    ///
    /// If `literal` is zero or outside the variable universe.
    #[must_use]
    pub fn vertex(&self, literal: i32) -> &Vertex {
        &self.vertices[vertex_index(literal)]
    }

    /// Literals implied by `literal` in every model.
    #[must_use]
    pub fn strong_edges(&self, literal: i32) -> &LiteralList {
        &self.vertex(literal).strong_edges
    }

    /// Complex clauses containing `-literal`.
    pub fn complex_clauses(&self, literal: i32) -> impl Iterator<Item = &LiteralList> {
        self.vertex(literal)
            .complex_clauses
            .iter()
            .map(|&i| &self.complex_clauses[i])
    }

    /// Every complex clause of the graph, deduplicated and sorted.
    #[must_use]
    pub fn all_complex_clauses(&self) -> &[LiteralList] {
        &self.complex_clauses
    }

    /// Status of the vertex of `literal`.
    #[must_use]
    pub fn status(&self, literal: i32) -> Status {
        self.vertex(literal).status
    }

    /// All core and dead literals, as the list of literals forced true.
    #[must_use]
    pub fn core_dead(&self) -> LiteralList {
        self.vertices
            .iter()
            .filter(|v| v.status == Status::Core)
            .map(Vertex::literal)
            .collect()
    }

    /// `true` if the graph alone proves that no model contains every literal of
    /// `literals`.
    ///
    /// A `false` answer proves nothing: only a solver can confirm satisfiability.
    #[must_use]
    pub fn is_combination_invalid(&self, literals: &LiteralList) -> bool {
        literals.iter().any(|&l| {
            let vertex = self.vertex(l);
            vertex.status == Status::Dead || vertex.strong_edges.has_conflicts(literals)
        })
    }

    /// Number of strong edges over all vertices.
    #[must_use]
    pub fn count_strong_edges(&self) -> usize {
        self.vertices.iter().map(|v| v.strong_edges.len()).sum()
    }
}
