#![deny(missing_docs)]
//! Feature-model analysis and t-wise sampling on top of an incremental CDCL solver.
//!
//! A formula in conjunctive normal form describes the valid configurations of a
//! configurable system. The crate answers questions about that set of configurations:
//!
//! - [`analysis`] finds the core and dead variables, the atomic sets and random
//!   configurations.
//! - [`mig`] builds the modal implication graph, which records the implications
//!   between literals that the formula enforces.
//! - [`twise`] generates a small sample of configurations covering every valid
//!   combination of `t` literals.
//!
//! Every solver call goes through [`sat::oracle::Oracle`], a CDCL engine driven by a
//! stack of assumptions.

/// Analyses of the configuration space: backbone, atomic sets and simple samples.
pub mod analysis;
/// The crate-wide error type.
pub mod error;
/// The modal implication graph.
pub mod mig;
/// The CDCL engine, the oracle around it and the formula types.
pub mod sat;
/// Greedy t-wise sampling.
pub mod twise;

#[cfg(test)]
pub mod test_util;
