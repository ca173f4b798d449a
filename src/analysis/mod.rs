#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Analyses built purely on top of the [`Oracle`](crate::sat::oracle::Oracle).

/// Groups of variables that take the same value in every model.
pub mod atomic_sets;
/// Core and dead literals.
pub mod backbone;
/// Samples covering every variable with a chosen polarity.
pub mod one_wise;
/// Random configurations.
pub mod random;
