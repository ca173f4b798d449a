#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! T-wise sampling.
//!
//! The generator walks every combination of `t` presence conditions and makes sure
//! some configuration of the sample covers it, extending existing configurations
//! before opening new ones.

use crate::mig::builder::MigConfig;
use crate::sat::literal_list::LiteralList;
use crate::twise::statistic::CoverageStatistic;
use clap::ValueEnum;
use std::fmt::Display;
use std::time::Duration;

/// Merging literal combinations into configurations.
pub mod combiner;
/// Partial configurations and their solver context.
pub mod configuration;
/// The sampling loop.
pub mod generator;
/// Enumeration of condition combinations.
pub mod iterator;
/// Presence conditions.
pub mod presence;
/// Coverage of a sample.
pub mod statistic;

pub use generator::TWiseSampler;

/// What happens after literals were added to a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, Default, ValueEnum)]
pub enum Deduce {
    /// Keep the literals as they are.
    None,
    /// Add every literal the configuration now implies.
    #[default]
    Dp,
    /// Complete the configuration with one model right away.
    Ac,
}

impl Display for Deduce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Dp => write!(f, "propagation"),
            Self::Ac => write!(f, "auto-completion"),
        }
    }
}

/// Handling of alternatives that no model contains.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, Default, ValueEnum)]
pub enum InvalidClausesMode {
    /// Check every alternative, remember nothing.
    #[default]
    None,
    /// Check every alternative and report the invalid ones with the sample.
    Create,
    /// Trust a known list of invalid alternatives and treat all others as valid.
    Use,
}

/// Options of the [`TWiseSampler`].
#[derive(Debug, Clone, PartialEq)]
pub struct TWiseConfig {
    /// Interaction strength.
    pub t: usize,
    /// Upper bound on the number of configurations.
    pub max_sample_size: usize,
    /// Deduction after a configuration was created.
    pub create_deduce: Deduce,
    /// Deduction after a configuration was extended.
    pub extend_deduce: Deduce,
    /// Handling of invalid alternatives.
    pub invalid_clauses: InvalidClausesMode,
    /// Alternatives known to be invalid, read in [`InvalidClausesMode::Use`].
    pub known_invalid: Vec<LiteralList>,
    /// Random models drawn up front to answer validity checks without the solver.
    pub random_sample_size: usize,
    /// Seed of every random choice.
    pub seed: u64,
    /// Budget of each individual solver call.
    pub timeout: Option<Duration>,
    /// Build an implication graph for early rejection and propagation.
    pub use_mig: bool,
    /// Options of the implication graph.
    pub mig: MigConfig,
}

impl Default for TWiseConfig {
    fn default() -> Self {
        Self {
            t: 2,
            max_sample_size: usize::MAX,
            create_deduce: Deduce::Dp,
            extend_deduce: Deduce::None,
            invalid_clauses: InvalidClausesMode::None,
            known_invalid: Vec::new(),
            random_sample_size: 0,
            seed: 42,
            timeout: None,
            use_mig: true,
            mig: MigConfig::default(),
        }
    }
}

/// A finished sample.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sample {
    /// Configurations still open at the end of sampling first, each completed, then the
    /// ones that were completed while sampling.
    pub configurations: Vec<LiteralList>,
    /// Coverage of the configurations.
    pub statistic: CoverageStatistic,
    /// Alternatives proven invalid, filled in [`InvalidClausesMode::Create`].
    pub invalid_alternatives: Vec<LiteralList>,
}
