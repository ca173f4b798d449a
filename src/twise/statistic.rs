#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Coverage of a sample with respect to a sequence of presence conditions.

use crate::sat::literal_list::LiteralList;
use crate::twise::presence::PresenceCondition;

/// Condition counts and per-configuration scores of a sample.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoverageStatistic {
    valid: u64,
    invalid: u64,
    covered: u64,
    uncovered: u64,
    scores: Vec<f64>,
}

impl CoverageStatistic {
    /// Evaluates `sample` treating every condition as valid.
    #[must_use]
    pub fn evaluate<I>(sample: &[LiteralList], conditions: I) -> Self
    where
        I: IntoIterator<Item = PresenceCondition>,
    {
        Self::evaluate_with(sample, conditions, |_| false)
    }

    /// Evaluates `sample`, counting the conditions for which `is_invalid` holds as
    /// invalid instead of checking them.
    ///
    /// Each covered condition adds `1/k` to the score of each of the `k` configurations
    /// covering it.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn evaluate_with<I, F>(sample: &[LiteralList], conditions: I, mut is_invalid: F) -> Self
    where
        I: IntoIterator<Item = PresenceCondition>,
        F: FnMut(&PresenceCondition) -> bool,
    {
        let mut statistic = Self {
            scores: vec![0.0; sample.len()],
            ..Self::default()
        };
        let mut covering = Vec::new();
        for condition in conditions {
            if is_invalid(&condition) {
                statistic.invalid += 1;
                continue;
            }
            statistic.valid += 1;
            covering.clear();
            covering.extend(sample.iter().enumerate().filter_map(|(i, configuration)| {
                condition
                    .iter()
                    .any(|alternative| configuration.contains_all(alternative))
                    .then_some(i)
            }));
            if covering.is_empty() {
                statistic.uncovered += 1;
            } else {
                statistic.covered += 1;
                let share = 1.0 / covering.len() as f64;
                for &i in &covering {
                    statistic.scores[i] += share;
                }
            }
        }
        statistic
    }

    /// Conditions not known to be invalid.
    #[must_use]
    pub const fn valid(&self) -> u64 {
        self.valid
    }

    /// Conditions counted as invalid.
    #[must_use]
    pub const fn invalid(&self) -> u64 {
        self.invalid
    }

    /// Valid conditions covered by some configuration.
    #[must_use]
    pub const fn covered(&self) -> u64 {
        self.covered
    }

    /// Valid conditions no configuration covers.
    #[must_use]
    pub const fn uncovered(&self) -> u64 {
        self.uncovered
    }

    /// Score of each configuration, in sample order.
    #[must_use]
    pub fn config_scores(&self) -> &[f64] {
        &self.scores
    }

    /// Share of valid conditions covered.
    ///
    /// Without valid conditions this is `covered / (covered + uncovered)` if nothing was
    /// invalid and `1.0` otherwise. An empty statistic has full coverage.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn coverage(&self) -> f64 {
        if self.valid != 0 {
            self.covered as f64 / self.valid as f64
        } else if self.invalid == 0 && self.covered + self.uncovered != 0 {
            self.covered as f64 / (self.covered + self.uncovered) as f64
        } else {
            1.0
        }
    }
}
