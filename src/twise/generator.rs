#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The t-wise covering generator.
//!
//! Combinations are processed in iterator order. A combination not yet covered is
//! handed to the cheapest mechanism that can cover it:
//!
//! 1. an incomplete configuration for which a cached model proves the alternative fits;
//! 2. after dropping the alternatives the graph, the random sample or the solver prove
//!    invalid, an incomplete configuration the solver accepts the alternative for;
//! 3. a new configuration, while the sample is below its size bound.
//!
//! Candidates are tried shortest alternative first, and among equally long ones in the
//! order of the incomplete configurations, which are kept sorted by their number of
//! set literals.

use crate::analysis::backbone::core_dead;
use crate::analysis::random::random_configurations;
use crate::error::{Result, SamplerError};
use crate::mig::Mig;
use crate::mig::builder::build;
use crate::sat::cnf::Cnf;
use crate::sat::literal_list::LiteralList;
use crate::sat::model::{Model, is_compatible, position};
use crate::sat::oracle::{Oracle, SatResult};
use crate::sat::selection::SelectionStrategy;
use crate::sat::solution_cache::DEFAULT_CAPACITY;
use crate::twise::configuration::{Configuration, Context, Solutions};
use crate::twise::iterator::{CombinationIterator, MergeIterator};
use crate::twise::presence::{PresenceCondition, default_groups, prepare_groups};
use crate::twise::statistic::CoverageStatistic;
use crate::twise::{Deduce, InvalidClausesMode, Sample, TWiseConfig};
use rustc_hash::FxHashSet;
use tracing::{debug, info, trace, warn};

/// Combinations between two progress messages.
const PROGRESS_INTERVAL: u64 = 10_000;

/// Builds t-wise samples of CNFs.
///
/// ```
/// use sat_sampler::sat::cnf::Cnf;
/// use sat_sampler::twise::{TWiseConfig, TWiseSampler};
///
/// let cnf = Cnf::from_clauses(3, [vec![-1, 2]]).unwrap();
/// let sample = TWiseSampler::new(TWiseConfig::default()).sample(&cnf).unwrap();
/// assert!((sample.statistic.coverage() - 1.0).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TWiseSampler {
    config: TWiseConfig,
    groups: Option<Vec<Vec<PresenceCondition>>>,
    mig: Option<Mig>,
}

impl TWiseSampler {
    /// A sampler with the given options.
    #[must_use]
    pub fn new(config: TWiseConfig) -> Self {
        Self {
            config,
            groups: None,
            mig: None,
        }
    }

    /// Combines conditions within each of `groups` instead of combining every free
    /// literal.
    #[must_use]
    pub fn with_groups(mut self, groups: Vec<Vec<PresenceCondition>>) -> Self {
        self.groups = Some(groups);
        self
    }

    /// Uses a previously built graph instead of building one.
    #[must_use]
    pub fn with_mig(mut self, mig: Mig) -> Self {
        self.mig = Some(mig);
        self
    }

    /// The sampler options.
    #[must_use]
    pub const fn config(&self) -> &TWiseConfig {
        &self.config
    }

    /// Samples `cnf`.
    ///
    /// # Errors
    ///
    /// - `SamplerError::InvalidConfiguration` if `t` is zero, or if a configuration
    ///   turns out to have no model.
    /// - `SamplerError::Unsatisfiable` if `cnf` has no model.
    /// - `SamplerError::InvalidGraph` if a supplied graph does not match `cnf`.
    pub fn sample(&self, cnf: &Cnf) -> Result<Sample> {
        let config = &self.config;
        if config.t == 0 {
            return Err(SamplerError::InvalidConfiguration("t must be at least 1".into()));
        }
        let num_vars = cnf.num_vars();
        let mut generation = self.set_up(cnf)?;

        let groups = self
            .groups
            .clone()
            .unwrap_or_else(|| default_groups(num_vars, &generation.core));
        let groups = prepare_groups(groups, &generation.core, num_vars);
        let combinations = MergeIterator::new(config.t, num_vars, groups.clone());
        info!(
            variables = num_vars,
            forced = generation.core.len(),
            t = config.t,
            combinations = combinations.size(),
            "sampling"
        );

        let mut invalid = FxHashSet::default();
        let (mut covered, mut uncovered) = (0_u64, 0_u64);
        for (processed, condition) in (1_u64..).zip(combinations) {
            match generation.cover(&condition)? {
                Coverage::Covered => covered += 1,
                Coverage::Uncovered => uncovered += 1,
                Coverage::Invalid => {
                    invalid.insert(condition);
                }
            }
            if processed % PROGRESS_INTERVAL == 0 {
                debug!(
                    processed,
                    configurations = generation.incomplete.len() + generation.complete.len(),
                    "progress"
                );
            }
        }
        debug!(covered, invalid = invalid.len(), uncovered, "combinations processed");

        let mut configurations = Vec::with_capacity(generation.incomplete.len() + generation.complete.len());
        for configuration in generation.incomplete.iter().chain(&generation.complete) {
            configurations.push(configuration.complete_solution(&mut generation.ctx)?);
        }

        let statistic = CoverageStatistic::evaluate_with(
            &configurations,
            MergeIterator::new(config.t, num_vars, groups),
            |condition| invalid.contains(condition),
        );
        info!(
            configurations = configurations.len(),
            covered = statistic.covered(),
            invalid = statistic.invalid(),
            uncovered = statistic.uncovered(),
            coverage = statistic.coverage(),
            "sampling finished"
        );
        Ok(Sample {
            configurations,
            statistic,
            invalid_alternatives: generation.invalid_found,
        })
    }

    fn set_up(&self, cnf: &Cnf) -> Result<Generation<'_>> {
        let config = &self.config;
        let num_vars = cnf.num_vars();
        let mut rng = fastrand::Rng::with_seed(config.seed);
        let mut solutions = Solutions::new(DEFAULT_CAPACITY);

        let mut oracle = Oracle::new(cnf)?;
        oracle.set_timeout(config.timeout);
        match oracle.solve() {
            SatResult::Satisfiable(model) => solutions.record(&model),
            SatResult::Unsatisfiable => return Err(SamplerError::Unsatisfiable),
            SatResult::Timeout => warn!("satisfiability check timed out"),
        }

        let mig = match &self.mig {
            Some(mig) if mig.num_vars() != num_vars => {
                return Err(SamplerError::InvalidGraph(format!(
                    "graph over {} variables for a formula over {num_vars}",
                    mig.num_vars()
                )));
            }
            Some(mig) => Some(mig.clone()),
            None if config.use_mig => Some(build(cnf, &config.mig)?),
            None => None,
        };
        let core = match &mig {
            Some(mig) => {
                let core = mig.core_dead();
                oracle.assumptions_mut().push_all(core.iter().copied());
                core
            }
            None => core_dead(&mut oracle, &mut rng, Some(solutions.cache_mut()))?.literals,
        };

        let random_sample = random_configurations(&mut oracle, config.random_sample_size, &mut rng);
        for model in &random_sample {
            solutions.record(model);
        }
        oracle.set_selection_strategy(SelectionStrategy::Random { seed: rng.u64(..) });
        solutions.take_fresh();

        Ok(Generation {
            config,
            ctx: Context {
                oracle,
                mig,
                solutions,
                rng,
            },
            core,
            num_vars,
            random_sample,
            incomplete: Vec::new(),
            complete: Vec::new(),
            known_invalid: config.known_invalid.iter().cloned().collect(),
            invalid_seen: FxHashSet::default(),
            invalid_found: Vec::new(),
        })
    }
}

/// How a combination ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Coverage {
    Covered,
    /// No model realises any alternative.
    Invalid,
    /// The sample is full, or no alternative could be proven valid in time.
    Uncovered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Validity {
    Valid,
    Invalid,
    Unknown,
}

/// State of one run of [`TWiseSampler::sample`].
struct Generation<'a> {
    config: &'a TWiseConfig,
    ctx: Context,
    core: LiteralList,
    num_vars: usize,
    random_sample: Vec<Model>,
    /// Sorted by ascending number of set literals.
    incomplete: Vec<Configuration>,
    complete: Vec<Configuration>,
    known_invalid: FxHashSet<LiteralList>,
    invalid_seen: FxHashSet<LiteralList>,
    invalid_found: Vec<LiteralList>,
}

impl Generation<'_> {
    fn cover(&mut self, condition: &PresenceCondition) -> Result<Coverage> {
        if self.is_covered(condition) {
            return Ok(Coverage::Covered);
        }

        let mut candidates: Vec<(usize, usize)> = Vec::new();
        for (a, alternative) in condition.iter().enumerate() {
            for (c, configuration) in self.incomplete.iter().enumerate() {
                if !configuration.has_conflicts(alternative) {
                    candidates.push((a, c));
                }
            }
        }
        candidates.sort_by_key(|&(a, _)| condition[a].len());

        let cached = candidates.iter().copied().find(|&(a, c)| {
            self.incomplete[c].fits_cached(self.ctx.solutions.cache(), &condition[a])
        });
        if let Some((a, c)) = cached {
            trace!(alternative = %condition[a], "covered by a cached model");
            self.select(c, self.config.extend_deduce, &condition[a])?;
            return Ok(Coverage::Covered);
        }

        let validity: Vec<Validity> = condition.iter().map(|a| self.check_alternative(a)).collect();
        self.flush();
        if validity.iter().all(|&v| v == Validity::Invalid) {
            return Ok(Coverage::Invalid);
        }

        candidates.retain(|&(a, _)| validity[a] == Validity::Valid);
        for (a, c) in candidates {
            if self.fits_solver(c, &condition[a]) {
                self.flush();
                self.select(c, self.config.extend_deduce, &condition[a])?;
                return Ok(Coverage::Covered);
            }
        }
        self.flush();

        let Some(a) = validity.iter().position(|&v| v == Validity::Valid) else {
            return Ok(Coverage::Uncovered);
        };
        if self.incomplete.len() + self.complete.len() >= self.config.max_sample_size {
            return Ok(Coverage::Uncovered);
        }
        self.new_configuration(&condition[a])?;
        Ok(Coverage::Covered)
    }

    fn is_covered(&self, condition: &PresenceCondition) -> bool {
        self.complete
            .iter()
            .chain(&self.incomplete)
            .any(|configuration| condition.iter().any(|a| configuration.contains_all(a)))
    }

    /// Decides whether some model contains `alternative`: the graph first, then the
    /// random sample, then the solver.
    fn check_alternative(&mut self, alternative: &LiteralList) -> Validity {
        let mode = self.config.invalid_clauses;
        if mode == InvalidClausesMode::Use {
            return if self.known_invalid.contains(alternative) {
                Validity::Invalid
            } else {
                Validity::Valid
            };
        }

        let validity = if self
            .ctx
            .mig
            .as_ref()
            .is_some_and(|mig| mig.is_combination_invalid(alternative))
        {
            Validity::Invalid
        } else if self.random_sample.iter().any(|model| is_compatible(model, alternative)) {
            Validity::Valid
        } else {
            let mut oracle = self.ctx.oracle.scope();
            oracle.assumptions_mut().push_all(alternative.iter().copied());
            match oracle.solve() {
                SatResult::Satisfiable(model) => {
                    self.ctx.solutions.record(&model);
                    oracle.shuffle_order(&mut self.ctx.rng);
                    Validity::Valid
                }
                SatResult::Unsatisfiable => Validity::Invalid,
                SatResult::Timeout => Validity::Unknown,
            }
        };

        if validity == Validity::Invalid
            && mode == InvalidClausesMode::Create
            && self.invalid_seen.insert(alternative.clone())
        {
            self.invalid_found.push(alternative.clone());
        }
        validity
    }

    /// Asks the solver whether configuration `c` can take `alternative`.
    fn fits_solver(&mut self, c: usize, alternative: &LiteralList) -> bool {
        let configuration = &self.incomplete[c];
        let mut oracle = self.ctx.oracle.scope();
        configuration.set_up_oracle(&mut oracle);
        let before = oracle.assumptions().len();
        oracle.assumptions_mut().push_all(
            alternative
                .iter()
                .copied()
                .filter(|&l| configuration.literals()[position(l)] == 0),
        );
        if oracle.assumptions().len() == before {
            return true;
        }
        match oracle.solve() {
            SatResult::Satisfiable(model) => {
                self.ctx.solutions.record(&model);
                oracle.shuffle_order(&mut self.ctx.rng);
                true
            }
            SatResult::Unsatisfiable | SatResult::Timeout => false,
        }
    }

    /// Adds `alternative` to configuration `c` and retires the configuration once it is
    /// complete.
    fn select(&mut self, c: usize, deduce: Deduce, alternative: &LiteralList) -> Result<()> {
        let configuration = &mut self.incomplete[c];
        configuration.set_literals(&mut self.ctx, alternative.literals());
        apply_deduce(configuration, &mut self.ctx, deduce)?;
        self.flush();

        if self.incomplete[c].is_complete() {
            let mut done = self.incomplete.remove(c);
            done.freeze();
            self.complete.push(done);
        }
        self.incomplete.sort_by_key(Configuration::count_literals);
        Ok(())
    }

    fn new_configuration(&mut self, alternative: &LiteralList) -> Result<()> {
        let mut configuration = Configuration::new(self.num_vars, &self.core);
        configuration.set_literals(&mut self.ctx, alternative.literals());
        apply_deduce(&mut configuration, &mut self.ctx, self.config.create_deduce)?;
        self.flush();
        configuration.update_compatible(self.ctx.solutions.cache());
        trace!(
            alternative = %alternative,
            set = configuration.count_literals(),
            "new configuration"
        );

        if configuration.is_complete() {
            configuration.freeze();
            self.complete.push(configuration);
        } else {
            self.incomplete.push(configuration);
            self.incomplete.sort_by_key(Configuration::count_literals);
        }
        Ok(())
    }

    /// Tells every incomplete configuration about the models cached since the last call.
    fn flush(&mut self) {
        for seq in self.ctx.solutions.take_fresh() {
            let Some(model) = self.ctx.solutions.cache().get(seq) else {
                continue;
            };
            for configuration in &mut self.incomplete {
                configuration.on_cache_insert(seq, model);
            }
        }
    }
}

fn apply_deduce(configuration: &mut Configuration, ctx: &mut Context, deduce: Deduce) -> Result<()> {
    match deduce {
        Deduce::None => {}
        Deduce::Dp => configuration.propagate(ctx)?,
        Deduce::Ac => configuration.auto_complete(ctx),
    }
    Ok(())
}
