#![allow(clippy::cast_precision_loss)]

use clap::{Args, CommandFactory, Parser, Subcommand};
use itertools::Itertools;
use sat_sampler::analysis::atomic_sets::atomic_sets;
use sat_sampler::analysis::backbone::core_dead;
use sat_sampler::analysis::one_wise::{CoverStrategy, one_wise};
use sat_sampler::error::{Result, SamplerError};
use sat_sampler::mig::Mig;
use sat_sampler::mig::builder::{MigConfig, build};
use sat_sampler::mig::io::{load_file, save_file};
use sat_sampler::mig::report::write_dependencies;
use sat_sampler::sat::cdcl::SolveStats;
use sat_sampler::sat::cnf::Cnf;
use sat_sampler::sat::dimacs::{find_dimacs_files, parse_file};
use sat_sampler::sat::literal_list::LiteralList;
use sat_sampler::sat::oracle::Oracle;
use sat_sampler::twise::{Deduce, InvalidClausesMode, Sample, TWiseConfig, TWiseSampler};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tikv_jemalloc_ctl::{epoch, stats};
use tracing::info;

/// Defines the command-line interface of the sampler.
#[derive(Parser, Debug)]
#[command(
    name = "sat_sampler",
    version,
    about = "Feature-model analysis and t-wise sampling"
)]
pub(crate) struct Cli {
    /// Verbosity level (-v, -vv, -vvv). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Shorthand for debug-level logging.
    #[arg(short, long, default_value_t = false, global = true)]
    pub debug: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

/// Enumerates the available subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Generate a t-wise sample for every DIMACS file found under the path.
    Sample {
        /// A DIMACS file or a directory of them.
        path: PathBuf,

        #[command(flatten)]
        options: SampleOptions,

        #[command(flatten)]
        graph: GraphOptions,

        /// Load the implication graph from this file instead of building it.
        #[arg(long)]
        mig: Option<PathBuf>,

        /// Write the configurations to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Print the core and dead variables.
    CoreDead {
        path: PathBuf,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Print the atomic sets, one per line.
    AtomicSets {
        path: PathBuf,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Print configurations covering every variable with one polarity.
    OneWise {
        path: PathBuf,

        /// Polarity every variable must take at least once.
        #[arg(long, value_enum, default_value_t = CoverStrategy::Negative)]
        cover: CoverStrategy,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Build an implication graph and save it.
    Mig {
        /// A DIMACS file.
        path: PathBuf,

        /// Destination of the graph.
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        graph: GraphOptions,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Print the ALWAYS/NEVER/MAYBE dependencies between variables.
    Report {
        /// A DIMACS file.
        path: PathBuf,

        /// Load the implication graph from this file instead of building it.
        #[arg(long)]
        mig: Option<PathBuf>,

        #[command(flatten)]
        graph: GraphOptions,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Options shared by every analysis.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct CommonOptions {
    /// Seed of every random choice.
    #[arg(long, default_value_t = 42)]
    pub(crate) seed: u64,

    /// Budget of each individual solver call, in milliseconds.
    #[arg(long)]
    pub(crate) timeout_ms: Option<u64>,

    /// Print performance statistics after each file.
    #[arg(short, long, default_value_t = false)]
    pub(crate) stats: bool,
}

impl CommonOptions {
    fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Options of the implication graph.
#[derive(Args, Debug, Default, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct GraphOptions {
    /// Skip the transitive closure of the strong edges.
    #[arg(long, default_value_t = false)]
    no_strong_closure: bool,

    /// Ask the solver for implications hidden in longer clauses.
    #[arg(long, default_value_t = false)]
    detect_strong: bool,

    /// Drop longer clauses implied by the rest of the formula.
    #[arg(long, default_value_t = false)]
    check_redundancy: bool,
}

impl GraphOptions {
    pub(crate) fn to_config(&self, common: &CommonOptions) -> MigConfig {
        MigConfig {
            strong_closure: !self.no_strong_closure,
            detect_strong: self.detect_strong,
            check_redundancy: self.check_redundancy,
            timeout: common.timeout(),
            seed: common.seed,
        }
    }
}

/// Options of the t-wise generator.
#[derive(Args, Debug, Clone)]
pub(crate) struct SampleOptions {
    /// Interaction strength.
    #[arg(short, default_value_t = 2)]
    t: usize,

    /// Upper bound on the number of configurations.
    #[arg(long)]
    max_size: Option<usize>,

    /// Deduction after a configuration was created.
    #[arg(long, value_enum, default_value_t = Deduce::Dp)]
    create_deduce: Deduce,

    /// Deduction after a configuration was extended.
    #[arg(long, value_enum, default_value_t = Deduce::None)]
    extend_deduce: Deduce,

    /// Handling of invalid alternatives.
    #[arg(long, value_enum, default_value_t = InvalidClausesMode::None)]
    invalid_clauses: InvalidClausesMode,

    /// DIMACS file whose clauses are alternatives known to be invalid.
    #[arg(long)]
    known_invalid: Option<PathBuf>,

    /// Random models drawn before sampling.
    #[arg(long, default_value_t = 0)]
    random_sample_size: usize,

    /// Sample without an implication graph.
    #[arg(long, default_value_t = false)]
    no_mig: bool,
}

impl SampleOptions {
    pub(crate) fn to_config(
        &self,
        graph: &GraphOptions,
        common: &CommonOptions,
    ) -> Result<TWiseConfig> {
        let known_invalid = match &self.known_invalid {
            Some(path) => parse_file(path)?.clauses().to_vec(),
            None => Vec::new(),
        };
        Ok(TWiseConfig {
            t: self.t,
            max_sample_size: self.max_size.unwrap_or(usize::MAX),
            create_deduce: self.create_deduce,
            extend_deduce: self.extend_deduce,
            invalid_clauses: self.invalid_clauses,
            known_invalid,
            random_sample_size: self.random_sample_size,
            seed: common.seed,
            timeout: common.timeout(),
            use_mig: !self.no_mig,
            mig: graph.to_config(common),
        })
    }
}

/// Runs the selected subcommand.
///
/// # Errors
///
/// The first failure of any file.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sample {
            path,
            options,
            graph,
            mig,
            output,
            common,
        } => {
            let config = options.to_config(&graph, &common)?;
            let mig = mig.map(load_file).transpose()?;
            for file in dimacs_files(&path)? {
                sample_file(&file, &config, mig.clone(), output.as_deref(), &common)?;
            }
            Ok(())
        }
        Commands::CoreDead { path, common } => {
            for file in dimacs_files(&path)? {
                core_dead_file(&file, &common)?;
            }
            Ok(())
        }
        Commands::AtomicSets { path, common } => {
            for file in dimacs_files(&path)? {
                atomic_sets_file(&file, &common)?;
            }
            Ok(())
        }
        Commands::OneWise {
            path,
            cover,
            common,
        } => {
            for file in dimacs_files(&path)? {
                one_wise_file(&file, cover, &common)?;
            }
            Ok(())
        }
        Commands::Mig {
            path,
            output,
            graph,
            common,
        } => mig_file(&path, &output, &graph.to_config(&common), &common),
        Commands::Report {
            path,
            mig,
            graph,
            common,
        } => {
            let cnf = parse_file(&path)?;
            let mig = match mig {
                Some(mig_path) => load_file(mig_path)?,
                None => build(&cnf, &graph.to_config(&common))?,
            };
            write_dependencies(&mig, &cnf, std::io::stdout().lock())
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
            Ok(())
        }
    }
}

fn dimacs_files(path: &Path) -> Result<Vec<PathBuf>> {
    let files = find_dimacs_files(path);
    if files.is_empty() {
        return Err(SamplerError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no DIMACS files under {}", path.display()),
        )));
    }
    Ok(files)
}

fn parse_timed(path: &Path) -> Result<(Cnf, Duration)> {
    let time = Instant::now();
    let cnf = parse_file(path)?;
    let elapsed = time.elapsed();
    info!(path = %path.display(), variables = cnf.num_vars(), clauses = cnf.len(), "parsed");
    Ok((cnf, elapsed))
}

fn sample_file(
    path: &Path,
    config: &TWiseConfig,
    mig: Option<Mig>,
    output: Option<&Path>,
    common: &CommonOptions,
) -> Result<()> {
    let (cnf, parse_time) = parse_timed(path)?;
    let mut sampler = TWiseSampler::new(config.clone());
    if let Some(mig) = mig {
        sampler = sampler.with_mig(mig);
    }

    let time = Instant::now();
    let sample = sampler.sample(&cnf)?;
    let elapsed = time.elapsed();

    match output {
        Some(output) => {
            let mut writer = std::io::BufWriter::new(std::fs::File::create(output)?);
            write_sample(&sample, &mut writer)?;
            writer.flush()?;
        }
        None => write_sample(&sample, std::io::stdout().lock())?,
    }

    if common.stats {
        print_problem_stats(path, parse_time, &cnf);
        print_sample_stats(elapsed, &sample);
    }
    Ok(())
}

/// Writes one configuration per line, DIMACS style.
pub(crate) fn write_sample<W: Write>(sample: &Sample, mut writer: W) -> Result<()> {
    for configuration in &sample.configurations {
        writeln!(writer, "{}", format_clause(configuration))?;
    }
    Ok(())
}

pub(crate) fn format_clause(literals: &LiteralList) -> String {
    literals.iter().map(ToString::to_string).chain(["0".into()]).join(" ")
}

/// Name of a literal's variable, prefixed with `-` when negative.
pub(crate) fn literal_name(cnf: &Cnf, literal: i32) -> String {
    let var = literal.unsigned_abs();
    let name = cnf.name(var).map_or_else(|| var.to_string(), ToString::to_string);
    if literal < 0 { format!("-{name}") } else { name }
}

fn core_dead_file(path: &Path, common: &CommonOptions) -> Result<()> {
    let (cnf, parse_time) = parse_timed(path)?;
    let mut oracle = Oracle::new(&cnf)?;
    oracle.set_timeout(common.timeout());
    let mut rng = fastrand::Rng::with_seed(common.seed);

    let time = Instant::now();
    let backbone = core_dead(&mut oracle, &mut rng, None)?;
    let elapsed = time.elapsed();

    let (core, dead): (Vec<i32>, Vec<i32>) = backbone.literals.iter().copied().partition(|&l| l > 0);
    println!("core: {}", core.iter().map(|&l| literal_name(&cnf, l)).join(" "));
    println!("dead: {}", dead.iter().map(|&l| literal_name(&cnf, -l)).join(" "));
    if !backbone.undecided.is_empty() {
        println!("undecided: {}", backbone.undecided.iter().join(" "));
    }

    if common.stats {
        print_problem_stats(path, parse_time, &cnf);
        print_search_stats(elapsed, oracle.stats());
    }
    Ok(())
}

fn atomic_sets_file(path: &Path, common: &CommonOptions) -> Result<()> {
    let (cnf, parse_time) = parse_timed(path)?;
    let mut oracle = Oracle::new(&cnf)?;
    oracle.set_timeout(common.timeout());
    let mut rng = fastrand::Rng::with_seed(common.seed);

    let time = Instant::now();
    let sets = atomic_sets(&mut oracle, &mut rng, None);
    let elapsed = time.elapsed();

    for group in &sets.groups {
        println!("{}", group.iter().map(|&l| literal_name(&cnf, l)).join(" "));
    }
    if !sets.undecided.is_empty() {
        println!("undecided: {}", sets.undecided.iter().join(" "));
    }

    if common.stats {
        print_problem_stats(path, parse_time, &cnf);
        print_search_stats(elapsed, oracle.stats());
    }
    Ok(())
}

fn one_wise_file(path: &Path, cover: CoverStrategy, common: &CommonOptions) -> Result<()> {
    let (cnf, parse_time) = parse_timed(path)?;
    let mut oracle = Oracle::new(&cnf)?;
    oracle.set_timeout(common.timeout());

    let time = Instant::now();
    let sample = one_wise(&mut oracle, None, cover, None)?;
    let elapsed = time.elapsed();

    let mut out = std::io::stdout().lock();
    for configuration in &sample.configurations {
        writeln!(out, "{}", format_clause(configuration))?;
    }
    if !sample.uncoverable.is_empty() {
        writeln!(out, "c uncoverable: {}", sample.uncoverable.iter().join(" "))?;
    }
    if !sample.undecided.is_empty() {
        writeln!(out, "c undecided: {}", sample.undecided.iter().join(" "))?;
    }
    drop(out);

    if common.stats {
        print_problem_stats(path, parse_time, &cnf);
        print_search_stats(elapsed, oracle.stats());
    }
    Ok(())
}

fn mig_file(path: &Path, output: &Path, config: &MigConfig, common: &CommonOptions) -> Result<()> {
    let (cnf, parse_time) = parse_timed(path)?;
    let time = Instant::now();
    let mig = build(&cnf, config)?;
    let elapsed = time.elapsed();
    save_file(&mig, output)?;
    println!("graph written to: {}", output.display());

    if common.stats {
        print_problem_stats(path, parse_time, &cnf);
        println!("=========================[ Graph Statistics ]========================");
        stat_line("Build time (s)", format!("{:.3}", elapsed.as_secs_f64()));
        stat_line("Core/dead variables", mig.core_dead().len());
        stat_line("Strong edges", mig.count_strong_edges());
        stat_line("Complex clauses", mig.all_complex_clauses().len());
        print_memory_stats();
    }
    Ok(())
}

/// Allocated and resident memory in MiB, zero if jemalloc cannot report them.
pub(crate) fn memory_usage() -> (f64, f64) {
    if epoch::advance().is_err() {
        return (0.0, 0.0);
    }
    let read = |mib: std::result::Result<usize, tikv_jemalloc_ctl::Error>| {
        mib.map_or(0.0, |bytes| bytes as f64 / (1024.0 * 1024.0))
    };
    (
        read(stats::allocated::read()),
        read(stats::resident::read()),
    )
}

/// Helper function to print a single statistic line in a formatted table row.
pub(crate) fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("|  {label:<28} {value:>18}  |");
}

/// Helper function to print a statistic line that includes a rate (value/second).
pub(crate) fn stat_line_with_rate(label: &str, value: usize, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("|  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

fn print_problem_stats(path: &Path, parse_time: Duration, cnf: &Cnf) {
    println!("\n=======================[ Problem Statistics ]=========================");
    stat_line("File", path.file_name().map_or_else(String::new, |f| f.to_string_lossy().into_owned()));
    stat_line("Parse time (s)", format!("{:.3}", parse_time.as_secs_f64()));
    stat_line("Variables", cnf.num_vars());
    stat_line("Clauses", cnf.len());
}

fn print_search_stats(elapsed: Duration, s: &SolveStats) {
    let elapsed_secs = elapsed.as_secs_f64();
    println!("========================[ Search Statistics ]========================");
    stat_line("Solver calls", s.solves);
    stat_line("Learnt clauses", s.learnt_clauses);
    stat_line_with_rate("Conflicts", s.conflicts, elapsed_secs);
    stat_line_with_rate("Decisions", s.decisions, elapsed_secs);
    stat_line_with_rate("Propagations", s.propagations, elapsed_secs);
    stat_line_with_rate("Restarts", s.restarts, elapsed_secs);
    stat_line("CPU time (s)", format!("{elapsed_secs:.3}"));
    print_memory_stats();
}

fn print_sample_stats(elapsed: Duration, sample: &Sample) {
    let statistic = &sample.statistic;
    println!("========================[ Sample Statistics ]========================");
    stat_line("Configurations", sample.configurations.len());
    stat_line("Valid combinations", statistic.valid());
    stat_line("Covered", statistic.covered());
    stat_line("Uncovered", statistic.uncovered());
    stat_line("Invalid", statistic.invalid());
    stat_line("Coverage", format!("{:.4}", statistic.coverage()));
    if !sample.invalid_alternatives.is_empty() {
        stat_line("Invalid alternatives", sample.invalid_alternatives.len());
    }
    stat_line("CPU time (s)", format!("{:.3}", elapsed.as_secs_f64()));
    print_memory_stats();
}

fn print_memory_stats() {
    let (allocated, resident) = memory_usage();
    stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
    stat_line("Resident memory (MiB)", format!("{resident:.2}"));
    println!("=====================================================================");
}
