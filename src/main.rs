//! # sat_sampler
//!
//! Command-line front end of the sampler. Every subcommand reads DIMACS CNF files,
//! where `c <index> <name>` comment lines name the variables.
//!
//! ```sh
//! sat_sampler [-v...] [--debug] <SUBCOMMAND>
//! ```
//!
//! - **`sample`**: print a t-wise sample, one configuration per line.
//!   ```sh
//!   sat_sampler sample model.cnf -t 2 --create-deduce dp --stats
//!   ```
//! - **`core-dead`**: print the variables fixed in every configuration.
//! - **`atomic-sets`**: print the groups of literals that always share a value.
//! - **`mig`**: build the modal implication graph and save it for later runs.
//!   ```sh
//!   sat_sampler mig model.cnf --output model.mig
//!   sat_sampler sample model.cnf --mig model.mig
//!   ```
//! - **`report`**: print the pairwise dependencies between named variables.
//! - **`completions`**: print a shell completion script.
//!
//! Paths given to `sample`, `core-dead` and `atomic-sets` may be directories, in which
//! case every `.cnf` file below them is processed.
//!
//! Logs go to stderr. `-v` enables info, `-vv` debug and `-vvv` trace output; the
//! `RUST_LOG` variable overrides both.

use crate::command_line::cli::{Cli, run};
use clap::Parser;
use tikv_jemallocator::Jemalloc;
use tracing_subscriber::EnvFilter;

mod command_line {
    pub(crate) mod cli;
}

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn init_logging(verbose: u8, debug: bool) {
    let level = match (verbose, debug) {
        (0, false) => "warn",
        (0 | 1, true) | (2, _) => "debug",
        (1, false) => "info",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
