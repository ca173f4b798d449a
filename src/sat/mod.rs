#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
/// Variable values.
pub mod assignment;
/// The search engine.
pub mod cdcl;
/// Clauses as stored by the engine.
pub mod clause;
/// Formulas in conjunctive normal form.
pub mod cnf;
/// First-UIP clause learning.
pub mod conflict_analysis;
/// DIMACS reading and writing.
pub mod dimacs;
/// Literal encodings.
pub mod literal;
/// Sorted literal sets.
pub mod literal_list;
/// Helpers for full and partial models.
pub mod model;
/// Incremental solving under an assumption stack.
pub mod oracle;
/// Saved polarities.
pub mod phase_saving;
/// Restart policies.
pub mod restarter;
/// Decision strategies.
pub mod selection;
/// Bounded storage of models.
pub mod solution_cache;
/// Assignment history.
pub mod trail;
/// Variable heuristics.
pub mod variable_selection;
/// Two-watched-literal lists.
pub mod watch;
