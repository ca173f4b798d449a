#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The formula representation shared by every component.
//!
//! A `Cnf` owns a contiguous variable universe `1..=num_vars`, an optional name per
//! variable (only used for rendering) and an ordered list of clauses. Tautological
//! clauses are filtered on insertion; literal order inside a clause is normalised.

use crate::error::{Result, SamplerError};
use crate::sat::literal_list::LiteralList;
use crate::sat::model::position;
use rustc_hash::FxHashMap;
use std::fmt::{Display, Formatter};
use std::ops::Index;

/// Conjunctive normal form over a named variable universe.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cnf {
    names: Vec<String>,
    index: FxHashMap<String, u32>,
    clauses: Vec<LiteralList>,
}

impl Cnf {
    /// Creates an empty formula over `num_vars` anonymous variables.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self::with_names((1..=num_vars).map(|i| i.to_string()))
    }

    /// Creates an empty formula whose variable `i` is named by the `i`-th item.
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), u32::try_from(i + 1).unwrap_or(u32::MAX)))
            .collect();
        Self {
            names,
            index,
            clauses: Vec::new(),
        }
    }

    /// Builds a formula from DIMACS-style clauses, growing the universe to fit.
    ///
    /// # Errors
    ///
    /// Never fails for non-zero literals; zeros inside a clause are dropped.
    pub fn from_clauses<I, C>(num_vars: usize, clauses: I) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: IntoIterator<Item = i32>,
    {
        let clauses: Vec<LiteralList> = clauses.into_iter().map(LiteralList::new).collect();
        let needed = clauses
            .iter()
            .flat_map(LiteralList::iter)
            .map(|l| l.unsigned_abs() as usize)
            .max()
            .unwrap_or(0);
        let mut cnf = Self::new(num_vars.max(needed));
        for clause in clauses {
            cnf.add_clause(clause)?;
        }
        Ok(cnf)
    }

    /// Number of variables.
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.names.len()
    }

    /// Number of clauses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// `true` if the formula has no clause.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// The clauses in insertion order.
    #[must_use]
    pub fn clauses(&self) -> &[LiteralList] {
        &self.clauses
    }

    /// Iterates over the clauses.
    pub fn iter(&self) -> impl Iterator<Item = &LiteralList> {
        self.clauses.iter()
    }

    /// Name of variable `var`, if it exists.
    #[must_use]
    pub fn name(&self, var: u32) -> Option<&str> {
        let i = (var as usize).checked_sub(1)?;
        self.names.get(i).map(String::as_str)
    }

    /// Variable carrying `name`.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<u32> {
        self.index.get(name).copied()
    }

    /// Renames variable `var`.
    pub fn set_name(&mut self, var: u32, name: impl Into<String>) {
        if let Some(slot) = (var as usize)
            .checked_sub(1)
            .and_then(|i| self.names.get_mut(i))
        {
            let name = name.into();
            self.index.remove(slot.as_str());
            self.index.insert(name.clone(), var);
            *slot = name;
        }
    }

    /// Appends a fresh variable and returns its id.
    pub fn add_variable(&mut self, name: impl Into<String>) -> u32 {
        let var = u32::try_from(self.names.len() + 1).unwrap_or(u32::MAX);
        let name = name.into();
        self.index.insert(name.clone(), var);
        self.names.push(name);
        var
    }

    /// Adds a clause. Tautologies are dropped silently.
    ///
    /// # Returns
    ///
    /// `true` if the clause was stored.
    ///
    /// # Errors
    ///
    /// `SamplerError::VariableOutOfRange` if a literal names an unknown variable.
    pub fn add_clause(&mut self, clause: impl Into<LiteralList>) -> Result<bool> {
        let clause = clause.into();
        if let Some(&literal) = clause
            .iter()
            .find(|l| l.unsigned_abs() as usize > self.num_vars())
        {
            return Err(SamplerError::VariableOutOfRange {
                literal,
                num_vars: self.num_vars(),
            });
        }
        if clause.is_tautology() {
            return Ok(false);
        }
        self.clauses.push(clause);
        Ok(true)
    }

    /// Checks a complete model against every clause.
    #[must_use]
    pub fn verify(&self, model: &[i32]) -> bool {
        self.clauses.iter().all(|c| {
            c.iter()
                .any(|&l| model.get(position(l)).is_some_and(|&v| v == l))
        })
    }
}

impl Index<usize> for Cnf {
    type Output = LiteralList;

    fn index(&self, index: usize) -> &Self::Output {
        &self.clauses[index]
    }
}

impl Display for Cnf {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, name) in self.names.iter().enumerate() {
            writeln!(f, "c {} {name}", i + 1)?;
        }
        writeln!(f, "p cnf {} {}", self.num_vars(), self.clauses.len())?;
        for clause in &self.clauses {
            for lit in clause {
                write!(f, "{lit} ")?;
            }
            writeln!(f, "0")?;
        }
        Ok(())
    }
}
