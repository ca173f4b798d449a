#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A reader for the DIMACS CNF file format.
//!
//! Besides the plain format this reader understands the variable-name comments
//! written by feature-model tools:
//!
//! ```text
//! c 1 Root
//! c 2 Engine
//! p cnf 2 1
//! -2 1 0
//! ```
//!
//! - Lines starting with `c` are comments. A comment of the form `c <id> <name>` names
//!   variable `<id>`.
//! - The problem line `p cnf <vars> <clauses>` fixes the size of the variable universe;
//!   clauses that mention larger variables grow it.
//! - Clauses are whitespace-separated literals terminated by `0` and may span lines.
//! - A line starting with `%` ends the data.

use crate::error::{Result, SamplerError};
use crate::sat::cnf::Cnf;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

/// Parses DIMACS data from any buffered reader.
///
/// # Errors
///
/// - `SamplerError::Io` if reading fails.
/// - `SamplerError::Parse` for malformed problem lines or non-integer literals.
pub fn parse_dimacs<R: BufRead>(reader: R) -> Result<Cnf> {
    let mut declared_vars = 0_usize;
    let mut names: Vec<(usize, String)> = Vec::new();
    let mut clauses: Vec<Vec<i32>> = Vec::new();
    let mut current: Vec<i32> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = line_no + 1;
        let mut parts = line.split_whitespace().peekable();

        match parts.peek() {
            Some(&"%") => break,
            None => {}
            Some(&"c") => {
                parts.next();
                if let Some(id) = parts.next().and_then(|s| s.parse::<usize>().ok()) {
                    let name = parts.collect::<Vec<_>>().join(" ");
                    if id > 0 && !name.is_empty() {
                        names.push((id, name));
                    }
                }
            }
            Some(&"p") => {
                let header: Vec<&str> = parts.collect();
                if header.len() < 4 || header[1] != "cnf" {
                    return Err(SamplerError::Parse {
                        line: line_no,
                        message: format!("malformed problem line '{line}'"),
                    });
                }
                declared_vars = header[2].parse().map_err(|e| SamplerError::Parse {
                    line: line_no,
                    message: format!("invalid variable count '{}': {e}", header[2]),
                })?;
            }
            Some(_) => {
                for token in parts {
                    let literal = token.parse::<i32>().map_err(|e| SamplerError::Parse {
                        line: line_no,
                        message: format!("failed to parse literal '{token}': {e}"),
                    })?;
                    if literal == 0 {
                        clauses.push(std::mem::take(&mut current));
                    } else {
                        current.push(literal);
                    }
                }
            }
        }
    }

    if !current.is_empty() {
        clauses.push(current);
    }

    let named_vars = names.iter().map(|(id, _)| *id).max().unwrap_or(0);
    let mut cnf = Cnf::from_clauses(declared_vars.max(named_vars), clauses)?;
    for (id, name) in names {
        if let Ok(var) = u32::try_from(id) {
            cnf.set_name(var, name);
        }
    }
    Ok(cnf)
}

/// Parses a DIMACS file.
///
/// # Errors
///
/// See [`parse_dimacs`]; additionally fails if the file cannot be opened.
pub fn parse_file(file_path: impl AsRef<Path>) -> Result<Cnf> {
    let file = std::fs::File::open(file_path)?;
    parse_dimacs(io::BufReader::new(file))
}

/// Collects every `.cnf` or `.dimacs` file below `dir`, sorted by path.
///
/// A path that is itself a file is returned as the only element.
#[must_use]
pub fn find_dimacs_files(dir: impl AsRef<Path>) -> Vec<PathBuf> {
    let dir = dir.as_ref();
    if dir.is_file() {
        return vec![dir.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .map(walkdir::DirEntry::into_path)
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext == "cnf" || ext == "dimacs")
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_simple_dimacs() {
        let dimacs_content = "c This is a comment\n\
                              p cnf 3 2\n\
                              1 -2 0\n\
                              2 3 0\n";
        let cnf = parse_dimacs(Cursor::new(dimacs_content)).unwrap();

        assert_eq!(cnf.len(), 2);
        assert_eq!(cnf.num_vars(), 3);
        assert_eq!(cnf[0].literals(), &[1, -2]);
        assert_eq!(cnf[1].literals(), &[2, 3]);
    }

    #[test]
    fn test_parse_names() {
        let dimacs_content = "c 1 Root\nc 2 Big Engine\np cnf 2 1\n-2 1 0\n";
        let cnf = parse_dimacs(Cursor::new(dimacs_content)).unwrap();

        assert_eq!(cnf.name(1), Some("Root"));
        assert_eq!(cnf.name(2), Some("Big Engine"));
        assert_eq!(cnf.variable("Root"), Some(1));
    }

    #[test]
    fn test_clause_spanning_lines_and_end_marker() {
        let dimacs_content = "p cnf 3 2\n1 2\n3 0\n\n-2 0\n%\n5 0\n";
        let cnf = parse_dimacs(Cursor::new(dimacs_content)).unwrap();

        assert_eq!(cnf.len(), 2);
        assert_eq!(cnf[0].literals(), &[1, 2, 3]);
        assert_eq!(cnf[1].literals(), &[-2]);
    }

    #[test]
    fn test_empty_clause_is_kept() {
        let cnf = parse_dimacs(Cursor::new("p cnf 1 1\n0\n")).unwrap();
        assert_eq!(cnf.len(), 1);
        assert!(cnf[0].is_empty());
    }

    #[test]
    fn test_malformed_literal() {
        let err = parse_dimacs(Cursor::new("1 abc 0\n")).unwrap_err();
        assert!(matches!(err, SamplerError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_malformed_header() {
        let err = parse_dimacs(Cursor::new("p dnf 1 1\n")).unwrap_err();
        assert!(matches!(err, SamplerError::Parse { .. }));
    }

    #[test]
    fn test_universe_grows_past_header() {
        let cnf = parse_dimacs(Cursor::new("p cnf 1 1\n1 -3 0\n")).unwrap();
        assert_eq!(cnf.num_vars(), 3);
    }
}
