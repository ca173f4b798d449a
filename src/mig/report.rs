#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Plain-text rendering of the relationships stored in a [`Mig`].

use crate::error::Result;
use crate::mig::Mig;
use crate::sat::cnf::Cnf;
use std::borrow::Cow;
use std::io::Write;

const HEADER: &str = "X ALWAYS Y := If X is selected then Y is selected in every valid configuration.\n\
X MAYBE  Y := If X is selected then Y is selected in at least one but not all valid configurations. \n\
X NEVER  Y := If X is selected then Y cannot be selected in any valid configuration.\n\n";

/// Renders one statement per line for every positive literal that is neither core nor
/// dead: `ALWAYS`/`NEVER` for its strong edges and `MAYBE` for the positive literals
/// of its complex clauses.
#[must_use]
pub fn dependencies_report(mig: &Mig, cnf: &Cnf) -> String {
    let mut out = String::from(HEADER);
    for vertex in mig.vertices() {
        let literal = vertex.literal();
        if literal < 0 || !vertex.is_normal() {
            continue;
        }
        let name = name_of(cnf, literal);
        for &target in vertex.strong_edges() {
            if !mig.vertex(target).is_normal() {
                continue;
            }
            let relation = if target > 0 { "ALWAYS" } else { "NEVER" };
            out.push_str(&format!("{name} {relation} {}\n", name_of(cnf, target)));
        }
        for clause in mig.complex_clauses(literal) {
            for &other in clause.iter().filter(|&&l| l > 0 && l != literal) {
                out.push_str(&format!("{name} MAYBE {}\n", name_of(cnf, other)));
            }
        }
    }
    out
}

/// Writes [`dependencies_report`] to `writer`.
///
/// # Errors
///
/// I/O failures of `writer`.
pub fn write_dependencies<W: Write>(mig: &Mig, cnf: &Cnf, mut writer: W) -> Result<()> {
    writer.write_all(dependencies_report(mig, cnf).as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Name of the variable of `literal`, or its number if it has none.
fn name_of(cnf: &Cnf, literal: i32) -> Cow<'_, str> {
    let var = literal.unsigned_abs();
    cnf.name(var)
        .map_or_else(|| Cow::Owned(var.to_string()), Cow::Borrowed)
}
