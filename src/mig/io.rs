#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Binary persistence of implication graphs.
//!
//! A file starts with the magic bytes [`MIG_MAGIC`] and the little-endian format
//! version [`MIG_VERSION`], followed by the `bincode` encoding of the [`Mig`].

use crate::error::{Result, SamplerError};
use crate::mig::Mig;
use crate::mig::vertex::vertex_index;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// Magic header identifying a persisted graph.
pub const MIG_MAGIC: &[u8; 4] = b"MIG1";
/// Version of the persisted layout.
pub const MIG_VERSION: u32 = 1;

/// Writes `mig` to `writer`.
///
/// # Errors
///
/// I/O or serialisation failures.
pub fn save<W: Write>(mig: &Mig, mut writer: W) -> Result<()> {
    writer.write_all(MIG_MAGIC)?;
    writer.write_all(&MIG_VERSION.to_le_bytes())?;
    bincode::serialize_into(&mut writer, mig)?;
    writer.flush()?;
    Ok(())
}

/// Reads a graph written by [`save`].
///
/// # Errors
///
/// `SamplerError::InvalidGraph` on a wrong header or an inconsistent graph, I/O or
/// serialisation failures otherwise.
pub fn load<R: Read>(mut reader: R) -> Result<Mig> {
    let mut magic = [0_u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != MIG_MAGIC {
        return Err(SamplerError::InvalidGraph("missing magic header".into()));
    }
    let mut version = [0_u8; 4];
    reader.read_exact(&mut version)?;
    let version = u32::from_le_bytes(version);
    if version != MIG_VERSION {
        return Err(SamplerError::InvalidGraph(format!(
            "unsupported version {version}, expected {MIG_VERSION}"
        )));
    }

    let mig: Mig = bincode::deserialize_from(reader)?;
    validate(&mig)?;
    Ok(mig)
}

/// Writes `mig` to the file at `path`.
///
/// # Errors
///
/// See [`save`].
pub fn save_file(mig: &Mig, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    save(mig, BufWriter::new(File::create(path)?))?;
    debug!(path = %path.display(), "implication graph saved");
    Ok(())
}

/// Reads the graph stored at `path`.
///
/// # Errors
///
/// See [`load`].
pub fn load_file(path: impl AsRef<Path>) -> Result<Mig> {
    let path = path.as_ref();
    let mig = load(BufReader::new(File::open(path)?))?;
    debug!(path = %path.display(), variables = mig.num_vars(), "implication graph loaded");
    Ok(mig)
}

fn validate(mig: &Mig) -> Result<()> {
    let invalid = |message: String| Err(SamplerError::InvalidGraph(message));
    if mig.vertices.len() != 2 * mig.num_vars {
        return invalid(format!(
            "{} vertices for {} variables",
            mig.vertices.len(),
            mig.num_vars
        ));
    }
    let in_range = |literal: i32| literal != 0 && literal.unsigned_abs() as usize <= mig.num_vars;

    for (index, vertex) in mig.vertices.iter().enumerate() {
        if !in_range(vertex.literal) || vertex_index(vertex.literal) != index {
            return invalid(format!("vertex {index} holds literal {}", vertex.literal));
        }
        if let Some(&target) = vertex.strong_edges.iter().find(|&&l| !in_range(l)) {
            return invalid(format!("strong edge {} -> {target} out of range", vertex.literal));
        }
        if let Some(&clause) = vertex
            .complex_clauses
            .iter()
            .find(|&&c| c >= mig.complex_clauses.len())
        {
            return invalid(format!("vertex {} refers to missing clause {clause}", vertex.literal));
        }
    }
    if let Some(clause) = mig
        .complex_clauses
        .iter()
        .find(|clause| clause.iter().any(|&l| !in_range(l)))
    {
        return invalid(format!("complex clause {clause} out of range"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mig::builder::{MigConfig, build};
    use crate::sat::cnf::Cnf;
    use crate::sat::literal_list::LiteralList;

    fn sample_graph() -> Mig {
        let cnf = Cnf::from_clauses(
            5,
            [vec![-1, 2], vec![1, 3, 4], vec![-5], vec![-2, -3, 4]],
        )
        .unwrap();
        build(&cnf, &MigConfig::default()).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let mig = sample_graph();
        let mut bytes = Vec::new();
        save(&mig, &mut bytes).unwrap();
        assert_eq!(&bytes[..4], MIG_MAGIC);

        let loaded = load(bytes.as_slice()).unwrap();
        assert_eq!(loaded, mig);
        for vertex in mig.vertices() {
            let literal = vertex.literal();
            assert_eq!(loaded.status(literal), mig.status(literal));
            assert_eq!(loaded.strong_edges(literal), mig.strong_edges(literal));
        }
    }

    #[test]
    fn test_file_round_trip() {
        let mig = sample_graph();
        let path = std::env::temp_dir().join(format!("sat-sampler-{}.mig", std::process::id()));
        save_file(&mig, &path).unwrap();
        let loaded = load_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, mig);
    }

    #[test]
    fn test_bad_magic() {
        let err = load(&b"NOPE\x01\x00\x00\x00"[..]).unwrap_err();
        assert!(matches!(err, SamplerError::InvalidGraph(_)));
    }

    #[test]
    fn test_bad_version() {
        let mut bytes = Vec::new();
        save(&sample_graph(), &mut bytes).unwrap();
        bytes[4] = 9;
        let err = load(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, SamplerError::InvalidGraph(_)));
    }

    #[test]
    fn test_truncated() {
        let mut bytes = Vec::new();
        save(&sample_graph(), &mut bytes).unwrap();
        bytes.truncate(bytes.len() / 2);
        assert!(load(bytes.as_slice()).is_err());
    }

    #[test]
    fn test_inconsistent_graph() {
        let mut mig = sample_graph();
        mig.vertices[0].strong_edges = LiteralList::new([42]);
        let mut bytes = Vec::new();
        save(&mig, &mut bytes).unwrap();
        assert!(matches!(load(bytes.as_slice()), Err(SamplerError::InvalidGraph(_))));

        let mut mig = sample_graph();
        mig.vertices.pop();
        let mut bytes = Vec::new();
        save(&mig, &mut bytes).unwrap();
        assert!(matches!(load(bytes.as_slice()), Err(SamplerError::InvalidGraph(_))));
    }
}
