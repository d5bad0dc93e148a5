//! Speech recognition lattices and their text archive format.
//!
//! A [`CompactLattice`] is an acyclic acceptor over word labels whose arc
//! weights carry a (graph, acoustic) cost pair and the frame alignment of the
//! word. Archives hold a sequence of keyed lattices, one per utterance.

mod archive;
mod weight;

pub use archive::{ArchiveReader, Rspecifier};
pub use weight::{CompactLatticeWeight, LatticeWeight};

use std::io;

use rustfst::fst_impls::VectorFst;

pub type CompactLattice = VectorFst<CompactLatticeWeight>;

#[derive(Debug, thiserror::Error)]
pub enum LatticeError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("parse error in lattice '{key}' at line {line}: {message}")]
    Parse {
        key: String,
        line: usize,
        message: String,
    },

    #[error("binary lattice archives are not supported (entry '{0}')")]
    BinaryUnsupported(String),

    #[error("unsupported rspecifier: {0}")]
    Rspecifier(String),
}
