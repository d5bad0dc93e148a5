//! Word-length distributions of speech recognition lattices.
//!
//! For every lattice, the probability mass of all transcriptions is split by
//! word count: costs are rescaled and penalized ([`preprocess`]), collapsed to
//! one log-semiring cost ([`project`]), labels are made uniform so only path
//! length matters ([`length`]), and equal lengths are merged by
//! determinization before the n most probable lengths are extracted
//! ([`distribution`]).

pub mod distribution;
pub mod error;
pub mod lattice;
pub mod length;
pub mod preprocess;
pub mod project;
pub mod report;
pub mod settings;

#[cfg(test)]
pub(crate) mod testutil;
#[cfg(test)]
mod tests;

pub use distribution::{analyze_lattice, Distribution, LengthProb};
pub use error::AnalyzeError;
pub use lattice::{ArchiveReader, CompactLattice, LatticeError, Rspecifier};
pub use settings::{Settings, SettingsError};
