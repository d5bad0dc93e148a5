/// Failure while computing the distribution of one lattice.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("lattice is cyclic")]
    Cyclic,

    #[error("automaton operation failed: {0}")]
    Fst(#[from] anyhow::Error),
}
