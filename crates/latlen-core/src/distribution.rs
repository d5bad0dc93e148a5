//! Distribution of transcription lengths in a lattice.
//!
//! The length-collapsed automaton is determinized in the log semiring, which
//! merges all paths of equal length into one path carrying their summed
//! probability. The result is reinterpreted in the tropical semiring and the
//! n cheapest paths, one per distinct length, are read off.

use rustfst::algorithms::determinize::{
    determinize_with_config, DeterminizeConfig, DeterminizeType,
};
use rustfst::algorithms::weight_converters::SimpleWeightConverter;
use rustfst::algorithms::{
    shortest_distance, shortest_path_with_config, weight_convert, ShortestPathConfig,
};
use rustfst::fst_impls::VectorFst;
use rustfst::fst_traits::{CoreFst, ExpandedFst, Fst};
use rustfst::semirings::{LogWeight, Semiring, TropicalWeight};
use rustfst::FstPath;
use serde::Serialize;
use tracing::{debug, debug_span, warn};

use crate::error::AnalyzeError;
use crate::lattice::CompactLattice;
use crate::length::collapse_lengths;
use crate::preprocess::preprocess_lattice;
use crate::project::project_to_log;
use crate::settings::Settings;

/// Quantization step used to compare residual weights while determinizing.
pub const DETERMINIZE_DELTA: f32 = 1.0 / 1024.0;

/// One entry of a [`Distribution`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LengthProb {
    /// Number of words.
    pub length: usize,
    /// `ln(P(length) / P(lattice))`, never above zero.
    pub log_prob: f64,
}

/// Lengths ordered from most to least probable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Distribution {
    pub entries: Vec<LengthProb>,
}

impl Distribution {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LengthProb> {
        self.entries.iter()
    }

    /// Log-probability of `length`, if it was extracted.
    #[cfg(test)]
    pub fn log_prob_of(&self, length: usize) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.length == length)
            .map(|e| e.log_prob)
    }

    /// Sum of the probabilities of the extracted lengths.
    pub fn total_probability(&self) -> f64 {
        self.entries.iter().map(|e| e.log_prob.exp()).sum()
    }
}

/// Total log-semiring cost of all paths, `-ln` of the lattice mass. Semiring
/// zero when nothing is accepted.
pub fn total_cost(fst: &VectorFst<LogWeight>) -> Result<LogWeight, AnalyzeError> {
    let Some(start) = fst.start() else {
        return Ok(LogWeight::zero());
    };
    let backward = shortest_distance(fst, true)?;
    Ok(backward
        .get(start as usize)
        .copied()
        .unwrap_or_else(LogWeight::zero))
}

/// Extract up to `nbest` distinct lengths with their relative
/// log-probabilities from a length-collapsed automaton.
///
/// Ordered from most to least probable. Empty when the automaton accepts
/// nothing or `nbest` is zero.
pub fn extract_distribution(
    fst: &VectorFst<LogWeight>,
    nbest: usize,
) -> Result<Distribution, AnalyzeError> {
    let _span = debug_span!("extract_distribution", nbest).entered();
    if nbest == 0 {
        return Ok(Distribution::default());
    }
    let total = total_cost(fst)?;
    if total.is_zero() {
        return Ok(Distribution::default());
    }

    // Merge equal lengths under ⊕ = log-sum-exp, then search under ⊕ = min.
    let config = DeterminizeConfig::new(DETERMINIZE_DELTA, DeterminizeType::DeterminizeFunctional);
    let merged: VectorFst<LogWeight> = determinize_with_config(fst, config)?;
    let searchable: VectorFst<TropicalWeight> =
        weight_convert(&merged, &mut SimpleWeightConverter {})?;

    // A deterministic automaton over one label is a chain, so it cannot hold
    // more distinct lengths than states.
    let nshortest = nbest.min(searchable.num_states());
    let best: VectorFst<TropicalWeight> = shortest_path_with_config(
        &searchable,
        ShortestPathConfig::default().with_nshortest(nshortest),
    )?;
    let mut paths: Vec<FstPath<TropicalWeight>> = best.paths_iter().collect();
    paths.sort_by(|a, b| {
        a.weight
            .value()
            .total_cmp(b.weight.value())
            .then_with(|| a.ilabels.len().cmp(&b.ilabels.len()))
    });

    // Rounding may push a whole-mass length a hair above zero.
    let total_value = f64::from(*total.value());
    let entries: Vec<LengthProb> = paths
        .iter()
        .map(|p| LengthProb {
            length: p.ilabels.len(),
            log_prob: (total_value - f64::from(*p.weight.value())).min(0.0),
        })
        .collect();
    debug!(
        total_cost = total_value,
        lengths = entries.len(),
        best = entries.first().map(|e| e.length)
    );
    Ok(Distribution { entries })
}

/// Full per-lattice pipeline: preprocess, project to the log semiring,
/// collapse to lengths and extract the distribution. Consumes the lattice.
pub fn analyze_lattice(
    mut lat: CompactLattice,
    settings: &Settings,
) -> Result<Distribution, AnalyzeError> {
    preprocess_lattice(&mut lat, settings)?;
    let mut fst = project_to_log(&lat)?;
    drop(lat);
    collapse_lengths(&mut fst)?;
    let dist = extract_distribution(&fst, settings.nbest_limit())?;
    if dist.is_empty() && settings.nbest_limit() > 0 {
        warn!("lattice has no successful path");
    }
    Ok(dist)
}
