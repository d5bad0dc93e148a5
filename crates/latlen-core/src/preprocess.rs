//! Cost rescaling, insertion penalty and clean-up applied to each lattice
//! before it is projected to a single cost.

use rustfst::algorithms::{top_sort, tr_map, FinalTr, MapFinalAction, TrMapper};
use rustfst::fst_properties::FstProperties;
use rustfst::fst_traits::{CoreFst, ExpandedFst};
use rustfst::semirings::Semiring;
use rustfst::{Tr, EPS_LABEL};
use tracing::{debug, debug_span};

use crate::error::AnalyzeError;
use crate::lattice::{CompactLattice, CompactLatticeWeight, LatticeWeight};
use crate::settings::Settings;

/// Multipliers for the two cost components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeScale {
    pub graph: f32,
    pub acoustic: f32,
}

impl LatticeScale {
    pub fn is_identity(&self) -> bool {
        self.graph == 1.0 && self.acoustic == 1.0
    }

    fn apply(&self, w: &mut LatticeWeight) {
        // Zero stays zero even under a zero scale.
        if w.is_zero() {
            return;
        }
        w.graph *= self.graph;
        w.acoustic *= self.acoustic;
        if w.is_zero() {
            *w = LatticeWeight::zero();
        }
    }
}

impl Default for LatticeScale {
    fn default() -> Self {
        Self {
            graph: 1.0,
            acoustic: 1.0,
        }
    }
}

/// Properties left after a mapper that only rewrites weights.
fn weight_mapped_properties(inprops: FstProperties) -> FstProperties {
    inprops
        & !(FstProperties::WEIGHTED
            | FstProperties::UNWEIGHTED
            | FstProperties::WEIGHTED_CYCLES
            | FstProperties::UNWEIGHTED_CYCLES)
}

impl TrMapper<CompactLatticeWeight> for LatticeScale {
    fn tr_map(&self, tr: &mut Tr<CompactLatticeWeight>) -> anyhow::Result<()> {
        self.apply(&mut tr.weight.weight);
        Ok(())
    }

    fn final_tr_map(&self, final_tr: &mut FinalTr<CompactLatticeWeight>) -> anyhow::Result<()> {
        self.apply(&mut final_tr.weight.weight);
        Ok(())
    }

    fn final_action(&self) -> MapFinalAction {
        MapFinalAction::MapNoSuperfinal
    }

    fn properties(&self, inprops: FstProperties) -> FstProperties {
        weight_mapped_properties(inprops)
    }
}

/// Adds a fixed graph cost to every arc that emits a word.
struct InsertionPenalty(f32);

impl TrMapper<CompactLatticeWeight> for InsertionPenalty {
    fn tr_map(&self, tr: &mut Tr<CompactLatticeWeight>) -> anyhow::Result<()> {
        if tr.olabel != EPS_LABEL && !tr.weight.is_zero() {
            tr.weight.weight.graph += self.0;
        }
        Ok(())
    }

    fn final_tr_map(&self, _final_tr: &mut FinalTr<CompactLatticeWeight>) -> anyhow::Result<()> {
        Ok(())
    }

    fn final_action(&self) -> MapFinalAction {
        MapFinalAction::MapNoSuperfinal
    }

    fn properties(&self, inprops: FstProperties) -> FstProperties {
        weight_mapped_properties(inprops)
    }
}

struct AlignmentRemover;

impl TrMapper<CompactLatticeWeight> for AlignmentRemover {
    fn tr_map(&self, tr: &mut Tr<CompactLatticeWeight>) -> anyhow::Result<()> {
        tr.weight.alignment.clear();
        Ok(())
    }

    fn final_tr_map(&self, final_tr: &mut FinalTr<CompactLatticeWeight>) -> anyhow::Result<()> {
        final_tr.weight.alignment.clear();
        Ok(())
    }

    fn final_action(&self) -> MapFinalAction {
        MapFinalAction::MapNoSuperfinal
    }

    fn properties(&self, inprops: FstProperties) -> FstProperties {
        weight_mapped_properties(inprops)
    }
}

/// Sort states topologically. Later stages rely on this; a cyclic lattice is
/// an error.
pub fn top_sort_if_needed(lat: &mut CompactLattice) -> Result<(), AnalyzeError> {
    if lat.properties().contains(FstProperties::TOP_SORTED) {
        return Ok(());
    }
    top_sort(lat)?;
    if lat.properties().contains(FstProperties::CYCLIC) {
        return Err(AnalyzeError::Cyclic);
    }
    Ok(())
}

/// Scale graph and acoustic costs of every arc and final weight.
pub fn scale_lattice(lat: &mut CompactLattice, scale: LatticeScale) -> Result<(), AnalyzeError> {
    tr_map(lat, &scale)?;
    Ok(())
}

/// Add `penalty` to the graph cost of every arc that emits a word.
pub fn add_insertion_penalty(
    lat: &mut CompactLattice,
    penalty: f32,
) -> Result<(), AnalyzeError> {
    tr_map(lat, &InsertionPenalty(penalty))?;
    Ok(())
}

/// Drop the per-arc frame alignments.
pub fn remove_alignments(lat: &mut CompactLattice) -> Result<(), AnalyzeError> {
    tr_map(lat, &AlignmentRemover)?;
    Ok(())
}

/// Top-sort, rescale, penalize and strip alignments, in that order. Scaling
/// and the penalty are skipped when they would not change anything.
pub fn preprocess_lattice(
    lat: &mut CompactLattice,
    settings: &Settings,
) -> Result<(), AnalyzeError> {
    let _span = debug_span!("preprocess", states = lat.num_states()).entered();
    top_sort_if_needed(lat)?;

    let scale = settings.lattice_scale();
    if !scale.is_identity() {
        scale_lattice(lat, scale)?;
    }
    let penalty = settings.penalty.insertion;
    if penalty != 0.0 {
        add_insertion_penalty(lat, penalty)?;
    }
    remove_alignments(lat)?;
    debug!(
        graph_scale = scale.graph,
        acoustic_scale = scale.acoustic,
        penalty
    );
    Ok(())
}
