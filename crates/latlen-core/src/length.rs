//! Rewrites an automaton so that paths differ only by their length.

use rustfst::algorithms::rm_epsilon::rm_epsilon;
use rustfst::algorithms::{tr_map, FinalTr, MapFinalAction, TrMapper};
use rustfst::fst_impls::VectorFst;
use rustfst::fst_properties::FstProperties;
use rustfst::fst_traits::ExpandedFst;
use rustfst::semirings::LogWeight;
use rustfst::{Label, Tr};
use tracing::{debug, debug_span};

use crate::error::AnalyzeError;

/// The single label every arc carries after [`collapse_lengths`].
pub const WORD_MARKER: Label = 1;

/// Puts one non-epsilon label on both sides of every arc.
struct UniformLabel(Label);

impl TrMapper<LogWeight> for UniformLabel {
    fn tr_map(&self, tr: &mut Tr<LogWeight>) -> anyhow::Result<()> {
        tr.ilabel = self.0;
        tr.olabel = self.0;
        Ok(())
    }

    fn final_tr_map(&self, _final_tr: &mut FinalTr<LogWeight>) -> anyhow::Result<()> {
        Ok(())
    }

    fn final_action(&self) -> MapFinalAction {
        MapFinalAction::MapNoSuperfinal
    }

    fn properties(&self, inprops: FstProperties) -> FstProperties {
        let kept = FstProperties::WEIGHTED
            | FstProperties::UNWEIGHTED
            | FstProperties::CYCLIC
            | FstProperties::ACYCLIC
            | FstProperties::INITIAL_CYCLIC
            | FstProperties::INITIAL_ACYCLIC
            | FstProperties::TOP_SORTED
            | FstProperties::NOT_TOP_SORTED
            | FstProperties::ACCESSIBLE
            | FstProperties::NOT_ACCESSIBLE
            | FstProperties::COACCESSIBLE
            | FstProperties::NOT_COACCESSIBLE;
        (inprops & kept)
            | FstProperties::ACCEPTOR
            | FstProperties::NO_EPSILONS
            | FstProperties::NO_I_EPSILONS
            | FstProperties::NO_O_EPSILONS
            | FstProperties::I_LABEL_SORTED
            | FstProperties::O_LABEL_SORTED
    }
}

/// Set every input and output label to `label`, weights untouched. `label`
/// must not be epsilon.
pub fn relabel_uniform(
    fst: &mut VectorFst<LogWeight>,
    label: Label,
) -> Result<(), AnalyzeError> {
    tr_map(fst, &UniformLabel(label))?;
    Ok(())
}

/// Remove epsilons (exactly, the input is acyclic), then replace every
/// label with [`WORD_MARKER`]. Afterwards two paths have the same label
/// sequence iff they have the same number of words.
pub fn collapse_lengths(fst: &mut VectorFst<LogWeight>) -> Result<(), AnalyzeError> {
    let _span = debug_span!("collapse_lengths", states = fst.num_states()).entered();
    rm_epsilon(fst)?;
    relabel_uniform(fst, WORD_MARKER)?;
    debug!(states = fst.num_states());
    Ok(())
}
