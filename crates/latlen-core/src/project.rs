//! Projection of (graph, acoustic) lattice weights onto the log semiring.

use rustfst::algorithms::{weight_convert, FinalTr, MapFinalAction, WeightConverter};
use rustfst::fst_impls::VectorFst;
use rustfst::fst_properties::FstProperties;
use rustfst::fst_traits::ExpandedFst;
use rustfst::semirings::{LogWeight, Semiring};
use rustfst::Tr;
use tracing::debug;

use crate::error::AnalyzeError;
use crate::lattice::{CompactLattice, CompactLatticeWeight};

/// Sums the two costs and copies the output label onto the input side.
struct LogProjection;

fn to_log(w: &CompactLatticeWeight) -> LogWeight {
    if w.is_zero() {
        LogWeight::zero()
    } else {
        LogWeight::new(w.weight.cost())
    }
}

impl WeightConverter<CompactLatticeWeight, LogWeight> for LogProjection {
    fn tr_map(&mut self, tr: &Tr<CompactLatticeWeight>) -> anyhow::Result<Tr<LogWeight>> {
        Ok(Tr::new(tr.olabel, tr.olabel, to_log(&tr.weight), tr.nextstate))
    }

    fn final_tr_map(
        &mut self,
        final_tr: &FinalTr<CompactLatticeWeight>,
    ) -> anyhow::Result<FinalTr<LogWeight>> {
        Ok(FinalTr {
            ilabel: final_tr.ilabel,
            olabel: final_tr.olabel,
            weight: to_log(&final_tr.weight),
        })
    }

    fn final_action(&self) -> MapFinalAction {
        MapFinalAction::MapNoSuperfinal
    }

    // Labels and weights both change; the output's own bookkeeping is kept.
    fn properties(&self, _inprops: FstProperties) -> FstProperties {
        FstProperties::empty()
    }
}

/// Collapse each cost pair into one log-semiring cost `graph + acoustic`.
///
/// Topology is kept and the result is an acceptor over the output (word)
/// labels; alignments are dropped. In the result, parallel paths combine by
/// summing probabilities instead of keeping the best one.
pub fn project_to_log(lat: &CompactLattice) -> Result<VectorFst<LogWeight>, AnalyzeError> {
    let fst: VectorFst<LogWeight> = weight_convert(lat, &mut LogProjection)?;
    debug!(states = fst.num_states(), "projected");
    Ok(fst)
}
