use rustfst::fst_traits::MutableFst;
use rustfst::semirings::Semiring;
use rustfst::{Label, Tr, EPS_LABEL};

use crate::lattice::{CompactLattice, CompactLatticeWeight};

/// A path through a test lattice: its labels (0 = epsilon) and the
/// (graph, acoustic) cost of each arc.
pub struct TestPath<'a> {
    pub labels: &'a [Label],
    pub graph: f32,
    pub acoustic: f32,
}

/// Build a lattice made of independent paths sharing only the start state
/// and one final state. The path cost is put on its first arc; the other
/// arcs are free.
pub fn lattice_from_paths(paths: &[TestPath<'_>]) -> CompactLattice {
    let mut lat = CompactLattice::new();
    let start = lat.add_state();
    let end = lat.add_state();
    lat.set_start(start).unwrap();
    lat.set_final(end, CompactLatticeWeight::one()).unwrap();

    for path in paths {
        if path.labels.is_empty() {
            continue;
        }
        let mut prev = start;
        for (i, &label) in path.labels.iter().enumerate() {
            let next = if i + 1 == path.labels.len() {
                end
            } else {
                lat.add_state()
            };
            let weight = if i == 0 {
                CompactLatticeWeight::new(path.graph, path.acoustic).with_alignment(vec![1, 2, 3])
            } else {
                CompactLatticeWeight::one().with_alignment(vec![4])
            };
            lat.add_tr(prev, Tr::new(label, label, weight, next)).unwrap();
            prev = next;
        }
    }
    lat
}

/// Number of non-epsilon labels of a test path.
pub fn word_count(labels: &[Label]) -> usize {
    labels.iter().filter(|&&l| l != EPS_LABEL).count()
}
