//! Property-based tests for the length distribution pipeline.
//!
//! Random lattices are built either from independent paths or as random
//! acyclic graphs with shared states, epsilons, parallel arcs and several
//! final states. The graphs are checked against per-length masses summed by
//! enumerating every path.

use std::collections::BTreeMap;

use proptest::prelude::*;
use rustfst::fst_traits::MutableFst;
use rustfst::{Label, StateId, Tr, EPS_LABEL};

use super::settings_with_nbest;
use crate::distribution::{analyze_lattice, Distribution};
use crate::lattice::{CompactLattice, CompactLatticeWeight};
use crate::settings::Settings;
use crate::testutil::{lattice_from_paths, word_count, TestPath};

/// Error allowed on a log-probability. Determinization quantizes residual
/// weights to 1/1024 per state, so the error grows with path length.
const LOG_TOL: f64 = 1e-2;

#[derive(Debug, Clone)]
struct ArbPath {
    labels: Vec<Label>,
    graph: f32,
    acoustic: f32,
}

fn arb_label() -> impl Strategy<Value = Label> {
    prop_oneof![
        1 => Just(0),
        4 => 1u32..50,
    ]
}

fn arb_path() -> impl Strategy<Value = ArbPath> {
    (
        prop::collection::vec(arb_label(), 1..7),
        0.0f32..8.0,
        0.0f32..8.0,
    )
        .prop_map(|(labels, graph, acoustic)| ArbPath {
            labels,
            graph,
            acoustic,
        })
}

fn arb_paths() -> impl Strategy<Value = Vec<ArbPath>> {
    prop::collection::vec(arb_path(), 1..8)
}

fn run(paths: &[ArbPath], settings: &Settings) -> Distribution {
    let test_paths: Vec<TestPath<'_>> = paths
        .iter()
        .map(|p| TestPath {
            labels: &p.labels,
            graph: p.graph,
            acoustic: p.acoustic,
        })
        .collect();
    analyze_lattice(lattice_from_paths(&test_paths), settings).unwrap()
}

fn expected_length(dist: &Distribution) -> f64 {
    let mass: f64 = dist.total_probability();
    dist.iter()
        .map(|e| e.log_prob.exp() * e.length as f64)
        .sum::<f64>()
        / mass
}

#[derive(Debug, Clone)]
struct ArbArc {
    src: StateId,
    dst: StateId,
    label: Label,
    graph: f32,
    acoustic: f32,
}

#[derive(Debug, Clone)]
struct ArbGraph {
    num_states: StateId,
    arcs: Vec<ArbArc>,
    finals: Vec<(StateId, f32, f32)>,
}

/// Acyclic graph over states `0..k`, start 0. Every arc goes forward; the
/// same (src, dst) pair may be drawn more than once.
fn arb_graph() -> impl Strategy<Value = ArbGraph> {
    (2u32..7).prop_flat_map(|k| {
        let arc = (0..k - 1, 0u32..8, arb_label(), 0.0f32..4.0, 0.0f32..4.0).prop_map(
            move |(src, offset, label, graph, acoustic)| ArbArc {
                src,
                dst: src + 1 + offset % (k - 1 - src),
                label,
                graph,
                acoustic,
            },
        );
        let fin = (0..k, 0.0f32..4.0, 0.0f32..4.0);
        (
            prop::collection::vec(arc, 1..14),
            prop::collection::vec(fin, 1..4),
        )
            .prop_map(move |(arcs, finals)| ArbGraph {
                num_states: k,
                arcs,
                finals,
            })
    })
}

fn build_graph(graph: &ArbGraph) -> CompactLattice {
    let mut lat = CompactLattice::new();
    lat.add_states(graph.num_states as usize);
    lat.set_start(0).unwrap();
    for arc in &graph.arcs {
        let weight = CompactLatticeWeight::new(arc.graph, arc.acoustic);
        lat.add_tr(arc.src, Tr::new(arc.label, arc.label, weight, arc.dst))
            .unwrap();
    }
    for &(state, g, a) in &graph.finals {
        lat.set_final(state, CompactLatticeWeight::new(g, a)).unwrap();
    }
    lat
}

/// Final cost per state. A later draw for the same state replaces the
/// earlier one, as `set_final` does.
fn final_costs(graph: &ArbGraph) -> BTreeMap<StateId, f64> {
    graph
        .finals
        .iter()
        .map(|&(s, g, a)| (s, f64::from(g) + f64::from(a)))
        .collect()
}

/// Probability mass `sum exp(-cost)` of every successful path, keyed by its
/// number of words.
fn mass_by_length(graph: &ArbGraph) -> BTreeMap<usize, f64> {
    fn walk(
        graph: &ArbGraph,
        finals: &BTreeMap<StateId, f64>,
        state: StateId,
        words: usize,
        cost: f64,
        mass: &mut BTreeMap<usize, f64>,
    ) {
        if let Some(f) = finals.get(&state) {
            *mass.entry(words).or_insert(0.0) += (-(cost + f)).exp();
        }
        for arc in graph.arcs.iter().filter(|a| a.src == state) {
            let words = words + usize::from(arc.label != EPS_LABEL);
            let cost = cost + f64::from(arc.graph) + f64::from(arc.acoustic);
            walk(graph, finals, arc.dst, words, cost, mass);
        }
    }

    let finals = final_costs(graph);
    let mut mass = BTreeMap::new();
    walk(graph, &finals, 0, 0, 0.0, &mut mass);
    mass
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn unlimited_distribution_sums_to_one(paths in arb_paths()) {
        let dist = run(&paths, &Settings::default());
        prop_assert!(!dist.is_empty());
        prop_assert!((dist.total_probability() - 1.0).abs() < LOG_TOL,
            "total probability {}", dist.total_probability());
    }

    #[test]
    fn entries_are_valid_and_ordered(paths in arb_paths()) {
        let dist = run(&paths, &Settings::default());
        let mut possible: Vec<usize> = paths.iter().map(|p| word_count(&p.labels)).collect();
        possible.sort_unstable();
        possible.dedup();

        let mut seen = Vec::new();
        for entry in dist.iter() {
            prop_assert!(entry.log_prob <= 0.0);
            prop_assert!(possible.contains(&entry.length));
            prop_assert!(!seen.contains(&entry.length), "length {} repeated", entry.length);
            seen.push(entry.length);
        }
        prop_assert_eq!(seen.len(), possible.len());
        for pair in dist.entries.windows(2) {
            prop_assert!(pair[0].log_prob >= pair[1].log_prob - 1e-6);
        }
    }

    #[test]
    fn nbest_is_a_prefix_of_the_full_distribution(paths in arb_paths(), n in 1i64..5) {
        let full = run(&paths, &Settings::default());
        let capped = run(&paths, &settings_with_nbest(Some(n)));
        prop_assert_eq!(capped.len(), full.len().min(n as usize));
        prop_assert!(capped.total_probability() <= 1.0 + 1e-6);
        for (a, b) in capped.iter().zip(full.iter()) {
            prop_assert!((a.log_prob - b.log_prob).abs() < 1e-4);
        }
    }

    #[test]
    fn insertion_penalty_never_lengthens(paths in arb_paths(), penalty in 0.1f32..3.0) {
        let plain = run(&paths, &Settings::default());
        let mut settings = Settings::default();
        settings.penalty.insertion = penalty;
        let penalized = run(&paths, &settings);
        prop_assert!(expected_length(&penalized) <= expected_length(&plain) + 5e-2);
    }

    #[test]
    fn random_graph_matches_path_enumeration(graph in arb_graph()) {
        let mass = mass_by_length(&graph);
        let dist = analyze_lattice(build_graph(&graph), &Settings::default()).unwrap();
        if mass.is_empty() {
            prop_assert!(dist.is_empty());
            return Ok(());
        }

        let total: f64 = mass.values().sum();
        let mut lengths: Vec<usize> = dist.iter().map(|e| e.length).collect();
        lengths.sort_unstable();
        prop_assert_eq!(lengths, mass.keys().copied().collect::<Vec<_>>());
        for entry in dist.iter() {
            let expected = (mass[&entry.length] / total).ln();
            prop_assert!((entry.log_prob - expected).abs() < LOG_TOL,
                "length {}: got {}, expected {}", entry.length, entry.log_prob, expected);
        }
    }
}
