//! Loader to score wrapper, end to end through files on disk

use causal_bench::graph::write_graph;
use causal_bench::prelude::*;
use causal_bench::{CausalError, LinearSemSimulation, ManifestViolation, SimulationManifest};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn to_tab_text(data: &DataSet) -> String {
    let header: Vec<&str> = data.variables().iter().map(|v| v.name.as_str()).collect();
    let mut text = header.join("\t");
    text.push('\n');
    for r in 0..data.num_rows() {
        let row: Vec<String> = (0..data.num_columns())
            .map(|c| data.value(r, c).to_string())
            .collect();
        writeln!(text, "{}", row.join("\t")).unwrap();
    }
    text
}

/// Generate a SEM simulation and write it out in the loader's layout
fn write_simulation(root: &Path, runs: usize) -> LinearSemSimulation {
    let mut params = Parameters::new()
        .with(keys::NUM_MEASURES, 6)
        .with(keys::AVG_DEGREE, 3.0)
        .with(keys::SAMPLE_SIZE, 1000)
        .with(keys::NUM_RUNS, runs)
        .with(keys::SEED, 2024);
    let mut sem = LinearSemSimulation::new();
    sem.create_data(&mut params, true).unwrap();

    let data_dir = root.join(SimulationManifest::DATA_DIR);
    let graph_dir = root.join(SimulationManifest::GRAPH_DIR);
    fs::create_dir_all(&data_dir).unwrap();
    fs::create_dir_all(&graph_dir).unwrap();

    for i in 0..sem.num_data_models() {
        let data = sem.data_model(i).unwrap();
        fs::write(
            data_dir.join(format!("data.{}.txt", i + 1)),
            to_tab_text(data),
        )
        .unwrap();
    }
    write_graph(sem.true_graph(0).unwrap(), graph_dir.join("graph.txt")).unwrap();
    sem
}

#[test]
fn test_loaded_data_matches_written() {
    let tmp = TempDir::new().unwrap();
    let sem = write_simulation(tmp.path(), 2);

    let mut params = Parameters::new();
    let mut sim = SimulationKind::LoadContinuousData
        .build(Some(tmp.path()))
        .unwrap();
    sim.create_data(&mut params, false).unwrap();

    assert_eq!(sim.num_data_models(), 2);
    assert_eq!(params.get_int(keys::NUM_RUNS, 0).unwrap(), 2);

    let loaded = sim.data_model(1).unwrap();
    let generated = sem.data_model(1).unwrap();
    assert_eq!(loaded.name(), "data.2");
    assert_eq!(loaded.num_rows(), generated.num_rows());
    assert_eq!(loaded.column(3), generated.column(3));

    let loaded_graph = sim.true_graph(0).unwrap();
    let generated_graph = sem.true_graph(0).unwrap();
    assert_eq!(loaded_graph.edges(), generated_graph.edges());
}

#[test]
fn test_true_graph_outscores_empty_graph() {
    let tmp = TempDir::new().unwrap();
    write_simulation(tmp.path(), 1);

    let mut params = Parameters::new();
    let mut sim = LoadSimulation::new(tmp.path());
    sim.create_data(&mut params, false).unwrap();

    let truth = sim.true_graph(0).unwrap();
    assert!(truth.num_edges() > 0);
    let names: Vec<&str> = truth.nodes().iter().map(|n| n.name.as_str()).collect();
    let empty = Graph::with_nodes(&names).unwrap();

    for kind in ScoreKind::all() {
        let score = kind
            .wrapper()
            .score(sim.data_model(0).unwrap(), &params)
            .unwrap();
        let with_edges = score.graph_score(truth).unwrap();
        let without = score.graph_score(&empty).unwrap();
        assert!(
            with_edges > without,
            "{}: truth {} <= empty {}",
            kind,
            with_edges,
            without
        );
    }
}

#[test]
fn test_bad_file_skipped_and_bad_layout_fatal() {
    let tmp = TempDir::new().unwrap();
    write_simulation(tmp.path(), 2);
    fs::write(
        tmp.path().join("data_noise").join("data.0.txt"),
        "X1\tX2\n1\tnot-a-number\n",
    )
    .unwrap();

    let mut sim = LoadSimulation::new(tmp.path());
    sim.create_data(&mut Parameters::new(), false).unwrap();
    assert_eq!(sim.num_data_models(), 2);

    fs::write(tmp.path().join("graph").join("extra.txt"), "").unwrap();
    match sim.create_data(&mut Parameters::new(), false) {
        Err(CausalError::Manifest { violations, .. }) => {
            assert_eq!(violations, vec![ManifestViolation::GraphFileCount(2)]);
        }
        other => panic!("expected manifest error, got {:?}", other),
    }
    assert_eq!(sim.num_data_models(), 0);
}

#[test]
fn test_loaded_data_is_continuous() {
    let tmp = TempDir::new().unwrap();
    write_simulation(tmp.path(), 1);
    let mut sim = LoadSimulation::new(tmp.path());
    sim.create_data(&mut Parameters::new(), false).unwrap();

    let data = sim.data_model(0).unwrap();
    assert_eq!(data.data_type(), DataType::Continuous);
    assert!(ScoreKind::FisherZ
        .wrapper()
        .data_type()
        .accepts(data.data_type()));
}
