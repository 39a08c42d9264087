use std::path::PathBuf;

use fluxmap_core::configuration::RunConfiguration;
use fluxmap_core::escher::{EscherMap, MapNode};
use fluxmap_core::metabolic_model::model::Model;
use fluxmap_core::pipeline;

fn toy_model_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join("test_models")
        .join("toy_fermentation.json")
}

fn config_in(dir: &tempfile::TempDir) -> RunConfiguration {
    RunConfiguration {
        output_dir: dir.path().to_path_buf(),
        layout_iterations: 200,
        ..RunConfiguration::default()
    }
}

#[test]
fn toy_fermentation_map() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let output = pipeline::run(toy_model_path(), &config).unwrap();

    let alcd2x = output.solution.fluxes["ALCD2x"];
    assert!((alcd2x - 20.).abs() < 1e-4, "ALCD2x flux was {}", alcd2x);
    assert!((output.solution.objective_value - 20.).abs() < 1e-4);

    // Every reaction of the toy model is needed to make ethanol
    assert_eq!(output.flux_sets.with_flux.len(), 12);
    assert_eq!(output.flux_sets.with_greater_flux.len(), 12);
    assert_eq!(output.occurrence["h_c"], 5);
    assert_eq!(
        output.common_metabolites.iter().collect::<Vec<_>>(),
        vec!["h_c"]
    );

    // Written files
    assert!(output.model_snapshot_path.exists());
    let snapshot = Model::read_json(&output.model_snapshot_path).unwrap();
    assert_eq!(snapshot.reactions.len(), 12);
    let map_json = std::fs::read_to_string(&output.map_path).unwrap();
    let map = EscherMap::from_json_str(&map_json).unwrap();
    assert_eq!(map.header(), output.map.header());
    assert!(map.check().is_ok());
    assert_eq!(map.body().reactions.len(), 12);
    let html = std::fs::read_to_string(&output.viewer_path).unwrap();
    assert!(html.contains("escher.Builder"));

    // h_c is drawn once per reaction using it, never as a shared node
    let h_nodes: Vec<&MapNode> = map
        .body()
        .nodes
        .values()
        .filter(|node| matches!(node, MapNode::Metabolite { bigg_id, .. } if bigg_id == "h_c"))
        .collect();
    assert_eq!(h_nodes.len(), 5);
    assert!(h_nodes
        .iter()
        .all(|node| matches!(node, MapNode::Metabolite { node_is_primary: false, .. })));
}

#[test]
fn excluded_reactions_and_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfiguration {
        excluded_reactions: vec!["ATPM".to_string(), "EX_h_e".to_string()],
        threshold_flux: 15.,
        ..config_in(&dir)
    };
    let output = pipeline::run(toy_model_path(), &config).unwrap();
    assert!(!output.flux_sets.with_flux.contains("ATPM"));
    assert_eq!(output.flux_sets.with_flux.len(), 10);
    // Only the reactions downstream of pyruvate carry 20
    assert!(output.flux_sets.with_greater_flux.contains("ALCD2x"));
    assert!(!output.flux_sets.with_greater_flux.contains("HEX1"));
    // Without ATPM and EX_h_e, h_c is only in three reactions
    assert!(output.common_metabolites.is_empty());
    assert!(output.map.check().is_ok());
}

#[test]
fn unknown_objective() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfiguration {
        objective: "NOT_A_REACTION".to_string(),
        ..config_in(&dir)
    };
    assert!(matches!(
        pipeline::run(toy_model_path(), &config),
        Err(pipeline::PipelineError::Model(_))
    ));
}

#[test]
fn missing_model_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    assert!(matches!(
        pipeline::run(dir.path().join("missing.json"), &config),
        Err(pipeline::PipelineError::Json(_))
    ));
}

#[test]
fn sbml_model_gives_the_same_map() {
    let sbml_path = toy_model_path().with_extension("xml");
    let dir = tempfile::tempdir().unwrap();
    let output = pipeline::run(&sbml_path, &config_in(&dir)).unwrap();
    assert!((output.solution.fluxes["ALCD2x"] - 20.).abs() < 1e-4);
    assert_eq!(output.flux_sets.with_flux.len(), 12);
    assert_eq!(
        output.common_metabolites.iter().collect::<Vec<_>>(),
        vec!["h_c"]
    );
    assert!(output.map.check().is_ok());

    // The snapshot is always COBRA JSON
    let snapshot = Model::read_json(&output.model_snapshot_path).unwrap();
    assert_eq!(snapshot.genes.len(), 9);
}

#[test]
fn missing_sbml_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        pipeline::run(dir.path().join("missing.xml"), &config_in(&dir)),
        Err(pipeline::PipelineError::Sbml(_))
    ));
}
