//! The map generation pipeline, from a model file to a map and its viewer page
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;
use tracing::{debug, info};

use crate::analysis::{
    filter_fluxes, metabolite_occurrence, select_common_metabolites, AnalysisError, FluxSets,
};
use crate::configuration::{ConfigurationError, RunConfiguration};
use crate::escher::{EscherMap, MapBuilder, MapError, MapSettings, MapValidationError};
use crate::io::json::JsonError;
use crate::io::sbml::SbmlError;
use crate::metabolic_model::model::{FluxSolution, Model, ModelError};
use crate::viewer::{write_viewer, ViewerError};

/// Everything produced by a run of the pipeline
#[derive(Debug)]
pub struct PipelineOutput {
    pub solution: FluxSolution,
    pub flux_sets: FluxSets,
    /// Number of flux carrying reactions referencing each metabolite
    pub occurrence: IndexMap<String, usize>,
    pub common_metabolites: IndexSet<String>,
    pub map: EscherMap,
    pub model_snapshot_path: PathBuf,
    pub map_path: PathBuf,
    pub viewer_path: PathBuf,
}

/// Load the model, optimize it for the configured objective and draw the reactions
/// carrying flux
///
/// The model snapshot, the map and the viewer page are written to the configured output
/// directory. The first failing step aborts the run.
pub fn run<P: AsRef<Path>>(
    model_path: P,
    config: &RunConfiguration,
) -> Result<PipelineOutput, PipelineError> {
    let model_path = model_path.as_ref();
    fs::create_dir_all(&config.output_dir)?;

    info!(path = %model_path.display(), "reading model");
    let mut model = read_model(model_path)?;
    debug!(
        reactions = model.reactions.len(),
        metabolites = model.metabolites.len(),
        "model loaded"
    );
    let model_snapshot_path = config.model_snapshot_path();
    model.write_json(&model_snapshot_path)?;

    model.set_objective(&config.objective)?;
    model.set_upper_bound(&config.objective, config.objective_upper_bound)?;
    let solution = model.optimize()?;
    info!("Flux of {} {}", config.objective, solution.objective_value);

    let flux_sets = filter_fluxes(
        &solution.fluxes,
        &config.excluded_reactions,
        config.threshold_flux,
    );
    debug!(
        with_flux = flux_sets.with_flux.len(),
        with_greater_flux = flux_sets.with_greater_flux.len(),
        "filtered reactions"
    );
    let occurrence = metabolite_occurrence(&model, &flux_sets.with_flux)?;
    let common_metabolites = select_common_metabolites(
        &occurrence,
        config.common_metabolite_cutoff,
        &config.uncommon_metabolites,
    );
    debug!(common = ?common_metabolites, "selected common metabolites");

    let map = MapBuilder::new(&model, MapSettings::from(config))
        .build(&flux_sets.with_greater_flux, &common_metabolites)?;
    let map_json = map.dump_json()?;
    let map_path = config.map_path();
    fs::write(&map_path, &map_json)?;
    info!(path = %map_path.display(), "wrote map");

    // Check what was written, not the in-memory map
    EscherMap::from_json_str(&map_json)?.check()?;

    let viewer_path = config.viewer_path();
    write_viewer(
        &viewer_path,
        &config.map_name,
        &map,
        &model,
        &solution.fluxes,
    )?;
    info!(path = %viewer_path.display(), "wrote viewer");

    Ok(PipelineOutput {
        solution,
        flux_sets,
        occurrence,
        common_metabolites,
        map,
        model_snapshot_path,
        map_path,
        viewer_path,
    })
}

/// Read an SBML model for `.xml` and `.sbml` files, COBRA JSON otherwise
fn read_model(path: &Path) -> Result<Model, PipelineError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("xml") | Some("sbml") => Ok(Model::read_sbml(path)?),
        _ => Ok(Model::read_json(path)?),
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unable to read or write the model")]
    Json(#[from] JsonError),
    #[error("Unable to read the SBML model")]
    Sbml(#[from] SbmlError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("Unable to build the map")]
    Map(#[from] MapError),
    #[error("Generated map is invalid: {0}")]
    Validation(#[from] MapValidationError),
    #[error("Unable to write the viewer")]
    Viewer(#[from] ViewerError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("Unable to write output")]
    Io(#[from] std::io::Error),
}
