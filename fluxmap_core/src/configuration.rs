//! Global solver defaults and the settings of a single map-generation run
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

/// Snapshot of the global configuration, falling back to the defaults if the lock is poisoned
pub fn current() -> Configuration {
    CONFIGURATION
        .read()
        .map(|config| config.clone())
        .unwrap_or_default()
}

#[derive(Clone, Debug)]
pub struct Configuration {
    /// Lower bound given to reactions which don't specify one
    pub lower_bound: f64,
    /// Upper bound given to reactions which don't specify one
    pub upper_bound: f64,
    /// Fluxes with a smaller magnitude than this are reported as exactly zero
    pub tolerance: f64,
    pub solver: Solver,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            tolerance: 1e-07,
            solver: DEFAULT_SOLVER,
        }
    }
}

/// Enum used to specify the default solver to use
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Solver {
    /// Use the Clarabel interior point solver, fluxes are taken from the centre of the
    /// optimal face
    Clarabel,
    /// Use the microlp simplex solver, requires the minilp feature to be enabled
    #[cfg(feature = "minilp")]
    Microlp,
}

cfg_if::cfg_if! {
    if #[cfg(feature = "minilp")] {
        const DEFAULT_SOLVER: Solver = Solver::Microlp;
    } else {
        const DEFAULT_SOLVER: Solver = Solver::Clarabel;
    }
}

/// Settings for one run of the map generation pipeline
///
/// Every field has a default, so a configuration file only needs to list the values it
/// changes.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfiguration {
    /// Reaction to maximize
    pub objective: String,
    /// Upper bound applied to the objective reaction before optimizing
    pub objective_upper_bound: f64,
    /// Reactions whose |flux| is not above this value are left off the map
    pub threshold_flux: f64,
    /// Reactions never considered, whatever their flux
    pub excluded_reactions: Vec<String>,
    /// Metabolites occurring in more than this many active reactions are common
    pub common_metabolite_cutoff: usize,
    /// Metabolites treated as uncommon whatever their occurrence
    pub uncommon_metabolites: Vec<String>,
    /// Ideal distance in pixels between linked nodes of the layout
    pub node_spacing: f64,
    /// Number of force-directed layout iterations
    pub layout_iterations: usize,
    /// Seed of the initial random layout
    pub layout_seed: u64,
    /// Name written into the map header
    pub map_name: String,
    /// Directory receiving every output file
    pub output_dir: PathBuf,
    /// File name of the model snapshot read by the viewer
    pub model_snapshot_file: String,
    /// File name of the Escher map
    pub map_file: String,
    /// File name of the HTML viewer page
    pub viewer_file: String,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        RunConfiguration {
            objective: "ALCD2x".to_string(),
            objective_upper_bound: 1000.,
            threshold_flux: 0.0001,
            excluded_reactions: Vec::new(),
            common_metabolite_cutoff: 4,
            uncommon_metabolites: ["accoa_c", "pry_c", "g3p_c", "acald_c", "f6p_c", "pep_c"]
                .iter()
                .map(|id| id.to_string())
                .collect(),
            node_spacing: 350.,
            layout_iterations: 500,
            layout_seed: 0,
            map_name: "fluxmap".to_string(),
            output_dir: PathBuf::from("."),
            model_snapshot_file: "test.json".to_string(),
            map_file: "escher.json".to_string(),
            viewer_file: "escher.html".to_string(),
        }
    }
}

impl RunConfiguration {
    /// Read a run configuration from a JSON file, missing fields take their default values
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn model_snapshot_path(&self) -> PathBuf {
        self.output_dir.join(&self.model_snapshot_file)
    }

    pub fn map_path(&self) -> PathBuf {
        self.output_dir.join(&self.map_file)
    }

    pub fn viewer_path(&self) -> PathBuf {
        self.output_dir.join(&self.viewer_file)
    }
}

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Unable to read configuration file")]
    UnableToRead(#[from] std::io::Error),
    #[error("Unable to parse configuration: {0}")]
    UnableToParse(#[from] serde_json::Error),
}
