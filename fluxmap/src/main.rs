use std::path::{Path, PathBuf};
use std::process::Command;

use clap::Parser;
use fluxmap_core::configuration::RunConfiguration;
use fluxmap_core::pipeline::{self, PipelineError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fluxmap")]
#[command(about = "Draw the reactions carrying flux in a metabolic model as an Escher map", long_about = None)]
struct Cli {
    /// Path to the model, SBML for `.xml`/`.sbml` files and COBRA JSON otherwise
    model_path: PathBuf,
    /// JSON file with run settings, flags given here take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Reaction to maximize
    #[arg(long)]
    objective: Option<String>,
    /// Minimum absolute flux for a reaction to be drawn
    #[arg(long)]
    threshold: Option<f64>,
    /// Reaction to leave out of the map, may be repeated
    #[arg(long = "exclude")]
    excluded: Vec<String>,
    /// Directory receiving the model snapshot, the map and the viewer page
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// Open the viewer page in the default browser
    #[arg(long)]
    open: bool,
}

impl Cli {
    fn run_configuration(&self) -> Result<RunConfiguration, PipelineError> {
        let mut config = match &self.config {
            Some(path) => RunConfiguration::read_json(path)?,
            None => RunConfiguration::default(),
        };
        if let Some(objective) = &self.objective {
            config.objective = objective.clone();
        }
        if let Some(threshold) = self.threshold {
            config.threshold_flux = threshold;
        }
        if !self.excluded.is_empty() {
            config.excluded_reactions = self.excluded.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        Ok(config)
    }
}

fn main() -> Result<(), PipelineError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = cli.run_configuration()?;
    let output = pipeline::run(&cli.model_path, &config)?;
    println!(
        "Flux of {} {}",
        config.objective, output.solution.objective_value
    );
    println!(
        "Drew {} of {} reactions with flux, {} common metabolites",
        output.flux_sets.with_greater_flux.len(),
        output.flux_sets.with_flux.len(),
        output.common_metabolites.len()
    );
    println!("Map written to {}", output.map_path.display());

    if cli.open {
        open_in_browser(&output.viewer_path);
    }
    Ok(())
}

/// Start the system browser on `path`, failures are only logged
fn open_in_browser(path: &Path) {
    let target = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    } else {
        Command::new("xdg-open")
    };
    info!(path = %target.display(), "opening viewer");
    if let Err(err) = command.arg(&target).spawn() {
        warn!("Unable to open a browser: {}", err);
    }
}
