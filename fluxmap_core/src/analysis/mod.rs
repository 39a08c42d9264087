//! Selection of the reactions and metabolites which make it onto the map
mod common_metabolites;
mod flux_filter;

pub use common_metabolites::{metabolite_occurrence, select_common_metabolites};
pub use flux_filter::{filter_fluxes, FluxSets};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Reaction {0} is not in the model")]
    UnknownReaction(String),
}
