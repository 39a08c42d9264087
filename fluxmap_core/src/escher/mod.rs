//! Generation of Escher metabolic maps
//!
//! An Escher map is a JSON array of a header and a body. The body holds the nodes
//! (metabolites and the markers reactions are drawn through), the reactions with their
//! segments, free text labels and the canvas.
mod builder;
pub mod layout;
mod map;
mod validate;

pub use builder::{MapBuilder, MapSettings};
pub use map::{
    Canvas, EscherMap, MapBody, MapGene, MapHeader, MapNode, MapReaction,
    MapReactionMetabolite, Point, Segment, TextLabel, ESCHER_HOMEPAGE, ESCHER_SCHEMA,
};
pub use validate::MapValidationError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("Reaction {0} is not in the model")]
    UnknownReaction(String),
    #[error("Unable to convert the map to or from JSON")]
    Json(#[from] serde_json::Error),
}
