//! Serializable representation of the Escher map format
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::escher::MapError;

pub const ESCHER_SCHEMA: &str = "https://escher.github.io/escher/jsonschema/1-0-0#";
pub const ESCHER_HOMEPAGE: &str = "https://escher.github.io";

/// A complete map, serialized as the two element array `[header, body]`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EscherMap(pub MapHeader, pub MapBody);

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MapHeader {
    pub map_name: String,
    pub map_id: String,
    pub map_description: String,
    pub homepage: String,
    pub schema: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MapBody {
    pub reactions: IndexMap<String, MapReaction>,
    pub nodes: IndexMap<String, MapNode>,
    pub text_labels: IndexMap<String, TextLabel>,
    pub canvas: Canvas,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MapReaction {
    pub name: String,
    pub bigg_id: String,
    pub reversibility: bool,
    pub label_x: f64,
    pub label_y: f64,
    pub gene_reaction_rule: String,
    pub genes: Vec<MapGene>,
    pub metabolites: Vec<MapReactionMetabolite>,
    pub segments: IndexMap<String, Segment>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MapGene {
    pub bigg_id: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MapReactionMetabolite {
    pub bigg_id: String,
    pub coefficient: f64,
}

/// A piece of a reaction path between two nodes, optionally curved by two bezier handles
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Segment {
    pub from_node_id: String,
    pub to_node_id: String,
    pub b1: Option<Point>,
    pub b2: Option<Point>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "node_type", rename_all = "lowercase")]
pub enum MapNode {
    Metabolite {
        x: f64,
        y: f64,
        bigg_id: String,
        name: String,
        label_x: f64,
        label_y: f64,
        /// Secondary nodes are drawn smaller and never link reactions
        node_is_primary: bool,
    },
    /// Centre of a reaction, carries the reaction label
    Midmarker { x: f64, y: f64 },
    /// Point where the metabolites of one side of a reaction join
    Multimarker { x: f64, y: f64 },
}

impl MapNode {
    pub fn position(&self) -> Point {
        match self {
            MapNode::Metabolite { x, y, .. }
            | MapNode::Midmarker { x, y }
            | MapNode::Multimarker { x, y } => Point { x: *x, y: *y },
        }
    }

    pub fn is_marker(&self) -> bool {
        !matches!(self, MapNode::Metabolite { .. })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TextLabel {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Canvas {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl EscherMap {
    pub fn header(&self) -> &MapHeader {
        &self.0
    }

    pub fn body(&self) -> &MapBody {
        &self.1
    }

    /// Serialize the map into the JSON read by the Escher viewer
    pub fn dump_json(&self) -> Result<String, MapError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json_str(data: &str) -> Result<Self, MapError> {
        Ok(serde_json::from_str(data)?)
    }
}
