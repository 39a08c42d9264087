//! Structural checks of Escher maps
use indexmap::IndexSet;
use thiserror::Error;

use crate::escher::map::{EscherMap, MapNode};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapValidationError {
    #[error("Map header field {0} is empty")]
    MissingHeaderField(&'static str),
    #[error("Segment {segment} of reaction {reaction} references missing node {node}")]
    MissingNode {
        reaction: String,
        segment: String,
        node: String,
    },
    #[error("Node {node} ({bigg_id}) is connected to reaction {reaction} which does not contain it")]
    MetaboliteNotInReaction {
        node: String,
        bigg_id: String,
        reaction: String,
    },
    #[error("Marker node {0} is not part of any segment")]
    OrphanMarker(String),
    #[error("Node {0} has a non-finite position")]
    NonFiniteNode(String),
    #[error("Label of reaction {0} has a non-finite position")]
    NonFiniteLabel(String),
    #[error("Canvas has no area")]
    EmptyCanvas,
}

impl EscherMap {
    /// Check that the map can be drawn, returning the first defect found
    pub fn check(&self) -> Result<(), MapValidationError> {
        let header = self.header();
        if header.map_id.is_empty() {
            return Err(MapValidationError::MissingHeaderField("map_id"));
        }
        if header.schema.is_empty() {
            return Err(MapValidationError::MissingHeaderField("schema"));
        }

        let body = self.body();
        for (node_id, node) in &body.nodes {
            let p = node.position();
            let label_finite = match node {
                MapNode::Metabolite {
                    label_x, label_y, ..
                } => label_x.is_finite() && label_y.is_finite(),
                _ => true,
            };
            if !(p.x.is_finite() && p.y.is_finite() && label_finite) {
                return Err(MapValidationError::NonFiniteNode(node_id.clone()));
            }
        }

        let mut used_nodes: IndexSet<&str> = IndexSet::new();
        for (reaction_id, reaction) in &body.reactions {
            if !(reaction.label_x.is_finite() && reaction.label_y.is_finite()) {
                return Err(MapValidationError::NonFiniteLabel(reaction_id.clone()));
            }
            for (segment_id, segment) in &reaction.segments {
                for node_id in [&segment.from_node_id, &segment.to_node_id] {
                    let node = body.nodes.get(node_id).ok_or_else(|| {
                        MapValidationError::MissingNode {
                            reaction: reaction_id.clone(),
                            segment: segment_id.clone(),
                            node: node_id.clone(),
                        }
                    })?;
                    if let MapNode::Metabolite { bigg_id, .. } = node {
                        if !reaction.metabolites.iter().any(|m| &m.bigg_id == bigg_id) {
                            return Err(MapValidationError::MetaboliteNotInReaction {
                                node: node_id.clone(),
                                bigg_id: bigg_id.clone(),
                                reaction: reaction_id.clone(),
                            });
                        }
                    }
                    used_nodes.insert(node_id.as_str());
                }
            }
        }

        if let Some((node_id, _)) = body
            .nodes
            .iter()
            .find(|(id, node)| node.is_marker() && !used_nodes.contains(id.as_str()))
        {
            return Err(MapValidationError::OrphanMarker(node_id.clone()));
        }

        let canvas = &body.canvas;
        if !(canvas.width > 0. && canvas.height > 0.) {
            return Err(MapValidationError::EmptyCanvas);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escher::map::{
        Canvas, MapBody, MapHeader, MapReaction, MapReactionMetabolite, Segment,
    };
    use indexmap::IndexMap;

    fn valid_map() -> EscherMap {
        let mut nodes = IndexMap::new();
        nodes.insert(
            "1".to_string(),
            MapNode::Metabolite {
                x: 0.,
                y: 0.,
                bigg_id: "a".to_string(),
                name: "A".to_string(),
                label_x: 0.,
                label_y: 0.,
                node_is_primary: true,
            },
        );
        nodes.insert("2".to_string(), MapNode::Midmarker { x: 10., y: 0. });
        let mut segments = IndexMap::new();
        segments.insert(
            "3".to_string(),
            Segment {
                from_node_id: "1".to_string(),
                to_node_id: "2".to_string(),
                b1: None,
                b2: None,
            },
        );
        let mut reactions = IndexMap::new();
        reactions.insert(
            "4".to_string(),
            MapReaction {
                name: "R".to_string(),
                bigg_id: "R".to_string(),
                reversibility: false,
                label_x: 5.,
                label_y: 5.,
                gene_reaction_rule: String::new(),
                genes: Vec::new(),
                metabolites: vec![MapReactionMetabolite {
                    bigg_id: "a".to_string(),
                    coefficient: -1.,
                }],
                segments,
            },
        );
        EscherMap(
            MapHeader {
                map_name: "m".to_string(),
                map_id: "abc".to_string(),
                map_description: String::new(),
                homepage: String::new(),
                schema: "schema".to_string(),
            },
            MapBody {
                reactions,
                nodes,
                text_labels: IndexMap::new(),
                canvas: Canvas {
                    x: 0.,
                    y: 0.,
                    width: 100.,
                    height: 100.,
                },
            },
        )
    }

    #[test]
    fn valid() {
        assert_eq!(valid_map().check(), Ok(()));
    }

    #[test]
    fn missing_id() {
        let mut map = valid_map();
        map.0.map_id.clear();
        assert_eq!(
            map.check(),
            Err(MapValidationError::MissingHeaderField("map_id"))
        );
    }

    #[test]
    fn missing_node() {
        let mut map = valid_map();
        map.1.nodes.shift_remove("2");
        assert!(matches!(
            map.check(),
            Err(MapValidationError::MissingNode { node, .. }) if node == "2"
        ));
    }

    #[test]
    fn foreign_metabolite() {
        let mut map = valid_map();
        if let Some(MapNode::Metabolite { bigg_id, .. }) = map.1.nodes.get_mut("1") {
            *bigg_id = "z".to_string();
        }
        assert!(matches!(
            map.check(),
            Err(MapValidationError::MetaboliteNotInReaction { bigg_id, .. }) if bigg_id == "z"
        ));
    }

    #[test]
    fn orphan_marker() {
        let mut map = valid_map();
        map.1
            .nodes
            .insert("9".to_string(), MapNode::Multimarker { x: 1., y: 1. });
        assert_eq!(
            map.check(),
            Err(MapValidationError::OrphanMarker("9".to_string()))
        );
    }

    #[test]
    fn non_finite_positions() {
        let mut map = valid_map();
        map.1.nodes.insert(
            "2".to_string(),
            MapNode::Midmarker {
                x: f64::NAN,
                y: 0.,
            },
        );
        assert_eq!(
            map.check(),
            Err(MapValidationError::NonFiniteNode("2".to_string()))
        );

        let mut map = valid_map();
        map.1.reactions["4"].label_y = f64::INFINITY;
        assert_eq!(
            map.check(),
            Err(MapValidationError::NonFiniteLabel("4".to_string()))
        );
    }

    #[test]
    fn empty_canvas() {
        let mut map = valid_map();
        map.1.canvas.width = 0.;
        assert_eq!(map.check(), Err(MapValidationError::EmptyCanvas));
    }
}
