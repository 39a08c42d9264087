//! Construction of an Escher map from a set of reactions
use indexmap::{IndexMap, IndexSet};
use nalgebra::Vector2;
use tracing::debug;

use crate::configuration::RunConfiguration;
use crate::escher::layout::{fruchterman_reingold, LayoutGraph, LayoutSettings};
use crate::escher::map::{
    Canvas, EscherMap, MapBody, MapGene, MapHeader, MapNode, MapReaction,
    MapReactionMetabolite, Point, Segment, ESCHER_HOMEPAGE, ESCHER_SCHEMA,
};
use crate::escher::MapError;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::Reaction;
use crate::utils::hashing::hash_ids_as_hex_string;

/// Distance of the multimarkers from the midmarker, as a fraction of the node spacing
const MARKER_OFFSET: f64 = 0.12;
/// Distance of secondary nodes from their multimarker along the reaction axis
const SECONDARY_OFFSET: f64 = 0.18;
/// Spread of secondary nodes across the reaction axis
const SECONDARY_SPREAD: f64 = 0.12;
const LABEL_OFFSET: f64 = 0.1;
const METABOLITE_LABEL_OFFSET: f64 = 0.06;

#[derive(Clone, Debug)]
pub struct MapSettings {
    pub map_name: String,
    /// Ideal distance between a reaction and its metabolites
    pub node_spacing: f64,
    pub layout_iterations: usize,
    pub layout_seed: u64,
}

impl Default for MapSettings {
    fn default() -> Self {
        MapSettings::from(&RunConfiguration::default())
    }
}

impl From<&RunConfiguration> for MapSettings {
    fn from(config: &RunConfiguration) -> Self {
        MapSettings {
            map_name: config.map_name.clone(),
            node_spacing: config.node_spacing,
            layout_iterations: config.layout_iterations,
            layout_seed: config.layout_seed,
        }
    }
}

/// Builds maps for the reactions of a model
///
/// Primary metabolites are shared nodes linking reactions together. Common metabolites
/// get a separate secondary node for every reaction they take part in, so they never
/// pull unrelated reactions together in the layout.
pub struct MapBuilder<'a> {
    model: &'a Model,
    settings: MapSettings,
}

impl<'a> MapBuilder<'a> {
    pub fn new(model: &'a Model, settings: MapSettings) -> Self {
        MapBuilder { model, settings }
    }

    pub fn build(
        &self,
        reactions: &IndexSet<String>,
        common_metabolites: &IndexSet<String>,
    ) -> Result<EscherMap, MapError> {
        let selected = reactions
            .iter()
            .map(|id| {
                self.model
                    .reactions
                    .get(id)
                    .ok_or_else(|| MapError::UnknownReaction(id.clone()))
            })
            .collect::<Result<Vec<&Reaction>, MapError>>()?;

        // Layout graph: reactions first, then each distinct primary metabolite
        let mut graph = LayoutGraph::default();
        let reaction_nodes: Vec<usize> = selected.iter().map(|_| graph.add_node()).collect();
        let mut metabolite_nodes: IndexMap<&str, usize> = IndexMap::new();
        for (reaction, &reaction_node) in selected.iter().zip(&reaction_nodes) {
            for met_id in reaction.metabolites.keys() {
                if common_metabolites.contains(met_id) {
                    continue;
                }
                let met_node = *metabolite_nodes
                    .entry(met_id.as_str())
                    .or_insert_with(|| graph.add_node());
                graph.add_edge(reaction_node, met_node);
            }
        }
        debug!(
            "Laying out {} reactions and {} primary metabolites",
            reaction_nodes.len(),
            metabolite_nodes.len()
        );
        let spacing = self.settings.node_spacing;
        let mut positions = fruchterman_reingold(
            &graph,
            &LayoutSettings {
                ideal_distance: spacing,
                iterations: self.settings.layout_iterations,
                seed: self.settings.layout_seed,
            },
        );
        shift_to_margin(&mut positions, spacing / 2.);

        let mut drawing = Drawing::new(spacing);
        let mut primary_ids: IndexMap<&str, String> = IndexMap::new();
        for (&met_id, &layout_node) in &metabolite_nodes {
            let node_id = drawing.add_metabolite(self.model, met_id, positions[layout_node], true);
            primary_ids.insert(met_id, node_id);
        }

        for (reaction, &layout_node) in selected.iter().zip(&reaction_nodes) {
            let centre = positions[layout_node];
            let position_of = |id: &str| metabolite_nodes.get(id).map(|&n| positions[n]);
            let reactant_centroid = centroid(reaction.reactants().filter_map(position_of));
            let product_centroid = centroid(reaction.products().filter_map(position_of));
            let axis = reaction_axis(centre, reactant_centroid, product_centroid);
            drawing.add_reaction(
                self.model,
                reaction,
                centre,
                axis,
                &primary_ids,
                common_metabolites,
            );
        }

        let header = MapHeader {
            map_name: self.settings.map_name.clone(),
            map_id: hash_ids_as_hex_string(reactions.iter().map(String::as_str)),
            map_description: match &self.model.id {
                Some(id) => format!("Reactions carrying flux in {}", id),
                None => "Reactions carrying flux".to_string(),
            },
            homepage: ESCHER_HOMEPAGE.to_string(),
            schema: ESCHER_SCHEMA.to_string(),
        };
        let canvas = drawing.canvas();
        Ok(EscherMap(
            header,
            MapBody {
                reactions: drawing.reactions,
                nodes: drawing.nodes,
                text_labels: IndexMap::new(),
                canvas,
            },
        ))
    }
}

/// Nodes and reactions of a map under construction, sharing one id sequence
struct Drawing {
    spacing: f64,
    next_id: usize,
    nodes: IndexMap<String, MapNode>,
    reactions: IndexMap<String, MapReaction>,
}

impl Drawing {
    fn new(spacing: f64) -> Self {
        Drawing {
            spacing,
            next_id: 0,
            nodes: IndexMap::new(),
            reactions: IndexMap::new(),
        }
    }

    fn next_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn add_node(&mut self, node: MapNode) -> String {
        let id = self.next_id();
        self.nodes.insert(id.clone(), node);
        id
    }

    fn connect(&mut self, segments: &mut IndexMap<String, Segment>, from: &str, to: &str) {
        segments.insert(
            self.next_id(),
            Segment {
                from_node_id: from.to_string(),
                to_node_id: to.to_string(),
                b1: None,
                b2: None,
            },
        );
    }

    fn add_metabolite(
        &mut self,
        model: &Model,
        met_id: &str,
        position: Vector2<f64>,
        primary: bool,
    ) -> String {
        let name = model
            .metabolites
            .get(met_id)
            .map(|met| met.display_name().to_string())
            .unwrap_or_else(|| met_id.to_string());
        let label_offset = METABOLITE_LABEL_OFFSET * self.spacing;
        self.add_node(MapNode::Metabolite {
            x: position.x,
            y: position.y,
            bigg_id: met_id.to_string(),
            name,
            label_x: position.x + label_offset,
            label_y: position.y - label_offset,
            node_is_primary: primary,
        })
    }

    fn add_reaction(
        &mut self,
        model: &Model,
        reaction: &Reaction,
        centre: Vector2<f64>,
        axis: Vector2<f64>,
        primary_ids: &IndexMap<&str, String>,
        common_metabolites: &IndexSet<String>,
    ) {
        let normal = Vector2::new(-axis.y, axis.x);
        let marker_offset = axis * (MARKER_OFFSET * self.spacing);
        let reactant_position = centre - marker_offset;
        let product_position = centre + marker_offset;

        let midmarker = self.add_node(MapNode::Midmarker {
            x: centre.x,
            y: centre.y,
        });
        let reactant_marker = self.add_node(MapNode::Multimarker {
            x: reactant_position.x,
            y: reactant_position.y,
        });
        let product_marker = self.add_node(MapNode::Multimarker {
            x: product_position.x,
            y: product_position.y,
        });

        let mut segments = IndexMap::new();
        self.connect(&mut segments, &reactant_marker, &midmarker);
        self.connect(&mut segments, &midmarker, &product_marker);

        let mut reactant_slots = 0;
        for met_id in reaction.reactants() {
            if common_metabolites.contains(met_id) {
                let position = reactant_position
                    - axis * (SECONDARY_OFFSET * self.spacing)
                    + normal * (SECONDARY_SPREAD * self.spacing * slot(reactant_slots));
                reactant_slots += 1;
                let node = self.add_metabolite(model, met_id, position, false);
                self.connect(&mut segments, &node, &reactant_marker);
            } else if let Some(node) = primary_ids.get(met_id) {
                self.connect(&mut segments, node, &reactant_marker);
            }
        }
        let mut product_slots = 0;
        for met_id in reaction.products() {
            if common_metabolites.contains(met_id) {
                let position = product_position
                    + axis * (SECONDARY_OFFSET * self.spacing)
                    + normal * (SECONDARY_SPREAD * self.spacing * slot(product_slots));
                product_slots += 1;
                let node = self.add_metabolite(model, met_id, position, false);
                self.connect(&mut segments, &product_marker, &node);
            } else if let Some(node) = primary_ids.get(met_id) {
                self.connect(&mut segments, &product_marker, node);
            }
        }

        let label = centre + normal * (LABEL_OFFSET * self.spacing);
        let genes = reaction
            .gene_ids()
            .into_iter()
            .map(|gene_id| MapGene {
                name: model
                    .genes
                    .get(&gene_id)
                    .map(|gene| gene.display_name().to_string())
                    .unwrap_or_else(|| gene_id.clone()),
                bigg_id: gene_id,
            })
            .collect();
        let map_reaction = MapReaction {
            name: reaction.name.clone().unwrap_or_else(|| reaction.id.clone()),
            bigg_id: reaction.id.clone(),
            reversibility: reaction.is_reversible(),
            label_x: label.x,
            label_y: label.y,
            gene_reaction_rule: reaction.gene_reaction_rule.clone(),
            genes,
            metabolites: reaction
                .metabolites
                .iter()
                .map(|(id, coefficient)| MapReactionMetabolite {
                    bigg_id: id.clone(),
                    coefficient: *coefficient,
                })
                .collect(),
            segments,
        };
        let reaction_id = self.next_id();
        self.reactions.insert(reaction_id, map_reaction);
    }

    /// Bounding box of all nodes with half a node spacing of margin
    fn canvas(&self) -> Canvas {
        let mut min = Point {
            x: f64::INFINITY,
            y: f64::INFINITY,
        };
        let mut max = Point {
            x: f64::NEG_INFINITY,
            y: f64::NEG_INFINITY,
        };
        for node in self.nodes.values() {
            let p = node.position();
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        if self.nodes.is_empty() {
            min = Point { x: 0., y: 0. };
            max = min;
        }
        let margin = self.spacing / 2.;
        Canvas {
            x: min.x - margin,
            y: min.y - margin,
            width: (max.x - min.x + 2. * margin).max(self.spacing),
            height: (max.y - min.y + 2. * margin).max(self.spacing),
        }
    }
}

/// Alternating offsets 1, -1, 2, -2, ... for nodes fanned out around an axis
fn slot(index: usize) -> f64 {
    let magnitude = (index / 2 + 1) as f64;
    if index % 2 == 0 {
        magnitude
    } else {
        -magnitude
    }
}

fn centroid(points: impl Iterator<Item = Vector2<f64>>) -> Option<Vector2<f64>> {
    let (sum, count) = points.fold((Vector2::zeros(), 0usize), |(sum, count), p| {
        (sum + p, count + 1)
    });
    (count > 0).then(|| sum / count as f64)
}

/// Unit direction from the reactant side to the product side of a reaction
fn reaction_axis(
    centre: Vector2<f64>,
    reactants: Option<Vector2<f64>>,
    products: Option<Vector2<f64>>,
) -> Vector2<f64> {
    let direction = match (reactants, products) {
        (Some(r), Some(p)) => p - r,
        (Some(r), None) => centre - r,
        (None, Some(p)) => p - centre,
        (None, None) => Vector2::new(1., 0.),
    };
    let length = direction.norm();
    if length.is_finite() && length > 1e-9 {
        direction / length
    } else {
        Vector2::new(1., 0.)
    }
}

/// Translate positions so the smallest coordinates sit at `margin`
fn shift_to_margin(positions: &mut [Vector2<f64>], margin: f64) {
    let min_x = positions.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let min_y = positions.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    if !min_x.is_finite() || !min_y.is_finite() {
        return;
    }
    let shift = Vector2::new(margin - min_x, margin - min_y);
    for p in positions.iter_mut() {
        *p += shift;
    }
}
