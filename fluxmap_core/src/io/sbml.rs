//! Module providing SBML (level 3 with the fbc package) input for Models
//!
//! Flux bounds are read from `fbc:lowerFluxBound`/`fbc:upperFluxBound`, falling back to the
//! `LOWER_BOUND`/`UPPER_BOUND` kinetic law parameters of older COBRA files and finally to
//! the configured default bounds. The `M_`, `R_` and `G_` id prefixes are clipped.
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::configuration;
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::{ReactionBuilder, ReactionBuilderError};

// region SBML Document
#[derive(Debug, Deserialize)]
#[serde(rename = "sbml")]
struct SbmlDocument {
    model: SbmlModel,
}

#[derive(Debug, Deserialize)]
struct SbmlModel {
    #[serde(rename = "@id")]
    id: Option<String>,
    #[serde(rename = "listOfCompartments")]
    compartments: Option<ListOfCompartments>,
    #[serde(rename = "listOfSpecies")]
    species: Option<ListOfSpecies>,
    #[serde(rename = "listOfParameters")]
    parameters: Option<ListOfParameters>,
    #[serde(rename = "listOfReactions")]
    reactions: Option<ListOfReactions>,
    #[serde(rename = "listOfObjectives", alias = "fbc:listOfObjectives")]
    objectives: Option<ListOfObjectives>,
    #[serde(rename = "listOfGeneProducts", alias = "fbc:listOfGeneProducts")]
    gene_products: Option<ListOfGeneProducts>,
}

#[derive(Debug, Deserialize)]
struct ListOfCompartments {
    #[serde(rename = "compartment", default)]
    compartments: Vec<SbmlCompartment>,
}

#[derive(Debug, Deserialize)]
struct SbmlCompartment {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@name")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListOfSpecies {
    #[serde(rename = "species", default)]
    species: Vec<SbmlSpecies>,
}

#[derive(Debug, Deserialize)]
struct SbmlSpecies {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@name")]
    name: Option<String>,
    #[serde(rename = "@compartment")]
    compartment: Option<String>,
    #[serde(rename = "@charge", alias = "@fbc:charge")]
    charge: Option<i32>,
    #[serde(rename = "@chemicalFormula", alias = "@fbc:chemicalFormula")]
    formula: Option<String>,
}

/// Model parameters, and the local parameters of a kinetic law
#[derive(Debug, Deserialize)]
struct ListOfParameters {
    #[serde(rename = "parameter", alias = "localParameter", default)]
    parameters: Vec<SbmlParameter>,
}

#[derive(Debug, Deserialize)]
struct SbmlParameter {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@value")]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListOfReactions {
    #[serde(rename = "reaction", default)]
    reactions: Vec<SbmlReaction>,
}

#[derive(Debug, Deserialize)]
struct SbmlReaction {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@name")]
    name: Option<String>,
    #[serde(rename = "@reversible")]
    reversible: Option<bool>,
    #[serde(rename = "@lowerFluxBound", alias = "@fbc:lowerFluxBound")]
    lower_flux_bound: Option<String>,
    #[serde(rename = "@upperFluxBound", alias = "@fbc:upperFluxBound")]
    upper_flux_bound: Option<String>,
    #[serde(rename = "listOfReactants")]
    reactants: Option<ListOfSpeciesReferences>,
    #[serde(rename = "listOfProducts")]
    products: Option<ListOfSpeciesReferences>,
    #[serde(rename = "kineticLaw")]
    kinetic_law: Option<KineticLaw>,
    #[serde(rename = "geneProductAssociation", alias = "fbc:geneProductAssociation")]
    gene_product_association: Option<GeneProductAssociation>,
}

#[derive(Debug, Deserialize)]
struct ListOfSpeciesReferences {
    #[serde(rename = "speciesReference", default)]
    references: Vec<SpeciesReference>,
}

#[derive(Debug, Deserialize)]
struct SpeciesReference {
    #[serde(rename = "@species")]
    species: String,
    #[serde(rename = "@stoichiometry")]
    stoichiometry: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KineticLaw {
    #[serde(rename = "listOfLocalParameters", alias = "listOfParameters")]
    parameters: Option<ListOfParameters>,
}

#[derive(Debug, Deserialize)]
struct GeneProductAssociation {
    #[serde(rename = "$value")]
    rule: GprNode,
}

#[derive(Debug, Deserialize)]
enum GprNode {
    #[serde(rename = "geneProductRef", alias = "fbc:geneProductRef")]
    Gene {
        #[serde(rename = "@geneProduct", alias = "@fbc:geneProduct")]
        gene_product: String,
    },
    #[serde(rename = "and", alias = "fbc:and")]
    And {
        #[serde(rename = "$value", default)]
        children: Vec<GprNode>,
    },
    #[serde(rename = "or", alias = "fbc:or")]
    Or {
        #[serde(rename = "$value", default)]
        children: Vec<GprNode>,
    },
}

#[derive(Debug, Deserialize)]
struct ListOfObjectives {
    #[serde(rename = "@activeObjective", alias = "@fbc:activeObjective")]
    active: Option<String>,
    #[serde(rename = "objective", alias = "fbc:objective", default)]
    objectives: Vec<SbmlObjective>,
}

#[derive(Debug, Deserialize)]
struct SbmlObjective {
    #[serde(rename = "@id", alias = "@fbc:id")]
    id: String,
    #[serde(rename = "listOfFluxObjectives", alias = "fbc:listOfFluxObjectives")]
    flux_objectives: Option<ListOfFluxObjectives>,
}

#[derive(Debug, Deserialize)]
struct ListOfFluxObjectives {
    #[serde(rename = "fluxObjective", alias = "fbc:fluxObjective", default)]
    flux_objectives: Vec<FluxObjective>,
}

#[derive(Debug, Deserialize)]
struct FluxObjective {
    #[serde(rename = "@reaction", alias = "@fbc:reaction")]
    reaction: String,
    #[serde(rename = "@coefficient", alias = "@fbc:coefficient")]
    coefficient: String,
}

#[derive(Debug, Deserialize)]
struct ListOfGeneProducts {
    #[serde(rename = "geneProduct", alias = "fbc:geneProduct", default)]
    gene_products: Vec<SbmlGeneProduct>,
}

#[derive(Debug, Deserialize)]
struct SbmlGeneProduct {
    #[serde(rename = "@id", alias = "@fbc:id")]
    id: String,
    #[serde(rename = "@name", alias = "@fbc:name")]
    name: Option<String>,
    #[serde(rename = "@label", alias = "@fbc:label")]
    label: Option<String>,
}
// endregion SBML Document

// region Conversions
/// Strip an SBML id prefix such as `R_`
fn clip<'a>(id: &'a str, prefix: &str) -> &'a str {
    id.strip_prefix(prefix).unwrap_or(id)
}

/// Parse an SBML double, which spells infinities `INF` and `-INF`
fn parse_number(value: &str) -> Result<f64, SbmlError> {
    match value.trim() {
        "INF" => Ok(f64::INFINITY),
        "-INF" => Ok(f64::NEG_INFINITY),
        other => other
            .parse::<f64>()
            .map_err(|_| SbmlError::InvalidNumber(value.to_string())),
    }
}

impl GprNode {
    /// Write the association as a gene reaction rule, nested groups in parentheses
    fn to_rule(&self, nested: bool) -> String {
        let (children, operator) = match self {
            GprNode::Gene { gene_product } => return clip(gene_product, "G_").to_string(),
            GprNode::And { children } => (children, " and "),
            GprNode::Or { children } => (children, " or "),
        };
        let rule = children
            .iter()
            .map(|child| child.to_rule(true))
            .collect::<Vec<_>>()
            .join(operator);
        if nested && children.len() > 1 {
            format!("({})", rule)
        } else {
            rule
        }
    }
}

impl SbmlReaction {
    /// Net stoichiometry, reactants negative and products positive
    fn stoichiometry(&self) -> Result<IndexMap<String, f64>, SbmlError> {
        let mut metabolites: IndexMap<String, f64> = IndexMap::new();
        let sides = [(&self.reactants, -1.), (&self.products, 1.)];
        for (side, sign) in sides {
            let Some(side) = side else { continue };
            for reference in &side.references {
                let coefficient = match &reference.stoichiometry {
                    Some(value) => parse_number(value)?,
                    None => 1.,
                };
                *metabolites
                    .entry(clip(&reference.species, "M_").to_string())
                    .or_default() += sign * coefficient;
            }
        }
        Ok(metabolites)
    }

    fn bounds(&self, parameters: &IndexMap<String, f64>) -> Result<(f64, f64), SbmlError> {
        let defaults = configuration::current();
        let lookup = |parameter: &String| {
            parameters
                .get(parameter)
                .copied()
                .ok_or_else(|| SbmlError::UnknownParameter {
                    reaction: self.id.clone(),
                    parameter: parameter.clone(),
                })
        };
        let local = |name: &str| -> Result<Option<f64>, SbmlError> {
            let Some(list) = self.kinetic_law.as_ref().and_then(|law| law.parameters.as_ref())
            else {
                return Ok(None);
            };
            match list.parameters.iter().find(|p| p.id == name) {
                Some(SbmlParameter {
                    value: Some(value), ..
                }) => Ok(Some(parse_number(value)?)),
                _ => Ok(None),
            }
        };

        let lower_bound = match &self.lower_flux_bound {
            Some(parameter) => lookup(parameter)?,
            None => match local("LOWER_BOUND")? {
                Some(value) => value,
                None if self.reversible == Some(false) => 0.,
                None => defaults.lower_bound,
            },
        };
        let upper_bound = match &self.upper_flux_bound {
            Some(parameter) => lookup(parameter)?,
            None => local("UPPER_BOUND")?.unwrap_or(defaults.upper_bound),
        };
        Ok((lower_bound, upper_bound))
    }

    fn objective_coefficient(&self) -> Result<Option<f64>, SbmlError> {
        let Some(list) = self.kinetic_law.as_ref().and_then(|law| law.parameters.as_ref()) else {
            return Ok(None);
        };
        list.parameters
            .iter()
            .find(|p| p.id == "OBJECTIVE_COEFFICIENT")
            .and_then(|p| p.value.as_deref())
            .map(parse_number)
            .transpose()
    }
}

impl Model {
    /// Read a model from an SBML file
    pub fn read_sbml<P: AsRef<Path>>(path: P) -> Result<Model, SbmlError> {
        let model_str = fs::read_to_string(path.as_ref())
            .map_err(|err| SbmlError::UnableToRead(format!("{:?}", err)))?;
        Model::from_sbml_str(&model_str)
    }

    /// Parse a model from an SBML string
    ///
    /// # Examples
    /// ```rust
    /// use fluxmap_core::metabolic_model::model::Model;
    /// let data = r#"<sbml><model id="tiny">
    ///   <listOfSpecies><species id="M_a_c" compartment="c"/></listOfSpecies>
    ///   <listOfReactions>
    ///     <reaction id="R_EX_a" reversible="false">
    ///       <listOfReactants><speciesReference species="M_a_c"/></listOfReactants>
    ///     </reaction>
    ///   </listOfReactions>
    /// </model></sbml>"#;
    /// let model = Model::from_sbml_str(data).unwrap();
    /// assert_eq!(model.reactions["EX_a"].metabolites["a_c"], -1.);
    /// assert_eq!(model.reactions["EX_a"].lower_bound, 0.);
    /// ```
    pub fn from_sbml_str(data: &str) -> Result<Model, SbmlError> {
        let document: SbmlDocument = quick_xml::de::from_str(data)
            .map_err(|err| SbmlError::UnableToParse(format!("{}", err)))?;
        Model::from_sbml(document.model)
    }

    fn from_sbml(sbml: SbmlModel) -> Result<Self, SbmlError> {
        let mut model = Model::new_empty();
        model.id = sbml.id;
        model.compartments = sbml.compartments.map(|list| {
            list.compartments
                .into_iter()
                .map(|c| {
                    let name = c.name.unwrap_or_else(|| c.id.clone());
                    (c.id, name)
                })
                .collect()
        });

        for gene in sbml.gene_products.into_iter().flat_map(|l| l.gene_products) {
            let id = clip(&gene.id, "G_").to_string();
            model.add_gene(Gene::new(id, gene.name.or(gene.label)));
        }
        for species in sbml.species.into_iter().flat_map(|l| l.species) {
            model.add_metabolite(Metabolite {
                id: clip(&species.id, "M_").to_string(),
                name: species.name,
                compartment: species.compartment,
                charge: species.charge.unwrap_or_default(),
                formula: species.formula,
                notes: None,
                annotation: None,
            });
        }

        let mut parameters = IndexMap::new();
        for parameter in sbml.parameters.into_iter().flat_map(|l| l.parameters) {
            if let Some(value) = parameter.value {
                parameters.insert(parameter.id, parse_number(&value)?);
            }
        }

        for rxn in sbml.reactions.into_iter().flat_map(|l| l.reactions) {
            let (lower_bound, upper_bound) = rxn.bounds(&parameters)?;
            let id = clip(&rxn.id, "R_").to_string();
            let reaction = ReactionBuilder::default()
                .id(id.clone())
                .metabolites(rxn.stoichiometry()?)
                .name(rxn.name.clone())
                .gene_reaction_rule(
                    rxn.gene_product_association
                        .as_ref()
                        .map(|gpa| gpa.rule.to_rule(false))
                        .unwrap_or_default(),
                )
                .lower_bound(lower_bound)
                .upper_bound(upper_bound)
                .build()?;
            if let Some(coef) = rxn.objective_coefficient()? {
                if coef != 0. {
                    model.objective.insert(id, coef);
                }
            }
            model.add_reaction(reaction);
        }

        if let Some(list) = sbml.objectives {
            let active = match &list.active {
                Some(active) => list.objectives.iter().find(|o| &o.id == active),
                None => list.objectives.first(),
            };
            match active {
                Some(objective) => {
                    model.objective.clear();
                    for flux in objective
                        .flux_objectives
                        .iter()
                        .flat_map(|l| &l.flux_objectives)
                    {
                        let coef = parse_number(&flux.coefficient)?;
                        if coef != 0. {
                            model
                                .objective
                                .insert(clip(&flux.reaction, "R_").to_string(), coef);
                        }
                    }
                }
                None => warn!(active = ?list.active, "active objective not found"),
            }
        }

        debug!(
            reactions = model.reactions.len(),
            metabolites = model.metabolites.len(),
            genes = model.genes.len(),
            "read SBML model"
        );
        Ok(model)
    }
}

#[derive(Error, Debug)]
pub enum SbmlError {
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Unable to parse SBML due to {0}")]
    UnableToParse(String),
    #[error("Reaction {reaction} uses unknown bound parameter {parameter}")]
    UnknownParameter { reaction: String, parameter: String },
    #[error("Invalid number {0}")]
    InvalidNumber(String),
    #[error("Unable to build reaction")]
    UnableToBuildReaction(#[from] ReactionBuilderError),
}
// endregion Conversions
