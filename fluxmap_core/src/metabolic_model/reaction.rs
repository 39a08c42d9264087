//! This module provides a struct for representing reactions
use derive_builder::Builder;
use indexmap::IndexMap;

use crate::configuration;
use crate::metabolic_model::gene::genes_in_rule;
use crate::utils::hashing::hash_as_hex_string;

/// Represents a reaction in the metabolic model
#[derive(Builder, Debug, Clone)]
pub struct Reaction {
    /// Used to identify the reaction
    pub id: String,
    /// Metabolite stoichiometry of the reaction
    ///
    /// Negative coefficients are consumed, positive ones produced.
    #[builder(default = "IndexMap::new()")]
    pub metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Gene reaction rule, empty when the reaction has no associated genes
    #[builder(default = "String::new()")]
    pub gene_reaction_rule: String,
    /// Lower flux bound
    #[builder(default = "configuration::current().lower_bound")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "configuration::current().upper_bound")]
    pub upper_bound: f64,
    /// Reaction subsystem
    #[builder(default = "None")]
    pub subsystem: Option<String>,
    /// Notes about the reaction
    #[builder(default = "None")]
    pub notes: Option<String>,
    /// Reaction Annotations
    #[builder(default = "None")]
    pub annotation: Option<String>,
}

impl Reaction {
    /// Determine the id to be associated with the forward reaction in the optimization problem
    ///
    /// # Note:
    /// The forward id is "{reaction_id}_forward"
    pub fn get_forward_id(&self) -> String {
        format!("{}_forward", &self.id)
    }

    /// Determine the id to be associated with the reverse reaction in the optimization problem
    ///
    /// # Note:
    /// The reverse id is "{reaction_id}_reverse_{hexidecimal hash of reaction_id}"
    pub fn get_reverse_id(&self) -> String {
        format!("{}_reverse_{}", &self.id, hash_as_hex_string(&self.id))
    }

    /// Determine the upper bound of the variable associated with the forward reaction
    pub(crate) fn get_forward_upper_bound(&self) -> f64 {
        self.upper_bound.max(0f64)
    }

    /// Determine the lower bound of the variable associated with the forward reaction
    pub(crate) fn get_forward_lower_bound(&self) -> f64 {
        self.lower_bound.max(0f64)
    }

    /// Determine the upper bound of the variable associated with the reverse reaction
    pub(crate) fn get_reverse_upper_bound(&self) -> f64 {
        (-self.lower_bound).max(0f64)
    }

    /// Determine the lower bound of the variable associated with the reverse reaction
    pub(crate) fn get_reverse_lower_bound(&self) -> f64 {
        (-self.upper_bound).max(0f64)
    }

    /// Whether the reaction can carry flux in the reverse direction
    pub fn is_reversible(&self) -> bool {
        self.lower_bound < 0f64
    }

    /// Ids of the metabolites consumed by the reaction
    pub fn reactants(&self) -> impl Iterator<Item = &str> {
        self.metabolites
            .iter()
            .filter(|(_, coef)| **coef < 0f64)
            .map(|(id, _)| id.as_str())
    }

    /// Ids of the metabolites produced by the reaction
    pub fn products(&self) -> impl Iterator<Item = &str> {
        self.metabolites
            .iter()
            .filter(|(_, coef)| **coef > 0f64)
            .map(|(id, _)| id.as_str())
    }

    /// Ids of the genes named in the gene reaction rule
    pub fn gene_ids(&self) -> Vec<String> {
        genes_in_rule(&self.gene_reaction_rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pfk() -> Reaction {
        let mut metabolites = IndexMap::new();
        metabolites.insert("atp_c".to_string(), -1.0);
        metabolites.insert("f6p_c".to_string(), -1.0);
        metabolites.insert("adp_c".to_string(), 1.0);
        metabolites.insert("fdp_c".to_string(), 1.0);
        ReactionBuilder::default()
            .id("PFK".to_string())
            .metabolites(metabolites)
            .gene_reaction_rule("b3916 or b1723".to_string())
            .lower_bound(0.)
            .upper_bound(1000.)
            .build()
            .unwrap()
    }

    #[test]
    fn default_bounds() {
        let reaction = ReactionBuilder::default()
            .id("R1".to_string())
            .build()
            .unwrap();
        assert!((reaction.lower_bound + 1000.).abs() < 1e-25);
        assert!((reaction.upper_bound - 1000.).abs() < 1e-25);
        assert!(reaction.is_reversible());
        assert!(reaction.gene_ids().is_empty());
    }

    #[test]
    fn split_variable_bounds() {
        let irreversible = pfk();
        assert!((irreversible.get_forward_lower_bound() - 0.).abs() < 1e-25);
        assert!((irreversible.get_forward_upper_bound() - 1000.).abs() < 1e-25);
        assert!((irreversible.get_reverse_lower_bound() - 0.).abs() < 1e-25);
        assert!((irreversible.get_reverse_upper_bound() - 0.).abs() < 1e-25);

        // A reaction forced to run backwards
        let mut backwards = pfk();
        backwards.lower_bound = -10.;
        backwards.upper_bound = -2.;
        assert!((backwards.get_forward_upper_bound() - 0.).abs() < 1e-25);
        assert!((backwards.get_reverse_lower_bound() - 2.).abs() < 1e-25);
        assert!((backwards.get_reverse_upper_bound() - 10.).abs() < 1e-25);
    }

    #[test]
    fn variable_ids() {
        let reaction = pfk();
        assert_eq!(reaction.get_forward_id(), "PFK_forward");
        assert!(reaction.get_reverse_id().starts_with("PFK_reverse_"));
        assert_ne!(reaction.get_forward_id(), reaction.get_reverse_id());
    }

    #[test]
    fn sides() {
        let reaction = pfk();
        assert_eq!(reaction.reactants().collect::<Vec<_>>(), vec!["atp_c", "f6p_c"]);
        assert_eq!(reaction.products().collect::<Vec<_>>(), vec!["adp_c", "fdp_c"]);
        assert_eq!(reaction.gene_ids(), vec!["b3916", "b1723"]);
    }
}
