//! Metabolites taking part in the reactions of a model
use derive_builder::Builder;

/// A chemical species in one compartment of the model
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Metabolite {
    /// Unique id, usually a BiGG id such as `pyr_c`
    pub id: String,
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Short name of the compartment, a key of [`Model::compartments`](crate::metabolic_model::model::Model::compartments)
    #[builder(default = "None")]
    pub compartment: Option<String>,
    #[builder(default = "0")]
    pub charge: i32,
    #[builder(default = "None")]
    pub formula: Option<String>,
    /// Free form notes, kept as JSON text
    #[builder(default = "None")]
    pub notes: Option<String>,
    /// Database cross references, kept as JSON text
    #[builder(default = "None")]
    pub annotation: Option<String>,
}

impl Metabolite {
    /// Name shown on the map, the id when the metabolite has no name
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_id() {
        let mut pyruvate = MetaboliteBuilder::default()
            .id("pyr_c".to_string())
            .compartment(Some("c".to_string()))
            .build()
            .unwrap();
        assert_eq!(pyruvate.display_name(), "pyr_c");
        assert_eq!(pyruvate.charge, 0);
        pyruvate.name = Some("Pyruvate".to_string());
        assert_eq!(pyruvate.display_name(), "Pyruvate");
    }
}
