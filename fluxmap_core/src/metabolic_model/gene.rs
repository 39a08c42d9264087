//! This module provides the Gene struct, representing a gene
use std::fmt::{Display, Formatter};
use std::hash::Hash;

use derive_builder::Builder;

/// Structure Representing a Gene
#[derive(Builder, Clone, Debug, Eq, PartialEq)]
pub struct Gene {
    /// Used to identify the gene
    pub id: String,
    /// Human Readable Gene Name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Notes about the gene
    #[builder(default = "None")]
    pub notes: Option<String>,
    /// Gene Annotations
    #[builder(default = "None")]
    pub annotation: Option<String>,
}

impl Gene {
    pub fn new(id: String, name: Option<String>) -> Gene {
        Gene {
            id,
            name,
            notes: None,
            annotation: None,
        }
    }

    /// Name to display for the gene, the id when no name is known
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

impl Display for Gene {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl Hash for Gene {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Pull the gene ids out of a gene reaction rule such as `(b0001 and b0002) or b0003`
///
/// Ids are returned in order of first appearance, each only once.
pub fn genes_in_rule(rule: &str) -> Vec<String> {
    let mut genes: Vec<String> = Vec::new();
    for token in rule
        .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .filter(|t| !t.is_empty())
    {
        let lowered = token.to_ascii_lowercase();
        if lowered == "and" || lowered == "or" || lowered == "not" {
            continue;
        }
        if !genes.iter().any(|g| g == token) {
            genes.push(token.to_string());
        }
    }
    genes
}
