//! Metabolite occurrence counts and the choice of common metabolites
use indexmap::{IndexMap, IndexSet};

use crate::analysis::AnalysisError;
use crate::metabolic_model::model::Model;

/// Count, for every metabolite, how many of `reactions` reference it
pub fn metabolite_occurrence<'a, I>(
    model: &Model,
    reactions: I,
) -> Result<IndexMap<String, usize>, AnalysisError>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for reaction_id in reactions {
        let reaction = model
            .reactions
            .get(reaction_id)
            .ok_or_else(|| AnalysisError::UnknownReaction(reaction_id.clone()))?;
        for metabolite in reaction.metabolites.keys() {
            *counts.entry(metabolite.clone()).or_insert(0) += 1;
        }
    }
    Ok(counts)
}

/// Metabolites occurring in more than `cutoff` reactions, except those listed in `uncommon`
///
/// A count equal to `cutoff` is not common.
pub fn select_common_metabolites<S: AsRef<str>>(
    occurrence: &IndexMap<String, usize>,
    cutoff: usize,
    uncommon: &[S],
) -> IndexSet<String> {
    occurrence
        .iter()
        .filter(|(id, count)| {
            **count > cutoff && !uncommon.iter().any(|u| u.as_ref() == id.as_str())
        })
        .map(|(id, _)| id.clone())
        .collect()
}
