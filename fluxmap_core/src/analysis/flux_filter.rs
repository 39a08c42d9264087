//! Partition reactions by the flux they carry
use indexmap::{IndexMap, IndexSet};

/// Reactions carrying flux, and the subset carrying more than the threshold
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FluxSets {
    /// Reactions with a nonzero flux which are not excluded
    pub with_flux: IndexSet<String>,
    /// Reactions of `with_flux` whose flux lies outside `[-threshold, threshold]`
    pub with_greater_flux: IndexSet<String>,
}

/// Split the reactions of a flux mapping into those with flux and those with more flux
/// than `threshold`
///
/// Excluded ids never appear in either set. Both comparisons are strict, a flux of exactly
/// `threshold` has flux but not greater flux.
///
/// # Examples
/// ```rust
/// use indexmap::IndexMap;
/// use fluxmap_core::analysis::filter_fluxes;
/// let fluxes: IndexMap<String, f64> =
///     [("R1", 0.), ("R2", 0.00005), ("R3", 5.), ("R4", -10.)]
///         .iter()
///         .map(|(id, v)| (id.to_string(), *v))
///         .collect();
/// let sets = filter_fluxes::<&str>(&fluxes, &[], 0.0001);
/// assert_eq!(sets.with_flux.len(), 3);
/// assert!(sets.with_greater_flux.contains("R3"));
/// assert!(!sets.with_greater_flux.contains("R2"));
/// ```
pub fn filter_fluxes<S: AsRef<str>>(
    fluxes: &IndexMap<String, f64>,
    excluded: &[S],
    threshold: f64,
) -> FluxSets {
    let mut sets = FluxSets::default();
    for (id, flux) in fluxes {
        if *flux == 0. || excluded.iter().any(|e| e.as_ref() == id.as_str()) {
            continue;
        }
        sets.with_flux.insert(id.clone());
        if *flux < -threshold || *flux > threshold {
            sets.with_greater_flux.insert(id.clone());
        }
    }
    sets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flux_map(values: &[(&str, f64)]) -> IndexMap<String, f64> {
        values.iter().map(|(id, v)| (id.to_string(), *v)).collect()
    }

    fn ids(set: &IndexSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn partition() {
        let fluxes = flux_map(&[("R1", 0.), ("R2", 0.00005), ("R3", 5.0), ("R4", -10.0)]);
        let sets = filter_fluxes::<&str>(&fluxes, &[], 0.0001);
        assert_eq!(ids(&sets.with_flux), vec!["R2", "R3", "R4"]);
        assert_eq!(ids(&sets.with_greater_flux), vec!["R3", "R4"]);
    }

    #[test]
    fn threshold_is_strict() {
        let fluxes = flux_map(&[
            ("at", 0.0001),
            ("neg_at", -0.0001),
            ("above", 0.0002),
            ("neg_above", -0.0002),
        ]);
        let sets = filter_fluxes::<&str>(&fluxes, &[], 0.0001);
        assert_eq!(sets.with_flux.len(), 4);
        assert_eq!(ids(&sets.with_greater_flux), vec!["above", "neg_above"]);
    }

    #[test]
    fn exclusions() {
        let fluxes = flux_map(&[("biomass", 0.8), ("PFK", 7.0), ("DNA", 0.)]);
        let sets = filter_fluxes(&fluxes, &["biomass", "DNA"], 0.0001);
        assert_eq!(ids(&sets.with_flux), vec!["PFK"]);
        assert_eq!(ids(&sets.with_greater_flux), vec!["PFK"]);
    }

    #[test]
    fn empty_mapping() {
        let sets = filter_fluxes::<String>(&IndexMap::new(), &[], 0.0001);
        assert!(sets.with_flux.is_empty());
        assert!(sets.with_greater_flux.is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn greater_flux_is_a_subset(
            values in prop::collection::vec(prop_oneof![Just(0.0_f64), -20.0_f64..20.0], 0..40),
            threshold in 0.0_f64..5.0,
            excluded_every in 1usize..6,
        ) {
            let fluxes: IndexMap<String, f64> = values
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("R{}", i), *v))
                .collect();
            let excluded: Vec<String> = (0..values.len())
                .filter(|i| i % excluded_every == 0)
                .map(|i| format!("R{}", i))
                .collect();
            let sets = filter_fluxes(&fluxes, &excluded, threshold);

            for id in &sets.with_greater_flux {
                prop_assert!(sets.with_flux.contains(id));
            }
            for id in &sets.with_flux {
                prop_assert!(fluxes[id] != 0.0);
                prop_assert!(!excluded.contains(id));
            }
            for (id, flux) in &fluxes {
                if *flux == 0.0 {
                    prop_assert!(!sets.with_flux.contains(id));
                }
            }
        }
    }
}
