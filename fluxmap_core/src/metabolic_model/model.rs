//! This module provides the Model struct for representing an entire metabolic model
use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::configuration;
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::Reaction;
use crate::optimize::problem::{Problem, ProblemError};
use crate::optimize::solvers::{configured_solver, Solver, SolverError};
use crate::optimize::OptimizationStatus;

/// Represents a Genome Scale Metabolic Model
#[derive(Clone, Debug)]
pub struct Model {
    /// Map of reaction ids to Reaction Objects
    pub reactions: IndexMap<String, Reaction>,
    /// Map of gene ids to Gene Objects
    pub genes: IndexMap<String, Gene>,
    /// Map of metabolite ids to Metabolite Objects
    pub metabolites: IndexMap<String, Metabolite>,
    /// Map of reaction ids to objective function coefficients
    pub objective: IndexMap<String, f64>,
    /// Id associated with the Model
    pub id: Option<String>,
    /// Compartments in the model
    ///
    /// An IndexMap<String, String> of {short name: long name}
    pub compartments: Option<IndexMap<String, String>>,
    /// A version identifier for the Model, stored as a string
    pub version: Option<String>,
}

/// Result of a flux balance analysis
#[derive(Clone, Debug)]
pub struct FluxSolution {
    /// Status reported by the solver
    pub status: OptimizationStatus,
    /// Value of the objective at the optimum
    pub objective_value: f64,
    /// Net flux of every reaction, keyed by reaction id in model order
    pub fluxes: IndexMap<String, f64>,
}

impl Model {
    pub fn new_empty() -> Self {
        Model {
            reactions: IndexMap::new(),
            genes: IndexMap::new(),
            metabolites: IndexMap::new(),
            objective: IndexMap::new(),
            id: None,
            compartments: None,
            version: None,
        }
    }

    /// Add a reaction to the model
    ///
    /// # Examples
    /// ```rust
    /// use fluxmap_core::metabolic_model::model::Model;
    /// use fluxmap_core::metabolic_model::reaction::ReactionBuilder;
    /// let mut model = Model::new_empty();
    /// let new_reaction = ReactionBuilder::default().id("new_reaction".to_string()).build().unwrap();
    /// model.add_reaction(new_reaction);
    /// assert!(model.reaction("new_reaction").is_ok());
    /// ```
    pub fn add_reaction(&mut self, reaction: Reaction) {
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
    }

    /// Add a metabolite to the model
    pub fn add_metabolite(&mut self, metabolite: Metabolite) {
        let id = metabolite.id.clone();
        self.metabolites.insert(id, metabolite);
    }

    /// Add a gene to the model
    pub fn add_gene(&mut self, gene: Gene) {
        let id = gene.id.clone();
        self.genes.insert(id, gene);
    }

    /// Look up a reaction by id
    pub fn reaction(&self, id: &str) -> Result<&Reaction, ModelError> {
        self.reactions
            .get(id)
            .ok_or_else(|| ModelError::UnknownReaction(id.to_string()))
    }

    fn reaction_mut(&mut self, id: &str) -> Result<&mut Reaction, ModelError> {
        self.reactions
            .get_mut(id)
            .ok_or_else(|| ModelError::UnknownReaction(id.to_string()))
    }

    /// Make `reaction_id` the only term of the objective, with coefficient 1
    pub fn set_objective(&mut self, reaction_id: &str) -> Result<(), ModelError> {
        self.reaction(reaction_id)?;
        self.objective.clear();
        self.objective.insert(reaction_id.to_string(), 1.);
        Ok(())
    }

    /// Change both flux bounds of a reaction
    pub fn set_bounds(
        &mut self,
        reaction_id: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ModelError> {
        if lower_bound > upper_bound {
            return Err(ModelError::InvalidBounds {
                reaction: reaction_id.to_string(),
                lower_bound,
                upper_bound,
            });
        }
        let reaction = self.reaction_mut(reaction_id)?;
        reaction.lower_bound = lower_bound;
        reaction.upper_bound = upper_bound;
        Ok(())
    }

    /// Change the upper flux bound of a reaction
    pub fn set_upper_bound(&mut self, reaction_id: &str, upper_bound: f64) -> Result<(), ModelError> {
        let lower_bound = self.reaction(reaction_id)?.lower_bound;
        self.set_bounds(reaction_id, lower_bound, upper_bound)
    }

    /// Build the flux balance problem of the model
    ///
    /// Each reaction is split into a forward and a reverse variable, both non-negative,
    /// and each metabolite contributes a steady state mass balance constraint.
    pub fn build_problem(&self) -> Result<Problem, ModelError> {
        let mut problem = Problem::new_maximization();
        for reaction in self.reactions.values() {
            problem.add_new_variable(
                &reaction.get_forward_id(),
                None,
                reaction.get_forward_lower_bound(),
                reaction.get_forward_upper_bound(),
            )?;
            problem.add_new_variable(
                &reaction.get_reverse_id(),
                None,
                reaction.get_reverse_lower_bound(),
                reaction.get_reverse_upper_bound(),
            )?;
        }

        // Gather the stoichiometry by metabolite, including metabolites only named in reactions
        let mut balances: IndexMap<&str, (Vec<String>, Vec<f64>)> = IndexMap::new();
        for metabolite in self.metabolites.keys() {
            balances.insert(metabolite.as_str(), (Vec::new(), Vec::new()));
        }
        for reaction in self.reactions.values() {
            let forward = reaction.get_forward_id();
            let reverse = reaction.get_reverse_id();
            for (metabolite, coef) in &reaction.metabolites {
                let (variables, coefficients) = balances.entry(metabolite.as_str()).or_default();
                variables.push(forward.clone());
                coefficients.push(*coef);
                variables.push(reverse.clone());
                coefficients.push(-*coef);
            }
        }
        for (metabolite, (variables, coefficients)) in &balances {
            if variables.is_empty() {
                continue;
            }
            let variables: Vec<&str> = variables.iter().map(String::as_str).collect();
            problem.add_new_equality_constraint(metabolite, &variables, coefficients, 0.)?;
        }

        for (reaction_id, coef) in &self.objective {
            let reaction = self.reaction(reaction_id)?;
            problem.add_new_linear_objective_term(&reaction.get_forward_id(), *coef)?;
            problem.add_new_linear_objective_term(&reaction.get_reverse_id(), -*coef)?;
        }
        Ok(problem)
    }

    /// Run flux balance analysis with the configured solver
    pub fn optimize(&self) -> Result<FluxSolution, ModelError> {
        let solver = configured_solver();
        self.optimize_with(solver.as_ref())
    }

    /// Run flux balance analysis with the given solver
    ///
    /// Net fluxes whose magnitude is below the configured tolerance are reported as zero.
    pub fn optimize_with<S: Solver + ?Sized>(
        &self,
        solver: &S,
    ) -> Result<FluxSolution, ModelError> {
        let mut problem = self.build_problem()?;
        let solution = problem.optimize(solver)?;
        let values = match solution.variable_values {
            Some(values) if solution.status.has_values() => values,
            _ => return Err(SolverError::NotOptimal(solution.status).into()),
        };
        if solution.status != OptimizationStatus::Optimal {
            warn!(status = %solution.status, "using a non-optimal flux solution");
        }

        let tolerance = configuration::current().tolerance;
        let fluxes: IndexMap<String, f64> = self
            .reactions
            .values()
            .map(|reaction| {
                let forward = values.get(&reaction.get_forward_id()).copied().unwrap_or(0.);
                let reverse = values.get(&reaction.get_reverse_id()).copied().unwrap_or(0.);
                let net = forward - reverse;
                let net = if net.abs() < tolerance { 0. } else { net };
                (reaction.id.clone(), net)
            })
            .collect();
        let objective_value = self
            .objective
            .iter()
            .map(|(id, coef)| coef * fluxes.get(id).copied().unwrap_or(0.))
            .sum();
        debug!(
            reactions = fluxes.len(),
            active = fluxes.values().filter(|v| **v != 0.).count(),
            "flux balance analysis finished"
        );
        Ok(FluxSolution {
            status: solution.status,
            objective_value,
            fluxes,
        })
    }
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Reaction {0} is not in the model")]
    UnknownReaction(String),
    #[error("Invalid bounds for {reaction}: lower bound {lower_bound} > upper bound {upper_bound}")]
    InvalidBounds {
        reaction: String,
        lower_bound: f64,
        upper_bound: f64,
    },
    #[error("Unable to build the optimization problem")]
    Problem(#[from] ProblemError),
    #[error("Unable to optimize the model")]
    Solver(#[from] SolverError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::reaction::ReactionBuilder;

    fn reaction(id: &str, stoichiometry: &[(&str, f64)], lb: f64, ub: f64) -> Reaction {
        ReactionBuilder::default()
            .id(id.to_string())
            .metabolites(
                stoichiometry
                    .iter()
                    .map(|(m, c)| (m.to_string(), *c))
                    .collect(),
            )
            .lower_bound(lb)
            .upper_bound(ub)
            .build()
            .unwrap()
    }

    /// A -> B -> C chain with an uptake limited to 10
    fn chain_model() -> Model {
        let mut model = Model::new_empty();
        model.add_reaction(reaction("EX_a", &[("a", -1.)], -10., 1000.));
        model.add_reaction(reaction("R1", &[("a", -1.), ("b", 1.)], 0., 1000.));
        model.add_reaction(reaction("R2", &[("b", -1.), ("c", 1.)], -1000., 1000.));
        model.add_reaction(reaction("EX_c", &[("c", -1.)], 0., 1000.));
        model.add_reaction(reaction("UNUSED", &[("d", -1.), ("e", 1.)], 0., 1000.));
        model
    }

    #[test]
    fn objective_and_bounds() {
        let mut model = chain_model();
        model.set_objective("EX_c").unwrap();
        assert_eq!(model.objective.len(), 1);
        assert!(matches!(
            model.set_objective("missing"),
            Err(ModelError::UnknownReaction(_))
        ));

        model.set_upper_bound("R1", 5.).unwrap();
        assert!((model.reactions["R1"].upper_bound - 5.).abs() < 1e-25);
        assert!(matches!(
            model.set_bounds("R1", 6., 5.),
            Err(ModelError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn problem_structure() {
        let mut model = chain_model();
        model.set_objective("EX_c").unwrap();
        let problem = model.build_problem().unwrap();
        // Two variables per reaction, one mass balance per metabolite
        assert_eq!(problem.num_variables(), 10);
        assert_eq!(problem.num_constraints(), 5);
        assert_eq!(problem.objective().terms().len(), 2);
    }

    #[test]
    fn flux_balance() {
        let mut model = chain_model();
        model.set_objective("EX_c").unwrap();
        let solution = model.optimize().unwrap();
        assert!(solution.status.has_values());
        assert!((solution.objective_value - 10.).abs() < 1e-4);
        assert!((solution.fluxes["EX_a"] + 10.).abs() < 1e-4);
        assert!((solution.fluxes["R1"] - 10.).abs() < 1e-4);
        assert!((solution.fluxes["R2"] - 10.).abs() < 1e-4);
        assert!(solution.fluxes["UNUSED"].abs() < 1e-6);
    }

    #[test]
    fn tightened_objective_bound() {
        let mut model = chain_model();
        model.set_objective("EX_c").unwrap();
        model.set_upper_bound("EX_c", 4.).unwrap();
        let solution = model.optimize().unwrap();
        assert!((solution.fluxes["EX_c"] - 4.).abs() < 1e-4);
    }

    #[test]
    fn infeasible_model() {
        let mut model = Model::new_empty();
        model.add_reaction(reaction("SINK", &[("a", -1.)], 1., 1000.));
        model.set_objective("SINK").unwrap();
        match model.optimize() {
            Err(ModelError::Solver(SolverError::NotOptimal(status))) => {
                assert_eq!(status, OptimizationStatus::Infeasible)
            }
            other => panic!("Infeasible model not reported: {:?}", other.map(|s| s.status)),
        }
    }

    /// Uptake of a feeding two parallel routes to b, with a loop through d
    fn branched_model() -> Model {
        let mut model = Model::new_empty();
        model.add_reaction(reaction("EX_a", &[("a", -1.)], -10., 1000.));
        model.add_reaction(reaction("R1", &[("a", -1.), ("b", 1.)], 0., 1000.));
        model.add_reaction(reaction("ALT", &[("a", -1.), ("b", 1.)], 0., 1000.));
        model.add_reaction(reaction("EX_b", &[("b", -1.)], 0., 1000.));
        model.add_reaction(reaction("CYC1", &[("b", -1.), ("d", 1.)], 0., 1000.));
        model.add_reaction(reaction("CYC2", &[("d", -1.), ("b", 1.)], 0., 1000.));
        model
    }

    #[cfg(feature = "minilp")]
    #[test]
    fn loops_and_parallel_routes_carry_no_extra_flux() {
        use crate::analysis::filter_fluxes;
        use crate::optimize::solvers::microlp::MicrolpSolver;

        let mut model = branched_model();
        model.set_objective("EX_b").unwrap();
        let solution = model.optimize_with(&MicrolpSolver).unwrap();
        assert!((solution.objective_value - 10.).abs() < 1e-9);
        assert_eq!(solution.fluxes["CYC1"], 0.);
        assert_eq!(solution.fluxes["CYC2"], 0.);
        let (r1, alt) = (solution.fluxes["R1"], solution.fluxes["ALT"]);
        assert!(
            (r1 == 0. && (alt - 10.).abs() < 1e-9) || (alt == 0. && (r1 - 10.).abs() < 1e-9),
            "flux split as R1 {} and ALT {}",
            r1,
            alt
        );

        let sets = filter_fluxes(&solution.fluxes, &[] as &[&str], 0.0001);
        assert_eq!(sets.with_flux.len(), 3);
        assert!(sets.with_flux.contains("EX_a"));
        assert!(sets.with_flux.contains("EX_b"));
        assert_eq!(sets.with_greater_flux, sets.with_flux);

        // The default solver behaves the same
        let default_solution = model.optimize().unwrap();
        assert_eq!(default_solution.fluxes["CYC1"], 0.);
    }
}
