//! Interfaces to the numerical solvers used for optimization problems
pub mod clarabel;
#[cfg(feature = "minilp")]
pub mod microlp;

use thiserror::Error;

use crate::configuration;
use crate::optimize::problem::Problem;
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// A backend able to solve a [`Problem`]
pub trait Solver {
    /// Solve the problem, the returned solution carries the final status
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError>;
}

/// The solver selected by the global configuration
pub fn configured_solver() -> Box<dyn Solver> {
    match configuration::current().solver {
        configuration::Solver::Clarabel => Box::new(clarabel::ClarabelSolver::default()),
        #[cfg(feature = "minilp")]
        configuration::Solver::Microlp => Box::new(microlp::MicrolpSolver),
    }
}

#[derive(Error, Debug, Clone)]
pub enum SolverError {
    #[error("Objective refers to unknown variable {0}")]
    UnknownObjectiveVariable(String),
    #[error("Constraint {constraint} refers to unknown variable {variable}")]
    UnknownConstraintVariable {
        constraint: String,
        variable: String,
    },
    #[error("Optimization finished with status: {0}")]
    NotOptimal(OptimizationStatus),
}
