//! Implements a solver interface for the microlp simplex solver
//!
//! Simplex ends on a vertex of the feasible region, so reactions which are free at the
//! optimum (loops, alternative routes) are left at a bound instead of sharing the flux.
use indexmap::IndexMap;
use microlp::{ComparisonOp, LinearExpr, OptimizationDirection, Variable};
use tracing::debug;

use crate::optimize::constraint::{Constraint, ConstraintTerm};
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

#[derive(Clone, Debug, Default)]
pub struct MicrolpSolver;

impl MicrolpSolver {
    /// Linear expression of the terms, with repeated variables merged
    fn expression(
        problem: &Problem,
        columns: &[Variable],
        constraint_id: &str,
        terms: &[ConstraintTerm],
    ) -> Result<LinearExpr, SolverError> {
        let mut merged: IndexMap<usize, f64> = IndexMap::new();
        for term in terms {
            let col = problem
                .variables()
                .get_index_of(&term.variable)
                .ok_or_else(|| SolverError::UnknownConstraintVariable {
                    constraint: constraint_id.to_string(),
                    variable: term.variable.clone(),
                })?;
            *merged.entry(col).or_insert(0.) += term.coefficient;
        }
        let mut expr = LinearExpr::empty();
        for (col, coefficient) in merged {
            expr.add(columns[col], coefficient);
        }
        Ok(expr)
    }
}

impl Solver for MicrolpSolver {
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let direction = match problem.objective().sense() {
            ObjectiveSense::Maximize => OptimizationDirection::Maximize,
            ObjectiveSense::Minimize => OptimizationDirection::Minimize,
        };
        let mut costs = vec![0f64; problem.num_variables()];
        for term in problem.objective().terms() {
            match problem.variables().get_index_of(&term.variable) {
                Some(col) => costs[col] += term.coefficient,
                None => return Err(SolverError::UnknownObjectiveVariable(term.variable.clone())),
            }
        }

        let mut lp = microlp::Problem::new(direction);
        let columns: Vec<Variable> = problem
            .variables()
            .values()
            .zip(&costs)
            .map(|(variable, cost)| lp.add_var(*cost, (variable.lower_bound, variable.upper_bound)))
            .collect();

        for (id, constraint) in problem.constraints() {
            match constraint {
                Constraint::Equality { terms, equals, .. } => {
                    let expr = Self::expression(problem, &columns, id, terms)?;
                    lp.add_constraint(expr, ComparisonOp::Eq, *equals);
                }
                Constraint::Inequality {
                    terms,
                    lower_bound,
                    upper_bound,
                    ..
                } => {
                    if upper_bound.is_finite() {
                        let expr = Self::expression(problem, &columns, id, terms)?;
                        lp.add_constraint(expr, ComparisonOp::Le, *upper_bound);
                    }
                    if lower_bound.is_finite() {
                        let expr = Self::expression(problem, &columns, id, terms)?;
                        lp.add_constraint(expr, ComparisonOp::Ge, *lower_bound);
                    }
                }
            }
        }
        debug!(
            variables = columns.len(),
            constraints = problem.num_constraints(),
            "solving with microlp"
        );

        let solution = match lp.solve() {
            Ok(solution) => solution,
            Err(microlp::Error::Infeasible) => {
                return Ok(ProblemSolution::unsolved(OptimizationStatus::Infeasible))
            }
            Err(microlp::Error::Unbounded) => {
                return Ok(ProblemSolution::unsolved(OptimizationStatus::Unbounded))
            }
            #[allow(unreachable_patterns)]
            Err(err) => {
                debug!(error = %err, "microlp failed");
                return Ok(ProblemSolution::unsolved(OptimizationStatus::NumericalError));
            }
        };

        let variable_values: IndexMap<String, f64> = problem
            .variables()
            .keys()
            .zip(&columns)
            .map(|(id, column)| (id.clone(), solution[*column]))
            .collect();
        let objective_value = problem
            .objective()
            .evaluate(|id| variable_values.get(id).copied());
        Ok(ProblemSolution {
            status: OptimizationStatus::Optimal,
            objective_value: Some(objective_value),
            variable_values: Some(variable_values),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_lp() {
        // maximize x + 2y subject to x + y <= 4, 0 <= x <= 3, 0 <= y <= 3
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", None, 0., 3.).unwrap();
        problem.add_new_variable("y", None, 0., 3.).unwrap();
        problem
            .add_new_inequality_constraint("cap", &["x", "y"], &[1., 1.], f64::NEG_INFINITY, 4.)
            .unwrap();
        problem.add_new_linear_objective_term("x", 1.).unwrap();
        problem.add_new_linear_objective_term("y", 2.).unwrap();

        let solution = problem.optimize(&MicrolpSolver).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Optimal);
        let values = solution.variable_values.unwrap();
        assert!((values["x"] - 1.).abs() < 1e-9);
        assert!((values["y"] - 3.).abs() < 1e-9);
        assert!((solution.objective_value.unwrap() - 7.).abs() < 1e-9);
    }

    #[test]
    fn free_variables_stay_at_a_bound() {
        // maximize x with x = y + z, any split of x between y and z is optimal
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", None, 0., 10.).unwrap();
        problem.add_new_variable("y", None, 0., 100.).unwrap();
        problem.add_new_variable("z", None, 0., 100.).unwrap();
        problem
            .add_new_equality_constraint("split", &["x", "y", "z"], &[1., -1., -1.], 0.)
            .unwrap();
        problem.add_new_linear_objective_term("x", 1.).unwrap();

        let values = problem
            .optimize(&MicrolpSolver)
            .unwrap()
            .variable_values
            .unwrap();
        assert!((values["x"] - 10.).abs() < 1e-9);
        let (y, z) = (values["y"], values["z"]);
        assert!((y + z - 10.).abs() < 1e-9);
        assert!(y.abs() < 1e-9 || z.abs() < 1e-9, "flux split as {} and {}", y, z);
    }

    #[test]
    fn infeasible() {
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", None, 1., 5.).unwrap();
        problem
            .add_new_equality_constraint("zero", &["x"], &[1.], 0.)
            .unwrap();
        problem.add_new_linear_objective_term("x", 1.).unwrap();

        let solution = problem.optimize(&MicrolpSolver).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Infeasible);
        assert!(solution.variable_values.is_none());
    }
}
