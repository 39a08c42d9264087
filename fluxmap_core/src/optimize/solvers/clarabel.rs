//! Implements a solver interface for Clarabel
//!
//! Clarabel solves `min 1/2 x'Px + q'x` subject to `Ax + s = b` with `s` in a product of
//! cones. Equalities (including fixed variables) go in a zero cone, every finite side of an
//! inequality or variable bound becomes one row of a nonnegative cone.
use clarabel::algebra::*;
use clarabel::solver::*;
use indexmap::IndexMap;
use nalgebra_sparse::CooMatrix;
use tracing::debug;

use crate::optimize::constraint::{Constraint, ConstraintTerm};
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

#[derive(Clone, Debug, Default)]
pub struct ClarabelSolver {
    /// Print Clarabel's iteration log
    pub verbose: bool,
}

/// Sparse rows of one cone block, with their right hand sides
#[derive(Default)]
struct RowBlock {
    rows: Vec<Vec<(usize, f64)>>,
    rhs: Vec<f64>,
}

impl RowBlock {
    fn push(&mut self, row: Vec<(usize, f64)>, rhs: f64) {
        self.rows.push(row);
        self.rhs.push(rhs);
    }
}

impl ClarabelSolver {
    fn term_row(
        problem: &Problem,
        constraint_id: &str,
        terms: &[ConstraintTerm],
        sign: f64,
    ) -> Result<Vec<(usize, f64)>, SolverError> {
        terms
            .iter()
            .map(|t| match problem.variables().get_index_of(&t.variable) {
                Some(col) => Ok((col, sign * t.coefficient)),
                None => Err(SolverError::UnknownConstraintVariable {
                    constraint: constraint_id.to_string(),
                    variable: t.variable.clone(),
                }),
            })
            .collect()
    }

    /// Stack the two row blocks into Clarabel's compressed sparse column format
    fn assemble(equalities: &RowBlock, inequalities: &RowBlock, n: usize) -> CscMatrix<f64> {
        let m = equalities.rows.len() + inequalities.rows.len();
        let mut coo = CooMatrix::new(m, n);
        let all_rows = equalities.rows.iter().chain(inequalities.rows.iter());
        for (row_idx, row) in all_rows.enumerate() {
            for &(col, value) in row {
                coo.push(row_idx, col, value);
            }
        }
        let csc = nalgebra_sparse::CscMatrix::from(&coo);
        CscMatrix::new(
            m,
            n,
            csc.col_offsets().to_vec(),
            csc.row_indices().to_vec(),
            csc.values().to_vec(),
        )
    }

    fn map_status(status: SolverStatus) -> OptimizationStatus {
        match status {
            SolverStatus::Solved => OptimizationStatus::Optimal,
            SolverStatus::AlmostSolved => OptimizationStatus::AlmostOptimal,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                OptimizationStatus::Infeasible
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                OptimizationStatus::Unbounded
            }
            SolverStatus::NumericalError => OptimizationStatus::NumericalError,
            SolverStatus::Unsolved => OptimizationStatus::Unoptimized,
            _ => OptimizationStatus::SolverHalted,
        }
    }
}

impl Solver for ClarabelSolver {
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let n = problem.num_variables();
        let mut equalities = RowBlock::default();
        let mut inequalities = RowBlock::default();

        for (id, constraint) in problem.constraints() {
            match constraint {
                Constraint::Equality { terms, equals, .. } => {
                    let row = Self::term_row(problem, id, terms, 1.)?;
                    equalities.push(row, *equals);
                }
                Constraint::Inequality {
                    terms,
                    lower_bound,
                    upper_bound,
                    ..
                } => {
                    if upper_bound.is_finite() {
                        let row = Self::term_row(problem, id, terms, 1.)?;
                        inequalities.push(row, *upper_bound);
                    }
                    if lower_bound.is_finite() {
                        let row = Self::term_row(problem, id, terms, -1.)?;
                        inequalities.push(row, -*lower_bound);
                    }
                }
            }
        }

        for (col, variable) in problem.variables().values().enumerate() {
            if variable.is_fixed() {
                equalities.push(vec![(col, 1.)], variable.lower_bound);
                continue;
            }
            if variable.upper_bound.is_finite() {
                inequalities.push(vec![(col, 1.)], variable.upper_bound);
            }
            if variable.lower_bound.is_finite() {
                inequalities.push(vec![(col, -1.)], -variable.lower_bound);
            }
        }

        // Clarabel minimizes, so a maximization objective is negated
        let sign = match problem.objective().sense() {
            ObjectiveSense::Maximize => -1.,
            ObjectiveSense::Minimize => 1.,
        };
        let mut q = vec![0f64; n];
        for term in problem.objective().terms() {
            match problem.variables().get_index_of(&term.variable) {
                Some(col) => q[col] += sign * term.coefficient,
                None => return Err(SolverError::UnknownObjectiveVariable(term.variable.clone())),
            }
        }

        let p: CscMatrix<f64> = CscMatrix::new(n, n, vec![0; n + 1], vec![], vec![]);
        let a = Self::assemble(&equalities, &inequalities, n);
        let b: Vec<f64> = equalities
            .rhs
            .iter()
            .chain(inequalities.rhs.iter())
            .copied()
            .collect();
        let mut cones = Vec::new();
        if !equalities.rows.is_empty() {
            cones.push(ZeroConeT(equalities.rows.len()));
        }
        if !inequalities.rows.is_empty() {
            cones.push(NonnegativeConeT(inequalities.rows.len()));
        }
        debug!(
            variables = n,
            equalities = equalities.rows.len(),
            inequalities = inequalities.rows.len(),
            "solving with clarabel"
        );

        let settings: DefaultSettings<f64> = DefaultSettings {
            verbose: self.verbose,
            ..DefaultSettings::default()
        };
        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
        solver.solve();

        let status = Self::map_status(solver.solution.status);
        if !status.has_values() {
            return Ok(ProblemSolution::unsolved(status));
        }

        let x = &solver.solution.x;
        let variable_values: IndexMap<String, f64> = problem
            .variables()
            .keys()
            .cloned()
            .zip(x.iter().copied())
            .collect();
        let objective_value = problem
            .objective()
            .evaluate(|id| variable_values.get(id).copied());

        Ok(ProblemSolution {
            status,
            objective_value: Some(objective_value),
            variable_values: Some(variable_values),
        })
    }
}
