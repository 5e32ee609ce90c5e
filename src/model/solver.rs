// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Translation of a [`Model`] into a `good_lp` problem, and extraction of the
//! solution.

use std::collections::HashMap;

use good_lp::{
    constraint, solvers::minilp::minilp, variable, Expression, ProblemVariables,
    ResolutionError, Solution as _, SolverModel, Variable as LpVariable,
};

use super::{LinExpr, Model, Relation, Variable};
use crate::Error;

/// The termination status of a solver run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    Error,
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::Infeasible => write!(f, "infeasible"),
            SolveStatus::Unbounded => write!(f, "unbounded"),
            SolveStatus::Error => write!(f, "error"),
        }
    }
}

/// The LP backend used to solve a [`Model`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SolverChoice {
    /// The pure Rust simplex solver bundled with `good_lp`.
    #[default]
    Minilp,
}

impl std::str::FromStr for SolverChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minilp" | "default" => Ok(SolverChoice::Minilp),
            other => Err(Error::invalid_config(format!(
                "unknown solver '{other}', available solvers: minilp"
            ))),
        }
    }
}

impl std::fmt::Display for SolverChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverChoice::Minilp => write!(f, "minilp"),
        }
    }
}

/// The optimal values of all variables of a solved [`Model`].
#[derive(Clone, Debug)]
pub struct Solution {
    status: SolveStatus,
    objective_value: f64,
    values: Vec<f64>,
    scalars: HashMap<String, f64>,
    series: HashMap<String, Vec<f64>>,
}

impl Solution {
    pub fn status(&self) -> SolveStatus {
        self.status
    }

    pub fn objective_value(&self) -> f64 {
        self.objective_value
    }

    /// Returns the value of every column, indexed by [`Var::index`][super::Var::index].
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the value of the scalar variable with the given name.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.scalars.get(name).copied()
    }

    /// Returns the values of the time indexed variable with the given name.
    pub fn series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(Vec::as_slice)
    }

    /// Evaluates an expression over the model's columns.
    pub fn eval(&self, expr: &LinExpr) -> f64 {
        expr.evaluate(&self.values)
    }
}

impl Model {
    /// Solves the model, minimising its objective.
    ///
    /// Returns an error of kind `SolveFailed` if the solver does not reach an
    /// optimal solution.
    pub fn solve(&self, solver: SolverChoice) -> Result<Solution, Error> {
        tracing::info!(
            "Solving model with {} columns and {} constraints using {}.",
            self.columns.len(),
            self.constraints.len(),
            solver
        );
        match solver {
            SolverChoice::Minilp => self.solve_minilp(),
        }
    }

    fn solve_minilp(&self) -> Result<Solution, Error> {
        let mut problem = ProblemVariables::new();
        let columns = self
            .columns
            .iter()
            .map(|column| match column.lower {
                Some(lower) => problem.add(variable().min(lower)),
                None => problem.add(variable()),
            })
            .collect::<Vec<_>>();

        let to_lp = |expr: &LinExpr| -> Expression {
            expr.terms().fold(
                Expression::from(expr.constant_value()),
                |acc, (var, coeff)| acc + coeff * columns[var.index()],
            )
        };

        let mut lp = problem.minimise(to_lp(&self.objective)).using(minilp);
        for c in &self.constraints {
            let lhs = to_lp(&c.expr);
            let rhs = c.rhs;
            lp = match c.relation {
                Relation::Eq => lp.with(constraint!(lhs == rhs)),
                Relation::Le => lp.with(constraint!(lhs <= rhs)),
                Relation::Ge => lp.with(constraint!(lhs >= rhs)),
            };
        }

        let lp_solution = lp.solve().map_err(|err: ResolutionError| {
            let status = match err {
                ResolutionError::Infeasible => SolveStatus::Infeasible,
                ResolutionError::Unbounded => SolveStatus::Unbounded,
                _ => SolveStatus::Error,
            };
            tracing::warn!("Solver terminated without optimal solution: {err}");
            Error::solve_failed_with(status, format!("Solver terminated with status {status}: {err}"))
        })?;

        let values = columns
            .iter()
            .map(|column: &LpVariable| lp_solution.value(*column))
            .collect::<Vec<_>>();
        if let Some(column) = values.iter().position(|v| !v.is_finite()) {
            tracing::warn!("Solver returned a non-finite value for column {column}.");
            return Err(Error::solve_failed_with(
                SolveStatus::Unbounded,
                format!(
                    "Solver terminated with status {}: column {column} has no finite value.",
                    SolveStatus::Unbounded
                ),
            ));
        }
        self.collect_solution(values)
    }

    fn collect_solution(&self, values: Vec<f64>) -> Result<Solution, Error> {
        let mut scalars = HashMap::new();
        let mut series = HashMap::new();
        for (name, variable) in &self.variables {
            match variable {
                Variable::Scalar(var) => {
                    scalars.insert(name.clone(), values[var.index()]);
                }
                Variable::Series(vars) => {
                    series.insert(
                        name.clone(),
                        vars.iter().map(|var| values[var.index()]).collect(),
                    );
                }
            }
        }
        let objective_value = self.objective.evaluate(&values);
        if !objective_value.is_finite() {
            tracing::warn!("Objective value is not finite: {objective_value}.");
            return Err(Error::solve_failed_with(
                SolveStatus::Unbounded,
                format!(
                    "Solver terminated with status {}: objective value {objective_value} is not finite.",
                    SolveStatus::Unbounded
                ),
            ));
        }
        tracing::info!("Optimal solution found, objective value: {objective_value}.");

        Ok(Solution {
            status: SolveStatus::Optimal,
            objective_value,
            values,
            scalars,
            series,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_choice() {
        assert_eq!("minilp".parse::<SolverChoice>(), Ok(SolverChoice::Minilp));
        assert_eq!("default".parse::<SolverChoice>(), Ok(SolverChoice::Minilp));
        assert_eq!(SolverChoice::default().to_string(), "minilp");
        assert!("gurobi".parse::<SolverChoice>().is_err_and(|e| e
            == Error::invalid_config("unknown solver 'gurobi', available solvers: minilp")));
    }

    #[test]
    fn test_solve_sizing() {
        // A generator with a capacity factor of 0.5 has to serve a demand of 5
        // in every time step.
        let mut model = Model::new();
        let size = model.add_variable("size_wind", Some(0.0)).unwrap();
        let flow = model
            .add_series_variable("flow_wind_demand", Some(0.0), 4)
            .unwrap();
        for (t, f) in flow.iter().enumerate() {
            model
                .add_constraint(
                    format!("inout_flow_balance_wind[{t}]"),
                    LinExpr::from(*f) - size * 0.5,
                    Relation::Eq,
                    0.0,
                )
                .unwrap();
            model
                .add_constraint(
                    format!("inout_flow_balance_demand[{t}]"),
                    LinExpr::from(*f),
                    Relation::Eq,
                    5.0,
                )
                .unwrap();
        }
        model.set_objective(size * 2.0);

        let solution = model.solve(SolverChoice::Minilp).unwrap();
        assert_eq!(solution.status(), SolveStatus::Optimal);
        assert!((solution.value("size_wind").unwrap() - 10.0).abs() < 1e-6);
        assert!((solution.objective_value() - 20.0).abs() < 1e-6);
        let flows = solution.series("flow_wind_demand").unwrap();
        assert_eq!(flows.len(), 4);
        assert!(flows.iter().all(|f| (f - 5.0).abs() < 1e-6));
        assert!((solution.eval(&(LinExpr::from(flow[0]) + flow[1] * 1.0)) - 10.0).abs() < 1e-6);
        assert!(solution.value("flow_wind_demand").is_none());
    }

    #[test]
    fn test_solve_infeasible() {
        let mut model = Model::new();
        let x = model.add_variable("x", Some(0.0)).unwrap();
        model
            .add_constraint("upper", LinExpr::from(x), Relation::Le, 1.0)
            .unwrap();
        model
            .add_constraint("lower", LinExpr::from(x), Relation::Ge, 2.0)
            .unwrap();
        model.set_objective(LinExpr::from(x));

        let err = model.solve(SolverChoice::Minilp).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::SolveFailed);
        assert_eq!(err.status(), Some(SolveStatus::Infeasible));
    }

    #[test]
    fn test_solve_unbounded() {
        let mut model = Model::new();
        let x = model.add_variable("x", None).unwrap();
        model
            .add_constraint("upper", LinExpr::from(x), Relation::Le, 1.0)
            .unwrap();
        model.set_objective(LinExpr::from(x));

        let err = model.solve(SolverChoice::Minilp).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::SolveFailed);
        assert_eq!(err.status(), Some(SolveStatus::Unbounded));
    }
}
