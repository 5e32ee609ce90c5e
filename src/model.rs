// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A linear optimization model: named variables, named constraints and a
//! minimisation objective.
//!
//! Constraints are stored in canonical form, with all variable terms on the
//! left hand side and a constant right hand side.  Constants appearing in the
//! left hand side expression passed to [`Model::add_constraint`] are moved to
//! the right hand side automatically.

mod expr;
mod solver;

pub use expr::{LinExpr, Var};
pub use solver::{Solution, SolveStatus, SolverChoice};

use std::collections::HashMap;

use crate::Error;

/// The relation between the two sides of a constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    Eq,
    Le,
    Ge,
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Relation::Eq => write!(f, "="),
            Relation::Le => write!(f, "<="),
            Relation::Ge => write!(f, ">="),
        }
    }
}

/// A named constraint `expr <relation> rhs`.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    name: String,
    expr: LinExpr,
    relation: Relation,
    rhs: f64,
}

impl Constraint {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expr(&self) -> &LinExpr {
        &self.expr
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    /// Returns true if the constraint holds for the given column values.
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.relation {
            Relation::Eq => (lhs - self.rhs).abs() <= tolerance,
            Relation::Le => lhs <= self.rhs + tolerance,
            Relation::Ge => lhs >= self.rhs - tolerance,
        }
    }
}

/// A scalar column of the model.
#[derive(Clone, Debug)]
struct Column {
    name: String,
    lower: Option<f64>,
}

/// A named variable: either a single column or one column per time step.
#[derive(Clone, Debug)]
enum Variable {
    Scalar(Var),
    Series(Vec<Var>),
}

/// A linear optimization model.
#[derive(Clone, Debug, Default)]
pub struct Model {
    columns: Vec<Column>,
    variables: Vec<(String, Variable)>,
    variable_indices: HashMap<String, usize>,
    constraints: Vec<Constraint>,
    objective: LinExpr,
}

impl Model {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    fn check_unique(&self, name: &str) -> Result<(), Error> {
        if self.variable_indices.contains_key(name) {
            return Err(Error::internal(format!(
                "Variable with name {name} already exists."
            )));
        }
        Ok(())
    }

    fn register(&mut self, name: &str, variable: Variable) {
        self.variable_indices
            .insert(name.to_string(), self.variables.len());
        self.variables.push((name.to_string(), variable));
    }

    fn add_column(&mut self, name: String, lower: Option<f64>) -> Var {
        self.columns.push(Column { name, lower });
        Var(self.columns.len() - 1)
    }

    /// Adds a scalar variable with an optional lower bound.
    pub fn add_variable(&mut self, name: &str, lower: Option<f64>) -> Result<Var, Error> {
        self.check_unique(name)?;
        let var = self.add_column(name.to_string(), lower);
        self.register(name, Variable::Scalar(var));
        Ok(var)
    }

    /// Adds a time indexed variable, i.e. one column for each of the `len`
    /// time steps, with an optional lower bound.
    pub fn add_series_variable(
        &mut self,
        name: &str,
        lower: Option<f64>,
        len: usize,
    ) -> Result<Vec<Var>, Error> {
        self.check_unique(name)?;
        let vars = (0..len)
            .map(|t| self.add_column(format!("{name}[{t}]"), lower))
            .collect::<Vec<_>>();
        self.register(name, Variable::Series(vars.clone()));
        Ok(vars)
    }

    /// Adds the constraint `lhs <relation> rhs`.
    ///
    /// Constraints without any variables are checked right away: they are
    /// dropped if they hold, and make the model infeasible otherwise.
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        lhs: LinExpr,
        relation: Relation,
        rhs: f64,
    ) -> Result<(), Error> {
        let name = name.into();
        let (expr, constant) = lhs.split_constant();
        let constraint = Constraint {
            name,
            expr,
            relation,
            rhs: rhs - constant,
        };

        if constraint.expr.is_constant() {
            if constraint.is_satisfied(&[], 1e-9) {
                tracing::trace!("Dropping constant constraint {}.", constraint.name);
                return Ok(());
            }
            return Err(Error::solve_failed_with(
                SolveStatus::Infeasible,
                format!(
                    "Constraint {} can never hold: 0 {} {}.",
                    constraint.name, constraint.relation, constraint.rhs
                ),
            ));
        }

        self.constraints.push(constraint);
        Ok(())
    }

    /// Sets the expression to be minimised.
    pub fn set_objective(&mut self, objective: LinExpr) {
        self.objective = objective;
    }

    /// Returns the objective expression.
    pub fn objective(&self) -> &LinExpr {
        &self.objective
    }

    /// Returns the scalar variable with the given name.
    pub fn variable(&self, name: &str) -> Option<Var> {
        match self.variable_indices.get(name).map(|i| &self.variables[*i].1) {
            Some(Variable::Scalar(var)) => Some(*var),
            _ => None,
        }
    }

    /// Returns the columns of the time indexed variable with the given name.
    pub fn series_variable(&self, name: &str) -> Option<&[Var]> {
        match self.variable_indices.get(name).map(|i| &self.variables[*i].1) {
            Some(Variable::Series(vars)) => Some(vars),
            _ => None,
        }
    }

    /// Returns the names of all variables, in creation order.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the number of scalar columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Returns the name of a column, e.g. `size_wind` or `flow_wind_demand[3]`.
    pub fn column_name(&self, var: Var) -> &str {
        self.columns
            .get(var.0)
            .map(|c| c.name.as_str())
            .unwrap_or("<unknown>")
    }

    /// Returns all constraints, in creation order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Returns the constraint with the given name.
    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    /// Renders an expression using the names of the model's columns.
    pub fn expr_to_string(&self, expr: &LinExpr) -> String {
        expr.generate_string(|var| self.column_name(var).to_string())
    }

    /// Lists all constraints with their names, one term per line.
    ///
    /// Intended for debugging and tests.
    pub fn constraints_to_string(&self) -> String {
        let mut out = String::new();
        for constraint in &self.constraints {
            out.push_str(&format!("\n{}:\n", constraint.name));
            for (var, coeff) in constraint.expr.terms() {
                out.push_str(&format!("{:+.6} * {}\n", coeff, self.column_name(var)));
            }
            out.push_str(&format!("{}\n{:.6}\n", constraint.relation, constraint.rhs));
        }
        out
    }
}
