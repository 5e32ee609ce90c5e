// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Sparse linear expressions over model variables.

use std::collections::BTreeMap;

/// A handle to a scalar column of a [`Model`][super::Model].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var(pub(crate) usize);

impl Var {
    /// Returns the column index of the variable.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A linear expression `sum(coeff * var) + constant`.
///
/// Terms referring to the same variable are merged, and terms whose
/// coefficient cancels out are dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinExpr {
    terms: BTreeMap<Var, f64>,
    constant: f64,
}

/// Constructors and accessors for `LinExpr`.
impl LinExpr {
    pub fn constant(value: f64) -> Self {
        Self {
            terms: BTreeMap::new(),
            constant: value,
        }
    }

    pub fn term(var: Var, coeff: f64) -> Self {
        let mut expr = Self::default();
        expr.add_term(var, coeff);
        expr
    }

    /// Returns an iterator over the `(variable, coefficient)` pairs.
    pub fn terms(&self) -> impl Iterator<Item = (Var, f64)> + '_ {
        self.terms.iter().map(|(v, c)| (*v, *c))
    }

    /// Returns the constant part of the expression.
    pub fn constant_value(&self) -> f64 {
        self.constant
    }

    /// Returns true if the expression contains no variables.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluates the expression for the given column values.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coeff)| coeff * values.get(var.0).copied().unwrap_or_default())
            .sum::<f64>()
            + self.constant
    }

    /// Splits off the constant, leaving only variable terms.
    pub(crate) fn split_constant(mut self) -> (Self, f64) {
        let constant = std::mem::take(&mut self.constant);
        (self, constant)
    }

    fn add_term(&mut self, var: Var, coeff: f64) {
        let entry = self.terms.entry(var).or_insert(0.0);
        *entry += coeff;
        if *entry == 0.0 {
            self.terms.remove(&var);
        }
    }
}

impl From<Var> for LinExpr {
    fn from(var: Var) -> Self {
        Self::term(var, 1.0)
    }
}

impl From<f64> for LinExpr {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

impl std::ops::AddAssign for LinExpr {
    fn add_assign(&mut self, rhs: Self) {
        for (var, coeff) in rhs.terms {
            self.add_term(var, coeff);
        }
        self.constant += rhs.constant;
    }
}

impl std::ops::SubAssign for LinExpr {
    fn sub_assign(&mut self, rhs: Self) {
        *self += -rhs;
    }
}

impl std::ops::Add for LinExpr {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl std::ops::Sub for LinExpr {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self {
        self -= rhs;
        self
    }
}

impl std::ops::Neg for LinExpr {
    type Output = Self;

    fn neg(self) -> Self {
        self * -1.0
    }
}

impl std::ops::Mul<f64> for LinExpr {
    type Output = Self;

    fn mul(mut self, rhs: f64) -> Self {
        if rhs == 0.0 {
            return Self::default();
        }
        for coeff in self.terms.values_mut() {
            *coeff *= rhs;
        }
        self.constant *= rhs;
        self
    }
}

impl std::ops::Mul<LinExpr> for f64 {
    type Output = LinExpr;

    fn mul(self, rhs: LinExpr) -> LinExpr {
        rhs * self
    }
}

impl std::ops::Mul<f64> for Var {
    type Output = LinExpr;

    fn mul(self, rhs: f64) -> LinExpr {
        LinExpr::term(self, rhs)
    }
}

impl std::iter::Sum for LinExpr {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, expr| acc + expr)
    }
}

impl<'a> std::iter::Sum<&'a LinExpr> for LinExpr {
    fn sum<I: Iterator<Item = &'a LinExpr>>(iter: I) -> Self {
        iter.cloned().sum()
    }
}

impl std::fmt::Display for LinExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.generate_string(|var| format!("x{}", var.0)))
    }
}

/// Display helpers for `LinExpr`.
impl LinExpr {
    /// Renders the expression, naming variables with `name`.
    pub(crate) fn generate_string(&self, name: impl Fn(Var) -> String) -> String {
        let mut parts = self
            .terms
            .iter()
            .map(|(var, coeff)| format!("{:+.6} * {}", coeff, name(*var)))
            .collect::<Vec<_>>();
        if self.constant != 0.0 || parts.is_empty() {
            parts.push(format!("{:+.6}", self.constant));
        }
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn assert_expr(exprs: &[LinExpr], expected: &str) {
        for expr in exprs {
            assert_eq!(expr.to_string(), expected);
        }
    }

    #[test]
    fn test_arithmetic() {
        let x = |i| LinExpr::from(Var(i));
        let c = LinExpr::constant;

        assert_expr(
            &[
                x(0) + x(1),
                x(1) + x(0),
                x(0) - -x(1),
                x(0) + x(1) + x(2) - x(2),
            ],
            "+1.000000 * x0 +1.000000 * x1",
        );

        assert_expr(
            &[
                -(x(0) + x(1)),
                -x(0) - x(1),
                (x(0) + x(1)) * -1.0,
            ],
            "-1.000000 * x0 -1.000000 * x1",
        );

        assert_expr(
            &[
                2.0 * x(3) + c(5.0),
                Var(3) * 2.0 + c(2.0) + c(3.0),
                x(3) + x(3) + c(5.0),
            ],
            "+2.000000 * x3 +5.000000",
        );

        assert_expr(&[x(1) - x(1), x(2) * 0.0, LinExpr::default()], "+0.000000");
    }

    #[test]
    fn test_sum_and_evaluate() {
        let exprs = [Var(0) * 0.5, Var(1) * 2.0, LinExpr::constant(1.0)];
        let sum: LinExpr = exprs.iter().sum();
        assert_eq!(sum.terms().count(), 2);
        assert_eq!(sum.constant_value(), 1.0);
        assert_eq!(sum.evaluate(&[4.0, 3.0]), 9.0);

        let (terms, constant) = sum.split_constant();
        assert_eq!(constant, 1.0);
        assert_eq!(terms.constant_value(), 0.0);
        assert!(!terms.is_constant());
    }
}
