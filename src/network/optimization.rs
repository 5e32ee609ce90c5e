// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Solving the model of a [`Network`].

use crate::{Error, Network, Solution, SolverChoice};

use super::storage::not_optimized;

/// `Network` optimization.
impl Network {
    /// Solves the model with the solver named in the network's config.
    ///
    /// See [`optimize_with`][Network::optimize_with].
    pub fn optimize(&mut self) -> Result<&Solution, Error> {
        let solver = self.config.solver.parse::<SolverChoice>()?;
        self.optimize_with(solver)
    }

    /// Solves the model with the given solver, and keeps the solution.
    ///
    /// Returns an error of kind `SolveFailed` if no optimal solution is
    /// found, in which case any previous solution is discarded.  If enabled
    /// in the config, the storages are checked for plausibility afterwards,
    /// see [`check_storages`][Network::check_storages].
    pub fn optimize_with(&mut self, solver: SolverChoice) -> Result<&Solution, Error> {
        self.solution = None;
        self.solution = Some(self.model.solve(solver)?);

        if self.config.check_storage_plausibility {
            self.check_storages()?;
        }

        self.solution.as_ref().ok_or_else(not_optimized)
    }
}
