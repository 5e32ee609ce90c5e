// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Storage variables, storage dynamics and the plausibility check of solved
//! storage levels.

use crate::{Error, LinExpr, Model, Network, Relation};

use super::constraints::NodeConstraints;
use super::StorageVars;

impl StorageVars {
    pub(super) fn create(model: &mut Model, name: &str, len: usize) -> Result<Self, Error> {
        Ok(Self {
            size: model.add_variable(&format!("size_storage_{name}"), Some(0.0))?,
            level: model.add_series_variable(&format!("storage_level_{name}"), Some(0.0), len)?,
            charge: model.add_series_variable(&format!("storage_charge_{name}"), Some(0.0), len)?,
            discharge: model.add_series_variable(
                &format!("storage_discharge_{name}"),
                Some(0.0),
                len,
            )?,
        })
    }

    /// The net amount charged in time step `t`, as a flow over the interval
    /// of length `dt` hours.
    pub(super) fn net_charge_rate(&self, t: usize, dt: f64) -> LinExpr {
        (LinExpr::from(self.charge[t]) - LinExpr::from(self.discharge[t])) * (1.0 / dt)
    }

    /// The amount charged in time step `t`, as a flow over the interval of
    /// length `dt` hours.
    pub(super) fn charge_rate(&self, t: usize, dt: f64) -> LinExpr {
        self.charge[t] * (1.0 / dt)
    }
}

impl NodeConstraints<'_> {
    /// Adds the speed limits, the level limit and the level balance of the
    /// storage.
    ///
    /// The level of the first time step follows from the level of the last
    /// time step, so the storage runs in a cycle over the time grid.
    pub(super) fn create_storage_constraints(&mut self) -> Result<(), Error> {
        let node = self.node;
        let state = self.state;
        let (Some(storage), Some(vars)) = (node.storage(), state.storage.as_ref()) else {
            return Ok(());
        };
        let name = node.name();
        let len = vars.level.len();
        let max_amount = storage.max_charging_speed() * self.dt;

        for t in 0..len {
            self.model.add_constraint(
                format!("max_charging_speed_{name}[{t}]"),
                LinExpr::from(vars.charge[t]) - vars.size * max_amount,
                Relation::Le,
                0.0,
            )?;
            self.model.add_constraint(
                format!("max_discharging_speed_{name}[{t}]"),
                LinExpr::from(vars.discharge[t]) - vars.size * max_amount,
                Relation::Le,
                0.0,
            )?;
            self.model.add_constraint(
                format!("storage_max_level_{name}[{t}]"),
                LinExpr::from(vars.level[t]) - LinExpr::from(vars.size),
                Relation::Le,
                0.0,
            )?;

            let previous = (t + len - 1) % len;
            self.model.add_constraint(
                format!("storage_level_balance_{name}[{t}]"),
                LinExpr::from(vars.level[t])
                    - vars.level[previous] * (1.0 - storage.storage_loss())
                    - vars.charge[t] * (1.0 - storage.charging_loss())
                    + LinExpr::from(vars.discharge[t]),
                Relation::Eq,
                0.0,
            )?;
        }
        Ok(())
    }
}

impl Network {
    /// Checks that every storage with costs is completely empty and
    /// completely full at least once in the solution.
    ///
    /// A storage that is never empty or never full could have been built
    /// smaller, which points to a modelling error.  Requires an optimized
    /// network.
    pub fn check_storages(&self) -> Result<(), Error> {
        let solution = self.solution.as_ref().ok_or_else(not_optimized)?;

        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let (Some(storage), Some(vars)) = (node.storage(), &self.states[idx.index()].storage)
            else {
                continue;
            };
            if storage.costs().magnitude() <= 0.0 {
                continue;
            }

            let size = solution.eval(&LinExpr::from(vars.size));
            let levels = vars
                .level
                .iter()
                .map(|v| solution.eval(&LinExpr::from(*v)))
                .collect::<Vec<_>>();
            let min = levels.iter().copied().fold(f64::INFINITY, f64::min);
            let max = levels.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let tolerance = self.config.plausibility_tolerance * size.max(1.0);

            if min > tolerance {
                return Err(Error::implausible(format!(
                    "Storage of node '{}' is never empty: minimum level is {min}, size is {size}.",
                    node.name()
                )));
            }
            if max < size - tolerance {
                return Err(Error::implausible(format!(
                    "Storage of node '{}' is never full: maximum level is {max}, size is {size}.",
                    node.name()
                )));
            }
        }

        Ok(())
    }
}

pub(super) fn not_optimized() -> Error {
    Error::solve_failed("Network has not been optimized yet.")
}
