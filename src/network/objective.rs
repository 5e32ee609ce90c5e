// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Creation of the cost objective.

use crate::{Error, LinExpr, Node, Quantity, Unit};

use super::{Network, NodeState};

/// The units all costs are converted into.
struct CostUnits {
    currency: Unit,
    hour: Unit,
}

impl CostUnits {
    /// Currency per unit of size, e.g. `EUR/MW`.
    fn per_size(&self, size_unit: &Unit) -> Result<Unit, Error> {
        self.currency.try_div(size_unit)
    }

    /// Currency per unit of stored amount, e.g. `EUR/MWh`.
    fn per_amount(&self, flow_unit: &Unit) -> Result<Unit, Error> {
        self.currency.try_div(&flow_unit.try_mul(&self.hour)?)
    }
}

impl Network {
    /// Sets the total costs of the network as the objective of the model:
    /// the costs of all sizes, of all storage sizes, and of all input flows
    /// with input flow costs, in the configured currency.
    pub(super) fn create_objective(&mut self) -> Result<(), Error> {
        let units = CostUnits {
            currency: Unit::parse(&self.config.currency)?,
            hour: Unit::parse("h")?,
        };
        let dt = self.time_grid.interval_length_hours();

        let mut objective = LinExpr::default();
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let state = &self.states[idx.index()];
            objective += self.node_costs(node, state, &units, dt)?;
        }

        tracing::debug!(
            "Created objective with {} terms.",
            objective.terms().count()
        );
        self.model.set_objective(objective);
        Ok(())
    }

    fn node_costs(
        &self,
        node: &Node,
        state: &NodeState,
        units: &CostUnits,
        dt: f64,
    ) -> Result<LinExpr, Error> {
        let name = node.name();
        let mut costs = LinExpr::default();

        if let (Some(size), Some(node_costs)) = (state.size, node.costs()) {
            let size_unit = self.size_unit(name, state)?;
            costs += size * node_costs.to_magnitude(&units.per_size(size_unit)?)?;
        }

        if let (Some(vars), Some(storage)) = (&state.storage, node.storage()) {
            let size_unit = self.size_unit(name, state)?;
            costs += vars.size * storage.costs().to_magnitude(&units.per_amount(size_unit)?)?;
        }

        if let Some(flow_costs) = node.input_flow_costs() {
            costs += self.input_flow_costs(state, flow_costs, units, dt)?;
        }

        Ok(costs)
    }

    /// `costs * sum(inputs[t]) * dt` over all time steps.
    fn input_flow_costs(
        &self,
        state: &NodeState,
        flow_costs: &Quantity,
        units: &CostUnits,
        dt: f64,
    ) -> Result<LinExpr, Error> {
        let mut costs = LinExpr::default();
        for (flows, commodity) in state.input_flows.iter().zip(&state.input_commodities) {
            let unit = self.config.units.unit_of(commodity)?;
            let per_amount = flow_costs.to_magnitude(&units.per_amount(unit)?)?;
            costs += flows.iter().sum::<LinExpr>() * (per_amount * dt);
        }
        Ok(costs)
    }

    fn size_unit(&self, name: &str, state: &NodeState) -> Result<&Unit, Error> {
        let commodity = state.size_commodity.as_deref().ok_or_else(|| {
            Error::internal(format!("Node '{name}' has a size, but no size commodity."))
        })?;
        self.config.units.unit_of(commodity)
    }
}
