// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Creation of the size, flow and storage variables of all nodes.

use crate::{Error, LinExpr, Node, NodeKind, Unit, Var};

use super::{FlowSeries, Network, StorageVars};

fn variable_flow(vars: Vec<Var>) -> FlowSeries {
    vars.into_iter().map(LinExpr::from).collect()
}

fn constant_flow(values: Vec<f64>) -> FlowSeries {
    values.into_iter().map(LinExpr::constant).collect()
}

fn profile(node: &Node) -> Result<&crate::TimeSeries, Error> {
    node.profile().ok_or_else(|| {
        Error::internal(format!("Node '{}' of kind {} has no profile.", node.name(), node.kind()))
    })
}

impl Network {
    /// Creates the size variables, input flows and storage variables of all
    /// nodes.
    ///
    /// Input flows of generic and output nodes are new variables, one per
    /// input edge.  Input nodes get their flow from their profile.
    pub(super) fn create_variables(&mut self) -> Result<(), Error> {
        let len = self.time_grid.len();
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let name = node.name();
            let state = &mut self.states[idx.index()];

            if node.has_size() {
                if !node.has_costs() {
                    tracing::warn!(
                        "Scalable input node '{name}' has no costs, its size is unbounded."
                    );
                }
                state.size = Some(self.model.add_variable(&format!("size_{name}"), Some(0.0))?);
            }

            state.input_flows = match node.kind() {
                NodeKind::FixedInput => {
                    let unit = self.config.units.unit_of(&state.input_commodities[0])?;
                    vec![constant_flow(profile(node)?.magnitudes(unit)?)]
                }
                NodeKind::ScalableInput => {
                    let size = state.size.ok_or_else(|| {
                        Error::internal(format!("Scalable input node '{name}' has no size."))
                    })?;
                    let capacity_factors = profile(node)?.magnitudes(&Unit::dimensionless())?;
                    vec![capacity_factors
                        .into_iter()
                        .map(|cf| size * cf)
                        .collect::<FlowSeries>()]
                }
                _ => node
                    .inputs()
                    .iter()
                    .map(|input| {
                        self.model
                            .add_series_variable(&format!("flow_{input}_{name}"), Some(0.0), len)
                            .map(variable_flow)
                    })
                    .collect::<Result<Vec<_>, Error>>()?,
            };

            if node.storage().is_some() {
                state.storage = Some(StorageVars::create(&mut self.model, name, len)?);
            }
        }

        tracing::debug!("Created {} variables.", self.model.num_columns());
        Ok(())
    }

    /// Binds the output flows of every node to the input flows of its output
    /// nodes, and creates leaf flows for nodes without outputs or inputs.
    pub(super) fn bind_flows(&mut self) -> Result<(), Error> {
        let len = self.time_grid.len();
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let name = node.name();
            let state = &self.states[idx.index()];

            let output_flows = if node.kind() == NodeKind::FixedOutput {
                let unit = self.config.units.unit_of(&state.output_commodities[0])?;
                vec![constant_flow(profile(node)?.magnitudes(unit)?)]
            } else if state.outputs.is_empty() {
                let vars = self
                    .model
                    .add_series_variable(&format!("flow_{name}"), Some(0.0), len)?;
                vec![variable_flow(vars)]
            } else {
                state
                    .outputs
                    .iter()
                    .map(|(dest, slot)| self.states[dest.index()].input_flows[*slot].clone())
                    .collect()
            };

            let input_flows = if state.input_flows.is_empty() {
                let vars =
                    self.model
                        .add_series_variable(&format!("input_flow_{name}"), Some(0.0), len)?;
                Some(vec![variable_flow(vars)])
            } else {
                None
            };

            let state = &mut self.states[idx.index()];
            state.output_flows = output_flows;
            if let Some(input_flows) = input_flows {
                state.input_flows = input_flows;
            }
        }

        tracing::debug!("Bound the flows of {} edges.", self.graph.edge_count());
        Ok(())
    }
}
