// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Creation of the flow balance, proportion, size limit and storage
//! constraints of all nodes.

use std::collections::{BTreeMap, BTreeSet};

use crate::{Error, LinExpr, Model, Node, NodeKind, Quantity, Relation, UnitMap};

use super::{FlowSeries, Network, NodeState};

/// Everything needed to create the constraints of a single node.
pub(super) struct NodeConstraints<'a> {
    pub(super) node: &'a Node,
    pub(super) state: &'a NodeState,
    output_names: Vec<&'a str>,
    units: &'a UnitMap,
    len: usize,
    pub(super) dt: f64,
    pub(super) model: &'a mut Model,
}

/// A group of sibling flows sharing one entry of a proportions map.
struct ProportionGroup<'a> {
    key: &'a str,
    flows: Vec<&'a FlowSeries>,
    ratio: f64,
}

impl Network {
    pub(super) fn create_constraints(&mut self) -> Result<(), Error> {
        for idx in self.graph.node_indices() {
            let state = &self.states[idx.index()];
            let mut constraints = NodeConstraints {
                node: &self.graph[idx],
                state,
                output_names: state
                    .outputs
                    .iter()
                    .map(|(dest, _)| self.graph[*dest].name())
                    .collect(),
                units: &self.config.units,
                len: self.time_grid.len(),
                dt: self.time_grid.interval_length_hours(),
                model: &mut self.model,
            };
            constraints.create()?;
        }

        tracing::debug!("Created {} constraints.", self.model.constraints().len());
        Ok(())
    }
}

impl<'a> NodeConstraints<'a> {
    fn create(&mut self) -> Result<(), Error> {
        let node = self.node;
        let state = self.state;

        self.create_flow_balance()?;
        self.create_storage_constraints()?;

        if let Some(proportions) = node.input_proportions() {
            let neighbours = node.inputs().iter().map(String::as_str).collect::<Vec<_>>();
            self.create_proportion_constraints(
                "input",
                proportions,
                &state.input_flows,
                &state.input_commodities,
                &neighbours,
            )?;
        }
        if let Some(proportions) = node.output_proportions() {
            let neighbours = self.output_names.clone();
            self.create_proportion_constraints(
                "output",
                proportions,
                &state.output_flows,
                &state.output_commodities,
                &neighbours,
            )?;
        }

        self.create_size_limit()
    }

    /// For every output commodity and time step:
    ///
    /// `sum(outputs) + (charge - discharge) / dt == factor * sum(inputs)`
    fn create_flow_balance(&mut self) -> Result<(), Error> {
        let node = self.node;
        let name = node.name();
        let state = self.state;
        if state.input_flows.is_empty() || state.output_flows.is_empty() {
            return Err(Error::internal(format!(
                "Node '{name}' has no input or output flows."
            )));
        }

        let output_commodities = state
            .output_commodities
            .iter()
            .map(String::as_str)
            .collect::<BTreeSet<_>>();

        for &commodity in &output_commodities {
            let (inputs, factor) = self.conversion(commodity)?;
            let outputs = flows_of(&state.output_flows, &state.output_commodities, commodity);
            let constraint_name = if output_commodities.len() > 1 {
                format!("inout_flow_balance_{name}_{commodity}")
            } else {
                format!("inout_flow_balance_{name}")
            };

            for t in 0..self.len {
                let mut lhs = outputs.iter().map(|f| &f[t]).sum::<LinExpr>();
                if let Some(storage) = &state.storage {
                    lhs += storage.net_charge_rate(t, self.dt);
                }
                lhs -= inputs.iter().map(|f| &f[t]).sum::<LinExpr>() * factor;
                self.model
                    .add_constraint(format!("{constraint_name}[{t}]"), lhs, Relation::Eq, 0.0)?;
            }
        }
        Ok(())
    }

    /// Returns the input flows that are converted into `output_commodity`,
    /// and the conversion factor as a plain number.
    fn conversion(&self, output_commodity: &str) -> Result<(Vec<&'a FlowSeries>, f64), Error> {
        let node = self.node;
        let name = node.name();
        let state = self.state;
        let output_unit = self.units.unit_of(output_commodity)?;

        if let Some(factors) = node.convert_factors() {
            let factor = factors.get(output_commodity).ok_or_else(|| {
                Error::internal(format!(
                    "Node '{name}' has no convert factor for '{output_commodity}'."
                ))
            })?;
            let input_unit = self.units.unit_of(&factor.input_commodity)?;
            let inputs = flows_of(
                &state.input_flows,
                &state.input_commodities,
                &factor.input_commodity,
            );
            return Ok((inputs, factor.factor.to_magnitude(&output_unit.try_div(input_unit)?)?));
        }

        let convert_factor = node.convert_factor();
        let inputs = state.input_flows.iter().collect::<Vec<_>>();
        let input_commodities = state
            .input_commodities
            .iter()
            .collect::<BTreeSet<_>>();

        match input_commodities.first() {
            Some(input_commodity) if input_commodities.len() == 1 => {
                let input_unit = self.units.unit_of(input_commodity)?;
                Ok((inputs, convert_factor.to_magnitude(&output_unit.try_div(input_unit)?)?))
            }
            _ if convert_factor.unit().is_some() => Err(Error::invalid_unit(format!(
                "convert_factor of node '{name}' can't have a unit, because its inputs have \
                 different commodities."
            ))),
            _ => Ok((inputs, convert_factor.magnitude())),
        }
    }

    /// For the first entry `r` of the proportions map and every other entry
    /// `k`, and every time step:
    ///
    /// `sum(flows of r) / ratio(r) == sum(flows of k) / ratio(k)`
    fn create_proportion_constraints(
        &mut self,
        direction: &str,
        proportions: &'a BTreeMap<String, Quantity>,
        flows: &'a [FlowSeries],
        commodities: &'a [String],
        neighbours: &[&str],
    ) -> Result<(), Error> {
        let node = self.node;
        let name = node.name();
        let commodity_keys = commodities.iter().map(String::as_str).collect::<BTreeSet<_>>();
        let by_commodity = proportions
            .keys()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            == commodity_keys;

        let mut groups = vec![];
        for (key, ratio) in proportions {
            let members = (0..flows.len())
                .filter(|&i| {
                    if by_commodity {
                        commodities[i] == *key
                    } else {
                        neighbours.get(i).is_some_and(|n| *n == key.as_str())
                    }
                })
                .collect::<Vec<_>>();
            let Some(&first) = members.first() else {
                return Err(Error::invalid_proportions(format!(
                    "wrong parameter for node {name}: no {direction} flow matches \
                     proportion key '{key}'"
                )));
            };
            let ratio = ratio.to_magnitude(self.units.unit_of(&commodities[first])?)?;
            if !(ratio > 0.0) {
                return Err(Error::invalid_proportions(format!(
                    "wrong parameter for node {name}: {direction}_proportions must be \
                     positive, got {ratio} for '{key}'"
                )));
            }
            groups.push(ProportionGroup {
                key,
                flows: members.into_iter().map(|i| &flows[i]).collect(),
                ratio,
            });
        }

        let Some((reference, others)) = groups.split_first() else {
            return Ok(());
        };
        for group in others {
            for t in 0..self.len {
                let lhs = reference.flows.iter().map(|f| &f[t]).sum::<LinExpr>()
                    * (1.0 / reference.ratio)
                    - group.flows.iter().map(|f| &f[t]).sum::<LinExpr>() * (1.0 / group.ratio);
                self.model.add_constraint(
                    format!("proportion_{name}_{direction}_{}[{t}]", group.key),
                    lhs,
                    Relation::Eq,
                    0.0,
                )?;
            }
        }
        Ok(())
    }

    /// For sized nodes other than scalable inputs, and every time step:
    ///
    /// `sum(outputs of the size commodity) + charge / dt <= size`
    fn create_size_limit(&mut self) -> Result<(), Error> {
        let state = self.state;
        let Some(size) = state.size else {
            return Ok(());
        };
        if self.node.kind() == NodeKind::ScalableInput {
            return Ok(());
        }
        let node = self.node;
        let name = node.name();
        let size_commodity = state.size_commodity.as_deref().ok_or_else(|| {
            Error::internal(format!("Node '{name}' has a size, but no size commodity."))
        })?;
        let outputs = flows_of(&state.output_flows, &state.output_commodities, size_commodity);

        for t in 0..self.len {
            let mut lhs = outputs.iter().map(|f| &f[t]).sum::<LinExpr>();
            if let Some(storage) = &state.storage {
                lhs += storage.charge_rate(t, self.dt);
            }
            lhs -= LinExpr::from(size);
            self.model.add_constraint(
                format!("limit_outflow_by_size_{name}[{t}]"),
                lhs,
                Relation::Le,
                0.0,
            )?;
        }
        Ok(())
    }
}

/// Returns the flows carrying the given commodity.
fn flows_of<'a>(
    flows: &'a [FlowSeries],
    commodities: &[String],
    commodity: &str,
) -> Vec<&'a FlowSeries> {
    flows
        .iter()
        .zip(commodities)
        .filter(|(_, c)| *c == commodity)
        .map(|(f, _)| f)
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::network::test_utils::{hourly_grid, NetworkBuilder};
    use crate::{Error, ErrorKind, Node, Quantity};

    fn render(network: &crate::Network, name: &str) -> String {
        let model = network.model();
        let constraint = model.constraint(name).unwrap();
        format!(
            "{} {} {}",
            model.expr_to_string(constraint.expr()),
            constraint.relation(),
            constraint.rhs()
        )
    }

    #[test]
    fn test_flow_balance() -> Result<(), Error> {
        let grid = hourly_grid(2);
        let mut builder = NetworkBuilder::new(&grid);
        let wind = builder.wind("wind", 0.5, 1.0);
        let electrolyzer = builder.add(
            Node::generic("electrolyzer", &[&wind], "electricity")
                .costs(3.0)
                .convert_factor(Quantity::parse(0.02, "t/MWh")?)
                .build()?,
        );
        builder.demand_of("hydrogen_demand", &electrolyzer, "hydrogen", 0.1);
        let network = builder.build()?;

        // wind: its output is the input variable of the electrolyzer
        assert_eq!(
            render(&network, "inout_flow_balance_wind[0]"),
            "-0.500000 * size_wind +1.000000 * flow_wind_electrolyzer[0] = 0"
        );
        // the factor is converted from t/MWh into (t/h)/MW
        assert_eq!(
            render(&network, "inout_flow_balance_electrolyzer[1]"),
            "-0.020000 * flow_wind_electrolyzer[1] \
             +1.000000 * flow_electrolyzer_hydrogen_demand[1] = 0"
        );
        // a fixed output moves its flow to the right hand side
        assert_eq!(
            render(&network, "inout_flow_balance_hydrogen_demand[0]"),
            "-1.000000 * flow_electrolyzer_hydrogen_demand[0] = -0.1"
        );
        assert_eq!(
            render(&network, "limit_outflow_by_size_electrolyzer[0]"),
            "-1.000000 * size_electrolyzer +1.000000 * flow_electrolyzer_hydrogen_demand[0] <= 0"
        );
        assert!(network.model().constraint("limit_outflow_by_size_wind[0]").is_none());

        Ok(())
    }

    #[test]
    fn test_convert_factors() -> Result<(), Error> {
        let grid = hourly_grid(2);
        let mut builder = NetworkBuilder::new(&grid);
        let gas = builder.fixed_input("gas_supply", 10.0);
        let wind = builder.wind("wind", 0.5, 1.0);
        let chp = builder.add(
            Node::generic("chp", &[&gas, &wind], ["gas", "electricity"])
                .costs(1.0)
                .size_commodity("electricity")
                .convert_factors([
                    ("electricity", "gas", 0.4),
                    ("hydrogen", "electricity", 0.02),
                ])
                .build()?,
        );
        builder.junction("grid", &[&chp], "electricity");
        builder.junction("hydrogen_tank", &[&chp], "hydrogen");
        let network = builder.build()?;

        assert_eq!(
            render(&network, "inout_flow_balance_chp_electricity[0]"),
            "-0.400000 * flow_gas_supply_chp[0] +1.000000 * flow_chp_grid[0] = 0"
        );
        assert_eq!(
            render(&network, "inout_flow_balance_chp_hydrogen[0]"),
            "-0.020000 * flow_wind_chp[0] +1.000000 * flow_chp_hydrogen_tank[0] = 0"
        );
        assert_eq!(
            render(&network, "limit_outflow_by_size_chp[1]"),
            "-1.000000 * size_chp +1.000000 * flow_chp_grid[1] <= 0"
        );

        Ok(())
    }

    #[test]
    fn test_proportions() -> Result<(), Error> {
        let grid = hourly_grid(2);
        let mut builder = NetworkBuilder::new(&grid);
        let co2 = builder.fixed_input("co2", 5.0);
        let wind = builder.wind("wind", 0.5, 1.0);
        let electricity = builder.add(
            Node::generic("electricity", &[&wind], "electricity")
                .output_proportions([("grid", 1.0), ("methanol_synthesis", 3.0)])
                .build()?,
        );
        builder.junction("grid", &[&electricity], "electricity");
        builder.add(
            Node::generic(
                "methanol_synthesis",
                &[&co2, &electricity],
                ["co2", "electricity"],
            )
            .input_proportions([("co2", 0.25), ("electricity", 0.75)])
            .output_commodity("methanol")
            .build()?,
        );
        let network = builder.build()?;

        assert_eq!(
            render(&network, "proportion_methanol_synthesis_input_electricity[0]"),
            "+4.000000 * flow_co2_methanol_synthesis[0] \
             -1.333333 * flow_electricity_methanol_synthesis[0] = 0"
        );
        assert_eq!(
            render(&network, "proportion_electricity_output_methanol_synthesis[1]"),
            "+1.000000 * flow_electricity_grid[1] \
             -0.333333 * flow_electricity_methanol_synthesis[1] = 0"
        );
        // inputs with different commodities are summed up
        assert_eq!(
            render(&network, "inout_flow_balance_methanol_synthesis[0]"),
            "-1.000000 * flow_co2_methanol_synthesis[0] \
             -1.000000 * flow_electricity_methanol_synthesis[0] \
             +1.000000 * flow_methanol_synthesis[0] = 0"
        );

        Ok(())
    }

    #[test]
    fn test_convert_factor_unit_with_mixed_inputs() {
        let grid = hourly_grid(2);
        let mut builder = NetworkBuilder::new(&grid);
        let co2 = builder.fixed_input("co2", 5.0);
        let wind = builder.wind("wind", 0.5, 1.0);
        builder.add(
            Node::generic("methanol_synthesis", &[&co2, &wind], ["co2", "electricity"])
                .input_proportions([("co2", 0.25), ("electricity", 0.75)])
                .convert_factor(Quantity::parse(0.5, "t/MWh").unwrap())
                .output_commodity("methanol")
                .build()
                .unwrap(),
        );

        assert!(builder.build().is_err_and(|e| e.kind() == ErrorKind::InvalidUnit));
    }
}
