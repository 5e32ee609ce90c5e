// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Resolution of the output edges of each node, and of the commodity that
//! flows over every edge.
//!
//! Only the graph is needed for this, so any ambiguity is reported before a
//! single solver variable is created.

use std::collections::BTreeSet;


use crate::node::check_proportions;
use crate::{Error, Node, NodeKind};

use super::{Network, NodeState};

impl Network {
    /// Creates the state of every node, with its outputs and the commodities
    /// of all its flows.
    pub(super) fn resolve_commodities(&mut self) -> Result<(), Error> {
        let mut states = self
            .graph
            .node_indices()
            .map(|idx| NodeState {
                input_commodities: self.graph[idx].input_commodities().to_vec(),
                ..Default::default()
            })
            .collect::<Vec<_>>();

        for dest in self.graph.node_indices() {
            for (slot, input) in self.graph[dest].inputs().iter().enumerate() {
                let source = self.node_indices[input];
                states[source.index()].outputs.push((dest, slot));
            }
        }

        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let state = &states[idx.index()];
            let output_commodities = if state.outputs.is_empty() {
                vec![leaf_output_commodity(node, state)?]
            } else {
                state
                    .outputs
                    .iter()
                    .map(|(dest, slot)| states[dest.index()].input_commodities[*slot].clone())
                    .collect::<Vec<_>>()
            };

            if let Some(declared) = node.output_commodity() {
                if output_commodities.iter().any(|c| c != declared) {
                    return Err(Error::invalid_node(format!(
                        "output_commodity '{declared}' of node '{}' doesn't match the \
                         commodities of its outputs: {}.",
                        node.name(),
                        output_commodities.join(", ")
                    )));
                }
            }
            states[idx.index()].output_commodities = output_commodities;
        }

        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let state = &mut states[idx.index()];
            if state.input_commodities.is_empty() {
                state.input_commodities = vec![inferred_input_commodity(node, state)?];
            }
        }

        for idx in self.graph.node_indices() {
            let state = &mut states[idx.index()];
            let output_names = state
                .outputs
                .iter()
                .map(|(dest, _)| self.graph[*dest].name().to_string())
                .collect::<Vec<_>>();
            self.check_commodities(&self.graph[idx], state, &output_names)?;
        }

        tracing::debug!(
            "Resolved commodities of {} nodes and {} edges.",
            self.graph.node_count(),
            self.graph.edge_count()
        );
        self.states = states;
        Ok(())
    }

    /// Checks that the commodities of a node are unambiguous and known, and
    /// determines the size commodity.
    fn check_commodities(
        &self,
        node: &Node,
        state: &mut NodeState,
        output_names: &[String],
    ) -> Result<(), Error> {
        let name = node.name();
        let distinct_outputs = distinct(&state.output_commodities);

        if distinct_outputs.len() > 1 {
            if node.convert_factors().is_none() {
                return Err(Error::invalid_node(format!(
                    "Node '{name}' has several output commodities ({}), \
                     which requires convert_factors.",
                    join(&distinct_outputs)
                )));
            }
            if node.storage().is_some() {
                return Err(Error::invalid_node(format!(
                    "Storage of node '{name}' requires a single output commodity, got: {}.",
                    join(&distinct_outputs)
                )));
            }
        }

        if let Some(factors) = node.convert_factors() {
            for commodity in &distinct_outputs {
                if !factors.contains_key(*commodity) {
                    return Err(Error::invalid_node(format!(
                        "Node '{name}' has no convert factor for output commodity \
                         '{commodity}'."
                    )));
                }
            }
            for commodity in factors.keys() {
                if !distinct_outputs.contains(commodity.as_str()) {
                    return Err(Error::invalid_node(format!(
                        "Convert factor for '{commodity}' doesn't match any output commodity \
                         of node '{name}'."
                    )));
                }
            }
        }

        if node.has_size() || node.storage().is_some() {
            let size_commodity = match node.size_commodity() {
                Some(declared) if distinct_outputs.contains(declared) => declared.to_string(),
                Some(declared) => {
                    return Err(Error::invalid_node(format!(
                        "size_commodity '{declared}' of node '{name}' is not one of its \
                         output commodities: {}.",
                        join(&distinct_outputs)
                    )));
                }
                None if distinct_outputs.len() == 1 => {
                    state.output_commodities[0].clone()
                }
                None => {
                    return Err(Error::invalid_node(format!(
                        "Node '{name}' has several output commodities ({}), \
                         set size_commodity.",
                        join(&distinct_outputs)
                    )));
                }
            };
            state.size_commodity = Some(size_commodity);
        }

        if let Some(proportions) = node.output_proportions() {
            check_proportions(
                name,
                "output",
                proportions,
                &state.output_commodities,
                output_names,
            )?;
        }

        for commodity in state
            .input_commodities
            .iter()
            .chain(state.output_commodities.iter())
        {
            self.config.units.unit_of(commodity)?;
        }

        Ok(())
    }
}

/// The commodity of the leaf output flow of a node without output nodes.
fn leaf_output_commodity(node: &Node, state: &NodeState) -> Result<String, Error> {
    if let Some(declared) = node.output_commodity() {
        return Ok(declared.to_string());
    }
    if let Some(factors) = node.convert_factors() {
        if factors.len() == 1 {
            if let Some(commodity) = factors.keys().next() {
                return Ok(commodity.clone());
            }
        }
    }
    if matches!(node.kind(), NodeKind::Generic | NodeKind::FixedOutput) {
        let distinct_inputs = distinct(&state.input_commodities);
        if distinct_inputs.len() == 1 {
            return Ok(state.input_commodities[0].clone());
        }
    }
    Err(Error::invalid_node(format!(
        "Can't determine the output commodity of node '{}', which has no output nodes: \
         set output_commodity.",
        node.name()
    )))
}

/// The commodity of the input flow of a node without input nodes.
fn inferred_input_commodity(node: &Node, state: &NodeState) -> Result<String, Error> {
    if let Some(factors) = node.convert_factors() {
        let inputs = factors
            .values()
            .map(|f| f.input_commodity.as_str())
            .collect::<BTreeSet<_>>();
        if let (1, Some(commodity)) = (inputs.len(), inputs.first()) {
            return Ok(commodity.to_string());
        }
    }
    let distinct_outputs = distinct(&state.output_commodities);
    if let (1, Some(commodity)) = (distinct_outputs.len(), distinct_outputs.first()) {
        return Ok(commodity.to_string());
    }
    Err(Error::invalid_node(format!(
        "Input node '{}' must have a single output commodity, got: {}.",
        node.name(),
        join(&distinct_outputs)
    )))
}

fn distinct(commodities: &[String]) -> BTreeSet<&str> {
    commodities.iter().map(String::as_str).collect()
}

fn join(commodities: &BTreeSet<&str>) -> String {
    commodities.iter().copied().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use crate::network::test_utils::{hourly_grid, NetworkBuilder};
    use crate::{Error, ErrorKind, Node, NodeKind, Storage};

    #[test]
    fn test_commodities() -> Result<(), Error> {
        let grid = hourly_grid(4);
        let mut builder = NetworkBuilder::new(&grid);
        let wind = builder.wind("wind", 0.5, 1.0);
        let co2 = builder.fixed_input("co2", 5.0);
        let electrolyzer = builder.add(
            Node::generic("electrolyzer", &[&wind], "electricity")
                .costs(3.0)
                .convert_factor(0.02)
                .build()?,
        );
        builder.add(
            Node::generic(
                "methanol_synthesis",
                &[&co2, &electrolyzer],
                ["co2", "hydrogen"],
            )
            .input_proportions([("co2", 0.25), ("hydrogen", 0.75)])
            .output_commodity("methanol")
            .build()?,
        );
        let network = builder.build()?;

        let state = |name: &str| &network.states[network.node_indices[name].index()];
        assert_eq!(state("wind").input_commodities, ["electricity"]);
        assert_eq!(state("wind").output_commodities, ["electricity"]);
        assert_eq!(state("co2").input_commodities, ["co2"]);
        assert_eq!(state("electrolyzer").output_commodities, ["hydrogen"]);
        assert_eq!(
            state("electrolyzer").size_commodity.as_deref(),
            Some("hydrogen")
        );
        assert_eq!(state("methanol_synthesis").output_commodities, ["methanol"]);
        assert_eq!(state("methanol_synthesis").size_commodity, None);
        assert_eq!(
            network.graph[network.node_indices["methanol_synthesis"]].kind(),
            NodeKind::Generic
        );

        Ok(())
    }

    #[test]
    fn test_ambiguous_leaf_commodity() {
        let grid = hourly_grid(4);
        let mut builder = NetworkBuilder::new(&grid);
        let co2 = builder.fixed_input("co2", 5.0);
        let hydrogen = builder.fixed_input("hydrogen", 1.5);
        builder.add(
            Node::generic("methanol_synthesis", &[&co2, &hydrogen], ["co2", "hydrogen"])
                .input_proportions([("co2", 0.25), ("hydrogen", 0.75)])
                .build()
                .unwrap(),
        );

        assert!(builder.build().is_err_and(|e| e
            == Error::invalid_node(
                "Can't determine the output commodity of node 'methanol_synthesis', which has \
                 no output nodes: set output_commodity."
            )));
    }

    #[test]
    fn test_several_output_commodities() {
        let grid = hourly_grid(4);
        let mut builder = NetworkBuilder::new(&grid);
        let wind = builder.wind("wind", 0.5, 1.0);
        builder.junction("grid", &[&wind], "electricity");
        builder.junction("gas_plant", &[&wind], "gas");

        assert!(builder.build().is_err_and(|e| e
            == Error::invalid_node(
                "Input node 'wind' must have a single output commodity, got: electricity, gas."
            )));

        let mut builder = NetworkBuilder::new(&grid);
        let wind = builder.wind("wind", 0.5, 1.0);
        let electricity = builder.junction("electricity", &[&wind], "electricity");
        builder.junction("grid", &[&electricity], "electricity");
        builder.junction("gas_plant", &[&electricity], "gas");

        assert!(builder.build().is_err_and(|e| e
            == Error::invalid_node(
                "Node 'electricity' has several output commodities (electricity, gas), \
                 which requires convert_factors."
            )));
    }

    #[test]
    fn test_storage_with_several_output_commodities() {
        let grid = hourly_grid(4);
        let mut builder = NetworkBuilder::new(&grid);
        let wind = builder.wind("wind", 0.5, 1.0);
        let chp = builder.add(
            Node::generic("chp", &[&wind], "electricity")
                .convert_factors([
                    ("electricity", "electricity", 0.4),
                    ("gas", "electricity", 0.5),
                ])
                .storage(Storage::try_new(1.0, 1.0, 0.0, 0.0).unwrap())
                .build()
                .unwrap(),
        );
        builder.junction("grid", &[&chp], "electricity");
        builder.junction("heat", &[&chp], "gas");

        assert!(builder.build().is_err_and(|e| e
            == Error::invalid_node(
                "Storage of node 'chp' requires a single output commodity, \
                 got: electricity, gas."
            )));
    }

    #[test]
    fn test_size_commodity() {
        let grid = hourly_grid(4);
        let mut builder = NetworkBuilder::new(&grid);
        let wind = builder.wind("wind", 0.5, 1.0);
        let chp = builder.add(
            Node::generic("chp", &[&wind], "electricity")
                .costs(1.0)
                .convert_factors([
                    ("electricity", "electricity", 0.4),
                    ("gas", "electricity", 0.5),
                ])
                .build()
                .unwrap(),
        );
        builder.junction("grid", &[&chp], "electricity");
        builder.junction("heat", &[&chp], "gas");

        assert!(builder.build().is_err_and(|e| e
            == Error::invalid_node(
                "Node 'chp' has several output commodities (electricity, gas), \
                 set size_commodity."
            )));
    }

    #[test]
    fn test_unknown_commodity() {
        let grid = hourly_grid(4);
        let mut builder = NetworkBuilder::new(&grid);
        let wind = builder.wind("wind", 0.5, 1.0);
        builder.junction("heat", &[&wind], "heat");

        assert!(builder
            .build()
            .is_err_and(|e| e.kind() == ErrorKind::InvalidUnit));
    }
}
