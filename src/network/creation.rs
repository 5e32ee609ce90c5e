// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for creating [`Network`] instances from given nodes.

use std::collections::BTreeSet;

use petgraph::graph::DiGraph;

use crate::{Error, Model, NetworkConfig, Node, TimeGrid};

use super::{Network, NodeIndexMap};

/// `Network` instantiation.
impl Network {
    /// Creates a new [`Network`] from the given nodes, and builds its
    /// optimization model.
    ///
    /// Returns an error if the network or one of its nodes is invalid.
    pub fn try_new<NodeIterator: IntoIterator<Item = Node>>(
        nodes: NodeIterator,
        time_grid: TimeGrid,
        config: NetworkConfig,
    ) -> Result<Self, Error> {
        let (graph, indices) = Self::create_graph(nodes)?;

        let mut network = Self {
            graph,
            node_indices: indices,
            time_grid,
            config,
            states: vec![],
            model: Model::new(),
            solution: None,
        };
        network.add_edges()?;

        network.validate()?;
        network.build_model()?;

        Ok(network)
    }

    fn create_graph(
        nodes: impl IntoIterator<Item = Node>,
    ) -> Result<(DiGraph<Node, usize>, NodeIndexMap), Error> {
        let mut graph = DiGraph::new();
        let mut indices = NodeIndexMap::new();

        for node in nodes {
            let name = node.name().to_string();
            if let Some(first) = indices.get(&name) {
                return Err(Error::invalid_network(format!(
                    "Duplicate node name found: '{name}' at positions {} and {}.",
                    first.index(),
                    graph.node_count()
                )));
            }

            let idx = graph.add_node(node);
            indices.insert(name, idx);
        }

        Ok((graph, indices))
    }

    fn add_edges(&mut self) -> Result<(), Error> {
        let missing = self
            .graph
            .raw_nodes()
            .iter()
            .flat_map(|n| n.weight.inputs())
            .filter(|input| !self.node_indices.contains_key(*input))
            .map(String::as_str)
            .collect::<BTreeSet<_>>();
        if !missing.is_empty() {
            return Err(Error::invalid_network(format!(
                "nodes used as input node, but missing in list of nodes passed to Network: {}",
                missing.into_iter().collect::<Vec<_>>().join(", ")
            )));
        }

        let mut edges = vec![];
        for dest_idx in self.graph.node_indices() {
            let node = &self.graph[dest_idx];
            for (slot, input) in node.inputs().iter().enumerate() {
                let source_idx = self.node_indices[input];
                if self.graph[source_idx].kind().is_output() {
                    return Err(Error::invalid_network(format!(
                        "Output node '{input}' can't be an input of node '{}'.",
                        node.name()
                    )));
                }
                edges.push((source_idx, dest_idx, slot));
            }
        }
        for (source_idx, dest_idx, slot) in edges {
            self.graph.add_edge(source_idx, dest_idx, slot);
        }

        Ok(())
    }

    /// Builds the optimization model in dependency order: the commodities of
    /// all edges, the variables, the output flows bound to the input flows
    /// of the output nodes, then the constraints and the objective.
    fn build_model(&mut self) -> Result<(), Error> {
        self.resolve_commodities()?;
        self.create_variables()?;
        self.bind_flows()?;
        self.create_constraints()?;
        self.create_objective()?;

        tracing::debug!(
            "Built model for {} nodes: {} columns, {} constraints.",
            self.graph.node_count(),
            self.model.num_columns(),
            self.model.constraints().len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::test_utils::{hourly_grid, NetworkBuilder};
    use crate::TimeSeries;
    use petgraph::visit::EdgeRef;

    #[test]
    fn test_duplicate_names() {
        let grid = hourly_grid(4);
        let mut builder = NetworkBuilder::new(&grid);
        let wind = builder.wind("wind", 0.5, 1.0);
        builder.demand("demand", &wind, 5.0);
        builder.wind("wind", 0.3, 2.0);

        assert!(builder.build().is_err_and(|e| e
            == Error::invalid_network("Duplicate node name found: 'wind' at positions 0 and 2.")));
    }

    #[test]
    fn test_missing_node() {
        let grid = hourly_grid(4);
        let wind = Node::generic("wind", &[], "electricity")
            .costs(10.0)
            .build()
            .unwrap();
        let electricity = Node::generic("electricity", &[&wind], "electricity")
            .build()
            .unwrap();

        assert!(
            Network::try_new([electricity], grid, NetworkConfig::default()).is_err_and(|e| e
                == Error::invalid_network(
                    "nodes used as input node, but missing in list of nodes passed to \
                     Network: wind"
                ))
        );
    }

    #[test]
    fn test_output_node_as_input() {
        let grid = hourly_grid(4);
        let wind = Node::scalable_input("wind", TimeSeries::constant(0.5, &grid))
            .costs(1.0)
            .build()
            .unwrap();
        let demand = Node::fixed_output(
            "demand",
            &[&wind],
            "electricity",
            TimeSeries::constant(5.0, &grid),
        )
        .build()
        .unwrap();
        let curtailment = Node::generic("curtailment", &[&demand], "electricity")
            .build()
            .unwrap();

        assert!(Network::try_new(
            [wind, demand, curtailment],
            grid,
            NetworkConfig::default()
        )
        .is_err_and(|e| e
            == Error::invalid_network(
                "Output node 'demand' can't be an input of node 'curtailment'."
            )));
    }

    #[test]
    fn test_edges() -> Result<(), Error> {
        let grid = hourly_grid(4);
        let mut builder = NetworkBuilder::new(&grid);
        let wind = builder.wind("wind", 0.5, 1.0);
        let solar = builder.wind("solar_pv", 0.5, 20.0);
        let electricity = builder.junction("electricity", &[&solar, &wind], "electricity");
        builder.demand("demand", &electricity, 5.0);
        let network = builder.build()?;

        assert_eq!(network.graph.node_count(), 4);
        assert_eq!(network.graph.edge_count(), 3);

        let electricity_idx = network.node_indices["electricity"];
        let mut slots = network
            .graph
            .edges_directed(electricity_idx, petgraph::Direction::Incoming)
            .map(|e| (network.graph[e.source()].name(), *e.weight()))
            .collect::<Vec<_>>();
        slots.sort();
        assert_eq!(slots, vec![("solar_pv", 0), ("wind", 1)]);

        Ok(())
    }
}
