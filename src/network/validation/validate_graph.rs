// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for validating the connectedness of a [`Network`].

use std::collections::BTreeSet;

use petgraph::graph::NodeIndex;

use crate::Error;

use super::NetworkValidator;

impl NetworkValidator<'_> {
    pub(super) fn validate_not_empty(&self) -> Result<(), Error> {
        if self.network.graph.node_count() == 0 {
            return Err(Error::invalid_network("Network must have at least one node."));
        }
        Ok(())
    }

    /// Validates that all nodes are connected into a single graph,
    /// disregarding the direction of the edges.
    ///
    /// Storages only ever connect to their own node, so they can't join
    /// separate components.
    pub(super) fn validate_connected_graph(&self) -> Result<(), Error> {
        let graph = &self.network.graph;
        let mut visited = BTreeSet::new();
        let mut components = vec![];

        for start in graph.node_indices() {
            if visited.contains(&start) {
                continue;
            }
            let mut component: Vec<NodeIndex> = vec![];
            let mut queue = vec![start];
            visited.insert(start);
            while let Some(idx) = queue.pop() {
                component.push(idx);
                for neighbor in graph.neighbors_undirected(idx) {
                    if visited.insert(neighbor) {
                        queue.push(neighbor);
                    }
                }
            }
            component.sort();
            components.push(component);
        }

        if components.len() > 1 {
            return Err(Error::invalid_network(format!(
                "Network is not connected, found {} components: {}",
                components.len(),
                components
                    .iter()
                    .map(|c| format!(
                        "[{}]",
                        c.iter()
                            .map(|idx| graph[*idx].name())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ))
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::network::test_utils::{hourly_grid, NetworkBuilder};
    use crate::{Error, Network, NetworkConfig, Node, Storage};

    #[test]
    fn test_unconnected_network() {
        let grid = hourly_grid(4);
        let mut builder = NetworkBuilder::new(&grid);
        let wind = builder.wind("wind", 0.5, 1.0);
        builder.demand("demand", &wind, 5.0);
        let co2 = builder.fixed_input("co2", 5.0);
        builder.add(
            Node::generic("co2_storage", &[&co2], "co2")
                .storage(Storage::try_new(1.0, 1.0, 0.0, 0.0).unwrap())
                .build()
                .unwrap(),
        );

        assert!(builder.build().is_err_and(|e| e
            == Error::invalid_network(
                "Network is not connected, found 2 components: \
                 [wind, demand], [co2, co2_storage]"
            )));
    }

    #[test]
    fn test_empty_network() {
        assert!(
            Network::try_new(Vec::<Node>::new(), hourly_grid(4), NetworkConfig::default()).is_err_and(|e| e
                == Error::invalid_network("Network must have at least one node."))
        );
    }

    #[test]
    fn test_revalidation() -> Result<(), Error> {
        let grid = hourly_grid(4);
        let mut builder = NetworkBuilder::new(&grid);
        let wind = builder.wind("wind", 0.5, 1.0);
        builder.demand("demand", &wind, 5.0);
        let network = builder.build()?;

        let constraints = network.model().constraints().len();
        network.validate()?;
        network.validate()?;
        assert_eq!(network.model().constraints().len(), constraints);

        Ok(())
    }
}
