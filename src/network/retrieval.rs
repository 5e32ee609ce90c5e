// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for retrieving nodes, the model and solved values from a
//! [`Network`].

use petgraph::graph::NodeIndex;

use super::iterators::{Neighbors, Nodes};
use super::storage::not_optimized;
use crate::{Error, LinExpr, Model, Network, NetworkConfig, Node, Solution, TimeGrid};

/// `Node` retrieval.
impl Network {
    /// Returns the node with the given name, if it exists.
    pub fn node(&self, name: &str) -> Result<&Node, Error> {
        self.index_of(name).map(|idx| &self.graph[idx])
    }

    /// Returns an iterator over the nodes in the network.
    pub fn nodes(&self) -> Nodes {
        Nodes {
            iter: self.graph.raw_nodes().iter(),
        }
    }

    /// Returns an iterator over the *input* nodes of the node with the given
    /// name.
    ///
    /// Returns an error if the given name does not exist.
    pub fn inputs(&self, name: &str) -> Result<Neighbors, Error> {
        self.index_of(name).map(|index| Neighbors {
            graph: &self.graph,
            iter: self
                .graph
                .neighbors_directed(index, petgraph::Direction::Incoming),
        })
    }

    /// Returns an iterator over the *output* nodes of the node with the given
    /// name.
    ///
    /// Returns an error if the given name does not exist.
    pub fn outputs(&self, name: &str) -> Result<Neighbors, Error> {
        self.index_of(name).map(|index| Neighbors {
            graph: &self.graph,
            iter: self
                .graph
                .neighbors_directed(index, petgraph::Direction::Outgoing),
        })
    }

    pub(super) fn index_of(&self, name: &str) -> Result<NodeIndex, Error> {
        self.node_indices
            .get(name)
            .copied()
            .ok_or_else(|| Error::node_not_found(format!("Node with name {name} not found.")))
    }
}

/// Accessors.
impl Network {
    pub fn time_grid(&self) -> &TimeGrid {
        &self.time_grid
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Returns the optimization model built from the network.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Returns the solution of the last successful
    /// [`optimize`][Network::optimize] call.
    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }
}

/// Solved values.
impl Network {
    /// Returns the optimal size of the node with the given name.
    ///
    /// Returns an error if the node doesn't exist, has no size, or the
    /// network hasn't been optimized.
    pub fn size(&self, name: &str) -> Result<f64, Error> {
        let idx = self.index_of(name)?;
        let size = self.states[idx.index()]
            .size
            .ok_or_else(|| Error::invalid_node(format!("Node '{name}' has no size.")))?;
        self.value_of(&LinExpr::from(size))
    }

    /// Returns the optimal storage size of the node with the given name.
    pub fn storage_size(&self, name: &str) -> Result<f64, Error> {
        let idx = self.index_of(name)?;
        let vars = self.states[idx.index()]
            .storage
            .as_ref()
            .ok_or_else(|| Error::invalid_node(format!("Node '{name}' has no storage.")))?;
        self.value_of(&LinExpr::from(vars.size))
    }

    /// Returns the optimal flow from node `from` to node `to`, one value per
    /// time step.
    pub fn flow(&self, from: &str, to: &str) -> Result<Vec<f64>, Error> {
        let source = self.index_of(from)?;
        let dest = self.index_of(to)?;
        let slot = self
            .graph
            .edges_connecting(source, dest)
            .next()
            .map(|edge| *edge.weight())
            .ok_or_else(|| {
                Error::invalid_network(format!("Node '{from}' is not an input of node '{to}'."))
            })?;

        let solution = self.solution.as_ref().ok_or_else(not_optimized)?;
        Ok(self.states[dest.index()].input_flows[slot]
            .iter()
            .map(|expr| solution.eval(expr))
            .collect())
    }

    fn value_of(&self, expr: &LinExpr) -> Result<f64, Error> {
        let solution = self.solution.as_ref().ok_or_else(not_optimized)?;
        Ok(solution.eval(expr))
    }
}
