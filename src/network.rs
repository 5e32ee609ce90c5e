// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A graph of [`Node`]s and the optimization model compiled from it.

mod commodities;
mod constraints;
mod creation;
mod graph_view;
pub mod iterators;
mod objective;
mod optimization;
mod retrieval;
mod storage;
mod validation;
mod variables;

#[cfg(test)]
mod test_utils;

pub use graph_view::{GraphView, NodeRole, NodeView};

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::{LinExpr, Model, NetworkConfig, Node, Solution, TimeGrid, Var};

/// `Node`s stored in a `DiGraph` instance can be addressed with `NodeIndex`es.
///
/// `NodeIndexMap` stores the corresponding `NodeIndex` for any node name, so
/// that Nodes in the `DiGraph` can be retrieved from their names.
pub(crate) type NodeIndexMap = HashMap<String, NodeIndex>;

/// The flow over one edge, one expression per time step.
///
/// Depending on the node kind, this is a flow variable, a constant profile
/// or a profile scaled by a size variable.
pub(crate) type FlowSeries = Vec<LinExpr>;

/// The solver variables of a node's storage.
#[derive(Clone, Debug)]
pub(crate) struct StorageVars {
    size: Var,
    level: Vec<Var>,
    charge: Vec<Var>,
    discharge: Vec<Var>,
}

/// Everything the network derives for one node while building the model.
///
/// Kept apart from the [`Node`] descriptors, which stay unchanged.
#[derive(Clone, Debug, Default)]
pub(crate) struct NodeState {
    /// One commodity per input flow.
    input_commodities: Vec<String>,
    /// Downstream nodes, with the input slot this node occupies in each.
    outputs: Vec<(NodeIndex, usize)>,
    /// One commodity per output flow.
    output_commodities: Vec<String>,
    /// The commodity whose outflow is limited by the size.
    size_commodity: Option<String>,
    input_flows: Vec<FlowSeries>,
    output_flows: Vec<FlowSeries>,
    size: Option<Var>,
    storage: Option<StorageVars>,
}

/// A network of technologies and commodity junctions, compiled into a linear
/// optimization model that minimises the total costs.
///
/// Edges point from a node to the nodes that declared it as one of their
/// inputs.  The weight of an edge is the position of the source node in the
/// inputs of the destination node.
pub struct Network {
    graph: DiGraph<Node, usize>,
    node_indices: NodeIndexMap,
    time_grid: TimeGrid,
    config: NetworkConfig,
    states: Vec<NodeState>,
    model: Model,
    solution: Option<Solution>,
}
