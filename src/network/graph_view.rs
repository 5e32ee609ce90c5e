// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A read-only view of the structure of a [`Network`], for drawing it.

use crate::{Network, NodeKind};

/// The role of a node in a drawing of the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeRole {
    Input,
    Output,
    Generic,
}

impl From<NodeKind> for NodeRole {
    fn from(kind: NodeKind) -> Self {
        if kind.is_input() {
            NodeRole::Input
        } else if kind.is_output() {
            NodeRole::Output
        } else {
            NodeRole::Generic
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeView {
    pub name: String,
    pub role: NodeRole,
    pub has_storage: bool,
}

/// Node names, roles and storage attachment, plus `(from, to)` edges.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphView {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<(String, String)>,
}

impl Network {
    /// Returns a view of the nodes and edges of the network.
    pub fn graph_view(&self) -> GraphView {
        let nodes = self
            .nodes()
            .map(|node| NodeView {
                name: node.name().to_string(),
                role: node.kind().into(),
                has_storage: node.storage().is_some(),
            })
            .collect();
        let edges = self
            .graph
            .raw_edges()
            .iter()
            .map(|edge| {
                (
                    self.graph[edge.source()].name().to_string(),
                    self.graph[edge.target()].name().to_string(),
                )
            })
            .collect();

        GraphView { nodes, edges }
    }
}
