// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Iterators over the nodes of a `Network`.

use petgraph::graph::DiGraph;

use crate::Node;

/// An iterator over the nodes in a `Network`, in the order they were passed
/// to [`Network::try_new`][crate::Network::try_new].
pub struct Nodes<'a> {
    pub(crate) iter: std::slice::Iter<'a, petgraph::graph::Node<Node>>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|n| &n.weight)
    }
}

/// An iterator over the input or output nodes of a node in a `Network`.
pub struct Neighbors<'a> {
    pub(crate) graph: &'a DiGraph<Node, usize>,
    pub(crate) iter: petgraph::graph::Neighbors<'a, usize>,
}

impl<'a> Iterator for Neighbors<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|i| &self.graph[i])
    }
}
