// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module is only compiled when running unit tests and contains features
//! that are shared by all tests of the `network` module.
//!
//! - `hourly_grid`, `grid_with_step` and `assert_close`.
//! - the `NetworkBuilder`, which collects nodes with a few common shapes and
//!   builds a `Network` from them.

use crate::{Error, Network, NetworkConfig, Node, TimeGrid, TimeSeries};

pub(crate) fn hourly_grid(len: usize) -> TimeGrid {
    TimeGrid::hourly(2020, len).unwrap()
}

/// A grid of `len` time steps, each `hours` long.
pub(crate) fn grid_with_step(hours: i64, len: usize) -> TimeGrid {
    let start = hourly_grid(1).start();
    TimeGrid::try_new(start, chrono::Duration::hours(hours), len).unwrap()
}

#[track_caller]
pub(crate) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= 1e-6 * expected.abs().max(1.0),
        "expected {expected}, got {actual}"
    );
}

/// Collects nodes for a `Network`.
///
/// Every method adds a node and returns a clone of it, so that it can be
/// passed as input to the next nodes.
pub(crate) struct NetworkBuilder {
    grid: TimeGrid,
    nodes: Vec<Node>,
}

impl NetworkBuilder {
    pub(crate) fn new(grid: &TimeGrid) -> Self {
        NetworkBuilder {
            grid: grid.clone(),
            nodes: vec![],
        }
    }

    pub(crate) fn add(&mut self, node: Node) -> Node {
        self.nodes.push(node.clone());
        node
    }

    /// A scalable input with a constant capacity factor.
    pub(crate) fn wind(&mut self, name: &str, capacity_factor: f64, costs: f64) -> Node {
        self.add(
            Node::scalable_input(name, TimeSeries::constant(capacity_factor, &self.grid))
                .costs(costs)
                .build()
                .unwrap(),
        )
    }

    /// A fixed input with a constant flow.
    pub(crate) fn fixed_input(&mut self, name: &str, value: f64) -> Node {
        self.add(
            Node::fixed_input(name, TimeSeries::constant(value, &self.grid))
                .build()
                .unwrap(),
        )
    }

    /// A generic node without costs.
    pub(crate) fn junction(&mut self, name: &str, inputs: &[&Node], commodity: &str) -> Node {
        self.add(Node::generic(name, inputs, commodity).build().unwrap())
    }

    /// A constant electricity demand.
    pub(crate) fn demand(&mut self, name: &str, input: &Node, value: f64) -> Node {
        self.demand_of(name, input, "electricity", value)
    }

    pub(crate) fn demand_of(
        &mut self,
        name: &str,
        input: &Node,
        commodity: &str,
        value: f64,
    ) -> Node {
        self.add(
            Node::fixed_output(
                name,
                &[input],
                commodity,
                TimeSeries::constant(value, &self.grid),
            )
            .build()
            .unwrap(),
        )
    }

    pub(crate) fn build(self) -> Result<Network, Error> {
        self.build_with(NetworkConfig::default())
    }

    pub(crate) fn build_with(self, config: NetworkConfig) -> Result<Network, Error> {
        Network::try_new(self.nodes, self.grid, config)
    }
}
