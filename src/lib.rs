// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

/*!
# Commodity Network Optimizer

This is a library for describing energy and commodity systems as a network
of technologies, and for finding the sizes of those technologies that supply
the given demands at the lowest total costs.

A network is a directed graph of [`Node`]s.  Commodities such as
electricity, hydrogen or CO2 flow along the edges, from a node to the nodes
that list it as one of their inputs.  Every flow is defined on the time
steps of a [`TimeGrid`].

## Nodes

Nodes are created through the constructors on [`Node`]:

- [`fixed_input`][Node::fixed_input]: a source with a known input flow.
- [`scalable_input`][Node::scalable_input]: a source whose flow is a
  capacity factor profile times its size, e.g. wind or solar.
- [`fixed_output`][Node::fixed_output]: a sink with a known flow, e.g. a
  demand.
- [`generic`][Node::generic]: a technology or junction that converts its
  input flows into its output flows.

Nodes may have costs per unit of size, a [`Storage`], proportions between
their input or output flows, and conversion factors between commodities.

## Building the model

[`Network::try_new`] validates the nodes and the graph, and then compiles
them into a linear [`Model`]:

- a size variable for every node with costs,
- a flow variable for every edge and time step,
- flow balance, proportion, size limit and storage constraints for every
  node,
- an objective with the total costs, converted into a single currency.

If any validation step fails, an [`Error`] is returned before anything is
solved.

## Optimization

[`Network::optimize`] solves the model with the `minilp` backend of
`good_lp`.  The optimal sizes and flows are available through
[`Network::size`], [`Network::storage_size`] and [`Network::flow`], or
directly from the [`Solution`].
*/

mod config;
pub use config::NetworkConfig;

mod error;
pub use error::{Error, ErrorKind};

mod model;
pub use model::{Constraint, LinExpr, Model, Relation, Solution, SolveStatus, SolverChoice, Var};

mod network;
pub use network::{iterators, GraphView, Network, NodeRole, NodeView};

mod node;
pub use node::{Commodities, ConvertFactor, Node, NodeBuilder, NodeKind, Storage};

mod time_grid;
pub use time_grid::{TimeGrid, TimeSeries, DEFAULT_NUM_TIME_STEPS};

mod units;
pub use units::{Quantity, Unit, UnitMap};
