// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The technologies and commodity junctions that make up a
//! [`Network`][crate::Network].
//!
//! Nodes are immutable descriptors.  They are created through one of the
//! constructors on [`Node`], which return a [`NodeBuilder`] for setting
//! optional parameters, and are handed over to the `Network`, which derives
//! all edges, commodities and solver variables from them.
//!
//! ```
//! use commodity_network_optimizer::{Node, TimeGrid, TimeSeries};
//!
//! let grid = TimeGrid::hourly(2020, 24)?;
//! let wind = Node::scalable_input("wind", TimeSeries::constant(0.5, &grid))
//!     .costs(1.0)
//!     .build()?;
//! let demand = Node::fixed_output(
//!     "demand",
//!     &[&wind],
//!     "electricity",
//!     TimeSeries::constant(5.0, &grid),
//! )
//! .build()?;
//!
//! assert_eq!(demand.inputs(), ["wind"]);
//! # Ok::<(), commodity_network_optimizer::Error>(())
//! ```

mod builder;
mod storage;

pub use builder::NodeBuilder;
pub(crate) use builder::check_proportions;
pub use storage::Storage;

use std::collections::BTreeMap;

use crate::{Quantity, TimeSeries};

/// The capabilities of a [`Node`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A source with a given input flow, e.g. a CO2 stream.  It has a size
    /// only if it has costs.
    FixedInput,
    /// A source whose input flow is a capacity factor profile scaled by its
    /// size, e.g. wind or solar PV.
    ScalableInput,
    /// A sink with a given output flow, e.g. a demand.
    FixedOutput,
    /// A sink whose output profile is scaled by its size.  Not implemented.
    ScalableOutput,
    /// A conversion technology or commodity junction, whose flows are all
    /// determined by its neighbours, e.g. an electrolyzer.
    Generic,
}

impl NodeKind {
    /// Returns true for nodes whose input flow is given by a time series.
    pub fn is_input(&self) -> bool {
        matches!(self, NodeKind::FixedInput | NodeKind::ScalableInput)
    }

    /// Returns true for nodes whose output flow is given by a time series.
    pub fn is_output(&self) -> bool {
        matches!(self, NodeKind::FixedOutput | NodeKind::ScalableOutput)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The commodities flowing into a node.
///
/// `Single` applies one commodity to all input edges, `PerEdge` gives one
/// commodity for each input, in the order of the inputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Commodities {
    Single(String),
    PerEdge(Vec<String>),
}

impl From<&str> for Commodities {
    fn from(commodity: &str) -> Self {
        Commodities::Single(commodity.to_string())
    }
}

impl From<String> for Commodities {
    fn from(commodity: String) -> Self {
        Commodities::Single(commodity)
    }
}

impl From<Vec<String>> for Commodities {
    fn from(commodities: Vec<String>) -> Self {
        Commodities::PerEdge(commodities)
    }
}

impl From<Vec<&str>> for Commodities {
    fn from(commodities: Vec<&str>) -> Self {
        Commodities::PerEdge(commodities.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Commodities {
    fn from(commodities: [&str; N]) -> Self {
        Commodities::PerEdge(commodities.into_iter().map(String::from).collect())
    }
}

/// A conversion from one input commodity to an output commodity.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvertFactor {
    pub input_commodity: String,
    pub factor: Quantity,
}

/// A technology or commodity junction.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    name: String,
    kind: NodeKind,
    inputs: Vec<String>,
    input_commodities: Vec<String>,
    profile: Option<TimeSeries>,
    costs: Option<Quantity>,
    convert_factor: Quantity,
    convert_factors: Option<BTreeMap<String, ConvertFactor>>,
    input_proportions: Option<BTreeMap<String, Quantity>>,
    output_proportions: Option<BTreeMap<String, Quantity>>,
    size_commodity: Option<String>,
    output_commodity: Option<String>,
    storage: Option<Storage>,
    input_flow_costs: Option<Quantity>,
}

/// Node constructors.
impl Node {
    /// A source with a fixed input flow, e.g. a CO2 stream from a refinery.
    pub fn fixed_input(name: impl Into<String>, input_flow: TimeSeries) -> NodeBuilder {
        NodeBuilder::new(name.into(), NodeKind::FixedInput, &[], None).profile(input_flow)
    }

    /// A source whose input flow is `input_profile * size`.  The profile
    /// holds capacity factors, which must lie in `[0, 1]`.
    pub fn scalable_input(name: impl Into<String>, input_profile: TimeSeries) -> NodeBuilder {
        NodeBuilder::new(name.into(), NodeKind::ScalableInput, &[], None).profile(input_profile)
    }

    /// A sink with a fixed output flow, e.g. a demand.
    pub fn fixed_output(
        name: impl Into<String>,
        inputs: &[&Node],
        input_commodities: impl Into<Commodities>,
        output_flow: TimeSeries,
    ) -> NodeBuilder {
        NodeBuilder::new(
            name.into(),
            NodeKind::FixedOutput,
            inputs,
            Some(input_commodities.into()),
        )
        .profile(output_flow)
    }

    /// A sink with a scaled output profile.  Building it fails, because this
    /// kind of node is not implemented.
    pub fn scalable_output(
        name: impl Into<String>,
        inputs: &[&Node],
        input_commodities: impl Into<Commodities>,
        output_profile: TimeSeries,
    ) -> NodeBuilder {
        NodeBuilder::new(
            name.into(),
            NodeKind::ScalableOutput,
            inputs,
            Some(input_commodities.into()),
        )
        .profile(output_profile)
    }

    /// A node whose flows are all determined by its neighbours.  It has a
    /// size if it has costs.
    pub fn generic(
        name: impl Into<String>,
        inputs: &[&Node],
        input_commodities: impl Into<Commodities>,
    ) -> NodeBuilder {
        NodeBuilder::new(
            name.into(),
            NodeKind::Generic,
            inputs,
            Some(input_commodities.into()),
        )
    }
}

/// Node accessors.
impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns the names of the input nodes, in declaration order.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Returns the declared input commodities, one per input edge.
    ///
    /// Nodes without inputs have a single entry for their leaf input flow,
    /// or none at all if it is inferred from the output commodity.
    pub fn input_commodities(&self) -> &[String] {
        &self.input_commodities
    }

    /// Returns the input flow of input nodes, the capacity factors of
    /// scalable input nodes, or the output flow of output nodes.
    pub fn profile(&self) -> Option<&TimeSeries> {
        self.profile.as_ref()
    }

    pub fn costs(&self) -> Option<&Quantity> {
        self.costs.as_ref()
    }

    pub fn convert_factor(&self) -> &Quantity {
        &self.convert_factor
    }

    /// Returns the conversion factors keyed by output commodity.
    pub fn convert_factors(&self) -> Option<&BTreeMap<String, ConvertFactor>> {
        self.convert_factors.as_ref()
    }

    pub fn input_proportions(&self) -> Option<&BTreeMap<String, Quantity>> {
        self.input_proportions.as_ref()
    }

    pub fn output_proportions(&self) -> Option<&BTreeMap<String, Quantity>> {
        self.output_proportions.as_ref()
    }

    pub fn size_commodity(&self) -> Option<&str> {
        self.size_commodity.as_deref()
    }

    pub fn output_commodity(&self) -> Option<&str> {
        self.output_commodity.as_deref()
    }

    pub fn storage(&self) -> Option<&Storage> {
        self.storage.as_ref()
    }

    pub fn input_flow_costs(&self) -> Option<&Quantity> {
        self.input_flow_costs.as_ref()
    }

    /// Returns true if the node gets a size variable.
    ///
    /// Scalable input nodes are always sized, all other nodes only when they
    /// have non-zero costs.
    pub fn has_size(&self) -> bool {
        self.kind == NodeKind::ScalableInput || self.has_costs()
    }

    pub(crate) fn has_costs(&self) -> bool {
        self.costs.as_ref().is_some_and(|c| c.magnitude() != 0.0)
    }
}
