// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A builder for [`Node`]s, which validates the node parameters.

use std::collections::{BTreeMap, BTreeSet};

use crate::{Error, Quantity, TimeSeries};

use super::{Commodities, ConvertFactor, Node, NodeKind, Storage};

/// Sets the optional parameters of a [`Node`].
///
/// Created by the constructors on [`Node`], e.g. [`Node::generic`].
#[derive(Clone, Debug)]
pub struct NodeBuilder {
    name: String,
    kind: NodeKind,
    inputs: Vec<String>,
    input_commodities: Option<Commodities>,
    profile: Option<TimeSeries>,
    costs: Option<Quantity>,
    convert_factor: Option<Quantity>,
    convert_factors: Option<BTreeMap<String, ConvertFactor>>,
    input_proportions: Option<BTreeMap<String, Quantity>>,
    output_proportions: Option<BTreeMap<String, Quantity>>,
    size_commodity: Option<String>,
    output_commodity: Option<String>,
    storage: Option<Storage>,
    input_flow_costs: Option<Quantity>,
}

impl NodeBuilder {
    pub(super) fn new(
        name: String,
        kind: NodeKind,
        inputs: &[&Node],
        input_commodities: Option<Commodities>,
    ) -> Self {
        Self {
            name,
            kind,
            inputs: inputs.iter().map(|n| n.name().to_string()).collect(),
            input_commodities,
            profile: None,
            costs: None,
            convert_factor: None,
            convert_factors: None,
            input_proportions: None,
            output_proportions: None,
            size_commodity: None,
            output_commodity: None,
            storage: None,
            input_flow_costs: None,
        }
    }

    pub(super) fn profile(mut self, profile: TimeSeries) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Costs per unit of size, e.g. `EUR/MW`.  A plain number is taken to be
    /// in the network's currency per unit of the size commodity.
    pub fn costs(mut self, costs: impl Into<Quantity>) -> Self {
        self.costs = Some(costs.into());
        self
    }

    /// The ratio of output to input flow, for nodes with one input and one
    /// output commodity.  Defaults to 1.
    pub fn convert_factor(mut self, factor: impl Into<Quantity>) -> Self {
        self.convert_factor = Some(factor.into());
        self
    }

    /// Ratios of output to input flows for nodes with several commodities,
    /// given as `(output commodity, input commodity, factor)`.
    pub fn convert_factors<O, I, Q>(mut self, factors: impl IntoIterator<Item = (O, I, Q)>) -> Self
    where
        O: Into<String>,
        I: Into<String>,
        Q: Into<Quantity>,
    {
        self.convert_factors = Some(
            factors
                .into_iter()
                .map(|(output, input, factor)| {
                    (
                        output.into(),
                        ConvertFactor {
                            input_commodity: input.into(),
                            factor: factor.into(),
                        },
                    )
                })
                .collect(),
        );
        self
    }

    /// Fixed ratios between the input flows, keyed either by input
    /// commodity or by input node name.
    pub fn input_proportions<K, Q>(mut self, proportions: impl IntoIterator<Item = (K, Q)>) -> Self
    where
        K: Into<String>,
        Q: Into<Quantity>,
    {
        self.input_proportions = Some(collect_proportions(proportions));
        self
    }

    /// Fixed ratios between the output flows, keyed either by output
    /// commodity or by output node name.
    pub fn output_proportions<K, Q>(
        mut self,
        proportions: impl IntoIterator<Item = (K, Q)>,
    ) -> Self
    where
        K: Into<String>,
        Q: Into<Quantity>,
    {
        self.output_proportions = Some(collect_proportions(proportions));
        self
    }

    /// The output commodity whose flow is limited by the node size.  Only
    /// needed for nodes with several output commodities.
    pub fn size_commodity(mut self, commodity: impl Into<String>) -> Self {
        self.size_commodity = Some(commodity.into());
        self
    }

    /// The output commodity of a node without downstream nodes.
    pub fn output_commodity(mut self, commodity: impl Into<String>) -> Self {
        self.output_commodity = Some(commodity.into());
        self
    }

    pub fn storage(mut self, storage: Storage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Costs per unit of input flow and hour, e.g. fuel costs in `EUR/MWh`.
    pub fn input_flow_costs(mut self, costs: impl Into<Quantity>) -> Self {
        self.input_flow_costs = Some(costs.into());
        self
    }

    /// Validates the parameters and creates the node.
    pub fn build(self) -> Result<Node, Error> {
        let name = self.name.as_str();
        if self.kind == NodeKind::ScalableOutput {
            return Err(Error::not_implemented(format!(
                "NodeKind::ScalableOutput is not implemented yet (node '{name}')."
            )));
        }
        if name.is_empty() {
            return Err(Error::invalid_node("Node name must not be empty."));
        }

        self.validate_inputs()?;
        let input_commodities = self.resolve_input_commodities()?;
        self.validate_profile()?;

        if let Some(costs) = &self.costs {
            if costs.magnitude() < 0.0 {
                return Err(Error::invalid_node(format!(
                    "Costs of node '{name}' must not be negative, got {costs}."
                )));
            }
        }

        let distinct_inputs = input_commodities.iter().collect::<BTreeSet<_>>();

        if self.kind == NodeKind::FixedOutput {
            if distinct_inputs.len() > 1 {
                return Err(Error::invalid_node(format!(
                    "Fixed output node '{name}' must have a single input commodity, got: {}.",
                    input_commodities.join(", ")
                )));
            }
            if self.storage.is_some() {
                return Err(Error::invalid_node(format!(
                    "Storage is not supported for fixed output node '{name}'."
                )));
            }
        }

        if self.kind != NodeKind::Generic {
            for (param, is_set) in [
                ("convert_factor", self.convert_factor.is_some()),
                ("convert_factors", self.convert_factors.is_some()),
                ("input_flow_costs", self.input_flow_costs.is_some()),
                ("output_commodity", self.output_commodity.is_some()),
            ] {
                if is_set {
                    return Err(Error::invalid_node(format!(
                        "Parameter {param} is only supported by generic nodes, \
                         but node '{name}' is of kind {}.",
                        self.kind
                    )));
                }
            }
        }
        if self.kind.is_input() && self.input_proportions.is_some() {
            return Err(Error::invalid_node(format!(
                "Input node '{name}' does not support input_proportions."
            )));
        }
        if self.kind.is_output() && self.output_proportions.is_some() {
            return Err(Error::invalid_node(format!(
                "Output node '{name}' does not support output_proportions."
            )));
        }

        if self.convert_factors.is_some() && self.convert_factor.is_some() {
            return Err(Error::invalid_node(format!(
                "Node '{name}': convert_factors can't be combined with convert_factor."
            )));
        }
        if let Some(factors) = &self.convert_factors {
            if factors.is_empty() {
                return Err(Error::invalid_node(format!(
                    "Node '{name}': convert_factors must not be empty."
                )));
            }
            for (output, factor) in factors {
                if !input_commodities.is_empty()
                    && !input_commodities.contains(&factor.input_commodity)
                {
                    return Err(Error::invalid_node(format!(
                        "Node '{name}': convert factor for '{output}' refers to input \
                         commodity '{}', which is not an input commodity of the node.",
                        factor.input_commodity
                    )));
                }
            }
        }

        match &self.input_proportions {
            Some(proportions) => check_proportions(
                name,
                "input",
                proportions,
                &input_commodities,
                &self.inputs,
            )?,
            None if distinct_inputs.len() > 1 && self.convert_factors.is_none() => {
                return Err(Error::invalid_node(format!(
                    "Node '{name}' has different input_commodities, \
                     but no input_proportions or convert_factors provided."
                )));
            }
            None => {}
        }

        if let Some(costs) = &self.input_flow_costs {
            if costs.magnitude() < 0.0 {
                return Err(Error::invalid_node(format!(
                    "input_flow_costs of node '{name}' must not be negative, got {costs}."
                )));
            }
            if distinct_inputs.len() > 1 {
                return Err(Error::invalid_node(format!(
                    "input_flow_costs require a single input commodity, \
                     but node '{name}' has: {}.",
                    input_commodities.join(", ")
                )));
            }
        }

        Ok(Node {
            name: self.name,
            kind: self.kind,
            inputs: self.inputs,
            input_commodities,
            profile: self.profile,
            costs: self.costs,
            convert_factor: self.convert_factor.unwrap_or_else(|| Quantity::from(1.0)),
            convert_factors: self.convert_factors,
            input_proportions: self.input_proportions,
            output_proportions: self.output_proportions,
            size_commodity: self.size_commodity,
            output_commodity: self.output_commodity,
            storage: self.storage,
            input_flow_costs: self.input_flow_costs,
        })
    }

    fn validate_inputs(&self) -> Result<(), Error> {
        let mut seen = BTreeSet::new();
        for input in &self.inputs {
            if *input == self.name {
                return Err(Error::invalid_node(format!(
                    "Node '{}' can't be its own input.",
                    self.name
                )));
            }
            if !seen.insert(input) {
                return Err(Error::invalid_node(format!(
                    "Node '{}' has input '{input}' more than once.",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// Broadcasts a single input commodity to all input edges, or checks that
    /// one commodity was given per input.
    fn resolve_input_commodities(&self) -> Result<Vec<String>, Error> {
        match &self.input_commodities {
            None => Ok(vec![]),
            Some(Commodities::Single(commodity)) => {
                Ok(vec![commodity.clone(); self.inputs.len().max(1)])
            }
            Some(Commodities::PerEdge(commodities)) => {
                if self.inputs.is_empty() && commodities.len() <= 1 {
                    return Ok(commodities.clone());
                }
                if commodities.len() != self.inputs.len() {
                    return Err(Error::invalid_node(format!(
                        "invalid number of input_commodities provided for node '{}': \
                         [{}], does not match number of inputs: {}",
                        self.name,
                        commodities.join(", "),
                        self.inputs.join(", ")
                    )));
                }
                Ok(commodities.clone())
            }
        }
    }

    fn validate_profile(&self) -> Result<(), Error> {
        let Some(profile) = &self.profile else {
            return Ok(());
        };
        if self.kind == NodeKind::ScalableInput {
            if let Some(unit) = profile.unit() {
                if !unit.is_dimensionless() {
                    return Err(Error::invalid_node(format!(
                        "input_profile of node '{}' must be dimensionless, got unit {unit}.",
                        self.name
                    )));
                }
            }
            if !profile.values().iter().all(|v| (0.0..=1.0).contains(v)) {
                return Err(Error::invalid_node(format!(
                    "invalid values in input_profile of node '{}': \
                     must be capacity factors, i.e. between 0 and 1",
                    self.name
                )));
            }
        } else if profile.values().iter().any(|v| !v.is_finite()) {
            return Err(Error::invalid_node(format!(
                "Flow of node '{}' contains non-finite values.",
                self.name
            )));
        }
        Ok(())
    }
}

fn collect_proportions<K, Q>(
    proportions: impl IntoIterator<Item = (K, Q)>,
) -> BTreeMap<String, Quantity>
where
    K: Into<String>,
    Q: Into<Quantity>,
{
    proportions
        .into_iter()
        .map(|(key, ratio)| (key.into(), ratio.into()))
        .collect()
}

/// Checks that proportions are keyed either by all commodities or by all
/// neighbours, and that every ratio is positive.
pub(crate) fn check_proportions(
    node: &str,
    direction: &str,
    proportions: &BTreeMap<String, Quantity>,
    commodities: &[String],
    neighbours: &[String],
) -> Result<(), Error> {
    let keys = proportions.keys().map(String::as_str).collect::<BTreeSet<_>>();
    let commodity_keys = commodities.iter().map(String::as_str).collect::<BTreeSet<_>>();
    let neighbour_keys = neighbours.iter().map(String::as_str).collect::<BTreeSet<_>>();

    if keys != commodity_keys && keys != neighbour_keys {
        return Err(Error::invalid_proportions(format!(
            "wrong parameter for node {node}: {direction}_proportions needs keys matching \
             either the {direction} commodities ({}) or the {direction} nodes ({})",
            commodity_keys.into_iter().collect::<Vec<_>>().join(", "),
            neighbour_keys.into_iter().collect::<Vec<_>>().join(", ")
        )));
    }
    if let Some((key, ratio)) = proportions.iter().find(|(_, r)| !(r.magnitude() > 0.0)) {
        return Err(Error::invalid_proportions(format!(
            "wrong parameter for node {node}: {direction}_proportions must be positive, \
             got {ratio} for '{key}'"
        )));
    }
    Ok(())
}
