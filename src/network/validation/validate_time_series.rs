// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for validating the time series of the nodes in a [`Network`].

use crate::Error;

use super::NetworkValidator;

impl NetworkValidator<'_> {
    /// Validates that the profiles of all input and output nodes are defined
    /// on the time grid of the network.
    pub(super) fn validate_time_series(&self) -> Result<(), Error> {
        let time_grid = &self.network.time_grid;
        for node in self.network.graph.raw_nodes().iter().map(|n| &n.weight) {
            let Some(profile) = node.profile() else {
                continue;
            };
            let direction = if node.kind().is_output() {
                "output"
            } else {
                "input"
            };

            if profile.len() != time_grid.len() {
                return Err(Error::invalid_network(format!(
                    "Node {} has an {direction} flow with length {}, but the Network has {} \
                     time stamps.",
                    node.name(),
                    profile.len(),
                    time_grid.len()
                )));
            }
            if profile.grid() != time_grid {
                return Err(Error::invalid_network(format!(
                    "Node {} has an {direction} flow with time_coords different from the \
                     Network.",
                    node.name()
                )));
            }
        }
        Ok(())
    }
}
