// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for validating a [`Network`].

mod validate_graph;
mod validate_time_series;

use crate::{Error, Network};

pub(crate) struct NetworkValidator<'a> {
    network: &'a Network,
}

/// `Network` validation.
impl Network {
    /// Checks the structure of the network: it must not be empty, every
    /// time series must match the network's time grid, and all nodes must be
    /// connected.
    ///
    /// This is done by [`Network::try_new`] already, and doesn't modify the
    /// network.
    pub fn validate(&self) -> Result<(), Error> {
        let validator = NetworkValidator { network: self };

        validator.validate_not_empty()?;
        validator.validate_time_series()?;
        validator.validate_connected_graph()?;

        Ok(())
    }
}
