// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the configuration options for the `Network`.

use crate::{Unit, UnitMap};

/// Configuration options for the `Network`.
#[derive(Clone, Debug)]
pub struct NetworkConfig {
    /// The currency the total costs are expressed in.
    pub currency: String,

    /// The canonical unit of each commodity.  Flows, proportions and
    /// conversion factors given as plain numbers are taken to be in these
    /// units.
    pub units: UnitMap,

    /// The name of the solver used by `Network::optimize`.
    pub solver: String,

    /// Whether `Network::optimize` checks that every storage with costs is
    /// completely emptied and completely filled at least once.
    pub check_storage_plausibility: bool,

    /// Tolerance of the storage plausibility check, relative to
    /// `max(1, storage size)`.
    pub plausibility_tolerance: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            currency: String::from("EUR"),
            units: UnitMap::default(),
            solver: String::from("minilp"),
            check_storage_plausibility: true,
            plausibility_tolerance: 1e-6,
        }
    }
}

impl NetworkConfig {
    /// Overrides the unit of a commodity, or adds a new commodity.
    pub fn with_unit(mut self, commodity: impl Into<String>, unit: Unit) -> Self {
        self.units.insert(commodity, unit);
        self
    }
}
