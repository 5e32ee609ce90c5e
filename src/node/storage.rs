// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Storage attached to a node.

use crate::{Error, Quantity};

/// A buffer for the size commodity of a node, e.g. a battery or a hydrogen
/// tank.
///
/// The storage size is measured in the unit of the stored commodity times
/// hours, i.e. in MWh for electricity given in MW.
#[derive(Clone, Debug, PartialEq)]
pub struct Storage {
    costs: Quantity,
    max_charging_speed: f64,
    storage_loss: f64,
    charging_loss: f64,
}

impl Storage {
    /// Creates a storage.
    ///
    /// - `costs`: costs per unit of storage size.
    /// - `max_charging_speed`: share of the size that can be charged or
    ///   discharged per hour, in `(0, 1]`.
    /// - `storage_loss`: share of the level that is lost per hour, in `[0, 1)`.
    /// - `charging_loss`: share of each charged amount that is lost, in
    ///   `[0, 1)`.
    pub fn try_new(
        costs: impl Into<Quantity>,
        max_charging_speed: f64,
        storage_loss: f64,
        charging_loss: f64,
    ) -> Result<Self, Error> {
        if !(0.0..1.0).contains(&storage_loss) {
            return Err(Error::invalid_node(format!(
                "storage_loss must be in [0, 1), got {storage_loss}."
            )));
        }
        if !(0.0..1.0).contains(&charging_loss) {
            return Err(Error::invalid_node(format!(
                "charging_loss must be in [0, 1), got {charging_loss}."
            )));
        }
        if !(max_charging_speed > 0.0 && max_charging_speed <= 1.0) {
            return Err(Error::invalid_node(format!(
                "max_charging_speed must be in (0, 1], got {max_charging_speed}."
            )));
        }
        let costs = costs.into();
        if costs.magnitude() < 0.0 {
            return Err(Error::invalid_node(format!(
                "Storage costs must not be negative, got {costs}."
            )));
        }

        Ok(Self {
            costs,
            max_charging_speed,
            storage_loss,
            charging_loss,
        })
    }

    pub fn costs(&self) -> &Quantity {
        &self.costs
    }

    pub fn max_charging_speed(&self) -> f64 {
        self.max_charging_speed
    }

    pub fn storage_loss(&self) -> f64 {
        self.storage_loss
    }

    pub fn charging_loss(&self) -> f64 {
        self.charging_loss
    }
}
