use jiff::Timestamp;
use serde::Serialize;

use crate::{define_index_newtype, error::DataValidationError};

use super::{availability::Availability, location::Location};

define_index_newtype!(CourierIdx, Courier);

#[derive(Serialize, Debug, Clone)]
pub struct Courier {
    external_id: String,
    capacity: u32,
    availability: Availability,
    cost_rate: Option<f64>,
    location: Option<Location>,
    speed_kmh: Option<f64>,
}

impl Courier {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    /// Maximum load the courier can carry in one assignment round.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn availability(&self) -> &Availability {
        &self.availability
    }

    pub fn is_available_at(&self, dispatch_time: Option<Timestamp>) -> bool {
        self.availability.is_available_at(dispatch_time)
    }

    /// Operating cost per hour, informational only.
    pub fn cost_rate(&self) -> Option<f64> {
        self.cost_rate
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn speed_kmh(&self) -> Option<f64> {
        self.speed_kmh
    }

    pub(crate) fn with_capacity(&self, capacity: u32) -> Courier {
        Courier {
            capacity,
            ..self.clone()
        }
    }
}

#[derive(Default)]
pub struct CourierBuilder {
    external_id: Option<String>,
    capacity: Option<u32>,
    availability: Option<Availability>,
    cost_rate: Option<f64>,
    location: Option<Location>,
    speed_kmh: Option<f64>,
}

impl CourierBuilder {
    pub fn set_courier_id(&mut self, external_id: impl Into<String>) -> &mut CourierBuilder {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn set_capacity(&mut self, capacity: u32) -> &mut CourierBuilder {
        self.capacity = Some(capacity);
        self
    }

    pub fn set_availability(&mut self, availability: Availability) -> &mut CourierBuilder {
        self.availability = Some(availability);
        self
    }

    pub fn set_cost_rate(&mut self, cost_rate: f64) -> &mut CourierBuilder {
        self.cost_rate = Some(cost_rate);
        self
    }

    pub fn set_location(&mut self, location: Location) -> &mut CourierBuilder {
        self.location = Some(location);
        self
    }

    pub fn set_speed_kmh(&mut self, speed_kmh: f64) -> &mut CourierBuilder {
        self.speed_kmh = Some(speed_kmh);
        self
    }

    pub fn build(self) -> Result<Courier, DataValidationError> {
        let external_id = self
            .external_id
            .ok_or_else(|| DataValidationError::Malformed("courier id is required".into()))?;

        let capacity = self.capacity.unwrap_or(1);
        if capacity == 0 {
            return Err(DataValidationError::ZeroCapacity(external_id));
        }

        let availability = self.availability.unwrap_or_default();
        if !availability.is_well_formed() {
            return Err(DataValidationError::InvalidAvailabilityWindow(external_id));
        }

        for (field, value) in [("cost_rate", self.cost_rate), ("speed_kmh", self.speed_kmh)] {
            if let Some(value) = value.filter(|v| !(v.is_finite() && *v >= 0.0)) {
                return Err(DataValidationError::InvalidNumber {
                    id: external_id,
                    field,
                    value,
                });
            }
        }

        if self.location.is_some_and(|location| !location.is_valid()) {
            return Err(DataValidationError::Malformed(format!(
                "courier `{external_id}` has an invalid location"
            )));
        }

        Ok(Courier {
            external_id,
            capacity,
            availability,
            cost_rate: self.cost_rate,
            location: self.location,
            speed_kmh: self.speed_kmh,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_defaults() {
        let mut builder = CourierBuilder::default();
        builder.set_courier_id("c1");
        let courier = builder.build().unwrap();

        assert_eq!(courier.external_id(), "c1");
        assert_eq!(courier.capacity(), 1);
        assert!(courier.is_available_at(None));
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let mut builder = CourierBuilder::default();
        builder.set_courier_id("c1").set_capacity(0);

        assert_eq!(
            builder.build().unwrap_err(),
            DataValidationError::ZeroCapacity("c1".into())
        );
    }

    #[test]
    fn test_negative_speed_is_rejected() {
        let mut builder = CourierBuilder::default();
        builder.set_courier_id("c1").set_speed_kmh(-3.0);

        assert!(matches!(
            builder.build(),
            Err(DataValidationError::InvalidNumber {
                field: "speed_kmh",
                ..
            })
        ));
    }

    #[test]
    fn test_missing_id_is_rejected() {
        assert!(CourierBuilder::default().build().is_err());
    }
}
