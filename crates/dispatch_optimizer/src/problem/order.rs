use serde::Serialize;

use crate::{define_index_newtype, error::DataValidationError};

use super::{cost_matrix::Minutes, location::Location, priority::Priority};

define_index_newtype!(OrderIdx, Order);

#[derive(Serialize, Debug, Clone)]
pub struct Order {
    external_id: String,
    priority: Priority,
    restaurant_id: Option<String>,
    customer_location: Option<Location>,
    preparation_time: Minutes,
    delivery_time: Minutes,
    distance_km: Option<f64>,
    value: Option<f64>,
    size: u32,
}

impl Order {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn restaurant_id(&self) -> Option<&str> {
        self.restaurant_id.as_deref()
    }

    pub fn customer_location(&self) -> Option<&Location> {
        self.customer_location.as_ref()
    }

    pub fn preparation_time(&self) -> Minutes {
        self.preparation_time
    }

    /// Base restaurant → customer travel time.
    pub fn delivery_time(&self) -> Minutes {
        self.delivery_time
    }

    pub fn distance_km(&self) -> Option<f64> {
        self.distance_km
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Load units the order consumes under the size capacity measure.
    pub fn size(&self) -> u32 {
        self.size
    }
}

#[derive(Default)]
pub struct OrderBuilder {
    external_id: Option<String>,
    priority: Option<Priority>,
    restaurant_id: Option<String>,
    customer_location: Option<Location>,
    preparation_time: Option<Minutes>,
    delivery_time: Option<Minutes>,
    distance_km: Option<f64>,
    value: Option<f64>,
    size: Option<u32>,
}

impl OrderBuilder {
    pub fn set_order_id(&mut self, external_id: impl Into<String>) -> &mut OrderBuilder {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn set_priority(&mut self, priority: Priority) -> &mut OrderBuilder {
        self.priority = Some(priority);
        self
    }

    pub fn set_restaurant_id(&mut self, restaurant_id: impl Into<String>) -> &mut OrderBuilder {
        self.restaurant_id = Some(restaurant_id.into());
        self
    }

    pub fn set_customer_location(&mut self, location: Location) -> &mut OrderBuilder {
        self.customer_location = Some(location);
        self
    }

    pub fn set_preparation_time(&mut self, minutes: Minutes) -> &mut OrderBuilder {
        self.preparation_time = Some(minutes);
        self
    }

    pub fn set_delivery_time(&mut self, minutes: Minutes) -> &mut OrderBuilder {
        self.delivery_time = Some(minutes);
        self
    }

    pub fn set_distance_km(&mut self, distance_km: f64) -> &mut OrderBuilder {
        self.distance_km = Some(distance_km);
        self
    }

    pub fn set_value(&mut self, value: f64) -> &mut OrderBuilder {
        self.value = Some(value);
        self
    }

    pub fn set_size(&mut self, size: u32) -> &mut OrderBuilder {
        self.size = Some(size);
        self
    }

    pub fn build(self) -> Result<Order, DataValidationError> {
        let external_id = self
            .external_id
            .ok_or_else(|| DataValidationError::Malformed("order id is required".into()))?;

        let preparation_time = self.preparation_time.unwrap_or(0.0);
        let delivery_time = self.delivery_time.unwrap_or(0.0);

        for (field, value) in [
            ("preparation_time", Some(preparation_time)),
            ("delivery_time", Some(delivery_time)),
            ("distance_km", self.distance_km),
            ("value", self.value),
        ] {
            if let Some(value) = value.filter(|v| !(v.is_finite() && *v >= 0.0)) {
                return Err(DataValidationError::InvalidNumber {
                    id: external_id,
                    field,
                    value,
                });
            }
        }

        Ok(Order {
            external_id,
            priority: self.priority.unwrap_or_default(),
            restaurant_id: self.restaurant_id,
            customer_location: self.customer_location,
            preparation_time,
            delivery_time,
            distance_km: self.distance_km,
            value: self.value,
            size: self.size.unwrap_or(1),
        })
    }
}
