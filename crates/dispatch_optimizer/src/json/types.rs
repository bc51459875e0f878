use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    error::DataValidationError,
    problem::{
        allocation_problem::{AllocationProblem, AllocationProblemBuilder},
        availability::Availability,
        courier::{Courier, CourierBuilder},
        location::Location,
        order::{Order, OrderBuilder},
        priority::Priority,
        restaurant::Restaurant,
    },
};

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "AllocationProblem")]
pub struct JsonAllocationProblem {
    pub id: Option<String>,
    pub couriers: Vec<JsonCourier>,
    pub orders: Vec<JsonOrder>,
    #[serde(default)]
    pub restaurants: Vec<JsonRestaurant>,
    /// `cost_matrix[courier][order]` in minutes, in the order couriers and
    /// orders are listed. Estimated from locations when absent.
    pub cost_matrix: Option<Vec<Vec<f64>>>,
    /// Reference instant for courier shifts.
    pub dispatch_time: Option<Timestamp>,
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "Location")]
pub struct JsonLocation {
    /// `[lon, lat]`
    pub coordinates: [f64; 2],
}

impl From<&JsonLocation> for Location {
    fn from(value: &JsonLocation) -> Self {
        Location::from_lat_lon(value.coordinates[1], value.coordinates[0])
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "Shift")]
pub struct JsonShift {
    pub start: Timestamp,
    pub end: Timestamp,
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "Courier")]
pub struct JsonCourier {
    pub id: String,
    pub capacity: u32,
    /// `false` takes precedence over `shift`.
    pub available: Option<bool>,
    pub shift: Option<JsonShift>,
    pub cost_rate: Option<f64>,
    pub location: Option<JsonLocation>,
    pub speed_kmh: Option<f64>,
}

impl From<&Courier> for JsonCourier {
    fn from(value: &Courier) -> Self {
        let (available, shift) = match value.availability() {
            Availability::Always => (None, None),
            Availability::Never => (Some(false), None),
            Availability::Window { start, end } => (
                None,
                Some(JsonShift {
                    start: *start,
                    end: *end,
                }),
            ),
        };

        JsonCourier {
            id: value.external_id().to_owned(),
            capacity: value.capacity(),
            available,
            shift,
            cost_rate: value.cost_rate(),
            location: value.location().map(|location| JsonLocation {
                coordinates: [location.lon(), location.lat()],
            }),
            speed_kmh: value.speed_kmh(),
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "Order")]
pub struct JsonOrder {
    pub id: String,
    pub priority: Priority,
    pub restaurant_id: Option<String>,
    pub customer_location: Option<JsonLocation>,
    /// Minutes.
    pub preparation_time: Option<f64>,
    /// Restaurant to customer, in minutes.
    pub delivery_time: Option<f64>,
    pub distance_km: Option<f64>,
    pub value: Option<f64>,
    pub size: Option<u32>,
}

impl From<&Order> for JsonOrder {
    fn from(value: &Order) -> Self {
        JsonOrder {
            id: value.external_id().to_owned(),
            priority: value.priority(),
            restaurant_id: value.restaurant_id().map(str::to_owned),
            customer_location: value.customer_location().map(|location| JsonLocation {
                coordinates: [location.lon(), location.lat()],
            }),
            preparation_time: Some(value.preparation_time()),
            delivery_time: Some(value.delivery_time()),
            distance_km: value.distance_km(),
            value: value.value(),
            size: Some(value.size()),
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "Restaurant")]
pub struct JsonRestaurant {
    pub id: String,
    pub location: Option<JsonLocation>,
}

impl JsonAllocationProblem {
    #[instrument(skip_all, level = "debug")]
    pub fn build_problem(self) -> Result<AllocationProblem, DataValidationError> {
        let mut builder = AllocationProblemBuilder::default();

        if let Some(id) = self.id {
            builder.set_id(id);
        }

        let couriers = self
            .couriers
            .into_iter()
            .map(|courier| {
                let mut builder = CourierBuilder::default();

                builder
                    .set_courier_id(courier.id)
                    .set_capacity(courier.capacity);

                let availability = match (courier.available, courier.shift) {
                    (Some(false), _) => Availability::Never,
                    (_, Some(shift)) => Availability::window(shift.start, shift.end),
                    _ => Availability::Always,
                };
                builder.set_availability(availability);

                if let Some(cost_rate) = courier.cost_rate {
                    builder.set_cost_rate(cost_rate);
                }

                if let Some(location) = &courier.location {
                    builder.set_location(location.into());
                }

                if let Some(speed_kmh) = courier.speed_kmh {
                    builder.set_speed_kmh(speed_kmh);
                }

                builder.build()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let orders = self
            .orders
            .into_iter()
            .map(|order| {
                let mut builder = OrderBuilder::default();

                builder.set_order_id(order.id).set_priority(order.priority);

                if let Some(restaurant_id) = order.restaurant_id {
                    builder.set_restaurant_id(restaurant_id);
                }

                if let Some(location) = &order.customer_location {
                    builder.set_customer_location(location.into());
                }

                if let Some(preparation_time) = order.preparation_time {
                    builder.set_preparation_time(preparation_time);
                }

                if let Some(delivery_time) = order.delivery_time {
                    builder.set_delivery_time(delivery_time);
                }

                if let Some(distance_km) = order.distance_km {
                    builder.set_distance_km(distance_km);
                }

                if let Some(value) = order.value {
                    builder.set_value(value);
                }

                if let Some(size) = order.size {
                    builder.set_size(size);
                }

                builder.build()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let restaurants = self
            .restaurants
            .iter()
            .map(|restaurant| {
                Restaurant::new(
                    restaurant.id.clone(),
                    restaurant.location.as_ref().map(Location::from),
                )
            })
            .collect();

        builder
            .set_couriers(couriers)
            .set_orders(orders)
            .set_restaurants(restaurants);

        if let Some(rows) = self.cost_matrix {
            builder.set_cost_matrix(rows);
        }

        if let Some(dispatch_time) = self.dispatch_time {
            builder.set_dispatch_time(dispatch_time);
        }

        builder.build()
    }
}
