use serde::Serialize;

use crate::error::DataValidationError;

use super::{
    courier::{Courier, CourierIdx},
    order::{Order, OrderIdx},
    restaurant::Restaurant,
};

pub type Minutes = f64;

/// Travel time charged when a courier cannot reach a restaurant
/// (no speed, or zero speed).
pub const UNREACHABLE_PENALTY: Minutes = 9999.0;

/// Estimated total delivery time for every (courier, order) pair.
///
/// Stored flat, courier-major: `index = courier * num_orders + order`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CostMatrix {
    times: Vec<Minutes>,
    num_couriers: usize,
    num_orders: usize,
}

impl CostMatrix {
    /// Builds a matrix from `rows[courier][order]`, rejecting ragged or
    /// non-finite/negative input.
    pub fn from_rows(
        rows: Vec<Vec<Minutes>>,
        num_couriers: usize,
        num_orders: usize,
    ) -> Result<Self, DataValidationError> {
        let ragged = rows.iter().find(|row| row.len() != num_orders);
        if rows.len() != num_couriers || ragged.is_some() {
            return Err(DataValidationError::CostMatrixShape {
                rows: rows.len(),
                columns: ragged.or(rows.first()).map_or(0, |row| row.len()),
                couriers: num_couriers,
                orders: num_orders,
            });
        }

        for (i, row) in rows.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                if !(value.is_finite() && value >= 0.0) {
                    return Err(DataValidationError::InvalidNumber {
                        id: format!("cost_matrix[{i}][{j}]"),
                        field: "time",
                        value,
                    });
                }
            }
        }

        Ok(CostMatrix {
            times: rows.into_iter().flatten().collect(),
            num_couriers,
            num_orders,
        })
    }

    /// Estimates each pair as courier → restaurant travel plus preparation
    /// plus the order's base delivery time.
    pub fn estimate<'a>(
        couriers: &[Courier],
        orders: &[Order],
        restaurant_of: impl Fn(&Order) -> Option<&'a Restaurant>,
    ) -> Self {
        let mut times = Vec::with_capacity(couriers.len() * orders.len());
        for courier in couriers {
            for order in orders {
                times.push(estimate_pair_time(courier, order, restaurant_of(order)));
            }
        }

        CostMatrix {
            times,
            num_couriers: couriers.len(),
            num_orders: orders.len(),
        }
    }

    pub fn get(&self, courier: CourierIdx, order: OrderIdx) -> Minutes {
        self.times[courier.get() * self.num_orders + order.get()]
    }

    pub fn row(&self, courier: CourierIdx) -> &[Minutes] {
        let start = courier.get() * self.num_orders;
        &self.times[start..start + self.num_orders]
    }

    pub fn num_couriers(&self) -> usize {
        self.num_couriers
    }

    pub fn num_orders(&self) -> usize {
        self.num_orders
    }

    /// `false` when every order costs the same whatever the courier, in which
    /// case the objective cannot discriminate between couriers.
    pub fn is_courier_dependent(&self) -> bool {
        if self.num_couriers < 2 {
            return false;
        }

        (0..self.num_orders).any(|order| {
            let first = self.times[order];
            (1..self.num_couriers)
                .any(|courier| self.times[courier * self.num_orders + order] != first)
        })
    }

    /// Reorders rows and columns: new row `r` is old row `courier_order[r]`.
    pub(crate) fn permuted(&self, courier_order: &[usize], order_order: &[usize]) -> Self {
        let mut times = Vec::with_capacity(self.times.len());
        for &old_courier in courier_order {
            for &old_order in order_order {
                times.push(self.times[old_courier * self.num_orders + old_order]);
            }
        }

        CostMatrix {
            times,
            num_couriers: self.num_couriers,
            num_orders: self.num_orders,
        }
    }
}

/// Travel uses the haversine distance between the courier and the
/// restaurant when both are located, otherwise the order's own distance.
pub fn estimate_pair_time(
    courier: &Courier,
    order: &Order,
    restaurant: Option<&Restaurant>,
) -> Minutes {
    let distance_km = match (courier.location(), restaurant.and_then(|r| r.location())) {
        (Some(from), Some(to)) => Some(from.haversine_distance_km(to)),
        _ => order.distance_km(),
    };

    let travel = match (distance_km, courier.speed_kmh()) {
        (None, _) => 0.0,
        (Some(distance), Some(speed)) if speed > 0.0 => distance / speed * 60.0,
        (Some(_), _) => UNREACHABLE_PENALTY,
    };

    travel + order.preparation_time() + order.delivery_time()
}
