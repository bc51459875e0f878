use std::sync::Arc;

use fxhash::{FxHashMap, FxHashSet};
use jiff::Timestamp;
use tracing::warn;

use crate::error::DataValidationError;

use super::{
    cost_matrix::{CostMatrix, Minutes},
    courier::{Courier, CourierIdx},
    order::{Order, OrderIdx},
    restaurant::{Restaurant, RestaurantIdx},
};

/// Immutable snapshot of one allocation round.
///
/// Couriers and orders are sorted by external id, so `CourierIdx`/`OrderIdx`
/// order is id order. The cost matrix is shared between derived problems
/// (see [`AllocationProblem::with_capacities`]).
#[derive(Debug, Clone)]
pub struct AllocationProblem {
    id: Option<String>,
    couriers: Vec<Courier>,
    orders: Vec<Order>,
    restaurants: Vec<Restaurant>,
    restaurant_index: FxHashMap<String, RestaurantIdx>,
    cost_matrix: Arc<CostMatrix>,
    dispatch_time: Option<Timestamp>,
}

impl AllocationProblem {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn couriers(&self) -> &[Courier] {
        &self.couriers
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn restaurants(&self) -> &[Restaurant] {
        &self.restaurants
    }

    pub fn courier(&self, courier_id: CourierIdx) -> &Courier {
        &self.couriers[courier_id]
    }

    pub fn order(&self, order_id: OrderIdx) -> &Order {
        &self.orders[order_id]
    }

    pub fn courier_ids(&self) -> impl Iterator<Item = CourierIdx> {
        CourierIdx::range(self.couriers.len())
    }

    pub fn order_ids(&self) -> impl Iterator<Item = OrderIdx> {
        OrderIdx::range(self.orders.len())
    }

    pub fn courier_index(&self, external_id: &str) -> Option<CourierIdx> {
        self.couriers
            .binary_search_by(|courier| courier.external_id().cmp(external_id))
            .ok()
            .map(CourierIdx::new)
    }

    pub fn order_index(&self, external_id: &str) -> Option<OrderIdx> {
        self.orders
            .binary_search_by(|order| order.external_id().cmp(external_id))
            .ok()
            .map(OrderIdx::new)
    }

    pub fn restaurant_of(&self, order: &Order) -> Option<&Restaurant> {
        order
            .restaurant_id()
            .and_then(|id| self.restaurant_index.get(id))
            .map(|&idx| &self.restaurants[idx])
    }

    pub fn cost_matrix(&self) -> &CostMatrix {
        &self.cost_matrix
    }

    pub fn cost(&self, courier_id: CourierIdx, order_id: OrderIdx) -> Minutes {
        self.cost_matrix.get(courier_id, order_id)
    }

    pub fn dispatch_time(&self) -> Option<Timestamp> {
        self.dispatch_time
    }

    pub fn is_courier_active(&self, courier_id: CourierIdx) -> bool {
        self.couriers[courier_id].is_available_at(self.dispatch_time)
    }

    pub fn active_couriers(&self) -> impl Iterator<Item = CourierIdx> + '_ {
        self.courier_ids().filter(|&id| self.is_courier_active(id))
    }

    pub fn active_courier_count(&self) -> usize {
        self.active_couriers().count()
    }

    pub fn total_active_capacity(&self) -> u64 {
        self.active_couriers()
            .map(|id| u64::from(self.couriers[id].capacity()))
            .sum()
    }

    /// Derived problem with new capacities (indexed like `couriers()`).
    /// Everything else, including the cost matrix, is shared.
    pub fn with_capacities(&self, capacities: &[u32]) -> AllocationProblem {
        debug_assert_eq!(capacities.len(), self.couriers.len());

        AllocationProblem {
            couriers: self
                .couriers
                .iter()
                .zip(capacities)
                .map(|(courier, &capacity)| courier.with_capacity(capacity))
                .collect(),
            ..self.clone()
        }
    }
}

#[derive(Default)]
pub struct AllocationProblemBuilder {
    id: Option<String>,
    couriers: Vec<Courier>,
    orders: Vec<Order>,
    restaurants: Vec<Restaurant>,
    cost_rows: Option<Vec<Vec<Minutes>>>,
    dispatch_time: Option<Timestamp>,
}

impl AllocationProblemBuilder {
    pub fn set_id(&mut self, id: impl Into<String>) -> &mut AllocationProblemBuilder {
        self.id = Some(id.into());
        self
    }

    pub fn set_couriers(&mut self, couriers: Vec<Courier>) -> &mut AllocationProblemBuilder {
        self.couriers = couriers;
        self
    }

    pub fn set_orders(&mut self, orders: Vec<Order>) -> &mut AllocationProblemBuilder {
        self.orders = orders;
        self
    }

    pub fn set_restaurants(
        &mut self,
        restaurants: Vec<Restaurant>,
    ) -> &mut AllocationProblemBuilder {
        self.restaurants = restaurants;
        self
    }

    /// Explicit `rows[courier][order]` times, indexed in the order couriers
    /// and orders were given to the builder. Without it the matrix is
    /// estimated from locations, speeds and order times.
    pub fn set_cost_matrix(&mut self, rows: Vec<Vec<Minutes>>) -> &mut AllocationProblemBuilder {
        self.cost_rows = Some(rows);
        self
    }

    pub fn set_dispatch_time(&mut self, dispatch_time: Timestamp) -> &mut AllocationProblemBuilder {
        self.dispatch_time = Some(dispatch_time);
        self
    }

    pub fn build(self) -> Result<AllocationProblem, DataValidationError> {
        let mut seen = FxHashSet::default();
        for courier in &self.couriers {
            if !seen.insert(courier.external_id()) {
                return Err(DataValidationError::DuplicateCourierId(
                    courier.external_id().to_owned(),
                ));
            }
        }

        let mut seen = FxHashSet::default();
        for order in &self.orders {
            if !seen.insert(order.external_id()) {
                return Err(DataValidationError::DuplicateOrderId(
                    order.external_id().to_owned(),
                ));
            }
        }

        let mut restaurant_index = FxHashMap::default();
        for (idx, restaurant) in self.restaurants.iter().enumerate() {
            if restaurant_index
                .insert(restaurant.external_id().to_owned(), RestaurantIdx::new(idx))
                .is_some()
            {
                return Err(DataValidationError::DuplicateRestaurantId(
                    restaurant.external_id().to_owned(),
                ));
            }
        }

        for order in &self.orders {
            if let Some(restaurant) = order
                .restaurant_id()
                .filter(|id| !restaurant_index.contains_key(*id))
            {
                return Err(DataValidationError::UnknownRestaurant {
                    order: order.external_id().to_owned(),
                    restaurant: restaurant.to_owned(),
                });
            }
        }

        let courier_order = sorted_positions(&self.couriers, Courier::external_id);
        let order_order = sorted_positions(&self.orders, Order::external_id);

        let cost_matrix = match self.cost_rows {
            Some(rows) => CostMatrix::from_rows(rows, self.couriers.len(), self.orders.len())?
                .permuted(&courier_order, &order_order),
            None => {
                let couriers = reorder(&self.couriers, &courier_order);
                let orders = reorder(&self.orders, &order_order);
                CostMatrix::estimate(&couriers, &orders, |order| {
                    order
                        .restaurant_id()
                        .and_then(|id| restaurant_index.get(id))
                        .map(|&idx| &self.restaurants[idx.get()])
                })
            }
        };

        if !cost_matrix.is_courier_dependent() && self.couriers.len() > 1 {
            warn!("cost matrix does not vary by courier, assignment only decides feasibility");
        }

        Ok(AllocationProblem {
            id: self.id,
            couriers: reorder(&self.couriers, &courier_order),
            orders: reorder(&self.orders, &order_order),
            restaurants: self.restaurants,
            restaurant_index,
            cost_matrix: Arc::new(cost_matrix),
            dispatch_time: self.dispatch_time,
        })
    }
}

fn sorted_positions<T>(items: &[T], key: impl Fn(&T) -> &str) -> Vec<usize> {
    let mut positions = (0..items.len()).collect::<Vec<_>>();
    positions.sort_by(|&a, &b| key(&items[a]).cmp(key(&items[b])));
    positions
}

fn reorder<T: Clone>(items: &[T], positions: &[usize]) -> Vec<T> {
    positions.iter().map(|&p| items[p].clone()).collect()
}
