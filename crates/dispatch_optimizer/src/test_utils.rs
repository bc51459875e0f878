use crate::problem::{
    allocation_problem::{AllocationProblem, AllocationProblemBuilder},
    availability::Availability,
    courier::{Courier, CourierBuilder},
    order::{Order, OrderBuilder},
    priority::Priority,
};

/// Couriers `c00`, `c01`, ... and orders `o00`, `o01`, ... with an explicit
/// cost matrix.
pub fn fixed_problem(
    capacities: &[u32],
    priorities: &[Priority],
    costs: Vec<Vec<f64>>,
) -> AllocationProblem {
    let mut fixture = ProblemFixture::new();
    for (index, &capacity) in capacities.iter().enumerate() {
        fixture = fixture.courier(&format!("c{index:02}"), capacity);
    }
    for (index, &priority) in priorities.iter().enumerate() {
        fixture = fixture.order(&format!("o{index:02}"), priority);
    }
    fixture.costs(costs).build()
}

#[derive(Default)]
pub struct ProblemFixture {
    couriers: Vec<Courier>,
    orders: Vec<Order>,
    costs: Option<Vec<Vec<f64>>>,
}

impl ProblemFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn courier(mut self, id: &str, capacity: u32) -> Self {
        let mut builder = CourierBuilder::default();
        builder.set_courier_id(id).set_capacity(capacity);
        self.couriers.push(builder.build().unwrap());
        self
    }

    pub fn inactive_courier(mut self, id: &str, capacity: u32) -> Self {
        let mut builder = CourierBuilder::default();
        builder
            .set_courier_id(id)
            .set_capacity(capacity)
            .set_availability(Availability::Never);
        self.couriers.push(builder.build().unwrap());
        self
    }

    pub fn order(self, id: &str, priority: Priority) -> Self {
        self.sized_order(id, priority, 1)
    }

    pub fn sized_order(mut self, id: &str, priority: Priority, size: u32) -> Self {
        let mut builder = OrderBuilder::default();
        builder.set_order_id(id).set_priority(priority).set_size(size);
        self.orders.push(builder.build().unwrap());
        self
    }

    pub fn costs(mut self, costs: Vec<Vec<f64>>) -> Self {
        self.costs = Some(costs);
        self
    }

    pub fn build(self) -> AllocationProblem {
        let mut builder = AllocationProblemBuilder::default();
        builder.set_couriers(self.couriers).set_orders(self.orders);
        if let Some(costs) = self.costs {
            builder.set_cost_matrix(costs);
        }
        builder.build().unwrap()
    }
}
