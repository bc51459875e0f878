use serde::Serialize;

use crate::{
    problem::{cost_matrix::Minutes, courier::CourierIdx, order::OrderIdx, priority::Priority},
    solver::raw_solution::{SolveStatistics, SolveStatus},
};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Assignment {
    pub courier: CourierIdx,
    pub order: OrderIdx,
    pub courier_id: String,
    pub order_id: String,
    pub priority: Priority,
    /// Cost matrix entry of the pair.
    pub time: Minutes,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PriorityBreakdown {
    pub priority: Priority,
    pub count: usize,
    pub total_time: Minutes,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CourierLoad {
    pub courier_id: String,
    pub orders: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Metrics {
    /// Priority-weighted total time.
    pub objective_value: f64,
    pub total_time: Minutes,
    pub average_time: Minutes,
    /// One entry per priority class, in priority order.
    pub per_priority: Vec<PriorityBreakdown>,
    /// Every courier, in id order, including idle ones.
    pub per_courier_load: Vec<CourierLoad>,
    /// Distinct couriers used over available couriers.
    pub courier_utilization: f64,
    /// Assigned orders over submitted orders.
    pub order_coverage: f64,
}

impl Metrics {
    pub fn priority(&self, priority: Priority) -> Option<&PriorityBreakdown> {
        self.per_priority.iter().find(|b| b.priority == priority)
    }
}

/// Validated result of one build → solve → extract run.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AllocationSolution {
    pub status: SolveStatus,
    /// Ordered by order id.
    pub assignments: Vec<Assignment>,
    pub metrics: Metrics,
    pub statistics: SolveStatistics,
}

impl AllocationSolution {
    /// `false` when the budget ran out before optimality was proven.
    pub fn is_proven_optimal(&self) -> bool {
        self.status.is_proven_optimal()
    }

    pub fn assignment_for(&self, order_id: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.order_id == order_id)
    }

    pub fn assignments_of<'a>(&'a self, courier_id: &'a str) -> impl Iterator<Item = &'a Assignment> {
        self.assignments
            .iter()
            .filter(move |a| a.courier_id == courier_id)
    }
}
