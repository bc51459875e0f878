//! Descriptive statistics over an extracted solution, for reports.

use serde::Serialize;

use crate::{
    problem::{allocation_problem::AllocationProblem, cost_matrix::Minutes, priority::Priority},
    utils::stats,
};

use super::allocation_solution::AllocationSolution;

/// Upper edges of the delivery time bands, in minutes. The last band is
/// open-ended.
pub const TIME_BAND_EDGES: [Minutes; 4] = [30.0, 45.0, 60.0, 90.0];

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TimeBand {
    pub label: String,
    pub count: usize,
    pub share: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TimeDistribution {
    pub mean: Minutes,
    pub median: Minutes,
    pub std_dev: Minutes,
    pub min: Minutes,
    pub max: Minutes,
    pub q25: Minutes,
    pub q75: Minutes,
    pub bands: Vec<TimeBand>,
}

pub fn time_distribution(solution: &AllocationSolution) -> TimeDistribution {
    let times = solution
        .assignments
        .iter()
        .map(|a| a.time)
        .collect::<Vec<_>>();

    let mut counts = [0usize; TIME_BAND_EDGES.len() + 1];
    for &time in &times {
        let band = TIME_BAND_EDGES
            .iter()
            .position(|&edge| time <= edge)
            .unwrap_or(TIME_BAND_EDGES.len());
        counts[band] += 1;
    }

    let bands = counts
        .iter()
        .enumerate()
        .map(|(band, &count)| TimeBand {
            label: band_label(band),
            count,
            share: if times.is_empty() {
                0.0
            } else {
                count as f64 / times.len() as f64
            },
        })
        .collect();

    TimeDistribution {
        mean: stats::mean(&times),
        median: stats::median(&times),
        std_dev: stats::std_dev(&times),
        min: stats::min(&times),
        max: stats::max(&times),
        q25: stats::percentile(&times, 25.0),
        q75: stats::percentile(&times, 75.0),
        bands,
    }
}

fn band_label(band: usize) -> String {
    match band {
        0 => format!("<= {}", TIME_BAND_EDGES[0]),
        b if b == TIME_BAND_EDGES.len() => format!("> {}", TIME_BAND_EDGES[b - 1]),
        b => format!("{}-{}", TIME_BAND_EDGES[b - 1], TIME_BAND_EDGES[b]),
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CourierActivity {
    pub courier_id: String,
    pub orders: usize,
    pub total_time: Minutes,
    pub total_value: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CourierUtilization {
    /// Couriers with at least one order, in id order.
    pub couriers: Vec<CourierActivity>,
    pub mean_orders: f64,
    pub max_orders: usize,
    pub min_orders: usize,
    pub std_dev_orders: f64,
}

pub fn courier_utilization(
    problem: &AllocationProblem,
    solution: &AllocationSolution,
) -> CourierUtilization {
    let mut couriers: Vec<CourierActivity> = Vec::new();

    // Assignments are sorted by order, so group by courier index explicitly.
    let mut by_courier = vec![None::<CourierActivity>; problem.couriers().len()];
    for assignment in &solution.assignments {
        let activity = by_courier[assignment.courier.get()].get_or_insert_with(|| CourierActivity {
            courier_id: assignment.courier_id.clone(),
            orders: 0,
            total_time: 0.0,
            total_value: 0.0,
        });
        activity.orders += 1;
        activity.total_time += assignment.time;
        activity.total_value += problem.order(assignment.order).value().unwrap_or(0.0);
    }
    couriers.extend(by_courier.into_iter().flatten());

    let counts = couriers.iter().map(|c| c.orders as f64).collect::<Vec<_>>();

    CourierUtilization {
        mean_orders: stats::mean(&counts),
        max_orders: couriers.iter().map(|c| c.orders).max().unwrap_or(0),
        min_orders: couriers.iter().map(|c| c.orders).min().unwrap_or(0),
        std_dev_orders: stats::std_dev(&counts),
        couriers,
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PriorityStats {
    pub priority: Priority,
    pub count: usize,
    pub mean_time: Minutes,
    pub min_time: Minutes,
    pub max_time: Minutes,
    pub total_value: f64,
    pub mean_value: f64,
}

/// One entry per priority class that has at least one assignment.
pub fn priority_analysis(
    problem: &AllocationProblem,
    solution: &AllocationSolution,
) -> Vec<PriorityStats> {
    Priority::ALL
        .iter()
        .filter_map(|&priority| {
            let assignments = solution
                .assignments
                .iter()
                .filter(|a| a.priority == priority)
                .collect::<Vec<_>>();
            if assignments.is_empty() {
                return None;
            }

            let times = assignments.iter().map(|a| a.time).collect::<Vec<_>>();
            let values = assignments
                .iter()
                .map(|a| problem.order(a.order).value().unwrap_or(0.0))
                .collect::<Vec<_>>();

            Some(PriorityStats {
                priority,
                count: assignments.len(),
                mean_time: stats::mean(&times),
                min_time: stats::min(&times),
                max_time: stats::max(&times),
                total_value: values.iter().sum(),
                mean_value: stats::mean(&values),
            })
        })
        .collect()
}

/// The three analyses bundled for reports.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SolutionAnalysis {
    pub time_distribution: TimeDistribution,
    pub courier_utilization: CourierUtilization,
    pub priorities: Vec<PriorityStats>,
}

pub fn analyze(problem: &AllocationProblem, solution: &AllocationSolution) -> SolutionAnalysis {
    SolutionAnalysis {
        time_distribution: time_distribution(solution),
        courier_utilization: courier_utilization(problem, solution),
        priorities: priority_analysis(problem, solution),
    }
}
