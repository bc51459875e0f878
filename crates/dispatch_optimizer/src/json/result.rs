use std::collections::BTreeMap;

use jiff::SignedDuration;
use serde::Serialize;

use crate::{
    problem::{allocation_problem::AllocationProblem, cost_matrix::Minutes, priority::Priority},
    sensitivity::{
        sweep::{SweepOutcome, SweepPoint, SweepReport},
        sweep_parameter::SweepParameter,
    },
    solution::{
        allocation_solution::{AllocationSolution, Assignment, Metrics},
        analysis::{self, SolutionAnalysis},
    },
    solver::raw_solution::{SolveStatistics, SolveStatus, TieBreakOutcome},
};

#[derive(Serialize, Debug)]
#[serde(rename = "Assignment")]
pub struct JsonAssignment {
    pub courier_id: String,
    pub order_id: String,
    pub priority: Priority,
    pub computed_time: Minutes,
}

impl From<&Assignment> for JsonAssignment {
    fn from(value: &Assignment) -> Self {
        JsonAssignment {
            courier_id: value.courier_id.clone(),
            order_id: value.order_id.clone(),
            priority: value.priority,
            computed_time: value.time,
        }
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct JsonPriorityBreakdown {
    pub count: usize,
    pub total_time: Minutes,
}

#[derive(Serialize, Debug)]
pub struct JsonStatistics {
    pub backend: &'static str,
    pub elapsed: SignedDuration,
    pub nodes: usize,
    pub lp_iterations: usize,
    pub tie_break: TieBreakOutcome,
}

impl From<&SolveStatistics> for JsonStatistics {
    fn from(value: &SolveStatistics) -> Self {
        JsonStatistics {
            backend: value.backend,
            elapsed: value.elapsed,
            nodes: value.nodes,
            lp_iterations: value.lp_iterations,
            tie_break: value.tie_break,
        }
    }
}

/// Per-priority entries keyed by priority code.
fn priority_breakdown(metrics: &Metrics) -> BTreeMap<u8, JsonPriorityBreakdown> {
    metrics
        .per_priority
        .iter()
        .map(|breakdown| {
            (
                breakdown.priority.code(),
                JsonPriorityBreakdown {
                    count: breakdown.count,
                    total_time: breakdown.total_time,
                },
            )
        })
        .collect()
}

#[derive(Serialize, Debug)]
#[serde(rename = "AllocationResult")]
pub struct JsonAllocationResult {
    pub status: SolveStatus,
    pub objective_value: f64,
    pub total_time: Minutes,
    pub average_time: Minutes,
    /// Ordered by order id.
    pub assignments: Vec<JsonAssignment>,
    pub per_courier_load: BTreeMap<String, usize>,
    pub per_priority_breakdown: BTreeMap<u8, JsonPriorityBreakdown>,
    pub courier_utilization: f64,
    pub order_coverage: f64,
    pub statistics: JsonStatistics,
    pub analysis: SolutionAnalysis,
}

impl JsonAllocationResult {
    pub fn new(problem: &AllocationProblem, value: &AllocationSolution) -> Self {
        let metrics = &value.metrics;

        JsonAllocationResult {
            status: value.status,
            objective_value: metrics.objective_value,
            total_time: metrics.total_time,
            average_time: metrics.average_time,
            assignments: value.assignments.iter().map(JsonAssignment::from).collect(),
            per_courier_load: metrics
                .per_courier_load
                .iter()
                .map(|load| (load.courier_id.clone(), load.orders))
                .collect(),
            per_priority_breakdown: priority_breakdown(metrics),
            courier_utilization: metrics.courier_utilization,
            order_coverage: metrics.order_coverage,
            statistics: (&value.statistics).into(),
            analysis: analysis::analyze(problem, value),
        }
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct JsonPointError {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Serialize, Debug)]
#[serde(rename = "SweepPoint")]
pub struct JsonSweepPoint {
    pub parameter: SweepParameter,
    pub label: String,
    /// `solved`, `failed` or `cancelled`.
    pub outcome: &'static str,
    pub status: Option<SolveStatus>,
    pub objective_value: Option<f64>,
    pub total_time: Option<Minutes>,
    pub courier_utilization: Option<f64>,
    pub per_priority_breakdown: Option<BTreeMap<u8, JsonPriorityBreakdown>>,
    pub error: Option<JsonPointError>,
}

impl From<&SweepPoint> for JsonSweepPoint {
    fn from(value: &SweepPoint) -> Self {
        let metrics = value.metrics();
        let outcome = match &value.outcome {
            SweepOutcome::Solved { .. } => "solved",
            SweepOutcome::Failed { .. } => "failed",
            SweepOutcome::Cancelled => "cancelled",
        };

        JsonSweepPoint {
            parameter: value.parameter.clone(),
            label: value.parameter.to_string(),
            outcome,
            status: value.status(),
            objective_value: metrics.map(|m| m.objective_value),
            total_time: metrics.map(|m| m.total_time),
            courier_utilization: metrics.map(|m| m.courier_utilization),
            per_priority_breakdown: metrics.map(priority_breakdown),
            error: value.error().map(|error| JsonPointError {
                kind: error.kind(),
                message: error.to_string(),
            }),
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename = "SweepReport")]
pub struct JsonSweepReport {
    pub elapsed: SignedDuration,
    pub objective_non_increasing: bool,
    pub points: Vec<JsonSweepPoint>,
}

impl From<&SweepReport> for JsonSweepReport {
    fn from(value: &SweepReport) -> Self {
        JsonSweepReport {
            elapsed: value.elapsed,
            objective_non_increasing: value.is_objective_non_increasing(),
            points: value.points.iter().map(JsonSweepPoint::from).collect(),
        }
    }
}
