use tracing::{info, instrument};

use crate::{
    error::DispatchError,
    model::model_params::DeliveryCeilings,
    pipeline::AllocationSolver,
    problem::{allocation_problem::AllocationProblem, cost_matrix::Minutes, priority::Priority},
};

use super::{
    sweep::{SensitivityAnalyzer, SweepOutcome, SweepPoint},
    sweep_parameter::{SweepParameter, halved_capacity},
    sweep_params::SweepParams,
};

/// Express within 30 minutes, priority orders within 45.
pub fn default_time_restrictions() -> DeliveryCeilings {
    DeliveryCeilings::default()
        .with_ceiling(Priority::High, Some(45.0))
        .with_ceiling(Priority::Express, Some(30.0))
}

/// One line of a scenario comparison. The figures are `None` when the
/// scenario did not solve.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioRow {
    pub name: &'static str,
    pub parameter: SweepParameter,
    pub total_time: Option<Minutes>,
    pub average_time: Option<Minutes>,
    pub couriers_used: Option<usize>,
    pub error: Option<DispatchError>,
}

impl ScenarioRow {
    fn new(name: &'static str, point: SweepPoint) -> Self {
        let metrics = point.metrics();
        ScenarioRow {
            name,
            total_time: metrics.map(|m| m.total_time),
            average_time: metrics.map(|m| m.average_time),
            couriers_used: metrics.map(|m| {
                m.per_courier_load
                    .iter()
                    .filter(|load| load.orders > 0)
                    .count()
            }),
            error: match point.outcome {
                SweepOutcome::Failed { error } => Some(error),
                _ => None,
            },
            parameter: point.parameter,
        }
    }

    pub fn is_solved(&self) -> bool {
        self.total_time.is_some()
    }
}

/// Solves the problem as given, under `restrictions`, and with every
/// courier's capacity halved plus one. The three scenarios run as one sweep.
#[instrument(skip_all, level = "debug")]
pub fn compare_scenarios(
    problem: &AllocationProblem,
    solver: &AllocationSolver,
    params: SweepParams,
    restrictions: DeliveryCeilings,
) -> Vec<ScenarioRow> {
    let scenarios = [
        ("base", SweepParameter::Baseline),
        (
            "time_restricted",
            SweepParameter::DeliveryCeilings {
                ceilings: restrictions,
            },
        ),
        ("reduced_capacity", halved_capacity()),
    ];

    let parameters = scenarios
        .iter()
        .map(|(_, parameter)| parameter.clone())
        .collect::<Vec<_>>();
    let report = SensitivityAnalyzer::new(problem, solver, params).run(&parameters);

    let rows = scenarios
        .iter()
        .zip(report.points)
        .map(|((name, _), point)| ScenarioRow::new(*name, point))
        .collect::<Vec<_>>();

    for row in &rows {
        info!(
            scenario = row.name,
            total_time = ?row.total_time,
            average_time = ?row.average_time,
            couriers_used = ?row.couriers_used,
            "scenario compared"
        );
    }

    rows
}
