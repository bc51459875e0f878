mod test_utils;

use std::sync::Arc;

use dispatch_optimizer::{
    error::DispatchError,
    json::result::JsonSweepReport,
    model::model_params::DeliveryCeilings,
    problem::{allocation_problem::AllocationProblem, priority::Priority},
    sensitivity::{
        cancellation::CancellationToken,
        scenarios::{compare_scenarios, default_time_restrictions},
        sweep::{SensitivityAnalyzer, SweepOutcome, sweep},
        sweep_parameter::{SweepParameter, capacity_range},
        sweep_params::{SweepParams, Threads},
    },
};
use jiff::SignedDuration;
use parking_lot::Mutex;

fn sweep_params() -> SweepParams {
    SweepParams {
        threads: Threads::Multi(4),
        time_budget: SignedDuration::from_secs(30),
    }
}

#[test]
fn test_scenario_c_capacity_sweep_is_non_increasing() {
    let problem = test_utils::create_problem(
        &[1, 1, 1],
        &[1, 2, 3, 1, 2, 3],
        vec![
            vec![10.0, 20.0, 30.0, 14.0, 8.0, 22.0],
            vec![15.0, 12.0, 25.0, 9.0, 17.0, 28.0],
            vec![11.0, 19.0, 21.0, 30.0, 16.0, 12.0],
        ],
    );
    let solver = test_utils::default_solver();

    let report = sweep(&problem, &solver, sweep_params(), &capacity_range(1..=5));

    let labels = report
        .points
        .iter()
        .map(|point| point.parameter.to_string())
        .collect::<Vec<_>>();
    assert_eq!(
        labels,
        vec!["capacity=1", "capacity=2", "capacity=3", "capacity=4", "capacity=5"]
    );

    // three couriers of capacity one cannot take six orders
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.solved_count(), 4);
    assert!(report.is_objective_non_increasing());

    let series = report.objective_series();
    let unconstrained = series[4].unwrap();
    assert_eq!(series[3], Some(unconstrained));
}

#[test]
fn test_capacity_points_match_independent_solves() {
    let problem = test_utils::create_problem(
        &[1, 2],
        &[1, 3, 2],
        vec![vec![5.0, 9.0, 7.0], vec![6.0, 10.0, 4.0]],
    );
    let solver = test_utils::default_solver();
    let report = sweep(
        &problem,
        &solver,
        sweep_params(),
        &[
            SweepParameter::CapacityDelta { delta: 1 },
            SweepParameter::CourierCapacity {
                courier_id: "c0".into(),
                capacity: 3,
            },
        ],
    );

    let widened = test_utils::create_problem(
        &[2, 3],
        &[1, 3, 2],
        vec![vec![5.0, 9.0, 7.0], vec![6.0, 10.0, 4.0]],
    );
    let expected = solver.solve(&widened).unwrap();
    assert_eq!(
        report.points[0].metrics().unwrap(),
        &expected.metrics
    );

    let single = test_utils::create_problem(
        &[3, 2],
        &[1, 3, 2],
        vec![vec![5.0, 9.0, 7.0], vec![6.0, 10.0, 4.0]],
    );
    assert_eq!(
        report.points[1].metrics().unwrap().objective_value,
        solver.solve(&single).unwrap().metrics.objective_value
    );
}

#[test]
fn test_callback_sees_every_point() {
    let problem = test_utils::create_problem(&[2, 2], &[1, 2, 3], vec![vec![1.0; 3]; 2]);
    let solver = test_utils::default_solver();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let mut analyzer = SensitivityAnalyzer::new(&problem, &solver, sweep_params());
    let sink = seen.clone();
    analyzer.on_point(move |point| sink.lock().push(point.index));

    let report = analyzer.run(&capacity_range(1..=6));

    let mut indices = seen.lock().clone();
    indices.sort_unstable();
    assert_eq!(indices, (0..6).collect::<Vec<_>>());
    assert_eq!(report.points.len(), 6);
}

#[test]
fn test_cancellation_keeps_completed_points() {
    let problem = test_utils::create_problem(&[2, 2], &[1, 2, 3], vec![vec![1.0; 3]; 2]);
    let solver = test_utils::default_solver();
    let token = CancellationToken::new();

    let mut analyzer = SensitivityAnalyzer::new(
        &problem,
        &solver,
        SweepParams {
            threads: Threads::Single,
            ..sweep_params()
        },
    )
    .with_cancellation(token.clone());
    analyzer.on_point(move |point| {
        if point.index == 1 {
            token.cancel();
        }
    });

    let report = analyzer.run(&capacity_range(2..=6));
    assert_eq!(report.solved_count(), 2);
    assert_eq!(report.cancelled_count(), 3);
    assert!(matches!(report.points[4].outcome, SweepOutcome::Cancelled));
}

#[test]
fn test_report_serializes_failures() {
    let problem = test_utils::create_problem(&[1, 1], &[1, 1, 1], vec![vec![1.0; 3]; 2]);
    let solver = test_utils::default_solver();
    let report = sweep(&problem, &solver, sweep_params(), &capacity_range(1..=2));

    let json = serde_json::to_value(JsonSweepReport::from(&report)).unwrap();
    assert_eq!(json["points"][0]["outcome"], "failed");
    assert_eq!(json["points"][0]["error"]["kind"], "infeasible_demand");
    assert_eq!(json["points"][1]["outcome"], "solved");
    assert_eq!(json["points"][1]["objective_value"], 3.0);
    assert_eq!(json["points"][1]["parameter"]["type"], "uniform_capacity");
}

fn scenario_problem() -> AllocationProblem {
    test_utils::create_problem(
        &[4, 4],
        &[1, 1, 2, 3],
        vec![vec![10.0, 10.0, 10.0, 10.0], vec![20.0, 20.0, 40.0, 50.0]],
    )
}

#[test]
fn test_compare_scenarios() {
    let problem = scenario_problem();
    let solver = test_utils::default_solver();

    let rows = compare_scenarios(
        &problem,
        &solver,
        sweep_params(),
        default_time_restrictions(),
    );

    let names = rows.iter().map(|row| row.name).collect::<Vec<_>>();
    assert_eq!(names, vec!["base", "time_restricted", "reduced_capacity"]);
    assert!(rows.iter().all(|row| row.is_solved()));

    // c0 takes everything
    assert_eq!(rows[0].total_time, Some(40.0));
    assert_eq!(rows[0].average_time, Some(10.0));
    assert_eq!(rows[0].couriers_used, Some(1));
    assert_eq!(rows[1].total_time, Some(40.0));

    // 4 / 2 + 1 leaves c0 three orders, a normal one moves to c1
    assert_eq!(rows[2].parameter.to_string(), "capacity*1/2+1");
    assert_eq!(rows[2].total_time, Some(50.0));
    assert_eq!(rows[2].average_time, Some(12.5));
    assert_eq!(rows[2].couriers_used, Some(2));
}

#[test]
fn test_unsatisfiable_scenario_is_reported_not_dropped() {
    let problem = scenario_problem();
    let solver = test_utils::default_solver();
    let restrictions = DeliveryCeilings::default().with_ceiling(Priority::Express, Some(5.0));

    let rows = compare_scenarios(&problem, &solver, sweep_params(), restrictions);

    assert_eq!(rows.len(), 3);
    assert!(rows[0].is_solved());
    assert!(!rows[1].is_solved());
    assert!(rows[1].couriers_used.is_none());
    assert!(matches!(
        rows[1].error,
        Some(DispatchError::SolverInfeasible { .. })
    ));
    assert!(rows[2].is_solved());
}

