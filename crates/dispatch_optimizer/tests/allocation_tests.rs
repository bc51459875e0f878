mod test_utils;

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use dispatch_optimizer::{
    error::DispatchError,
    json::{result::JsonAllocationResult, types::JsonAllocationProblem},
    model::{
        linear_model::{ConstraintClass, LinearModel},
        model_params::{CapacityMeasure, DeliveryCeilings, ModelParams, PriorityWeights},
    },
    pipeline::AllocationSolver,
    problem::{
        allocation_problem::AllocationProblemBuilder,
        courier::CourierBuilder,
        order::OrderBuilder,
        priority::Priority,
    },
    solver::{
        embedded::EmbeddedBackend,
        raw_solution::{RawSolution, SolveStatus, TieBreakOutcome},
        solve_params::{SolveParams, SolverBackendKind, TieBreak},
        solver_backend::{SolveLimits, SolverBackend},
    },
};
use jiff::SignedDuration;

struct CountingBackend {
    calls: Arc<AtomicUsize>,
}

impl SolverBackend for CountingBackend {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn solve(&self, model: &LinearModel, limits: &SolveLimits) -> RawSolution {
        self.calls.fetch_add(1, Ordering::Relaxed);
        EmbeddedBackend.solve(model, limits)
    }
}

fn scenario_a_costs() -> Vec<Vec<f64>> {
    vec![vec![10.0, 20.0, 30.0], vec![15.0, 12.0, 25.0]]
}

#[test]
fn test_scenario_a_covers_every_order() {
    let problem = test_utils::create_problem(&[2, 2], &[1, 2, 3], scenario_a_costs());
    let solution = test_utils::default_solver().solve(&problem).unwrap();

    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_eq!(solution.metrics.order_coverage, 1.0);
    assert_eq!(solution.metrics.courier_utilization, 1.0);

    let pairs = solution
        .assignments
        .iter()
        .map(|a| (a.courier_id.as_str(), a.order_id.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(pairs, vec![("c0", "o0"), ("c1", "o1"), ("c1", "o2")]);

    // 10 * 1 + 12 * 2 + 25 * 3
    assert_eq!(solution.metrics.objective_value, 109.0);
    assert_eq!(solution.metrics.total_time, 47.0);
    test_utils::assert_solution_invariants(&problem, &ModelParams::default(), &solution);
}

#[test]
fn test_scenario_b_zero_budget_times_out() {
    let problem = test_utils::create_problem(
        &[2, 2, 2],
        &[1, 2, 3, 1],
        vec![
            vec![10.0, 20.0, 30.0, 14.0],
            vec![15.0, 12.0, 25.0, 9.0],
            vec![11.0, 19.0, 21.0, 30.0],
        ],
    );
    let solver = test_utils::create_solver(
        ModelParams::default(),
        SolveParams {
            time_budget: SignedDuration::ZERO,
            ..SolveParams::default()
        },
    );

    match solver.solve(&problem) {
        Err(DispatchError::SolverTimeout { budget, .. }) => {
            assert_eq!(budget, SignedDuration::ZERO)
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
}

#[test]
fn test_demand_pre_check_skips_the_solver() {
    let calls = Arc::new(AtomicUsize::new(0));
    let solver = AllocationSolver::with_backend(
        Box::new(CountingBackend {
            calls: calls.clone(),
        }),
        ModelParams::default(),
        SolveParams::default(),
    );

    let short = test_utils::create_problem(&[1, 1], &[1, 1, 1], vec![vec![1.0; 3]; 2]);
    assert_eq!(
        solver.solve(&short).err(),
        Some(DispatchError::InfeasibleDemand {
            capacity: 2,
            demand: 3
        })
    );
    assert_eq!(calls.load(Ordering::Relaxed), 0);

    let enough = test_utils::create_problem(&[2, 1], &[1, 1, 1], vec![vec![1.0; 3]; 2]);
    assert!(solver.solve(&enough).is_ok());
    assert!(calls.load(Ordering::Relaxed) > 0);
}

#[test]
fn test_inactive_couriers_do_not_count_towards_capacity() {
    let problem = test_utils::create_problem_with_availability(
        &[(5, false), (1, true)],
        &[1, 1],
        vec![vec![1.0, 1.0], vec![9.0, 9.0]],
    );

    assert!(matches!(
        test_utils::default_solver().solve(&problem),
        Err(DispatchError::InfeasibleDemand {
            capacity: 1,
            demand: 2
        })
    ));
}

#[test]
fn test_utilization_counts_available_couriers_only() {
    let problem = test_utils::create_problem_with_availability(
        &[(3, true), (3, true), (3, false)],
        &[1, 2],
        vec![vec![5.0, 5.0], vec![50.0, 50.0], vec![1.0, 1.0]],
    );
    let solution = test_utils::default_solver().solve(&problem).unwrap();

    assert!(solution.assignments.iter().all(|a| a.courier_id == "c0"));
    assert_eq!(solution.metrics.courier_utilization, 0.5);
    assert_eq!(solution.metrics.per_courier_load[2].orders, 0);
}

#[test]
fn test_weights_scale_the_objective() {
    let problem = test_utils::create_problem(&[2, 2], &[1, 2, 3], scenario_a_costs());

    let weighted = test_utils::default_solver().solve(&problem).unwrap();
    assert!(weighted.metrics.total_time <= weighted.metrics.objective_value);

    let params = ModelParams {
        weights: PriorityWeights::uniform(1.0),
        ..ModelParams::default()
    };
    let uniform = test_utils::create_solver(params, SolveParams::default())
        .solve(&problem)
        .unwrap();
    assert_eq!(uniform.metrics.total_time, uniform.metrics.objective_value);
}

#[test]
fn test_lexicographic_tie_break_prefers_lowest_courier() {
    let problem = test_utils::create_problem(&[2, 2, 2], &[1, 1, 1], vec![vec![5.0; 3]; 3]);
    let solution = test_utils::default_solver().solve(&problem).unwrap();

    let couriers = solution
        .assignments
        .iter()
        .map(|a| a.courier_id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(couriers, vec!["c0", "c0", "c1"]);
    assert_eq!(solution.statistics.tie_break, TieBreakOutcome::Complete);
}

#[test]
fn test_repeated_runs_are_identical() {
    let problem = test_utils::create_problem(
        &[2, 2, 1],
        &[3, 1, 2, 1, 3],
        vec![
            vec![10.0, 10.0, 20.0, 15.0, 12.0],
            vec![10.0, 10.0, 20.0, 15.0, 12.0],
            vec![11.0, 9.0, 19.0, 15.0, 12.0],
        ],
    );
    let solver = test_utils::default_solver();

    let first = solver.solve(&problem).unwrap();
    for _ in 0..3 {
        assert_eq!(solver.solve(&problem).unwrap().assignments, first.assignments);
    }
}

#[test]
fn test_tie_break_can_be_disabled() {
    let problem = test_utils::create_problem(&[2, 2], &[1, 1], vec![vec![5.0; 2]; 2]);
    let solver = test_utils::create_solver(
        ModelParams::default(),
        SolveParams {
            tie_break: TieBreak::None,
            ..SolveParams::default()
        },
    );
    let solution = solver.solve(&problem).unwrap();

    assert_eq!(solution.metrics.objective_value, 10.0);
    assert_eq!(solution.statistics.tie_break, TieBreakOutcome::Skipped);
}

#[test]
fn test_ceilings_prune_pairs() {
    let costs = vec![vec![10.0, 12.0], vec![40.0, 20.0]];
    let problem = test_utils::create_problem(&[1, 1], &[3, 3], costs);

    let relaxed = ModelParams {
        ceilings: DeliveryCeilings::default().with_ceiling(Priority::Express, Some(30.0)),
        ..ModelParams::default()
    };
    let solution = test_utils::create_solver(relaxed, SolveParams::default())
        .solve(&problem)
        .unwrap();
    assert!(solution.assignments.iter().all(|a| a.time <= 30.0));
    assert_eq!(solution.metrics.objective_value, 90.0);

    // only c0 remains eligible, and it holds a single order
    let tight = ModelParams {
        ceilings: DeliveryCeilings::default().with_ceiling(Priority::Express, Some(15.0)),
        ..ModelParams::default()
    };
    assert!(matches!(
        test_utils::create_solver(tight, SolveParams::default()).solve(&problem),
        Err(DispatchError::SolverInfeasible {
            binding: Some(ConstraintClass::Capacity),
            ..
        })
    ));

    let impossible = ModelParams {
        ceilings: DeliveryCeilings::default().with_ceiling(Priority::Express, Some(5.0)),
        ..ModelParams::default()
    };
    assert!(matches!(
        test_utils::create_solver(impossible, SolveParams::default()).solve(&problem),
        Err(DispatchError::SolverInfeasible {
            binding: Some(ConstraintClass::Assignment),
            ..
        })
    ));
}

#[test]
fn test_size_capacity_measure() {
    let couriers = ["c0", "c1"]
        .iter()
        .map(|id| {
            let mut builder = CourierBuilder::default();
            builder.set_courier_id(*id).set_capacity(3);
            builder.build().unwrap()
        })
        .collect();
    let orders = [("o0", 3), ("o1", 1)]
        .iter()
        .map(|&(id, size)| {
            let mut builder = OrderBuilder::default();
            builder.set_order_id(id).set_size(size);
            builder.build().unwrap()
        })
        .collect();
    let mut builder = AllocationProblemBuilder::default();
    builder
        .set_couriers(couriers)
        .set_orders(orders)
        .set_cost_matrix(vec![vec![1.0, 1.0], vec![10.0, 10.0]]);
    let problem = builder.build().unwrap();

    let by_count = test_utils::default_solver().solve(&problem).unwrap();
    assert_eq!(by_count.metrics.objective_value, 2.0);

    let params = ModelParams {
        capacity_measure: CapacityMeasure::OrderSize,
        ..ModelParams::default()
    };
    let by_size = test_utils::create_solver(params, SolveParams::default())
        .solve(&problem)
        .unwrap();
    assert_eq!(by_size.metrics.objective_value, 11.0);
    assert_eq!(by_size.assignment_for("o0").unwrap().courier_id, "c0");
    assert_eq!(by_size.assignment_for("o1").unwrap().courier_id, "c1");
}

#[test]
fn test_relative_gap_bounds_the_objective() {
    let problem = test_utils::create_problem(
        &[2, 2, 2],
        &[1, 2, 3, 1, 2],
        vec![
            vec![10.0, 20.0, 30.0, 14.0, 8.0],
            vec![15.0, 12.0, 25.0, 9.0, 17.0],
            vec![11.0, 19.0, 21.0, 30.0, 16.0],
        ],
    );
    let optimum = test_utils::brute_force_objective(&problem, &ModelParams::default()).unwrap();

    let solver = test_utils::create_solver(
        ModelParams::default(),
        SolveParams {
            relative_gap: Some(0.5),
            ..SolveParams::default()
        },
    );
    let solution = solver.solve(&problem).unwrap();

    assert!(matches!(
        solution.status,
        SolveStatus::Optimal | SolveStatus::SuboptimalWithinGap
    ));
    assert!(solution.metrics.objective_value <= 1.5 * optimum + 1e-6);
}

#[test]
fn test_missing_glpk_binary_is_unavailable() {
    let problem = test_utils::create_problem(&[2, 2], &[1, 2, 3], scenario_a_costs());
    let solver = AllocationSolver::new(
        &SolverBackendKind::Glpk {
            binary: "/nonexistent/bin/glpsol".into(),
        },
        ModelParams::default(),
        SolveParams::default(),
    );

    assert!(matches!(
        solver.solve(&problem),
        Err(DispatchError::SolverUnavailable { .. })
    ));
}

#[test]
fn test_json_round_trip() {
    let input: JsonAllocationProblem = serde_json::from_str(
        r#"{
            "couriers": [
                { "id": "c0", "capacity": 2 },
                { "id": "c1", "capacity": 2 }
            ],
            "orders": [
                { "id": "o0", "priority": 1 },
                { "id": "o1", "priority": 2 },
                { "id": "o2", "priority": 3 }
            ],
            "cost_matrix": [[10, 20, 30], [15, 12, 25]]
        }"#,
    )
    .unwrap();
    let problem = input.build_problem().unwrap();
    let solution = test_utils::default_solver().solve(&problem).unwrap();

    let output = serde_json::to_value(JsonAllocationResult::new(&problem, &solution)).unwrap();
    assert_eq!(output["objective_value"], 109.0);
    assert_eq!(output["total_time"], 47.0);
    assert_eq!(output["per_courier_load"]["c1"], 2);
    assert_eq!(output["per_priority_breakdown"]["2"]["count"], 1);
    assert_eq!(output["assignments"].as_array().unwrap().len(), 3);

    let analysis = &output["analysis"];
    assert_eq!(analysis["courier_utilization"]["min_orders"], 1);
    assert_eq!(analysis["courier_utilization"]["couriers"][1]["courier_id"], "c1");
    assert_eq!(analysis["priorities"].as_array().unwrap().len(), 3);
    assert_eq!(analysis["time_distribution"]["bands"].as_array().unwrap().len(), 5);
}
