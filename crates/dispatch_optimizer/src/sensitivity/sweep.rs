use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};
use parking_lot::Mutex;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, info, instrument, warn};

use crate::{
    error::{DispatchError, Result},
    model::{allocation_model::AllocationModel, build_model::build_model},
    pipeline::{AllocationSolver, BuiltModel},
    problem::allocation_problem::AllocationProblem,
    solution::allocation_solution::{AllocationSolution, Metrics},
    solver::{raw_solution::SolveStatus, solve_params::SolveParams},
};

use super::{
    cancellation::CancellationToken,
    sweep_parameter::{PointSetup, SweepParameter},
    sweep_params::SweepParams,
};

type PointHandler = Arc<Mutex<dyn FnMut(&SweepPoint) + Send + Sync + 'static>>;

/// Relative slack allowed when comparing objectives of neighbouring points.
const MONOTONICITY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub enum SweepOutcome {
    Solved {
        status: SolveStatus,
        metrics: Metrics,
    },
    Failed {
        error: DispatchError,
    },
    /// Cancellation was requested before the point started.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    /// Position in the input sequence.
    pub index: usize,
    pub parameter: SweepParameter,
    pub outcome: SweepOutcome,
}

impl SweepPoint {
    pub fn metrics(&self) -> Option<&Metrics> {
        match &self.outcome {
            SweepOutcome::Solved { metrics, .. } => Some(metrics),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<SolveStatus> {
        match &self.outcome {
            SweepOutcome::Solved { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&DispatchError> {
        match &self.outcome {
            SweepOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepReport {
    /// Same order as the swept parameters.
    pub points: Vec<SweepPoint>,
    pub elapsed: SignedDuration,
}

impl SweepReport {
    pub fn objective_series(&self) -> Vec<Option<f64>> {
        self.points
            .iter()
            .map(|point| point.metrics().map(|metrics| metrics.objective_value))
            .collect()
    }

    /// Whether the objective never increases from one solved point to the
    /// next. Points without a solution are skipped.
    pub fn is_objective_non_increasing(&self) -> bool {
        let objectives = self.objective_series().into_iter().flatten().collect::<Vec<_>>();
        objectives.windows(2).all(|pair| {
            pair[1] <= pair[0] + MONOTONICITY_TOLERANCE * pair[0].abs().max(1.0)
        })
    }

    pub fn solved_count(&self) -> usize {
        self.points
            .iter()
            .filter(|point| matches!(point.outcome, SweepOutcome::Solved { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.points
            .iter()
            .filter(|point| matches!(point.outcome, SweepOutcome::Failed { .. }))
            .count()
    }

    pub fn cancelled_count(&self) -> usize {
        self.points
            .iter()
            .filter(|point| point.outcome == SweepOutcome::Cancelled)
            .count()
    }
}

/// Re-runs the allocation pipeline of one base problem for each swept value.
pub struct SensitivityAnalyzer<'a> {
    problem: &'a AllocationProblem,
    solver: &'a AllocationSolver,
    params: SweepParams,
    on_point_handler: Option<PointHandler>,
    cancellation: CancellationToken,
}

impl<'a> SensitivityAnalyzer<'a> {
    pub fn new(
        problem: &'a AllocationProblem,
        solver: &'a AllocationSolver,
        params: SweepParams,
    ) -> Self {
        SensitivityAnalyzer {
            problem,
            solver,
            params,
            on_point_handler: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Called from worker threads as each point finishes, in completion
    /// order.
    pub fn on_point<F>(&mut self, callback: F)
    where
        F: FnMut(&SweepPoint) + Send + Sync + 'static,
    {
        self.on_point_handler = Some(Arc::new(Mutex::new(callback)));
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    #[instrument(skip_all, level = "debug", fields(points = parameters.len()))]
    pub fn run(&self, parameters: &[SweepParameter]) -> SweepReport {
        let start = Timestamp::now();

        // Capacity points patch this model instead of rebuilding it.
        let base = build_model(self.problem, self.solver.model_params());
        if let Err(error) = &base {
            debug!(%error, "base model did not build, capacity points will rebuild");
        }
        let base = base.as_ref().ok();

        let run_point = |(index, parameter): (usize, &SweepParameter)| {
            self.run_point(index, parameter, base)
        };

        let threads = self.params.threads.number_of_threads();
        let points = match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(|| {
                parameters
                    .par_iter()
                    .enumerate()
                    .map(run_point)
                    .collect::<Vec<_>>()
            }),
            Err(error) => {
                warn!(%error, "could not start sweep workers, running sequentially");
                parameters.iter().enumerate().map(run_point).collect()
            }
        };

        let report = SweepReport {
            points,
            elapsed: Timestamp::now().duration_since(start),
        };

        info!(
            solved = report.solved_count(),
            failed = report.failed_count(),
            cancelled = report.cancelled_count(),
            elapsed = ?report.elapsed,
            "sweep finished"
        );

        report
    }

    fn run_point(
        &self,
        index: usize,
        parameter: &SweepParameter,
        base: Option<&AllocationModel>,
    ) -> SweepPoint {
        let outcome = if self.cancellation.is_cancelled() {
            debug!(index, %parameter, "sweep point cancelled");
            SweepOutcome::Cancelled
        } else {
            debug!(index, %parameter, "sweep point started");
            match self.solve_point(parameter, base) {
                Ok(solution) => SweepOutcome::Solved {
                    status: solution.status,
                    metrics: solution.metrics,
                },
                Err(error) => {
                    info!(index, %parameter, kind = error.kind(), "sweep point failed: {error}");
                    SweepOutcome::Failed { error }
                }
            }
        };

        let point = SweepPoint {
            index,
            parameter: parameter.clone(),
            outcome,
        };

        if let Some(callback) = &self.on_point_handler {
            callback.lock()(&point);
        }

        point
    }

    fn solve_point(
        &self,
        parameter: &SweepParameter,
        base: Option<&AllocationModel>,
    ) -> Result<AllocationSolution> {
        let solve_params = SolveParams {
            time_budget: self.params.time_budget,
            ..self.solver.solve_params().clone()
        };
        let backend = self.solver.backend();

        match parameter.setup(self.problem, self.solver.model_params())? {
            PointSetup::PatchCapacities(capacities) => {
                let problem = self.problem.with_capacities(&capacities);
                let built = match base {
                    Some(model) => BuiltModel::from_model(&problem, model.with_capacities(&capacities)?),
                    None => BuiltModel::build(&problem, self.solver.model_params())?,
                };
                built.solve(backend, &solve_params)?.extract()
            }
            PointSetup::Rebuild(model_params) => BuiltModel::build(self.problem, &model_params)?
                .solve(backend, &solve_params)?
                .extract(),
        }
    }
}

/// Runs `parameters` against `problem` without a callback or external
/// cancellation.
pub fn sweep(
    problem: &AllocationProblem,
    solver: &AllocationSolver,
    params: SweepParams,
    parameters: &[SweepParameter],
) -> SweepReport {
    SensitivityAnalyzer::new(problem, solver, params).run(parameters)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::{
        model::model_params::ModelParams,
        problem::priority::Priority,
        sensitivity::{sweep_parameter::capacity_range, sweep_params::Threads},
        solver::solve_params::SolverBackendKind,
        test_utils::fixed_problem,
    };

    use super::*;

    fn problem() -> AllocationProblem {
        fixed_problem(
            &[2, 2],
            &[Priority::Normal, Priority::High, Priority::Express],
            vec![vec![10.0, 20.0, 30.0], vec![15.0, 12.0, 25.0]],
        )
    }

    fn solver() -> AllocationSolver {
        AllocationSolver::new(
            &SolverBackendKind::Embedded,
            ModelParams::default(),
            SolveParams::default(),
        )
    }

    fn params(threads: Threads) -> SweepParams {
        SweepParams {
            threads,
            time_budget: SignedDuration::from_secs(30),
        }
    }

    #[test]
    fn test_capacity_sweep_keeps_order_and_isolates_failures() {
        let problem = problem();
        let solver = solver();
        let report = sweep(&problem, &solver, params(Threads::Multi(3)), &capacity_range(1..=5));

        assert_eq!(report.points.len(), 5);
        for (index, point) in report.points.iter().enumerate() {
            assert_eq!(point.index, index);
        }

        assert!(matches!(
            report.points[0].error(),
            Some(DispatchError::InfeasibleDemand {
                capacity: 2,
                demand: 3
            })
        ));
        assert_eq!(report.solved_count(), 4);
        assert!(report.is_objective_non_increasing());

        // capacity 2 already lets c01 take both weighted orders: 10 + 24 + 75
        assert_eq!(report.objective_series()[1], Some(109.0));
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let problem = problem();
        let solver = solver();
        let parameters = capacity_range(1..=4);

        let single = sweep(&problem, &solver, params(Threads::Single), &parameters);
        let multi = sweep(&problem, &solver, params(Threads::Multi(4)), &parameters);

        assert_eq!(single.objective_series(), multi.objective_series());
    }

    #[test]
    fn test_base_model_failure_still_allows_patched_points() {
        let problem = fixed_problem(
            &[1, 1],
            &[Priority::Normal, Priority::Normal, Priority::Normal],
            vec![vec![1.0, 2.0, 3.0], vec![3.0, 2.0, 1.0]],
        );
        let solver = solver();
        let report = sweep(
            &problem,
            &solver,
            params(Threads::Single),
            &[SweepParameter::CapacityDelta { delta: 1 }],
        );

        assert_eq!(report.objective_series(), vec![Some(4.0)]);
    }

    #[test]
    fn test_weight_point_rebuilds_model() {
        let problem = problem();
        let solver = solver();
        let report = sweep(
            &problem,
            &solver,
            params(Threads::Single),
            &[
                SweepParameter::PriorityWeight {
                    priority: Priority::Express,
                    weight: 1.0,
                },
                SweepParameter::PriorityWeight {
                    priority: Priority::Express,
                    weight: -1.0,
                },
            ],
        );

        assert!(report.points[0].metrics().is_some());
        assert!(matches!(
            report.points[1].error(),
            Some(DispatchError::DataValidation(_))
        ));
    }

    #[test]
    fn test_cancelled_sweep_skips_points() {
        let problem = problem();
        let solver = solver();
        let token = CancellationToken::new();
        token.cancel();

        let seen = Arc::new(AtomicUsize::new(0));
        let mut analyzer = SensitivityAnalyzer::new(&problem, &solver, params(Threads::Multi(2)))
            .with_cancellation(token);
        let counter = seen.clone();
        analyzer.on_point(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        let report = analyzer.run(&capacity_range(2..=4));
        assert_eq!(report.cancelled_count(), 3);
        assert_eq!(seen.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_callback_cancels_remaining_points() {
        let problem = problem();
        let solver = solver();
        let mut analyzer = SensitivityAnalyzer::new(&problem, &solver, params(Threads::Single));
        let token = analyzer.cancellation().clone();
        analyzer.on_point(move |_| token.cancel());

        let report = analyzer.run(&capacity_range(2..=4));
        assert_eq!(report.solved_count(), 1);
        assert_eq!(report.cancelled_count(), 2);
        assert!(report.points[0].metrics().is_some());
    }
}
