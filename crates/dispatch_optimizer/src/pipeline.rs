//! Build → solve → extract as typed stages. Each stage consumes the previous
//! one, so the only way to an [`AllocationSolution`] is through all three.

use tracing::{info, instrument};

use crate::{
    error::Result,
    model::{allocation_model::AllocationModel, build_model::build_model, model_params::ModelParams},
    problem::allocation_problem::AllocationProblem,
    solution::{allocation_solution::AllocationSolution, extract::extract_solution},
    solver::{
        raw_solution::RawSolution,
        solve::solve_model,
        solve_params::{SolveParams, SolverBackendKind},
        solver_backend::SolverBackend,
    },
    timer_debug,
};

pub struct BuiltModel<'a> {
    problem: &'a AllocationProblem,
    model: AllocationModel,
}

impl<'a> BuiltModel<'a> {
    pub fn build(problem: &'a AllocationProblem, params: &ModelParams) -> Result<Self> {
        let model = timer_debug!("Build model", build_model(problem, params))?;
        Ok(BuiltModel { problem, model })
    }

    /// Wraps an already built (possibly patched) model of `problem`.
    pub fn from_model(problem: &'a AllocationProblem, model: AllocationModel) -> Self {
        BuiltModel { problem, model }
    }

    pub fn model(&self) -> &AllocationModel {
        &self.model
    }

    pub fn solve(self, backend: &dyn SolverBackend, params: &SolveParams) -> Result<SolvedModel<'a>> {
        let raw = solve_model(&self.model, backend, params)?;
        Ok(SolvedModel {
            problem: self.problem,
            model: self.model,
            raw,
        })
    }
}

pub struct SolvedModel<'a> {
    problem: &'a AllocationProblem,
    model: AllocationModel,
    raw: RawSolution,
}

impl SolvedModel<'_> {
    pub fn raw(&self) -> &RawSolution {
        &self.raw
    }

    pub fn extract(self) -> Result<AllocationSolution> {
        extract_solution(self.problem, &self.model, self.raw)
    }
}

/// A configured pipeline, reusable across problems and threads.
pub struct AllocationSolver {
    backend: Box<dyn SolverBackend>,
    model_params: ModelParams,
    solve_params: SolveParams,
}

impl AllocationSolver {
    pub fn new(
        backend: &SolverBackendKind,
        model_params: ModelParams,
        solve_params: SolveParams,
    ) -> Self {
        AllocationSolver {
            backend: backend.create_backend(),
            model_params,
            solve_params,
        }
    }

    pub fn with_backend(
        backend: Box<dyn SolverBackend>,
        model_params: ModelParams,
        solve_params: SolveParams,
    ) -> Self {
        AllocationSolver {
            backend,
            model_params,
            solve_params,
        }
    }

    pub fn backend(&self) -> &dyn SolverBackend {
        self.backend.as_ref()
    }

    pub fn model_params(&self) -> &ModelParams {
        &self.model_params
    }

    pub fn solve_params(&self) -> &SolveParams {
        &self.solve_params
    }

    #[instrument(skip_all, level = "debug", fields(problem = problem.id()))]
    pub fn solve(&self, problem: &AllocationProblem) -> Result<AllocationSolution> {
        let solution = BuiltModel::build(problem, &self.model_params)?
            .solve(self.backend.as_ref(), &self.solve_params)?
            .extract()?;

        info!(
            status = ?solution.status,
            objective = solution.metrics.objective_value,
            assignments = solution.assignments.len(),
            "allocation solved"
        );

        Ok(solution)
    }
}
