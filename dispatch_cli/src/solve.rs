use std::path::PathBuf;

use clap::{Args, ValueEnum};
use dispatch_optimizer::{
    json::result::JsonAllocationResult,
    solution::analysis,
    model::model_params::{ModelParams, ObjectiveStyle},
    pipeline::AllocationSolver,
    solver::solve_params::{SolveParams, SolverBackendKind},
};
use tracing::info;

use crate::{file_utils, parsers, summary};

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum BackendArg {
    #[default]
    Embedded,
    /// External `glpsol`, taken from `DISPATCH_GLPSOL` or the `PATH`
    Glpk,
}

impl BackendArg {
    pub fn to_kind(self) -> SolverBackendKind {
        match self {
            BackendArg::Embedded => SolverBackendKind::Embedded,
            BackendArg::Glpk => match std::env::var_os("DISPATCH_GLPSOL") {
                Some(binary) => SolverBackendKind::Glpk {
                    binary: binary.into(),
                },
                None => SolverBackendKind::glpk(),
            },
        }
    }
}

#[derive(Args)]
pub struct SolveArgs {
    /// The problem file
    #[arg(short = 'i', long)]
    input: PathBuf,

    #[arg(short, long, value_enum, default_value_t = BackendArg::Embedded)]
    backend: BackendArg,

    #[arg(short, long, value_parser = parsers::parse_duration, default_value = "5m")]
    timeout: jiff::SignedDuration,

    /// Accept solutions proven within this relative gap of the optimum
    #[arg(long)]
    gap: Option<f64>,

    /// Use the delivery-time variable formulation
    #[arg(long)]
    big_m: bool,

    /// Output file for the JSON result
    #[arg(long, short = 'o')]
    out: Option<PathBuf>,
}

pub fn run(args: SolveArgs) -> Result<(), anyhow::Error> {
    let problem = file_utils::read_problem(&args.input)?;
    info!(
        couriers = problem.couriers().len(),
        orders = problem.orders().len(),
        "Loaded {:?}",
        args.input
    );

    let solver = AllocationSolver::new(
        &args.backend.to_kind(),
        ModelParams {
            objective_style: if args.big_m {
                ObjectiveStyle::BigM
            } else {
                ObjectiveStyle::DirectCost
            },
            ..ModelParams::default()
        },
        SolveParams {
            time_budget: args.timeout,
            relative_gap: args.gap,
            ..SolveParams::default()
        },
    );

    let solution = solver.solve(&problem)?;

    println!("{}", summary::solution_table(&solution));
    println!("{}", summary::metrics_table(&solution));
    println!("{}", summary::analysis_table(&analysis::analyze(&problem, &solution)));

    if let Some(out) = args.out {
        file_utils::write_json(&out, &JsonAllocationResult::new(&problem, &solution))?;
        info!("Result written to {:?}", out);
    }

    Ok(())
}
