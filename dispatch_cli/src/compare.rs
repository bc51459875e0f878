use std::path::PathBuf;

use clap::Args;
use dispatch_optimizer::{
    model::model_params::ModelParams,
    pipeline::AllocationSolver,
    problem::priority::Priority,
    sensitivity::{
        scenarios::{compare_scenarios, default_time_restrictions},
        sweep_params::{SweepParams, Threads},
    },
    solver::solve_params::SolveParams,
};
use tracing::info;

use crate::{file_utils, parsers, solve::BackendArg, summary};

#[derive(Args)]
pub struct CompareArgs {
    /// The problem file
    #[arg(short = 'i', long)]
    input: PathBuf,

    #[arg(short, long, value_enum, default_value_t = BackendArg::Embedded)]
    backend: BackendArg,

    /// Time budget of each scenario
    #[arg(short, long, value_parser = parsers::parse_duration, default_value = "5m")]
    timeout: jiff::SignedDuration,

    /// Delivery ceiling of express orders in the restricted scenario, in minutes
    #[arg(long)]
    express_max: Option<f64>,

    /// Delivery ceiling of priority orders in the restricted scenario, in minutes
    #[arg(long)]
    priority_max: Option<f64>,
}

pub fn run(args: CompareArgs) -> Result<(), anyhow::Error> {
    let problem = file_utils::read_problem(&args.input)?;

    let mut restrictions = default_time_restrictions();
    if let Some(minutes) = args.express_max {
        restrictions = restrictions.with_ceiling(Priority::Express, Some(minutes));
    }
    if let Some(minutes) = args.priority_max {
        restrictions = restrictions.with_ceiling(Priority::High, Some(minutes));
    }

    let solver = AllocationSolver::new(
        &args.backend.to_kind(),
        ModelParams::default(),
        SolveParams::default(),
    );

    let rows = compare_scenarios(
        &problem,
        &solver,
        SweepParams {
            threads: Threads::Multi(3),
            time_budget: args.timeout,
        },
        restrictions,
    );

    println!("{}", summary::scenario_table(&rows));
    info!(
        solved = rows.iter().filter(|row| row.is_solved()).count(),
        "Compared scenarios of {:?}",
        args.input
    );

    Ok(())
}
