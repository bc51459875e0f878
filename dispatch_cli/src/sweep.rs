use std::{ops::RangeInclusive, path::PathBuf, sync::Arc};

use clap::Args;
use dispatch_optimizer::{
    json::result::JsonSweepReport,
    model::model_params::ModelParams,
    pipeline::AllocationSolver,
    sensitivity::{
        sweep::SensitivityAnalyzer,
        sweep_parameter::capacity_range,
        sweep_params::{SweepParams, Threads},
    },
    solver::solve_params::SolveParams,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::{file_utils, parsers, solve::BackendArg, summary};

#[derive(Args)]
pub struct SweepArgs {
    /// The problem file
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Uniform courier capacities to try, e.g. `1..=5`
    #[arg(short, long, value_parser = parsers::parse_capacity_range)]
    capacities: RangeInclusive<u32>,

    #[arg(short, long, value_enum, default_value_t = BackendArg::Embedded)]
    backend: BackendArg,

    /// Time budget of each point
    #[arg(short, long, value_parser = parsers::parse_duration, default_value = "30s")]
    timeout: jiff::SignedDuration,

    /// Number of points solved concurrently (default: available cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Output file for the JSON report
    #[arg(long, short = 'o')]
    out: Option<PathBuf>,
}

pub fn run(args: SweepArgs) -> Result<(), anyhow::Error> {
    let problem = file_utils::read_problem(&args.input)?;
    let parameters = capacity_range(args.capacities.clone());
    info!(
        "Sweeping capacities {:?} over {:?}",
        args.capacities, args.input
    );

    let solver = AllocationSolver::new(
        &args.backend.to_kind(),
        ModelParams::default(),
        SolveParams::default(),
    );

    let mut analyzer = SensitivityAnalyzer::new(
        &problem,
        &solver,
        SweepParams {
            threads: args.threads.map_or(Threads::Auto, Threads::Multi),
            time_budget: args.timeout,
        },
    );

    let bar = Arc::new(ProgressBar::new(parameters.len() as u64));
    bar.set_style(ProgressStyle::default_bar().template("[{bar:40}] {pos}/{len} {msg}")?);

    let t_bar = Arc::clone(&bar);
    analyzer.on_point(move |point| {
        t_bar.set_message(point.parameter.to_string());
        t_bar.inc(1);
    });

    let report = analyzer.run(&parameters);
    bar.finish_and_clear();

    println!("{}", summary::sweep_table(&report));
    info!(
        "Objective non-increasing over the sweep: {}",
        report.is_objective_non_increasing()
    );

    if let Some(out) = args.out {
        file_utils::write_json(&out, &JsonSweepReport::from(&report))?;
        info!("Report written to {:?}", out);
    }

    Ok(())
}
