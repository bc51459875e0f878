use comfy_table::{Table, presets::UTF8_FULL};
use dispatch_optimizer::{
    sensitivity::{
        scenarios::ScenarioRow,
        sweep::{SweepOutcome, SweepReport},
    },
    solution::{allocation_solution::AllocationSolution, analysis::SolutionAnalysis},
};

pub fn solution_table(solution: &AllocationSolution) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Order", "Priority", "Courier", "Time (min)"]);

    for assignment in &solution.assignments {
        table.add_row(vec![
            assignment.order_id.clone(),
            assignment.priority.to_string(),
            assignment.courier_id.clone(),
            format!("{:.1}", assignment.time),
        ]);
    }

    table
}

pub fn metrics_table(solution: &AllocationSolution) -> Table {
    let metrics = &solution.metrics;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Metric", "Value"]);

    table.add_row(vec!["status".to_owned(), format!("{:?}", solution.status)]);
    table.add_row(vec![
        "objective".to_owned(),
        format!("{:.2}", metrics.objective_value),
    ]);
    table.add_row(vec![
        "total time".to_owned(),
        format!("{:.1} min", metrics.total_time),
    ]);
    table.add_row(vec![
        "average time".to_owned(),
        format!("{:.1} min", metrics.average_time),
    ]);
    table.add_row(vec![
        "courier utilization".to_owned(),
        format!("{:.1}%", metrics.courier_utilization * 100.0),
    ]);
    table.add_row(vec![
        "order coverage".to_owned(),
        format!("{:.1}%", metrics.order_coverage * 100.0),
    ]);
    for breakdown in &metrics.per_priority {
        table.add_row(vec![
            format!("{} orders", breakdown.priority),
            format!("{} ({:.1} min)", breakdown.count, breakdown.total_time),
        ]);
    }

    table
}

pub fn analysis_table(analysis: &SolutionAnalysis) -> Table {
    let distribution = &analysis.time_distribution;
    let utilization = &analysis.courier_utilization;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Analysis", "Value"]);

    table.add_row(vec![
        "time mean / median".to_owned(),
        format!("{:.1} / {:.1} min", distribution.mean, distribution.median),
    ]);
    table.add_row(vec![
        "time range".to_owned(),
        format!("{:.1} - {:.1} min", distribution.min, distribution.max),
    ]);
    for band in &distribution.bands {
        table.add_row(vec![
            format!("{} min", band.label),
            format!("{} ({:.1}%)", band.count, band.share * 100.0),
        ]);
    }
    table.add_row(vec![
        "orders per used courier".to_owned(),
        format!(
            "{:.2} (min {}, max {})",
            utilization.mean_orders, utilization.min_orders, utilization.max_orders
        ),
    ]);
    for stats in &analysis.priorities {
        table.add_row(vec![
            format!("{} mean time", stats.priority),
            format!("{:.1} min", stats.mean_time),
        ]);
    }

    table
}

pub fn sweep_table(report: &SweepReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Parameter", "Outcome", "Objective", "Utilization"]);

    for point in &report.points {
        let (outcome, objective, utilization) = match &point.outcome {
            SweepOutcome::Solved { status, metrics } => (
                format!("{status:?}"),
                format!("{:.2}", metrics.objective_value),
                format!("{:.1}%", metrics.courier_utilization * 100.0),
            ),
            SweepOutcome::Failed { error } => (error.kind().to_owned(), "-".into(), "-".into()),
            SweepOutcome::Cancelled => ("cancelled".into(), "-".into(), "-".into()),
        };
        table.add_row(vec![point.parameter.to_string(), outcome, objective, utilization]);
    }

    table
}

pub fn scenario_table(rows: &[ScenarioRow]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Scenario",
        "Parameter",
        "Total time",
        "Average time",
        "Couriers",
    ]);

    for row in rows {
        let figures = match (row.total_time, row.average_time, row.couriers_used) {
            (Some(total), Some(average), Some(couriers)) => vec![
                format!("{total:.1} min"),
                format!("{average:.1} min"),
                couriers.to_string(),
            ],
            _ => {
                let kind = row.error.as_ref().map_or("-", |error| error.kind());
                vec![kind.to_owned(), "-".into(), "-".into()]
            }
        };

        let mut cells = vec![row.name.to_owned(), row.parameter.to_string()];
        cells.extend(figures);
        table.add_row(cells);
    }

    table
}

