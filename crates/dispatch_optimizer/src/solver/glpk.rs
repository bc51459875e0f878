use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread,
    time::Duration,
};

use jiff::SignedDuration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::model::linear_model::LinearModel;

use super::{
    lp_format::write_lp,
    raw_solution::{RawSolution, SolveStatistics, SolveStatus},
    solver_backend::{SolveLimits, SolverBackend, solve_without_variables},
};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs GLPK's `glpsol` as a child process on a CPLEX LP file.
#[derive(Debug, Clone)]
pub struct GlpkBackend {
    binary: PathBuf,
    scratch_dir: PathBuf,
    /// Extra wall-clock time granted past the budget before the child is
    /// killed.
    kill_grace: SignedDuration,
}

impl GlpkBackend {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        GlpkBackend {
            binary: binary.into(),
            scratch_dir: std::env::temp_dir(),
            kill_grace: SignedDuration::from_secs(2),
        }
    }

    pub fn with_scratch_dir(mut self, scratch_dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = scratch_dir.into();
        self
    }

    fn statistics(&self, limits: &SolveLimits) -> SolveStatistics {
        SolveStatistics {
            backend: self.name(),
            elapsed: limits.deadline.elapsed(),
            ..SolveStatistics::default()
        }
    }

    fn run(&self, model: &LinearModel, limits: &SolveLimits, files: &ScratchFiles) -> RawSolution {
        if let Err(error) = write_model(model, &files.model) {
            return RawSolution::without_point(SolveStatus::Unavailable, self.statistics(limits))
                .with_message(format!("cannot write model file: {error}"));
        }

        let remaining = limits.deadline.remaining();
        let seconds = remaining.as_secs_f64().ceil().max(1.0) as u64;

        let mut command = Command::new(&self.binary);
        command
            .arg("--lp")
            .arg(&files.model)
            .arg("--tmlim")
            .arg(seconds.to_string())
            .arg("-w")
            .arg(&files.solution);
        if let Some(gap) = limits.relative_gap {
            command.arg("--mipgap").arg(gap.to_string());
        }

        let log = match File::create(&files.log) {
            Ok(log) => log,
            Err(error) => {
                return RawSolution::without_point(
                    SolveStatus::Unavailable,
                    self.statistics(limits),
                )
                .with_message(format!("cannot create log file: {error}"));
            }
        };
        let stderr = log.try_clone().map(Stdio::from).unwrap_or_else(|_| Stdio::null());
        command.stdin(Stdio::null()).stdout(log).stderr(stderr);

        info!(command = ?command, "spawning glpsol");
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(error) => {
                let reason = if error.kind() == io::ErrorKind::NotFound {
                    format!("`{}` not found", self.binary.display())
                } else {
                    format!("cannot spawn `{}`: {error}", self.binary.display())
                };
                return RawSolution::without_point(
                    SolveStatus::Unavailable,
                    self.statistics(limits),
                )
                .with_message(reason);
            }
        };

        let hard_limit = limits.deadline.budget() + self.kill_grace;
        let exit_status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if limits.deadline.elapsed() > hard_limit => {
                    warn!("glpsol exceeded its time budget, killing it");
                    let _ = child.kill();
                    let _ = child.wait();
                    return RawSolution::without_point(
                        SolveStatus::TimeoutNoIncumbent,
                        self.statistics(limits),
                    );
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(error) => {
                    let _ = child.kill();
                    return RawSolution::without_point(
                        SolveStatus::Unavailable,
                        self.statistics(limits),
                    )
                    .with_message(format!("lost track of glpsol: {error}"));
                }
            }
        };

        let output = fs::read_to_string(&files.log).unwrap_or_default();
        debug!(status = %exit_status, "glpsol exited");

        let solution = match fs::read_to_string(&files.solution) {
            Ok(solution) if exit_status.success() => solution,
            _ => {
                let tail = output.lines().last().unwrap_or_default().to_owned();
                return RawSolution::without_point(
                    SolveStatus::Unavailable,
                    self.statistics(limits),
                )
                .with_message(format!("glpsol exited with {exit_status}: {tail}"));
            }
        };

        let mut raw = parse_solution(
            &solution,
            &output,
            model.num_variables(),
            limits.relative_gap.is_some(),
        );
        raw.statistics = self.statistics(limits);
        raw
    }
}

impl SolverBackend for GlpkBackend {
    fn name(&self) -> &'static str {
        "glpk"
    }

    #[instrument(skip_all, level = "debug")]
    fn solve(&self, model: &LinearModel, limits: &SolveLimits) -> RawSolution {
        if model.num_variables() == 0 {
            return solve_without_variables(model, self.name());
        }

        if limits.deadline.is_expired() {
            return RawSolution::without_point(
                SolveStatus::TimeoutNoIncumbent,
                self.statistics(limits),
            );
        }

        let files = ScratchFiles::new(&self.scratch_dir);
        let solution = self.run(model, limits, &files);
        files.remove();
        solution
    }
}

struct ScratchFiles {
    model: PathBuf,
    solution: PathBuf,
    log: PathBuf,
}

impl ScratchFiles {
    fn new(dir: &Path) -> Self {
        let stem = format!("dispatch-{}", Uuid::new_v4());
        ScratchFiles {
            model: dir.join(format!("{stem}.lp")),
            solution: dir.join(format!("{stem}.sol")),
            log: dir.join(format!("{stem}.log")),
        }
    }

    fn remove(&self) {
        for path in [&self.model, &self.solution, &self.log] {
            let _ = fs::remove_file(path);
        }
    }
}

fn write_model(model: &LinearModel, path: &Path) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_lp(model, &mut writer)?;
    writer.flush()
}

/// Reads GLPK's raw MIP solution (`glpsol -w`). Columns are numbered in
/// order of appearance in the LP file, i.e. by variable index.
pub(crate) fn parse_solution(
    solution: &str,
    output: &str,
    num_variables: usize,
    gap_requested: bool,
) -> RawSolution {
    let mut status_code = None;
    let mut objective = None;
    let mut values = vec![0.0; num_variables];

    for line in solution.lines() {
        let fields = line.split_whitespace().collect::<Vec<_>>();
        match fields.as_slice() {
            ["s", "mip", _rows, _columns, status, value] => {
                status_code = status.chars().next();
                objective = value.parse::<f64>().ok();
            }
            ["j", column, value] => {
                let column = column
                    .parse::<usize>()
                    .ok()
                    .filter(|column| (1..=num_variables).contains(column));
                if let (Some(column), Ok(value)) = (column, value.parse::<f64>()) {
                    values[column - 1] = value;
                }
            }
            _ => {}
        }
    }

    let upper_output = output.to_uppercase();
    let time_limit = upper_output.contains("TIME LIMIT");
    let statistics = SolveStatistics::default();

    let status = match status_code {
        Some('o') => SolveStatus::Optimal,
        Some('f') if time_limit || !gap_requested => SolveStatus::TimeoutWithIncumbent,
        Some('f') => SolveStatus::SuboptimalWithinGap,
        Some('n') => SolveStatus::Infeasible,
        _ if upper_output.contains("UNBOUNDED") => SolveStatus::Unbounded,
        _ if time_limit => SolveStatus::TimeoutNoIncumbent,
        _ if upper_output.contains("NO PRIMAL FEASIBLE")
            || upper_output.contains("NO INTEGER FEASIBLE") =>
        {
            SolveStatus::Infeasible
        }
        _ => {
            return RawSolution::without_point(SolveStatus::Unavailable, statistics)
                .with_message("glpsol reported no usable MIP status");
        }
    };

    match (status.has_solution(), objective) {
        (true, Some(objective)) => RawSolution::with_point(status, objective, values, statistics),
        (true, None) => RawSolution::without_point(SolveStatus::Unavailable, statistics)
            .with_message("glpsol solution has no objective value"),
        (false, _) => RawSolution::without_point(status, statistics),
    }
}
