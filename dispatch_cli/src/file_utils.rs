use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use anyhow::Context;
use dispatch_optimizer::{
    json::types::JsonAllocationProblem, problem::allocation_problem::AllocationProblem,
};
use serde::Serialize;

pub fn read_problem(path: &Path) -> Result<AllocationProblem, anyhow::Error> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let content: JsonAllocationProblem = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("cannot parse {}", path.display()))?;

    Ok(content.build_problem()?)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), anyhow::Error> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    Ok(())
}
