pub mod error;
pub mod json;
pub mod model;
pub mod pipeline;
pub mod problem;
pub mod sensitivity;
pub mod solution;
pub mod solver;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;
