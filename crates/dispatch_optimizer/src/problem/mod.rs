pub mod allocation_problem;
pub mod availability;
pub mod cost_matrix;
pub mod courier;
pub mod location;
pub mod order;
pub mod priority;
pub mod restaurant;
