pub mod allocation_solution;
pub mod analysis;
pub mod extract;
