pub mod allocation_model;
pub mod build_model;
pub mod linear_model;
pub mod model_params;
