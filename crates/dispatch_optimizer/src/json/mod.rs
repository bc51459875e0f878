pub mod result;
pub mod schema;
pub mod types;
