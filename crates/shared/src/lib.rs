pub mod config;
pub mod errors;
pub mod resilience;
pub mod utils;
