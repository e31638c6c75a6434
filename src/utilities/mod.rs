/// Error taxonomy
pub mod errors;
/// Privacy and domain parameters
pub mod params;
/// Injectable random number generators and uniform draws
pub mod randomness;
/// Exact combinatorial constants
pub mod exactarithmetic;
/// Run configuration
pub mod config;
/// Population-level encode and aggregate drivers
pub mod batch;
