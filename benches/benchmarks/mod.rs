pub mod duchi_benchmark;
pub mod bassily_benchmark;
pub mod privkv_benchmark;
