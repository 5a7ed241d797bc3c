// src/processing/mod.rs
pub mod classify;
pub mod health;
pub mod indices;
pub mod interpret;
pub mod parallel;
pub mod pest;
pub mod quality;
pub mod recommend;
pub mod statistics;
pub mod trend;

// Re-export main components
pub use parallel::ParallelProcessor;
