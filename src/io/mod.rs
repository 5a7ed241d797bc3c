// src/io/mod.rs
pub mod reader;
pub mod writer;

pub use reader::{read_history, read_request};
pub use writer::{to_json, write_result};
