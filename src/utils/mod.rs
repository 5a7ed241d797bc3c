// src/utils/mod.rs
pub mod cache;
