// src/core/mod.rs
pub mod engine;
