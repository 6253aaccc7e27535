// src/utils/mod.rs
pub mod backoff;
