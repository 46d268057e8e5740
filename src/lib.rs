//! STACKER: MLB daily fantasy roster optimizer
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod identity;
pub mod data;
pub mod strategy;
pub mod engine;
pub mod optimizer;
