// src/lib.rs — Library root for seqforge

pub mod cli;
pub mod core;
pub mod evaluator;
pub mod infra;
pub mod output;
pub mod targets;
