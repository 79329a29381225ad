// src/core/mod.rs — Sequence model and generation engine

pub mod budget;
pub mod editing;
pub mod executable;
pub mod generator;
pub mod operation;
pub mod pool;
pub mod sandbox;
pub mod sequence;
pub mod types;
