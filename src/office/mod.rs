//! Practice-level services layered over the store: audit recording, deletion
//! checks and orchestration, scheduling conflict probes, and dashboard
//! aggregation.

pub mod audit;
pub mod retention;
pub mod schedule;
pub mod stats;
