// src/plan/mod.rs

//! Dependency-ordered maintenance plans from `[step.<name>]` sections.
//!
//! The plan is the phased repair sequence: a restore point first, then
//! policy tweaks, then groups of independent cleanups. `graph` turns the
//! steps into waves with petgraph; `runner` executes each wave as one
//! task batch and reports per-command statuses.

pub mod graph;
pub mod runner;

pub use graph::{Plan, PlanStep};
pub use runner::{CommandRecord, PlanReport, PlanRunner, StepReport};
