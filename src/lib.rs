//! Core scheduling engine for a diagnostic-radiology residency program.
//!
//! The pipeline runs as a strict sequence of phases over one shared
//! [`domain::grid::ScheduleGrid`]: track derivation, trivial R1 assignment,
//! the R2 constraint matcher, the R3/R4 builders, the night-float overlay
//! solver, and finally the sampler resolver and validator. Each phase is
//! its own module; [`pipeline`] wires them together in order.

pub mod config;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod solvers;
pub mod tracks;
pub mod validate;
pub mod workbook;

pub use error::{SchedulerError, WorkbookError};
