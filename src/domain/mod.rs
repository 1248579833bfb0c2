//! Core domain models for the residency rotation scheduler.
//!
//! Mirrors the structure of the telescope-scheduling domain model this was
//! grounded on (`core::domain::{Period, SchedulingBlock}`): a handful of
//! small, mostly-immutable value types plus the one shared mutable resource
//! (the [`grid::ScheduleGrid`]).

pub mod calendar;
pub mod grid;
pub mod nf;
pub mod requirements;
pub mod resident;
pub mod rotation;
pub mod staffing;

pub use calendar::{derive_block_calendar, BlockCalendar, WeekRange};
pub use grid::{Phase, ScheduleGrid, WEEKS_PER_YEAR};
pub use nf::{nf_requirement, spacing_ok, NfKind, NfRequirement};
pub use requirements::GraduationRequirementTable;
pub use resident::{Pathway, PathwaySet, Pgy, PreferenceRecord, Resident};
pub use rotation::{HospitalSystem, RotationCatalog, RotationCode, Section};
pub use staffing::StaffingEnvelope;
