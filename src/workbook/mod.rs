//! The workbook boundary: traits the core reads its external input
//! through and writes its output to. The core treats the actual tabular
//! file format as a peripheral collaborator — only this interface is
//! specified; any concrete reader/writer (spreadsheet, CSV, database) can
//! implement it.

pub mod memory;

use std::collections::HashMap;

use crate::domain::{
    GraduationRequirementTable, Pathway, Resident, RotationCatalog, ScheduleGrid, StaffingEnvelope,
};
use crate::error::WorkbookError;
use crate::solvers::r3_builder::AirpSession;

pub use memory::MemoryWorkbook;

/// Everything the synthesis pipeline needs pulled from the persisted
/// workbook before a build can start.
pub struct WorkbookInput {
    pub residents: Vec<Resident>,
    pub catalog: RotationCatalog,
    pub envelope: StaffingEnvelope,
    pub requirements: GraduationRequirementTable,
    pub r1_base_sequence: Vec<String>,
    pub r2_base_sequence: Vec<String>,
    pub core_exam_block: u32,
    pub airp_sessions: Vec<AirpSession>,
    /// `rank[(resident, session_id)]`: 1 = most preferred, from the
    /// preference survey's AIRP session rankings.
    pub airp_rank: HashMap<(String, u32), u32>,
    /// R2 track index reserved for a pathway (e.g. the ESIR-compatible
    /// track), per §4.3 — "`x[i,t] = 0` when the track is
    /// pathway-incompatible". A track absent from this map is open to
    /// every eligible resident.
    pub r2_pathway_tracks: HashMap<Pathway, u32>,
}

/// Read-side of the workbook boundary.
pub trait WorkbookSource {
    fn load(&self) -> Result<WorkbookInput, WorkbookError>;

    /// A previously-written schedule, if this source already has one —
    /// the `validate` CLI command's input (§6, `scheduler validate
    /// INPUT.xlsm`) rather than a fresh `build`. `None` when the source
    /// has never been written to.
    fn load_existing_grid(&self, _residents: &[Resident]) -> Result<Option<ScheduleGrid>, WorkbookError> {
        Ok(None)
    }
}

/// Write-side of the workbook boundary. The input file is never
/// overwritten in place; a sink always targets a fresh copy.
pub trait WorkbookSink {
    fn write_schedule(&mut self, grid: &ScheduleGrid) -> Result<(), WorkbookError>;
}
