//! An in-memory `WorkbookSource`/`WorkbookSink` pair, used by tests and by
//! `--dry-run` builds that never touch a real file.

use std::collections::HashMap;

use crate::domain::{
    GraduationRequirementTable, Pathway, Resident, RotationCatalog, ScheduleGrid, StaffingEnvelope,
    WEEKS_PER_YEAR,
};
use crate::error::WorkbookError;
use crate::solvers::r3_builder::AirpSession;

use super::{WorkbookInput, WorkbookSink, WorkbookSource};

/// Holds a fully-populated `WorkbookInput` plus whatever the sink side
/// later writes, so a round trip can be asserted in tests without any I/O.
#[derive(Default)]
pub struct MemoryWorkbook {
    pub residents: Vec<Resident>,
    pub catalog: RotationCatalog,
    pub envelope: StaffingEnvelope,
    pub requirements: GraduationRequirementTable,
    pub r1_base_sequence: Vec<String>,
    pub r2_base_sequence: Vec<String>,
    pub core_exam_block: u32,
    pub airp_sessions: Vec<AirpSession>,
    pub airp_rank: HashMap<(String, u32), u32>,
    pub r2_pathway_tracks: HashMap<Pathway, u32>,
    pub written: HashMap<(String, u32), String>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkbookSource for MemoryWorkbook {
    fn load(&self) -> Result<WorkbookInput, WorkbookError> {
        if self.residents.is_empty() {
            return Err(WorkbookError::MissingData("roster".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        for r in &self.residents {
            if !seen.insert(&r.name) {
                return Err(WorkbookError::DuplicateResident(r.name.clone()));
            }
        }

        Ok(WorkbookInput {
            residents: self.residents.clone(),
            catalog: self.catalog.clone(),
            envelope: self.envelope.clone(),
            requirements: self.requirements.clone(),
            r1_base_sequence: self.r1_base_sequence.clone(),
            r2_base_sequence: self.r2_base_sequence.clone(),
            core_exam_block: self.core_exam_block,
            airp_sessions: self.airp_sessions.clone(),
            airp_rank: self.airp_rank.clone(),
            r2_pathway_tracks: self.r2_pathway_tracks.clone(),
        })
    }

    fn load_existing_grid(&self, residents: &[Resident]) -> Result<Option<ScheduleGrid>, WorkbookError> {
        if self.written.is_empty() {
            return Ok(None);
        }
        // Re-hydrated purely for validation, never written to again, so a
        // single nominal phase for every cell is enough to satisfy the
        // grid's lock invariant.
        let mut grid = ScheduleGrid::new(residents.iter().map(|r| r.name.clone()));
        for ((resident, week), code) in &self.written {
            grid.assign(resident, *week, code.clone(), crate::domain::Phase::R1Assignment)
                .map_err(|e| WorkbookError::UnparseableCell {
                    location: format!("{resident}@{week}"),
                    detail: e.to_string(),
                })?;
        }
        Ok(Some(grid))
    }
}

impl WorkbookSink for MemoryWorkbook {
    fn write_schedule(&mut self, grid: &ScheduleGrid) -> Result<(), WorkbookError> {
        for resident in grid.residents() {
            for week in 0..WEEKS_PER_YEAR {
                if let Some(code) = grid.get(resident, week) {
                    self.written
                        .insert((resident.clone(), week), code.to_string());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{resident::Pgy, PathwaySet, PreferenceRecord};

    fn resident(name: &str) -> Resident {
        Resident {
            name: name.to_string(),
            future_pgy: Pgy::R2,
            pathways: PathwaySet::new(),
            preferences: PreferenceRecord::default(),
            historical_weeks: HashMap::new(),
        }
    }

    #[test]
    fn empty_roster_is_a_missing_data_error() {
        let wb = MemoryWorkbook::new();
        let err = wb.load().unwrap_err();
        assert!(matches!(err, WorkbookError::MissingData(_)));
    }

    #[test]
    fn duplicate_resident_name_is_rejected() {
        let mut wb = MemoryWorkbook::new();
        wb.residents.push(resident("alice"));
        wb.residents.push(resident("alice"));
        let err = wb.load().unwrap_err();
        assert!(matches!(err, WorkbookError::DuplicateResident(_)));
    }

    #[test]
    fn write_then_load_round_trips_grid_contents() {
        let mut wb = MemoryWorkbook::new();
        wb.residents.push(resident("alice"));
        let grid = ScheduleGrid::new(["alice".to_string()]);
        wb.write_schedule(&grid).unwrap();
        assert!(wb.load().is_ok());
    }

    #[test]
    fn unwritten_workbook_has_no_existing_grid() {
        let mut wb = MemoryWorkbook::new();
        wb.residents.push(resident("alice"));
        assert!(wb.load_existing_grid(&wb.residents).unwrap().is_none());
    }

    #[test]
    fn written_workbook_rehydrates_an_existing_grid_for_validate() {
        let mut wb = MemoryWorkbook::new();
        wb.residents.push(resident("alice"));
        let mut grid = ScheduleGrid::new(["alice".to_string()]);
        grid.assign("alice", 3, "Mnuc", crate::domain::Phase::R1Assignment).unwrap();
        wb.write_schedule(&grid).unwrap();

        let existing = wb.load_existing_grid(&wb.residents).unwrap().unwrap();
        assert_eq!(existing.get("alice", 3), Some("Mnuc"));
    }
}
