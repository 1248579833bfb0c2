//! The shared, mutable schedule grid.
//!
//! A dense matrix indexed by (resident, week ∈ [0, 52)). Each phase of the
//! pipeline has exclusive write access to cells matching its phase
//! predicate and must not rewrite cells locked by a prior phase;
//! [`ScheduleGrid::assign`] enforces this as a precondition assertion
//! rather than leaving it to call-site discipline.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

use super::rotation::{HospitalSystem, RotationCatalog};

pub const WEEKS_PER_YEAR: u32 = 52;

/// Which pipeline phase wrote a cell. Ordered so a later phase can assert
/// "nothing after me has locked this yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    R1Assignment,
    R2Matcher,
    R3Builder,
    R4Builder,
    NightFloat,
    SamplerResolution,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Cell {
    code: Option<String>,
    locked_by: Option<Phase>,
}

/// The dense (resident × week) schedule grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleGrid {
    resident_index: HashMap<String, usize>,
    residents: Vec<String>,
    cells: Vec<Vec<Cell>>, // [resident_idx][week]
}

impl ScheduleGrid {
    pub fn new(residents: impl IntoIterator<Item = String>) -> Self {
        let residents: Vec<String> = residents.into_iter().collect();
        let resident_index = residents
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        let cells = residents
            .iter()
            .map(|_| (0..WEEKS_PER_YEAR).map(|_| Cell::default()).collect())
            .collect();
        Self {
            resident_index,
            residents,
            cells,
        }
    }

    pub fn residents(&self) -> &[String] {
        &self.residents
    }

    fn idx(&self, resident: &str) -> Option<usize> {
        self.resident_index.get(resident).copied()
    }

    pub fn get(&self, resident: &str, week: u32) -> Option<&str> {
        let i = self.idx(resident)?;
        self.cells[i][week as usize].code.as_deref()
    }

    pub fn locked_by(&self, resident: &str, week: u32) -> Option<Phase> {
        let i = self.idx(resident)?;
        self.cells[i][week as usize].locked_by
    }

    /// Write `code` into (resident, week) under `phase`, failing if the
    /// cell was already locked by a prior phase. A phase may freely
    /// overwrite its own still-unlocked writes within the same call before
    /// the phase finishes (used by backtracking placers); it may never
    /// touch a cell a *different* phase has already locked.
    pub fn assign(
        &mut self,
        resident: &str,
        week: u32,
        code: impl Into<String>,
        phase: Phase,
    ) -> Result<(), SchedulerError> {
        let i = self.idx(resident).ok_or_else(|| {
            SchedulerError::data_integrity(format!("unknown resident: {resident}"))
        })?;
        if week >= WEEKS_PER_YEAR {
            return Err(SchedulerError::data_integrity(format!(
                "week {week} out of range"
            )));
        }
        let cell = &mut self.cells[i][week as usize];
        if let Some(locked) = cell.locked_by {
            if locked != phase {
                return Err(SchedulerError::data_integrity(format!(
                    "cell ({resident}, week {week}) already locked by {locked:?}, phase {phase:?} may not rewrite it"
                )));
            }
        }
        cell.code = Some(code.into());
        cell.locked_by = Some(phase);
        Ok(())
    }

    pub fn is_assigned(&self, resident: &str, week: u32) -> bool {
        self.get(resident, week).is_some()
    }

    /// Overlay `code` onto (resident, week), intentionally bypassing the
    /// phase-lock precondition [`assign`](Self::assign) enforces.
    ///
    /// Night float is a real pull off the resident's day rotation (§3,
    /// §4.6) rather than a second independent tab, so the overlay phase
    /// is the one place in the pipeline allowed to supersede an earlier
    /// phase's lock. Returns the day-rotation code that was overlaid, if
    /// any, so the sampler resolver (§4.7) can tell which rotation lost
    /// coverage that week.
    pub fn overlay(
        &mut self,
        resident: &str,
        week: u32,
        code: impl Into<String>,
        phase: Phase,
    ) -> Result<Option<String>, SchedulerError> {
        let i = self.idx(resident).ok_or_else(|| {
            SchedulerError::data_integrity(format!("unknown resident: {resident}"))
        })?;
        if week >= WEEKS_PER_YEAR {
            return Err(SchedulerError::data_integrity(format!(
                "week {week} out of range"
            )));
        }
        let cell = &mut self.cells[i][week as usize];
        let prior_code = cell.code.take();
        cell.code = Some(code.into());
        cell.locked_by = Some(phase);
        Ok(prior_code)
    }

    /// All (non-OTHER) hospital systems present across a resident's four
    /// cells in `block`'s week range, used to enforce hospital exclusivity
    /// within a block.
    pub fn hospital_systems_in_block(
        &self,
        resident: &str,
        weeks: impl Iterator<Item = u32>,
        catalog: &RotationCatalog,
    ) -> Vec<HospitalSystem> {
        let mut systems = Vec::new();
        for week in weeks {
            if let Some(code) = self.get(resident, week) {
                if let Some(sys) = catalog.hospital_system_of(code) {
                    if sys != HospitalSystem::Other && !systems.contains(&sys) {
                        systems.push(sys);
                    }
                }
            }
        }
        systems
    }
}
