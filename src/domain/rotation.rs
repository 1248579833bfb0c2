//! Rotation codes, sections, and hospital systems.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::resident::Pgy;

/// The hospital system a rotation is billed/staffed under. `P`-prefix
/// rotations are payroll-equivalent to UCSF and must collapse to it — this
/// is encoded per-code in [`RotationCatalog`], not derived by stripping a
/// `P` prefix at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HospitalSystem {
    Ucsf,
    Zsfg,
    Va,
    Other,
}

/// A coarse clinical grouping used for graduation accounting and
/// quartile-based deficiency analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    Breast,
    NucMed,
    Msk,
    Peds,
    Ir,
    Neuro,
    Body,
    Chest,
    Cardiac,
    Other,
}

impl Section {
    pub fn all_sections() -> [Section; 10] {
        [
            Section::Breast,
            Section::NucMed,
            Section::Msk,
            Section::Peds,
            Section::Ir,
            Section::Neuro,
            Section::Body,
            Section::Chest,
            Section::Cardiac,
            Section::Other,
        ]
    }
}

/// A single rotation code's catalog entry (the `Key` tab).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationCode {
    pub code: String,
    pub hospital_system: HospitalSystem,
    pub section: Section,
    pub eligible_pgy: HashSet<Pgy>,
    pub participates_nf: bool,
}

impl RotationCode {
    pub fn eligible_for(&self, pgy: Pgy) -> bool {
        self.eligible_pgy.contains(&pgy)
    }
}

/// Lookup table mapping rotation codes to their catalog entries. Built once
/// from the `Key` tab at load time; immutable afterward.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RotationCatalog {
    codes: HashMap<String, RotationCode>,
}

impl RotationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: RotationCode) {
        self.codes.insert(code.code.clone(), code);
    }

    pub fn get(&self, code: &str) -> Option<&RotationCode> {
        self.codes.get(code)
    }

    pub fn hospital_system_of(&self, code: &str) -> Option<HospitalSystem> {
        self.get(code).map(|c| c.hospital_system)
    }

    pub fn section_of(&self, code: &str) -> Option<Section> {
        self.get(code).map(|c| c.section)
    }

    /// Codes that credit the given section (multiple codes may share a
    /// section, e.g. `Vb`/`Mb`/`Ser` all crediting MSK).
    pub fn codes_for_section(&self, section: Section) -> Vec<&str> {
        self.codes
            .values()
            .filter(|c| c.section == section)
            .map(|c| c.code.as_str())
            .collect()
    }
}
