//! Resident identity, pathway flags, and preference records.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::rotation::Section;

/// Post-graduate year, always the *target*-year level — the level a
/// resident will hold during the academic year being built, not the level
/// they held the prior year. That distinction is preserved across every
/// consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pgy {
    R1,
    R2,
    R3,
    R4,
}

impl Pgy {
    pub fn all() -> [Pgy; 4] {
        [Pgy::R1, Pgy::R2, Pgy::R3, Pgy::R4]
    }
}

/// An optional specialization commitment. Not mutually exclusive — a
/// resident may carry any subset of these, so it's modeled as an
/// independent set rather than an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pathway {
    Esir,
    Esnr,
    T32,
    Nrdr,
}

/// An independent set of pathway flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathwaySet(HashSet<Pathway>);

impl PathwaySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, p: Pathway) -> bool {
        self.0.contains(&p)
    }

    pub fn insert(&mut self, p: Pathway) {
        self.0.insert(p);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge another set's flags into this one (used to apply the
    /// recs-tab override: survey-first, then overwrite from recs).
    pub fn merge_from(&mut self, other: &PathwaySet) {
        for p in &other.0 {
            self.0.insert(*p);
        }
    }
}

/// One resident's per-resident preference data, assembled from the
/// preference survey (advisory) and the `R3-4 Recs` tab (authoritative for
/// pathway flags — see [`PathwaySet::merge_from`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferenceRecord {
    /// Track index ranked 1 (most preferred) .. N, indexed by track id.
    pub track_ranks: HashMap<u32, u32>,
    pub section_top: Vec<Section>,
    pub section_bottom: Vec<Section>,
    /// AIRP session id ranked 1 (most preferred) .. N.
    pub airp_session_ranks: HashMap<u32, u32>,
    /// Weeks (0-based, [0, 52)) the resident must not receive night float.
    pub no_call_weeks: HashSet<u32>,
    pub vacation_weeks: HashSet<u32>,
    pub fse_choice: Option<String>,
    /// Requested research/CEP duration in months, if any.
    pub research_cep_months: Option<u32>,
    /// R1 sampler rotation preference, used to resolve `Msamp`.
    pub sampler_preference: Option<String>,
    /// An explicit, human-provided annotation — never inferred by the
    /// core — used to redistribute unfilled `Mx` quota.
    pub harsh_r2_year: bool,
    /// Whether this resident had an IR rotation over the Christmas/New
    /// Year holiday span in the prior academic year. Drives the R3
    /// builder's "no `Zir` over Christmas again" policy (§4.4.3).
    pub had_ir_over_christmas_last_year: bool,
    /// Requested supplementary research funding, which lifts the R4
    /// research/CEP cap above its default two months (§4.5.1).
    pub supplementary_research_funding: bool,
}

/// A resident's identity, pathway flags, preference record, and historical
/// per-section weeks tally. Populated once from roster + preferences +
/// pathway-authoritative overrides, then immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resident {
    /// Stable name key — the canonical identity used across all tabs.
    pub name: String,
    pub future_pgy: Pgy,
    pub pathways: PathwaySet,
    pub preferences: PreferenceRecord,
    pub historical_weeks: HashMap<Section, u32>,
}

impl Resident {
    pub fn historical(&self, section: Section) -> u32 {
        self.historical_weeks.get(&section).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pathway_set_is_not_mutually_exclusive() {
        let mut set = PathwaySet::new();
        set.insert(Pathway::Esir);
        set.insert(Pathway::T32);
        assert!(set.has(Pathway::Esir));
        assert!(set.has(Pathway::T32));
        assert!(!set.has(Pathway::Nrdr));
    }

    #[test]
    fn recs_merge_is_additive_and_overwrites_nothing_survey_already_set() {
        let mut survey = PathwaySet::new();
        survey.insert(Pathway::T32);

        let mut recs = PathwaySet::new();
        recs.insert(Pathway::Nrdr);

        survey.merge_from(&recs);
        assert!(survey.has(Pathway::T32));
        assert!(survey.has(Pathway::Nrdr));
    }
}
