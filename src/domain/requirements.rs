//! Graduation requirement tables and the NucMed weighted-credit rule.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::resident::Pathway;
use super::rotation::Section;

/// Target credited weeks for a single (pathway, section) pair, plus the
/// pathway-specific hard blocks (e.g. ESIR's 12 IR weeks with a per-year
/// decomposition). Hard blocks are modeled as a fixed-rotation count the
/// builders must place verbatim, independent of the section-target table
/// below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraduationRequirementTable {
    targets: HashMap<(Pathway, Section), u32>,
    /// Sections for which the 4:1 substitution rule applies when *not*
    /// NRDR, encoded as a per-pathway rule-set rather than a hard-coded
    /// branch. NRDR residents never get the substitution regardless of
    /// what's configured here.
    substitution_sources: Vec<Section>,
}

impl GraduationRequirementTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_target(&mut self, pathway: Pathway, section: Section, weeks: u32) {
        self.targets.insert((pathway, section), weeks);
    }

    pub fn target(&self, pathway: Pathway, section: Section) -> u32 {
        self.targets.get(&(pathway, section)).copied().unwrap_or(0)
    }

    pub fn mark_substitution_source(&mut self, section: Section) {
        if !self.substitution_sources.contains(&section) {
            self.substitution_sources.push(section);
        }
    }

    pub fn is_substitution_source(&self, section: Section) -> bool {
        self.substitution_sources.contains(&section)
    }

    /// Credited weeks of `section`, applying the 4:1 NucMed substitution
    /// where `raw_weeks` came from a source section and the pathway set
    /// does not include NRDR. The substitution never applies to NRDR
    /// residents, full stop.
    pub fn credited_weeks(
        &self,
        section: Section,
        raw_weeks: u32,
        source_weeks: u32,
        is_nrdr: bool,
    ) -> u32 {
        if section != Section::NucMed {
            return raw_weeks;
        }
        if is_nrdr {
            return raw_weeks;
        }
        raw_weeks + source_weeks / 4
    }
}
