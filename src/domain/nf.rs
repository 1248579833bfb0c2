//! Night-float rule set.

use serde::{Deserialize, Serialize};

use super::resident::Pgy;

/// A night-float shift kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NfKind {
    Mnf,
    Snf,
    Snf2,
}

impl NfKind {
    pub fn code(&self) -> &'static str {
        match self {
            NfKind::Mnf => "Mnf",
            NfKind::Snf => "Snf",
            NfKind::Snf2 => "Snf2",
        }
    }
}

/// Minimum number of weeks that must separate any two NF weeks for the
/// same resident.
pub const MIN_NF_SPACING_WEEKS: u32 = 4;

/// Rotations preferred as NF sources — pulling night float from residents
/// already on these reduces disruption to their daytime rotation.
pub const PREFERRED_NF_SOURCE_ROTATIONS: [&str; 5] = ["Pcmb", "Mb", "Mucic", "Peds", "Mnuc"];

/// Per-PGY NF requirement: R2 → 2 Mnf; R3 → ≤3 total across
/// {Mnf, Snf2}; R4 → 2 Snf2.
#[derive(Debug, Clone, Copy)]
pub struct NfRequirement {
    pub kinds: &'static [NfKind],
    pub exact_count: Option<u32>,
    pub max_count: Option<u32>,
}

pub fn nf_requirement(pgy: Pgy) -> Option<NfRequirement> {
    match pgy {
        Pgy::R2 => Some(NfRequirement {
            kinds: &[NfKind::Mnf],
            exact_count: Some(2),
            max_count: None,
        }),
        Pgy::R3 => Some(NfRequirement {
            kinds: &[NfKind::Mnf, NfKind::Snf2],
            exact_count: None,
            max_count: Some(3),
        }),
        Pgy::R4 => Some(NfRequirement {
            kinds: &[NfKind::Snf2],
            exact_count: Some(2),
            max_count: None,
        }),
        Pgy::R1 => None,
    }
}

/// Whether two NF weeks for the same resident satisfy the minimum spacing
/// invariant: no two NF weeks within 3 weeks of each other, i.e. a gap of
/// at least 4.
pub fn spacing_ok(w1: u32, w2: u32) -> bool {
    w1.abs_diff(w2) >= MIN_NF_SPACING_WEEKS
}
