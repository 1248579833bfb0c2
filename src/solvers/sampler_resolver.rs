//! The sampler resolver (§4.7): rewrites each R1's `Msamp` placeholder
//! block into its concrete four-week decomposition — one week `Pcbi`, one
//! week `Mucic`/`Mir`, and two weeks `Mnuc` — ordered so the `Mnuc` weeks
//! land on any week the night-float solver already pulled an upper-level
//! `Mnuc` resident away from coverage.
//!
//! Like the night-float overlay it reads from, this necessarily rewrites
//! cells [`super::r1`] already locked, so it uses
//! [`crate::domain::grid::ScheduleGrid::overlay`] rather than `assign`.

use std::collections::HashSet;

use crate::domain::{Phase, Resident, ScheduleGrid, WEEKS_PER_YEAR};
use crate::error::SchedulerError;

use super::nf_solver::NfPull;

const MSAMP_CODE: &str = "Msamp";

pub struct SamplerInput<'a> {
    pub residents: &'a [Resident],
    pub nf_pulls: &'a [NfPull],
}

/// One resolved placeholder week: which resident, which week, which code
/// it was rewritten to.
#[derive(Debug, Clone)]
pub struct SamplerPlacement {
    pub resident: String,
    pub week: u32,
    pub code: String,
}

fn mucic_or_mir(resident: &Resident) -> &'static str {
    match resident.preferences.sampler_preference.as_deref() {
        Some("Mir") => "Mir",
        _ => "Mucic",
    }
}

/// Weeks the night-float solver pulled an `Mnuc` resident off coverage —
/// the preferred landing spot for the sampler's two `Mnuc` weeks.
fn mnuc_gap_weeks(pulls: &[NfPull]) -> HashSet<u32> {
    pulls
        .iter()
        .filter(|p| p.pulled_from.as_deref() == Some("Mnuc"))
        .map(|p| p.week)
        .collect()
}

/// Rewrite one contiguous `Msamp` block for `resident` in place.
fn resolve_block(
    resident: &Resident,
    weeks: &[u32],
    gaps: &HashSet<u32>,
    grid: &mut ScheduleGrid,
    placements: &mut Vec<SamplerPlacement>,
) -> Result<(), SchedulerError> {
    let mut ordered = weeks.to_vec();
    ordered.sort_by_key(|w| (!gaps.contains(w), *w));

    let total = ordered.len();
    let n_mnuc = total.min(2);
    let (mnuc_weeks, rest) = ordered.split_at(n_mnuc);

    let mut rest_sorted = rest.to_vec();
    rest_sorted.sort();
    let n_pcbi = rest_sorted.len().min(1);
    let mucic_mir = mucic_or_mir(resident);

    for (i, week) in rest_sorted.iter().enumerate() {
        let code = if i < n_pcbi { "Pcbi" } else { mucic_mir };
        grid.overlay(&resident.name, *week, code, Phase::SamplerResolution)?;
        placements.push(SamplerPlacement {
            resident: resident.name.clone(),
            week: *week,
            code: code.to_string(),
        });
    }

    let mut mnuc_sorted = mnuc_weeks.to_vec();
    mnuc_sorted.sort();
    for week in mnuc_sorted {
        grid.overlay(&resident.name, week, "Mnuc", Phase::SamplerResolution)?;
        placements.push(SamplerPlacement {
            resident: resident.name.clone(),
            week,
            code: "Mnuc".to_string(),
        });
    }

    Ok(())
}

/// Resolve every resident's `Msamp` blocks into concrete rotations.
pub fn resolve(input: &SamplerInput, grid: &mut ScheduleGrid) -> Result<Vec<SamplerPlacement>, SchedulerError> {
    let gaps = mnuc_gap_weeks(input.nf_pulls);
    let mut placements = Vec::new();

    let mut residents_sorted: Vec<&Resident> = input.residents.iter().collect();
    residents_sorted.sort_by(|a, b| a.name.cmp(&b.name));

    for resident in residents_sorted {
        let msamp_weeks: Vec<u32> = (0..WEEKS_PER_YEAR)
            .filter(|&w| grid.get(&resident.name, w) == Some(MSAMP_CODE))
            .collect();
        if msamp_weeks.is_empty() {
            continue;
        }

        for block in msamp_weeks.chunks(4) {
            resolve_block(resident, block, &gaps, grid, &mut placements)?;
        }
    }

    Ok(placements)
}
