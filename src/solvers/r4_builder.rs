//! The R4 builder: three strictly-ordered sub-steps — fixed commitments,
//! deficiency fill, capacity fill (§4.5). Each later sub-step only ever
//! touches weeks the earlier ones left open, using the same phase-locked
//! [`ScheduleGrid`] discipline as [`super::r3_builder`].

use std::collections::HashMap;

use crate::domain::{
    BlockCalendar, GraduationRequirementTable, Pathway, Phase, Resident, RotationCatalog, Section,
    ScheduleGrid, StaffingEnvelope,
};
use crate::error::SchedulerError;

pub struct R4Input<'a> {
    pub residents: &'a [Resident],
    pub catalog: &'a RotationCatalog,
    pub requirements: &'a GraduationRequirementTable,
    pub envelope: &'a StaffingEnvelope,
    pub calendar: &'a BlockCalendar,
}

fn sorted_residents<'a>(residents: &'a [Resident]) -> Vec<&'a Resident> {
    let mut v: Vec<&Resident> = residents.iter().collect();
    v.sort_by(|a, b| a.name.cmp(&b.name));
    v
}

/// The first block, at or after `from`, in which `resident` has no cells
/// assigned yet at all.
fn first_open_block(resident: &str, grid: &ScheduleGrid, calendar: &BlockCalendar, from: u32) -> Option<u32> {
    (from..=calendar.block_count() as u32).find(|&b| {
        calendar
            .week_range(b)
            .map(|r| r.weeks().all(|w| !grid.is_assigned(resident, w)))
            .unwrap_or(false)
    })
}

/// `n` contiguous fully-open blocks starting no earlier than `from`, if
/// any exist.
fn contiguous_open_blocks(
    resident: &str,
    grid: &ScheduleGrid,
    calendar: &BlockCalendar,
    from: u32,
    n: u32,
) -> Option<Vec<u32>> {
    let total = calendar.block_count() as u32;
    for start in from..=total.saturating_sub(n.saturating_sub(1)).max(from) {
        if start + n - 1 > total {
            break;
        }
        let window: Vec<u32> = (start..start + n).collect();
        let all_open = window.iter().all(|&b| {
            calendar
                .week_range(b)
                .map(|r| r.weeks().all(|w| !grid.is_assigned(resident, w)))
                .unwrap_or(false)
        });
        if all_open {
            return Some(window);
        }
    }
    None
}

fn lock_blocks(
    grid: &mut ScheduleGrid,
    resident: &str,
    calendar: &BlockCalendar,
    blocks: &[u32],
    code: &str,
) -> Result<(), SchedulerError> {
    for &block in blocks {
        let range = calendar.week_range(block).ok_or_else(|| {
            SchedulerError::data_integrity(format!("block {block} has no week range"))
        })?;
        for week in range.weeks() {
            grid.assign(resident, week, code, Phase::R4Builder)?;
        }
    }
    Ok(())
}

/// 4.5.1: research/CEP months, FSE blocks, NRDR `Mnuc` sextet, ESIR `Mir`
/// octet, ESNR 6-block neuro window.
pub fn fixed_commitments(input: &R4Input, grid: &mut ScheduleGrid) -> Result<(), SchedulerError> {
    let ordered = sorted_residents(input.residents);

    for (idx, resident) in ordered.iter().enumerate() {
        if let Some(months) = resident.preferences.research_cep_months {
            if !resident.pathways.has(Pathway::T32) {
                let cap = if resident.preferences.supplementary_research_funding {
                    4
                } else {
                    2
                };
                let granted = months.min(cap);
                if granted > 0 {
                    if let Some(blocks) = contiguous_open_blocks(&resident.name, grid, input.calendar, 1, granted) {
                        lock_blocks(grid, &resident.name, input.calendar, &blocks, "Research")?;
                    }
                }
            }
        }

        if resident.preferences.fse_choice.as_deref() == Some("breast") {
            // Half the cohort receives FSE in the first half of the year,
            // half in the second — partitioned deterministically by
            // alphabetical position, not randomly, so reruns reproduce.
            let start_block = if idx % 2 == 0 { 1 } else { 7 };
            if let Some(blocks) = contiguous_open_blocks(&resident.name, grid, input.calendar, start_block, 6) {
                lock_blocks(grid, &resident.name, input.calendar, &blocks, "Fse")?;
            }
        }

        if resident.pathways.has(Pathway::Nrdr) {
            let mut placed = 0;
            let mut from = 1;
            while placed < 6 {
                let Some(block) = first_open_block(&resident.name, grid, input.calendar, from) else {
                    break;
                };
                lock_blocks(grid, &resident.name, input.calendar, &[block], "Mnuc")?;
                placed += 1;
                from = block + 1;
            }
        }

        if resident.pathways.has(Pathway::Esir) {
            if let Some(blocks) = contiguous_open_blocks(&resident.name, grid, input.calendar, 1, 2) {
                lock_blocks(grid, &resident.name, input.calendar, &blocks, "Mir")?;
            }
        }

        if resident.pathways.has(Pathway::Esnr) {
            if let Some(blocks) = contiguous_open_blocks(&resident.name, grid, input.calendar, 1, 6) {
                // At most one Smr among the window; the default commitment
                // carries none, leaving room for a human override to swap
                // one block for Smr without violating the invariant.
                lock_blocks(grid, &resident.name, input.calendar, &blocks, "Mneu")?;
            }
        }
    }

    Ok(())
}

fn current_weeks_of(resident: &Resident, grid: &ScheduleGrid, catalog: &RotationCatalog, section: Section) -> u32 {
    (0..crate::domain::WEEKS_PER_YEAR)
        .filter(|w| grid.get(&resident.name, *w).and_then(|c| catalog.section_of(c)) == Some(section))
        .count() as u32
}

/// 4.5.2: breast- and NucMed-deficient residents receive their required
/// rotations, applying the 4:1 substitution only for non-NRDR residents.
pub fn deficiency_fill(input: &R4Input, grid: &mut ScheduleGrid) -> Result<(), SchedulerError> {
    for resident in sorted_residents(input.residents) {
        let is_nrdr = resident.pathways.has(Pathway::Nrdr);

        let mut breast_target = 0;
        let mut nucmed_target = 0;
        for pathway in [Pathway::Nrdr, Pathway::Esir, Pathway::Esnr, Pathway::T32] {
            if resident.pathways.has(pathway) {
                breast_target = breast_target.max(input.requirements.target(pathway, Section::Breast));
                nucmed_target = nucmed_target.max(input.requirements.target(pathway, Section::NucMed));
            }
        }

        let breast_have = resident.historical(Section::Breast) + current_weeks_of(resident, grid, input.catalog, Section::Breast);
        if breast_have < breast_target {
            let deficit_blocks = (breast_target - breast_have).div_ceil(4);
            let mut from = 1;
            for _ in 0..deficit_blocks {
                let Some(block) = first_open_block(&resident.name, grid, input.calendar, from) else {
                    break;
                };
                lock_blocks(grid, &resident.name, input.calendar, &[block], "Pcbi")?;
                from = block + 1;
            }
        }

        let nucmed_raw = current_weeks_of(resident, grid, input.catalog, Section::NucMed);
        let source_weeks: u32 = Section::all_sections()
            .into_iter()
            .filter(|s| input.requirements.is_substitution_source(*s))
            .map(|s| current_weeks_of(resident, grid, input.catalog, s))
            .sum();
        let nucmed_credited = input
            .requirements
            .credited_weeks(Section::NucMed, nucmed_raw, source_weeks, is_nrdr);
        let nucmed_have = resident.historical(Section::NucMed) + nucmed_credited;

        if nucmed_have < nucmed_target {
            let remaining_weeks = nucmed_target - nucmed_have;
            if is_nrdr || remaining_weeks > 4 {
                // Direct Mnuc placement: NRDR is forbidden the
                // substitution outright, and a large remaining deficit is
                // filled directly rather than by the 4:1 route.
                let blocks_needed = remaining_weeks.div_ceil(4);
                let mut from = 1;
                for _ in 0..blocks_needed {
                    let Some(block) = first_open_block(&resident.name, grid, input.calendar, from) else {
                        break;
                    };
                    lock_blocks(grid, &resident.name, input.calendar, &[block], "Mnuc")?;
                    from = block + 1;
                }
            } else if let Some(block) = first_open_block(&resident.name, grid, input.calendar, 1) {
                // Small remaining deficit: one substitution-source block
                // credits 1 week of Mnuc-equivalent per 4 weeks served.
                lock_blocks(grid, &resident.name, input.calendar, &[block], "Peds")?;
            }
        }
    }
    Ok(())
}

/// 4.5.3: `Mx` for everyone neither T32 nor dual-pathway (with unfilled
/// quota redistributed to residents flagged as having had a harsh R2
/// year), a Peds bump for single-historical-Peds residents, an MSK bump
/// for residents below 3 total MSK blocks, then fill to staffing
/// envelopes preferring minimum-satisfaction-first.
pub fn capacity_fill(input: &R4Input, grid: &mut ScheduleGrid) -> Result<(), SchedulerError> {
    let mut unfilled_mx_quota = 0u32;

    for resident in sorted_residents(input.residents) {
        let is_dual_pathway = [Pathway::Esir, Pathway::Esnr, Pathway::T32, Pathway::Nrdr]
            .iter()
            .filter(|p| resident.pathways.has(**p))
            .count()
            > 1;
        let eligible_for_mx = !resident.pathways.has(Pathway::T32) && !is_dual_pathway;

        if eligible_for_mx {
            if let Some(block) = first_open_block(&resident.name, grid, input.calendar, 1) {
                lock_blocks(grid, &resident.name, input.calendar, &[block], "Mx")?;
            } else {
                unfilled_mx_quota += 1;
            }
        }

        if resident.historical(Section::Peds) == 1 {
            if let Some(block) = first_open_block(&resident.name, grid, input.calendar, 1) {
                lock_blocks(grid, &resident.name, input.calendar, &[block], "Peds")?;
            }
        }

        let msk_total = resident.historical(Section::Msk) + current_weeks_of(resident, grid, input.catalog, Section::Msk);
        if msk_total < 3 {
            if let Some(code) = input.catalog.codes_for_section(Section::Msk).first().map(|c| c.to_string()) {
                if let Some(block) = first_open_block(&resident.name, grid, input.calendar, 1) {
                    lock_blocks(grid, &resident.name, input.calendar, &[block], &code)?;
                }
            }
        }
    }

    if unfilled_mx_quota > 0 {
        let mut harsh_year_residents: Vec<&Resident> = sorted_residents(input.residents)
            .into_iter()
            .filter(|r| r.preferences.harsh_r2_year)
            .collect();
        for resident in harsh_year_residents.drain(..).take(unfilled_mx_quota as usize) {
            if let Some(block) = first_open_block(&resident.name, grid, input.calendar, 1) {
                lock_blocks(grid, &resident.name, input.calendar, &[block], "Mx")?;
            }
        }
    }

    fill_to_envelope(input, grid)
}

/// Fill any remaining unassigned R4 weeks to satisfy per-week staffing
/// minimums, visiting the most understaffed (code, week) pairs first.
fn fill_to_envelope(input: &R4Input, grid: &mut ScheduleGrid) -> Result<(), SchedulerError> {
    let codes: Vec<&str> = Section::all_sections()
        .into_iter()
        .flat_map(|s| input.catalog.codes_for_section(s))
        .collect();

    for resident in sorted_residents(input.residents) {
        for week in 0..crate::domain::WEEKS_PER_YEAR {
            if grid.is_assigned(&resident.name, week) {
                continue;
            }
            let mut counts: HashMap<&str, u32> = HashMap::new();
            for r in grid.residents() {
                if let Some(code) = grid.get(r, week) {
                    *counts.entry(code).or_insert(0) += 1;
                }
            }
            let best = codes
                .iter()
                .filter(|c| {
                    input
                        .catalog
                        .get(c)
                        .map(|rc| rc.eligible_for(resident.future_pgy))
                        .unwrap_or(false)
                })
                .min_by_key(|c| {
                    let count = counts.get(*c).copied().unwrap_or(0);
                    let min = input.envelope.get(c, week).map(|e| e.min).unwrap_or(0);
                    count.saturating_sub(min.min(count)) as i64 - min as i64
                });
            if let Some(code) = best {
                grid.assign(&resident.name, week, *code, Phase::R4Builder)?;
            }
        }
    }
    Ok(())
}

pub fn run(input: &R4Input, grid: &mut ScheduleGrid) -> Result<(), SchedulerError> {
    fixed_commitments(input, grid)?;
    deficiency_fill(input, grid)?;
    capacity_fill(input, grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{derive_block_calendar, resident::Pgy, rotation::HospitalSystem, PathwaySet, PreferenceRecord, RotationCode};
    use std::collections::HashMap as Map;

    fn resident(name: &str, pathway: Option<Pathway>) -> Resident {
        let mut pathways = PathwaySet::new();
        if let Some(p) = pathway {
            pathways.insert(p);
        }
        Resident {
            name: name.to_string(),
            future_pgy: Pgy::R4,
            pathways,
            preferences: PreferenceRecord::default(),
            historical_weeks: Map::new(),
        }
    }

    fn catalog() -> RotationCatalog {
        let mut cat = RotationCatalog::new();
        for (code, section) in [
            ("Mnuc", Section::NucMed),
            ("Pcbi", Section::Breast),
            ("Mx", Section::Other),
            ("Peds", Section::Peds),
            ("Mb", Section::Msk),
            ("Mir", Section::Ir),
            ("Mneu", Section::Neuro),
            ("Research", Section::Other),
            ("Fse", Section::Breast),
        ] {
            cat.insert(RotationCode {
                code: code.to_string(),
                hospital_system: HospitalSystem::Ucsf,
                section,
                eligible_pgy: [Pgy::R4].into_iter().collect(),
                participates_nf: false,
            });
        }
        cat
    }

    #[test]
    fn nrdr_resident_gets_six_mnuc_blocks() {
        let residents = vec![resident("alice", Some(Pathway::Nrdr))];
        let requirements = GraduationRequirementTable::new();
        let envelope = StaffingEnvelope::new();
        let calendar = derive_block_calendar(2024);
        let cat = catalog();
        let input = R4Input {
            residents: &residents,
            catalog: &cat,
            requirements: &requirements,
            envelope: &envelope,
            calendar: &calendar,
        };
        let mut grid = ScheduleGrid::new(["alice".to_string()]);
        fixed_commitments(&input, &mut grid).unwrap();

        let mnuc_blocks = (1..=13)
            .filter(|&b| {
                calendar
                    .week_range(b)
                    .map(|r| grid.get("alice", r.start_week) == Some("Mnuc"))
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(mnuc_blocks, 6);
    }

    #[test]
    fn esir_resident_gets_two_mir_blocks() {
        let residents = vec![resident("bob", Some(Pathway::Esir))];
        let requirements = GraduationRequirementTable::new();
        let envelope = StaffingEnvelope::new();
        let calendar = derive_block_calendar(2024);
        let cat = catalog();
        let input = R4Input {
            residents: &residents,
            catalog: &cat,
            requirements: &requirements,
            envelope: &envelope,
            calendar: &calendar,
        };
        let mut grid = ScheduleGrid::new(["bob".to_string()]);
        fixed_commitments(&input, &mut grid).unwrap();

        let mir_weeks = (0..crate::domain::WEEKS_PER_YEAR)
            .filter(|w| grid.get("bob", *w) == Some("Mir"))
            .count();
        assert_eq!(mir_weeks, 8);
    }

    #[test]
    fn t32_resident_is_exempt_from_mx_capacity_fill() {
        let residents = vec![resident("carl", Some(Pathway::T32))];
        let requirements = GraduationRequirementTable::new();
        let envelope = StaffingEnvelope::new();
        let calendar = derive_block_calendar(2024);
        let cat = catalog();
        let input = R4Input {
            residents: &residents,
            catalog: &cat,
            requirements: &requirements,
            envelope: &envelope,
            calendar: &calendar,
        };
        let mut grid = ScheduleGrid::new(["carl".to_string()]);
        capacity_fill(&input, &mut grid).unwrap();

        let mx_weeks = (0..crate::domain::WEEKS_PER_YEAR)
            .filter(|w| grid.get("carl", *w) == Some("Mx"))
            .count();
        assert_eq!(mx_weeks, 0);
    }

    #[test]
    fn nrdr_forbids_the_four_to_one_substitution_in_deficiency_fill() {
        let mut requirements = GraduationRequirementTable::new();
        requirements.set_target(Pathway::Nrdr, Section::NucMed, 8);
        let envelope = StaffingEnvelope::new();
        let calendar = derive_block_calendar(2024);
        let cat = catalog();
        let residents = vec![resident("dana", Some(Pathway::Nrdr))];
        let input = R4Input {
            residents: &residents,
            catalog: &cat,
            requirements: &requirements,
            envelope: &envelope,
            calendar: &calendar,
        };
        let mut grid = ScheduleGrid::new(["dana".to_string()]);
        deficiency_fill(&input, &mut grid).unwrap();

        let peds_weeks = (0..crate::domain::WEEKS_PER_YEAR)
            .filter(|w| grid.get("dana", *w) == Some("Peds"))
            .count();
        assert_eq!(peds_weeks, 0, "NRDR must never receive the Peds substitution for Mnuc credit");
    }
}
