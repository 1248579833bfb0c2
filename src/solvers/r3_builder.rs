//! The R3 builder: four strictly-ordered sub-steps that lock an R3's
//! individualized schedule, each sub-step locking cells the next must
//! respect (§4.4).
//!
//! Like [`super::r2_matcher`], this is a greedy best-first placer rather
//! than an exact CP/ILP solve — `AIRP` capacities are tiny (≤5 sessions,
//! 3–4 seats each) and the graduation-requirement fill is driven by the
//! same urgency-scored best-first shape used throughout this module tree.

use std::collections::HashMap;

use tracing::warn;

use crate::domain::{
    BlockCalendar, GraduationRequirementTable, Pathway, Phase, Resident, RotationCatalog,
    ScheduleGrid, Section,
};
use crate::error::SchedulerError;

/// A fixed AIRP session: a block-long educational commitment with a seat
/// range, externally configured per year (§4.4.1).
#[derive(Debug, Clone)]
pub struct AirpSession {
    pub id: u32,
    pub block: u32,
    pub min_seats: u32,
    pub max_seats: u32,
}

/// Everything the R3 builder needs beyond the shared grid.
pub struct R3Input<'a> {
    pub residents: &'a [Resident],
    pub sessions: &'a [AirpSession],
    /// `rank[(resident, session_id)]`: 1 = most preferred.
    pub airp_rank: HashMap<(String, u32), u32>,
    pub catalog: &'a RotationCatalog,
    pub requirements: &'a GraduationRequirementTable,
    pub calendar: &'a BlockCalendar,
    pub core_exam_block: u32,
}

/// 4.4.1: assign every R3 to exactly one AIRP session, minimizing rank
/// subject to each session's seat range.
pub fn assign_airp(input: &R3Input) -> Result<Vec<(String, u32)>, SchedulerError> {
    let mut names: Vec<String> = input.residents.iter().map(|r| r.name.clone()).collect();
    names.sort();

    let mut candidates: Vec<(String, u32, u32)> = Vec::new();
    for name in &names {
        for session in input.sessions {
            let rank = input
                .airp_rank
                .get(&(name.clone(), session.id))
                .copied()
                .unwrap_or(input.sessions.len() as u32);
            candidates.push((name.clone(), session.id, rank));
        }
    }
    candidates.sort_by(|a, b| a.2.cmp(&b.2).then_with(|| a.0.cmp(&b.0)));

    let mut seats_used: HashMap<u32, u32> = HashMap::new();
    let mut assigned = std::collections::HashSet::new();
    let mut result = Vec::new();

    for (name, session_id, _) in candidates {
        if assigned.contains(&name) {
            continue;
        }
        let session = input.sessions.iter().find(|s| s.id == session_id).unwrap();
        let used = seats_used.entry(session_id).or_insert(0);
        if *used >= session.max_seats {
            continue;
        }
        *used += 1;
        assigned.insert(name.clone());
        result.push((name, session_id));
    }

    if assigned.len() != names.len() {
        let unassigned: Vec<&String> = names.iter().filter(|n| !assigned.contains(*n)).collect();
        return Err(SchedulerError::infeasibility(
            "AIRP seat capacity",
            format!("no AIRP session with a free seat for: {unassigned:?}"),
        ));
    }

    for session in input.sessions {
        let used = seats_used.get(&session.id).copied().unwrap_or(0);
        if used < session.min_seats {
            return Err(SchedulerError::infeasibility(
                "AIRP minimum seats",
                format!(
                    "session {} filled {used}/{} minimum seats",
                    session.id, session.min_seats
                ),
            ));
        }
    }

    result.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(result)
}

fn lock_block(
    grid: &mut ScheduleGrid,
    resident: &str,
    calendar: &BlockCalendar,
    block: u32,
    code: &str,
) -> Result<(), SchedulerError> {
    let range = calendar.week_range(block).ok_or_else(|| {
        SchedulerError::data_integrity(format!("block {block} has no week range in this calendar"))
    })?;
    for week in range.weeks() {
        grid.assign(resident, week, code, Phase::R3Builder)?;
    }
    Ok(())
}

/// 4.4.1: write each assigned AIRP session's block as `AIRP`.
pub fn write_airp_to_grid(
    assignment: &[(String, u32)],
    input: &R3Input,
    grid: &mut ScheduleGrid,
) -> Result<(), SchedulerError> {
    for (resident, session_id) in assignment {
        let session = input
            .sessions
            .iter()
            .find(|s| s.id == *session_id)
            .ok_or_else(|| SchedulerError::data_integrity(format!("unknown AIRP session {session_id}")))?;
        lock_block(grid, resident, input.calendar, session.block, "AIRP")?;
    }
    Ok(())
}

/// 4.4.2: every rising R3 gets `LC` in the last full block before the
/// (externally configured) CORE-exam block.
pub fn place_learning_center(input: &R3Input, grid: &mut ScheduleGrid) -> Result<u32, SchedulerError> {
    if input.core_exam_block == 0 {
        return Err(SchedulerError::data_integrity(
            "R3 builder asked to place LC with no core_exam_block configured",
        ));
    }
    let lc_block = input.core_exam_block - 1;

    for resident in input.residents {
        let range = input.calendar.week_range(lc_block);
        let Some(range) = range else { continue };
        let already_airp = range
            .weeks()
            .any(|w| grid.get(&resident.name, w) == Some("AIRP"));
        if already_airp {
            warn!(
                resident = %resident.name,
                block = lc_block,
                "LC block collides with this resident's AIRP session, leaving for human override"
            );
            continue;
        }
        lock_block(grid, &resident.name, input.calendar, lc_block, "LC")?;
    }
    Ok(lc_block)
}

/// One prioritized placement candidate for the graduation-requirement
/// fill: a (resident, section, urgency) triple. `urgency` combines
/// remaining-deficit magnitude, block pressure (how many other residents
/// in this cohort still need the same section), and preference weight.
fn urgency(deficit: u32, block_pressure: u32, preference_bonus: f64) -> f64 {
    deficit as f64 * 10.0 + block_pressure as f64 * 2.0 + preference_bonus
}

fn preference_bonus(resident: &Resident, section: Section) -> f64 {
    if resident.preferences.section_top.contains(&section) {
        5.0
    } else if resident.preferences.section_bottom.contains(&section) {
        -5.0
    } else {
        0.0
    }
}

fn remaining_deficit(resident: &Resident, grid: &ScheduleGrid, input: &R3Input, section: Section) -> u32 {
    let is_nrdr = resident.pathways.has(Pathway::Nrdr);
    let mut target = 0u32;
    for pathway in [Pathway::Nrdr, Pathway::Esir, Pathway::Esnr, Pathway::T32] {
        if resident.pathways.has(pathway) {
            target = target.max(input.requirements.target(pathway, section));
        }
    }
    if target == 0 {
        return 0;
    }
    let historical = resident.historical(section);
    let mut current = 0u32;
    for week in 0..crate::domain::WEEKS_PER_YEAR {
        if let Some(code) = grid.get(&resident.name, week) {
            if input.catalog.section_of(code) == Some(section) {
                current += 1;
            }
        }
    }
    let credited = input.requirements.credited_weeks(section, current, 0, is_nrdr);
    target.saturating_sub(historical + credited)
}

/// Is it policy-legal to place `code` for `resident` in `block`?
///
/// - `Zir` may never precede the LC block.
/// - `Zir` may never fall in the Christmas block for a resident who had IR
///   over Christmas the prior year.
/// - The hospital-exclusivity invariant must hold across the block's four
///   cells after the placement (at most one non-OTHER system).
fn placement_allowed(
    resident: &Resident,
    code: &str,
    block: u32,
    lc_block: u32,
    grid: &ScheduleGrid,
    input: &R3Input,
) -> bool {
    if code == "Zir" {
        if block < lc_block {
            return false;
        }
        if input.calendar.christmas_block() == Some(block) && resident.preferences.had_ir_over_christmas_last_year
        {
            return false;
        }
    }

    let Some(range) = input.calendar.week_range(block) else {
        return false;
    };
    let Some(new_system) = input.catalog.hospital_system_of(code) else {
        return true;
    };
    if new_system == crate::domain::HospitalSystem::Other {
        return true;
    }
    let existing = grid.hospital_systems_in_block(&resident.name, range.weeks(), input.catalog);
    existing.is_empty() || existing == vec![new_system]
}

/// 4.4.3: place required rotations block by block, driven by `urgency`.
/// Residents with remaining deficits but no legal block left carry an
/// `unassigned` marker forward (4.4.4) rather than failing the phase —
/// this is expected to be empty in practice per §4.4.4.
pub fn place_graduation_requirements(
    input: &R3Input,
    lc_block: u32,
    grid: &mut ScheduleGrid,
) -> Result<Vec<String>, SchedulerError> {
    let mut anchors = Vec::new();

    let sections = Section::all_sections();
    for block in 1..=input.calendar.block_count() as u32 {
        let Some(range) = input.calendar.week_range(block) else {
            continue;
        };
        let mut residents_sorted: Vec<&Resident> = input.residents.iter().collect();
        residents_sorted.sort_by(|a, b| a.name.cmp(&b.name));

        for resident in residents_sorted {
            if range.weeks().all(|w| grid.is_assigned(&resident.name, w)) {
                continue;
            }

            let pressure_by_section: HashMap<Section, u32> = sections
                .iter()
                .map(|s| {
                    let count = input
                        .residents
                        .iter()
                        .filter(|r| remaining_deficit(r, grid, input, *s) > 0)
                        .count() as u32;
                    (*s, count)
                })
                .collect();

            let mut ranked: Vec<(Section, f64)> = sections
                .iter()
                .map(|s| {
                    let deficit = remaining_deficit(resident, grid, input, *s);
                    let pressure = pressure_by_section.get(s).copied().unwrap_or(0);
                    let bonus = preference_bonus(resident, *s);
                    (*s, urgency(deficit, pressure, bonus))
                })
                .filter(|(s, _)| remaining_deficit(resident, grid, input, *s) > 0)
                .collect();
            ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

            let mut placed = false;
            for (section, _) in ranked {
                for code in input.catalog.codes_for_section(section) {
                    if !input.catalog.get(code).map(|c| c.eligible_for(resident.future_pgy)).unwrap_or(false) {
                        continue;
                    }
                    if placement_allowed(resident, code, block, lc_block, grid, input) {
                        for week in range.weeks() {
                            if !grid.is_assigned(&resident.name, week) {
                                grid.assign(&resident.name, week, code, Phase::R3Builder)?;
                            }
                        }
                        placed = true;
                        break;
                    }
                }
                if placed {
                    break;
                }
            }
        }
    }

    for resident in input.residents {
        for week in 0..crate::domain::WEEKS_PER_YEAR {
            if !grid.is_assigned(&resident.name, week) {
                anchors.push(resident.name.clone());
                break;
            }
        }
    }

    Ok(anchors)
}

/// Run all four R3 sub-steps in order, returning the LC block (needed by
/// the night-float solver's layer split, §4.6) and any carried-forward
/// anchor residents (4.4.4).
pub fn run(input: &R3Input, grid: &mut ScheduleGrid) -> Result<(u32, Vec<String>), SchedulerError> {
    let airp = assign_airp(input)?;
    write_airp_to_grid(&airp, input, grid)?;
    let lc_block = place_learning_center(input, grid)?;
    let anchors = place_graduation_requirements(input, lc_block, grid)?;
    Ok((lc_block, anchors))
}
