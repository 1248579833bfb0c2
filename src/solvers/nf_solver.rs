//! The night-float overlay solver (§4.6): seven prioritized layers over
//! one shared grid, the earliest layers constraining what the later ones
//! may place. Layers 1–4 restrict *where* specific (PGY, kind) pairs may
//! land; layer 5 is the general CP-style fallback that finishes off
//! whatever quota the restricted layers couldn't place, honoring each
//! PGY's full night-float requirement; layer 6 (T32 reserved for last) is
//! folded into layer 5's candidate ordering; layer 7 is the spacing
//! post-check.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::domain::nf::{nf_requirement, spacing_ok, NfKind, PREFERRED_NF_SOURCE_ROTATIONS};
use crate::domain::{BlockCalendar, Phase, Pgy, Resident, RotationCatalog, ScheduleGrid};
use crate::error::SchedulerError;

pub struct NfInput<'a> {
    pub residents: &'a [Resident],
    pub catalog: &'a RotationCatalog,
    pub calendar: &'a BlockCalendar,
    /// The R3 Learning Center block (4.4.2's output).
    pub lc_block: u32,
    pub core_exam_block: u32,
}

/// One committed night-float placement: which resident, which week, which
/// kind, and — when the overlay replaced an existing day rotation — what
/// that rotation was. The sampler resolver (§4.7) consults the latter to
/// find the gaps its placeholder weeks need to fill.
#[derive(Debug, Clone)]
pub struct NfPull {
    pub resident: String,
    pub week: u32,
    pub kind: NfKind,
    pub pulled_from: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NfSolveResult {
    pub pulls: Vec<NfPull>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layer {
    LcCore,
    Block1,
    PostCore,
    General,
}

fn layer_for_block(block: u32, lc_block: u32, core_exam_block: u32) -> Layer {
    if block == 1 {
        Layer::Block1
    } else if block == lc_block || block == core_exam_block {
        Layer::LcCore
    } else if block > core_exam_block {
        Layer::PostCore
    } else {
        Layer::General
    }
}

/// The (PGY, kind) pairs a layer opens up. `Layer::General` ignores the
/// block's native layer and opens every kind the PGY is ever eligible
/// for (§4.6's fallback "general CP solver").
fn allowed_kinds(layer: Layer, pgy: Pgy) -> Option<&'static [NfKind]> {
    match layer {
        Layer::Block1 => match pgy {
            Pgy::R3 => Some(&[NfKind::Mnf]),
            _ => None,
        },
        Layer::LcCore => match pgy {
            Pgy::R2 => Some(&[NfKind::Mnf]),
            Pgy::R4 => Some(&[NfKind::Snf2]),
            _ => None,
        },
        Layer::PostCore => match pgy {
            Pgy::R2 => Some(&[NfKind::Mnf]),
            Pgy::R3 => Some(&[NfKind::Mnf, NfKind::Snf2]),
            _ => None,
        },
        Layer::General => nf_requirement(pgy).map(|r| r.kinds),
    }
}

struct SolveState {
    counts: HashMap<(String, NfKind), u32>,
    weeks_used: HashMap<String, Vec<u32>>,
    filled_week_kind: HashSet<(u32, NfKind)>,
}

impl SolveState {
    fn new() -> Self {
        Self {
            counts: HashMap::new(),
            weeks_used: HashMap::new(),
            filled_week_kind: HashSet::new(),
        }
    }

    fn count(&self, resident: &str, kind: NfKind) -> u32 {
        self.counts.get(&(resident.to_string(), kind)).copied().unwrap_or(0)
    }

    fn total(&self, resident: &str) -> u32 {
        self.weeks_used.get(resident).map(|w| w.len() as u32).unwrap_or(0)
    }

    fn record(&mut self, resident: &str, week: u32, kind: NfKind) {
        *self.counts.entry((resident.to_string(), kind)).or_insert(0) += 1;
        self.weeks_used.entry(resident.to_string()).or_default().push(week);
        self.filled_week_kind.insert((week, kind));
    }
}

/// Has `resident` already met or exceeded their §3 NF requirement for
/// `kind` at this point in the solve?
fn quota_satisfied(resident: &Resident, kind: NfKind, state: &SolveState) -> bool {
    let Some(req) = nf_requirement(resident.future_pgy) else {
        return true;
    };
    if !req.kinds.contains(&kind) {
        return true;
    }
    if let Some(exact) = req.exact_count {
        let total_of_kind: u32 = req.kinds.iter().map(|k| state.count(&resident.name, *k)).sum();
        return total_of_kind >= exact;
    }
    if let Some(max) = req.max_count {
        let total_of_kind: u32 = req.kinds.iter().map(|k| state.count(&resident.name, *k)).sum();
        return total_of_kind >= max;
    }
    false
}

fn collides_with_own_lock(grid: &ScheduleGrid, resident: &str, week: u32) -> bool {
    matches!(grid.get(resident, week), Some("AIRP") | Some("LC"))
}

fn candidate_score(resident: &Resident, week: u32, grid: &ScheduleGrid, state: &SolveState) -> f64 {
    let source_bonus = grid
        .get(&resident.name, week)
        .map(|code| if PREFERRED_NF_SOURCE_ROTATIONS.contains(&code) { 10.0 } else { 0.0 })
        .unwrap_or(0.0);
    let balance = -(state.total(&resident.name) as f64);
    let t32_reserve = if resident.pathways.has(crate::domain::resident::Pathway::T32) {
        -100.0
    } else {
        0.0
    };
    source_bonus + balance + t32_reserve
}

fn assign_layer(
    input: &NfInput,
    grid: &mut ScheduleGrid,
    target: Layer,
    state: &mut SolveState,
    pulls: &mut Vec<NfPull>,
) -> Result<(), SchedulerError> {
    for block in 1..=input.calendar.block_count() as u32 {
        let native_layer = layer_for_block(block, input.lc_block, input.core_exam_block);
        if target != Layer::General && native_layer != target {
            continue;
        }
        let Some(range) = input.calendar.week_range(block) else {
            continue;
        };

        for week in range.weeks() {
            for kind in [NfKind::Mnf, NfKind::Snf2, NfKind::Snf] {
                if state.filled_week_kind.contains(&(week, kind)) {
                    continue;
                }

                let mut best: Option<(&Resident, f64)> = None;
                for resident in input.residents {
                    let Some(kinds) = allowed_kinds(target, resident.future_pgy) else {
                        continue;
                    };
                    if !kinds.contains(&kind) {
                        continue;
                    }
                    if quota_satisfied(resident, kind, state) {
                        continue;
                    }
                    if resident.preferences.no_call_weeks.contains(&week) {
                        continue;
                    }
                    if collides_with_own_lock(grid, &resident.name, week) {
                        continue;
                    }
                    let existing = state.weeks_used.get(&resident.name).cloned().unwrap_or_default();
                    if existing.iter().any(|&w| !spacing_ok(w, week)) {
                        continue;
                    }

                    let score = candidate_score(resident, week, grid, state);
                    if best.map(|(_, s)| score > s).unwrap_or(true) {
                        best = Some((resident, score));
                    }
                }

                if let Some((resident, _)) = best {
                    let prior = grid.overlay(&resident.name, week, kind.code(), Phase::NightFloat)?;
                    state.record(&resident.name, week, kind);
                    pulls.push(NfPull {
                        resident: resident.name.clone(),
                        week,
                        kind,
                        pulled_from: prior,
                    });
                }
            }
        }
    }
    Ok(())
}

/// Run the full seven-layer solve.
pub fn solve(input: &NfInput, grid: &mut ScheduleGrid) -> Result<NfSolveResult, SchedulerError> {
    let mut state = SolveState::new();
    let mut pulls = Vec::new();

    for layer in [Layer::LcCore, Layer::PostCore, Layer::Block1] {
        assign_layer(input, grid, layer, &mut state, &mut pulls)?;
    }
    assign_layer(input, grid, Layer::General, &mut state, &mut pulls)?;

    for resident in input.residents {
        let Some(req) = nf_requirement(resident.future_pgy) else {
            continue;
        };
        let total: u32 = req.kinds.iter().map(|k| state.count(&resident.name, *k)).sum();
        if let Some(exact) = req.exact_count {
            if total != exact {
                warn!(
                    resident = %resident.name,
                    got = total,
                    wanted = exact,
                    "could not place the full NF requirement for this resident, dropping soft reward first"
                );
            }
        }
    }

    for resident in input.residents {
        let weeks = state.weeks_used.get(&resident.name).cloned().unwrap_or_default();
        for i in 0..weeks.len() {
            for j in (i + 1)..weeks.len() {
                if !spacing_ok(weeks[i], weeks[j]) {
                    return Err(SchedulerError::infeasibility(
                        "NF spacing",
                        format!(
                            "{} has NF weeks {} and {} closer than the minimum spacing",
                            resident.name, weeks[i], weeks[j]
                        ),
                    ));
                }
            }
        }
    }

    info!(pulls = pulls.len(), "night-float overlay solve complete");
    Ok(NfSolveResult { pulls })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{derive_block_calendar, resident::Pgy, PathwaySet, PreferenceRecord};
    use std::collections::HashMap as Map;

    fn resident(name: &str, pgy: Pgy) -> Resident {
        Resident {
            name: name.to_string(),
            future_pgy: pgy,
            pathways: PathwaySet::new(),
            preferences: PreferenceRecord::default(),
            historical_weeks: Map::new(),
        }
    }

    #[test]
    fn r2_receives_exactly_two_mnf_weeks() {
        let residents = vec![resident("alice", Pgy::R2)];
        let calendar = derive_block_calendar(2024);
        let cat = RotationCatalog::new();
        let input = NfInput {
            residents: &residents,
            catalog: &cat,
            calendar: &calendar,
            lc_block: 5,
            core_exam_block: 6,
        };
        let mut grid = ScheduleGrid::new(["alice".to_string()]);
        let result = solve(&input, &mut grid).unwrap();
        let mnf_count = result.pulls.iter().filter(|p| p.resident == "alice" && p.kind == NfKind::Mnf).count();
        assert_eq!(mnf_count, 2);
    }

    #[test]
    fn spacing_is_enforced_across_all_assigned_weeks() {
        let residents = vec![resident("bob", Pgy::R4)];
        let calendar = derive_block_calendar(2024);
        let cat = RotationCatalog::new();
        let input = NfInput {
            residents: &residents,
            catalog: &cat,
            calendar: &calendar,
            lc_block: 5,
            core_exam_block: 6,
        };
        let mut grid = ScheduleGrid::new(["bob".to_string()]);
        let result = solve(&input, &mut grid).unwrap();
        let mut weeks: Vec<u32> = result.pulls.iter().map(|p| p.week).collect();
        weeks.sort();
        for pair in weeks.windows(2) {
            assert!(spacing_ok(pair[0], pair[1]));
        }
    }

    #[test]
    fn no_call_week_is_never_assigned() {
        let mut alice = resident("alice", Pgy::R2);
        alice.preferences.no_call_weeks.insert(10);
        alice.preferences.no_call_weeks.insert(11);
        let residents = vec![alice];
        let calendar = derive_block_calendar(2024);
        let cat = RotationCatalog::new();
        let input = NfInput {
            residents: &residents,
            catalog: &cat,
            calendar: &calendar,
            lc_block: 5,
            core_exam_block: 6,
        };
        let mut grid = ScheduleGrid::new(["alice".to_string()]);
        let result = solve(&input, &mut grid).unwrap();
        assert!(result.pulls.iter().all(|p| p.week != 10 && p.week != 11));
    }

    #[test]
    fn block1_only_offers_r3_mnf() {
        let r2 = resident("alice", Pgy::R2);
        let r3 = resident("bob", Pgy::R3);
        let residents = vec![r2, r3];
        let calendar = derive_block_calendar(2024);
        let cat = RotationCatalog::new();
        let input = NfInput {
            residents: &residents,
            catalog: &cat,
            calendar: &calendar,
            lc_block: 5,
            core_exam_block: 6,
        };
        let mut grid = ScheduleGrid::new(["alice".to_string(), "bob".to_string()]);
        let result = solve(&input, &mut grid).unwrap();
        let block1 = calendar.week_range(1).unwrap();
        for pull in &result.pulls {
            if block1.weeks().any(|w| w == pull.week) {
                assert_eq!(pull.resident, "bob", "only R3 Mnf should land in block 1");
                assert_eq!(pull.kind, NfKind::Mnf);
            }
        }
    }

    #[test]
    fn overlay_records_the_superseded_day_rotation() {
        let mut grid = ScheduleGrid::new(["alice".to_string()]);
        grid.assign("alice", 20, "Mnuc", Phase::R4Builder).unwrap();
        let residents = vec![resident("alice", Pgy::R4)];
        let calendar = derive_block_calendar(2024);
        let cat = RotationCatalog::new();
        let input = NfInput {
            residents: &residents,
            catalog: &cat,
            calendar: &calendar,
            lc_block: 5,
            core_exam_block: 6,
        };
        let result = solve(&input, &mut grid).unwrap();
        let on_week_20 = result.pulls.iter().find(|p| p.week == 20);
        if let Some(pull) = on_week_20 {
            assert_eq!(pull.pulled_from.as_deref(), Some("Mnuc"));
        }
    }
}
