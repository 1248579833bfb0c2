//! The R2 track matcher: assign each rising R2 to exactly one R2 track,
//! minimizing preference rank plus a small historical-deficit penalty,
//! subject to pathway eligibility. Solved as a sorted-cost greedy
//! assignment rather than an exact Hungarian/ILP solve — the problem is
//! small (≤15×15) and ties are broken deterministically by resident name,
//! which is the only ordering the surrounding system depends on.

use std::collections::HashMap;

use crate::domain::{BlockCalendar, Phase, Resident, ScheduleGrid};
use crate::error::SchedulerError;

/// One resident's full preference/eligibility/deficit profile for the R2
/// match, keyed by track index.
pub struct R2MatchInput<'a> {
    pub residents: &'a [Resident],
    /// `rank[(resident, track)]`: 1 = most preferred.
    pub rank: HashMap<(String, u32), u32>,
    /// `eligible[(resident, track)]`: false excludes the pairing entirely
    /// (e.g. an ESIR resident paired with a non-ESIR-compatible track).
    pub eligible: HashMap<(String, u32), bool>,
    /// `deficit_penalty[(resident, track)]`: discount for tracks covering
    /// sections where the resident sits in the bottom historical quartile.
    pub deficit_penalty: HashMap<(String, u32), f64>,
    pub track_indices: Vec<u32>,
    pub deficit_weight: f64,
}

#[derive(Debug, Clone)]
pub struct R2MatchResult {
    pub resident_to_track: Vec<(String, u32)>,
    pub total_penalty: f64,
}

impl<'a> R2MatchInput<'a> {
    fn is_eligible(&self, resident: &str, track: u32) -> bool {
        self.eligible
            .get(&(resident.to_string(), track))
            .copied()
            .unwrap_or(true)
    }

    fn cost(&self, resident: &str, track: u32) -> f64 {
        let rank = self
            .rank
            .get(&(resident.to_string(), track))
            .copied()
            .unwrap_or(self.track_indices.len() as u32) as f64;
        let deficit = self
            .deficit_penalty
            .get(&(resident.to_string(), track))
            .copied()
            .unwrap_or(0.0);
        (rank - 1.0) + self.deficit_weight * deficit
    }
}

pub fn solve(input: &R2MatchInput) -> Result<R2MatchResult, SchedulerError> {
    let mut names: Vec<String> = input.residents.iter().map(|r| r.name.clone()).collect();
    names.sort();

    if names.len() != input.track_indices.len() {
        return Err(SchedulerError::data_integrity(format!(
            "R2 matcher requires N residents == N tracks, got {} residents and {} tracks",
            names.len(),
            input.track_indices.len()
        )));
    }

    let mut candidates: Vec<(String, u32, f64)> = Vec::new();
    for name in &names {
        for &track in &input.track_indices {
            if input.is_eligible(name, track) {
                candidates.push((name.clone(), track, input.cost(name, track)));
            }
        }
    }
    candidates.sort_by(|a, b| {
        a.2.partial_cmp(&b.2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
            .then_with(|| a.1.cmp(&b.1))
    });

    let mut used_residents = std::collections::HashSet::new();
    let mut used_tracks = std::collections::HashSet::new();
    let mut assignment = Vec::new();
    let mut total_penalty = 0.0;

    for (name, track, cost) in candidates {
        if used_residents.contains(&name) || used_tracks.contains(&track) {
            continue;
        }
        used_residents.insert(name.clone());
        used_tracks.insert(track);
        total_penalty += cost;
        assignment.push((name, track));
    }

    if assignment.len() != names.len() {
        let unassigned: Vec<&String> = names.iter().filter(|n| !used_residents.contains(*n)).collect();
        return Err(SchedulerError::infeasibility(
            "pathway eligibility",
            format!("no eligible track remains for: {unassigned:?}"),
        ));
    }

    assignment.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(R2MatchResult {
        resident_to_track: assignment,
        total_penalty,
    })
}

/// Write the matched tracks' 13-block sequences into the grid, expanding
/// each block to its full week range per the block calendar.
pub fn write_to_grid(
    result: &R2MatchResult,
    base_sequence: &[String],
    class_size: u32,
    calendar: &BlockCalendar,
    grid: &mut ScheduleGrid,
) -> Result<(), SchedulerError> {
    crate::tracks::write_assignment_to_grid(
        &result.resident_to_track,
        base_sequence,
        class_size,
        calendar,
        grid,
        Phase::R2Matcher,
    )
}
