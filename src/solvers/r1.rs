//! R1 assignment: an unconstrained bijection between incoming R1s and R1
//! tracks, with a soft preference for routing a resident's expressed
//! sampler preference onto a track whose sampler block neighbors that
//! rotation — an objective bump, never a hard constraint.

use crate::domain::{BlockCalendar, Phase, Resident, ScheduleGrid};
use crate::error::SchedulerError;
use crate::tracks::{derive_all_tracks, Track};

/// The result of one R1 assignment run: which resident landed on which
/// track, in resident order.
#[derive(Debug, Clone)]
pub struct R1Assignment {
    pub resident_to_track: Vec<(String, u32)>,
}

/// Score a (resident, track) pairing: 1.0 if the resident's sampler
/// preference names a rotation code appearing adjacent to that track's
/// `Msamp` cell, 0.0 otherwise.
fn sampler_bonus(resident: &Resident, track: &Track) -> f64 {
    let Some(pref) = &resident.preferences.sampler_preference else {
        return 0.0;
    };
    for (i, code) in track.blocks.iter().enumerate() {
        if code == "Msamp" {
            let neighbors = [i.checked_sub(1), Some(i + 1)];
            for n in neighbors.into_iter().flatten() {
                if track.blocks.get(n) == Some(pref) {
                    return 1.0;
                }
            }
        }
    }
    0.0
}

/// Assign each resident (in roster order, sorted by name for determinism)
/// to a distinct track, preferring higher sampler-bonus pairings first.
pub fn assign(residents: &[Resident], base_sequence: &[String]) -> R1Assignment {
    let class_size = residents.len() as u32;
    let tracks = derive_all_tracks(base_sequence, class_size);

    let mut ordered: Vec<&Resident> = residents.iter().collect();
    ordered.sort_by(|a, b| a.name.cmp(&b.name));

    let mut remaining_tracks: Vec<Track> = tracks;
    let mut assignment = Vec::with_capacity(ordered.len());

    for resident in ordered {
        let best_idx = remaining_tracks
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                sampler_bonus(resident, a)
                    .partial_cmp(&sampler_bonus(resident, b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(idx, _)| idx)
            .expect("at least one track remains per resident, class_size == L-derived track count");
        let track = remaining_tracks.remove(best_idx);
        assignment.push((resident.name.clone(), track.index));
    }

    R1Assignment {
        resident_to_track: assignment,
    }
}

/// Write the assigned tracks' 13-block sequences into the grid, expanding
/// each block to its full week range per the block calendar.
pub fn write_to_grid(
    assignment: &R1Assignment,
    base_sequence: &[String],
    class_size: u32,
    calendar: &BlockCalendar,
    grid: &mut ScheduleGrid,
) -> Result<(), SchedulerError> {
    crate::tracks::write_assignment_to_grid(
        &assignment.resident_to_track,
        base_sequence,
        class_size,
        calendar,
        grid,
        Phase::R1Assignment,
    )
}
