//! Junior-year track derivation.
//!
//! A track is a 52-week rotation sequence built from a short base sequence
//! by biweekly cycling: `rotation(t, b) = base[((t-1) + (b-1)*2) mod L]`.
//! The derivation is pure, so results are memoized behind a
//! `once_cell`-backed cache keyed by the inputs rather than a global
//! singleton, since there can be many distinct base sequences (one per
//! class year) live at once.

use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::domain::{BlockCalendar, Phase, ScheduleGrid};
use crate::error::SchedulerError;

/// A warning (not an error) surfaced when a base sequence's length doesn't
/// match the class size exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackWarning {
    /// `L < N`: at least two residents share an identical schedule.
    DuplicateTrack,
    /// `L > N`: some rotations in the base sequence are never reached.
    MissedRotation,
}

/// One track's derived 13-block sequence, plus any derivation warning.
#[derive(Debug, Clone)]
pub struct Track {
    pub index: u32,
    pub blocks: Vec<String>,
    pub warning: Option<TrackWarning>,
}

type CacheKey = (Vec<String>, u32, u32);
static CACHE: Lazy<Mutex<HashMap<CacheKey, Track>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Derive the rotation at block `b` (1-indexed) for track `t` (1-indexed)
/// from a base sequence of length `L`.
///
/// `rotation(t, b) = base[((t - 1) + (b - 1) * 2) mod L]`. The factor of 2
/// reflects biweekly cycling: consecutive blocks advance two positions
/// through the base sequence.
pub fn rotation_at(base_sequence: &[String], track_index: u32, block: u32) -> &str {
    let l = base_sequence.len() as u32;
    let pos = ((track_index - 1) + (block - 1) * 2) % l;
    &base_sequence[pos as usize]
}

/// Derive the full 13-block sequence for `track_index` out of `class_size`
/// residents, caching the result.
pub fn derive_track(base_sequence: &[String], track_index: u32, class_size: u32) -> Track {
    let key = (base_sequence.to_vec(), track_index, class_size);
    if let Some(cached) = CACHE.lock().unwrap().get(&key) {
        return cached.clone();
    }

    let l = base_sequence.len() as u32;
    let blocks: Vec<String> = (1..=13)
        .map(|b| rotation_at(base_sequence, track_index, b).to_string())
        .collect();

    let warning = if l < class_size {
        Some(TrackWarning::DuplicateTrack)
    } else if l > class_size {
        Some(TrackWarning::MissedRotation)
    } else {
        None
    };

    let track = Track {
        index: track_index,
        blocks,
        warning,
    };
    CACHE.lock().unwrap().insert(key, track.clone());
    track
}

/// Derive every track in `[1, class_size]` for the given base sequence.
pub fn derive_all_tracks(base_sequence: &[String], class_size: u32) -> Vec<Track> {
    (1..=class_size)
        .map(|t| derive_track(base_sequence, t, class_size))
        .collect()
}

/// Write a resident-to-track assignment's full 13-block sequence into the
/// grid under `phase`, expanding each block to its full week range per the
/// calendar. Shared by [`super::solvers::r1`] (R1 bijection) and
/// [`super::solvers::r2_matcher`] (R2 CP match) — both phases ultimately
/// commit the same kind of "resident gets this whole track" result.
pub fn write_assignment_to_grid(
    assignment: &[(String, u32)],
    base_sequence: &[String],
    class_size: u32,
    calendar: &BlockCalendar,
    grid: &mut ScheduleGrid,
    phase: Phase,
) -> Result<(), SchedulerError> {
    let tracks = derive_all_tracks(base_sequence, class_size);
    for (resident, track_index) in assignment {
        let track = tracks
            .iter()
            .find(|t| t.index == *track_index)
            .expect("track index came from the same derivation, must exist");
        for (i, code) in track.blocks.iter().enumerate() {
            let block = i as u32 + 1;
            let Some(range) = calendar.week_range(block) else {
                continue;
            };
            for week in range.weeks() {
                grid.assign(resident, week, code.clone(), phase)?;
            }
        }
    }
    Ok(())
}
