//! Block calendar derivation.
//!
//! Thirteen four-week blocks cover a 52-week academic year running July 1 to
//! June 30. Blocks 2–12 are always exactly 4 weeks; block 1 and block 13
//! flex by a few days depending on which weekday July 1 falls on, so that
//! the night-float rotation start always lands on a Sunday. The mapping
//! from "day of week of July 1" to block-1 length is an administrative
//! table, not a continuous formula, and is implemented here as a direct
//! match rather than an approximation.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// A contiguous, inclusive week range `[start_week, end_week]`, 0-based
/// against the 52-week horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekRange {
    pub start_week: u32,
    pub end_week: u32,
}

impl WeekRange {
    pub fn weeks(&self) -> impl Iterator<Item = u32> {
        self.start_week..=self.end_week
    }

    pub fn len(&self) -> u32 {
        self.end_week - self.start_week + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// A mapping from block number `b ∈ [1, 13]` to its week range, plus the
/// night-float start date used to populate the `Night Float` tab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockCalendar {
    pub target_year: i32,
    pub nf_start: NaiveDate,
    blocks: Vec<WeekRange>,
}

impl BlockCalendar {
    pub fn week_range(&self, block: u32) -> Option<WeekRange> {
        if block == 0 || block as usize > self.blocks.len() {
            return None;
        }
        Some(self.blocks[(block - 1) as usize])
    }

    pub fn block_for_week(&self, week: u32) -> Option<u32> {
        self.blocks
            .iter()
            .position(|r| week >= r.start_week && week <= r.end_week)
            .map(|idx| idx as u32 + 1)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// The 0-based week index a calendar date falls in, counting from July 1
    /// of `target_year`. Dates before July 1 or past the 52-week horizon
    /// have no week index.
    pub fn week_for_date(&self, date: NaiveDate) -> Option<u32> {
        let july1 = NaiveDate::from_ymd_opt(self.target_year, 7, 1)?;
        let days = (date - july1).num_days();
        if days < 0 {
            return None;
        }
        let week = (days / 7) as u32;
        if week < WEEKS_PER_YEAR_CAL {
            Some(week)
        } else {
            None
        }
    }

    /// The block containing the Monday-following Dec 25–Jan 1 holiday
    /// span, used by the R3 builder's `Zir`-over-Christmas policy (§4.4.3).
    pub fn christmas_block(&self) -> Option<u32> {
        let date = NaiveDate::from_ymd_opt(self.target_year, 12, 25)?;
        self.block_for_week(self.week_for_date(date)?)
    }
}

const WEEKS_PER_YEAR_CAL: u32 = 52;

/// The administratively-fixed block-1 length, by category of July 1's
/// weekday.
fn block1_length_days(july1: Weekday) -> i64 {
    match july1 {
        Weekday::Mon => 28,
        Weekday::Tue | Weekday::Wed => 21,
        Weekday::Thu | Weekday::Fri => 35,
        Weekday::Sat | Weekday::Sun => 28,
    }
}

fn nf_start_date(july1: NaiveDate) -> NaiveDate {
    match july1.weekday() {
        Weekday::Mon | Weekday::Tue | Weekday::Wed => {
            // Last Sunday on or before June 30.
            let june30 = july1 - Duration::days(1);
            let back = (june30.weekday().num_days_from_sunday()) as i64;
            june30 - Duration::days(back)
        }
        _ => {
            // First Sunday on or after July 1.
            let fwd = (7 - july1.weekday().num_days_from_sunday() as i64) % 7;
            july1 + Duration::days(fwd)
        }
    }
}

/// Derive the 13-block calendar for the academic year starting July 1 of
/// `target_year`.
///
/// Block 1 starts July 1 and has a length fixed by the table above. Blocks
/// 2–12 are each exactly 4 weeks (44 weeks total). Block 13 takes whatever
/// remains of the fixed 52-week horizon, which is why it is the block that
/// ends up truncated or extended to land back on June 30: the week grid
/// always totals exactly 52 weeks, which is the invariant the rest of the
/// system (a dense `[resident][0..52)` grid) depends on.
pub fn derive_block_calendar(target_year: i32) -> BlockCalendar {
    let july1 = NaiveDate::from_ymd_opt(target_year, 7, 1).expect("valid calendar date");

    let block1_weeks = (block1_length_days(july1.weekday()) / 7) as u32;
    let middle_weeks = 11 * 4;
    let block13_weeks = 52 - block1_weeks - middle_weeks;

    let mut blocks = Vec::with_capacity(13);
    blocks.push(WeekRange {
        start_week: 0,
        end_week: block1_weeks - 1,
    });

    let mut week_cursor = block1_weeks;
    for _ in 2..=12 {
        let start_week = week_cursor;
        let end_week = start_week + 3; // 4 weeks, 0-based inclusive
        blocks.push(WeekRange {
            start_week,
            end_week,
        });
        week_cursor = end_week + 1;
    }

    blocks.push(WeekRange {
        start_week: week_cursor,
        end_week: week_cursor + block13_weeks - 1,
    });

    BlockCalendar {
        target_year,
        nf_start: nf_start_date(july1),
        blocks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_2_through_12_are_always_four_weeks() {
        for year in 2020..=2030 {
            let cal = derive_block_calendar(year);
            for b in 2..=12 {
                let r = cal.week_range(b).unwrap();
                assert_eq!(r.len(), 4, "block {b} in year {year} not 4 weeks");
            }
        }
    }

    #[test]
    fn thursday_july1_gives_long_block1_and_short_block13() {
        // 2021-07-01 is a Thursday.
        let cal = derive_block_calendar(2021);
        assert_eq!(
            NaiveDate::from_ymd_opt(2021, 7, 1).unwrap().weekday(),
            Weekday::Thu
        );
        let b1 = cal.week_range(1).unwrap();
        let b13 = cal.week_range(13).unwrap();
        assert!(b1.len() > 4, "block1 should be longer than 4 weeks");
        assert!(b13.len() < 4, "block13 should be truncated");
    }

    #[test]
    fn monday_july1_gives_exact_four_week_block1() {
        // 2024-07-01 is a Monday.
        let cal = derive_block_calendar(2024);
        assert_eq!(
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap().weekday(),
            Weekday::Mon
        );
        assert_eq!(cal.week_range(1).unwrap().len(), 4);
    }

    #[test]
    fn thirteen_blocks_cover_the_full_week_grid_contiguously() {
        let cal = derive_block_calendar(2021);
        assert_eq!(cal.block_count(), 13);
        let mut expected_next = 0u32;
        for b in 1..=13 {
            let r = cal.week_range(b).unwrap();
            assert_eq!(r.start_week, expected_next);
            expected_next = r.end_week + 1;
        }
    }

    #[test]
    fn block_for_week_round_trips_with_week_range() {
        let cal = derive_block_calendar(2024);
        for b in 1..=13 {
            let r = cal.week_range(b).unwrap();
            assert_eq!(cal.block_for_week(r.start_week), Some(b));
            assert_eq!(cal.block_for_week(r.end_week), Some(b));
        }
    }

    #[test]
    fn christmas_block_falls_within_the_calendar() {
        let cal = derive_block_calendar(2024);
        let block = cal.christmas_block().expect("Dec 25 is within the 52-week horizon");
        assert!((1..=13).contains(&block));
    }

    #[test]
    fn week_for_date_before_july1_is_none() {
        let cal = derive_block_calendar(2024);
        assert!(cal.week_for_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()).is_none());
    }

    #[test]
    fn nf_start_rules_match_the_dow_table() {
        // 2024-07-01 Monday -> last Sunday in June = 2024-06-30.
        assert_eq!(
            derive_block_calendar(2024).nf_start,
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
        );
        // 2021-07-01 Thursday -> first Sunday in July = 2021-07-04.
        assert_eq!(
            derive_block_calendar(2021).nf_start,
            NaiveDate::from_ymd_opt(2021, 7, 4).unwrap()
        );
    }
}
