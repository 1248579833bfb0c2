use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use residency_scheduler::domain::resident::Pgy;
use residency_scheduler::domain::{derive_block_calendar, PathwaySet, PreferenceRecord, Resident, RotationCatalog};
use residency_scheduler::solvers::nf_solver::{self, NfInput};
use residency_scheduler::solvers::r2_matcher::{self, R2MatchInput};
use residency_scheduler::domain::ScheduleGrid;

fn resident(name: &str, pgy: Pgy) -> Resident {
    Resident {
        name: name.to_string(),
        future_pgy: pgy,
        pathways: PathwaySet::new(),
        preferences: PreferenceRecord::default(),
        historical_weeks: HashMap::new(),
    }
}

/// An R2 cohort matched one-for-one against an equal number of tracks,
/// every pairing eligible, so the matcher's full O(n^2 log n) sort is
/// exercised rather than short-circuited by eligibility pruning.
fn bench_r2_matcher(c: &mut Criterion) {
    let mut group = c.benchmark_group("r2_matcher");

    for &size in &[15usize, 60] {
        let residents: Vec<Resident> = (0..size)
            .map(|i| resident(&format!("resident_{i}"), Pgy::R2))
            .collect();
        let track_indices: Vec<u32> = (1..=size as u32).collect();

        let mut rank = HashMap::new();
        for (i, r) in residents.iter().enumerate() {
            for &t in &track_indices {
                rank.insert((r.name.clone(), t), ((t as usize + i) % size) as u32 + 1);
            }
        }

        group.bench_with_input(BenchmarkId::new("solve", size), &size, |b, _| {
            b.iter(|| {
                let input = R2MatchInput {
                    residents: black_box(&residents),
                    rank: rank.clone(),
                    eligible: HashMap::new(),
                    deficit_penalty: HashMap::new(),
                    track_indices: track_indices.clone(),
                    deficit_weight: 0.1,
                };
                black_box(r2_matcher::solve(&input).unwrap());
            });
        });
    }

    group.finish();
}

/// A full-size 60-resident roster (15 per PGY year) run through the
/// seven-layer night-float overlay solve.
fn bench_nf_solver(c: &mut Criterion) {
    let mut group = c.benchmark_group("nf_solver");

    let mut residents = Vec::new();
    for pgy in [Pgy::R1, Pgy::R2, Pgy::R3, Pgy::R4] {
        for i in 0..15 {
            residents.push(resident(&format!("{pgy:?}_{i}"), pgy));
        }
    }
    let calendar = derive_block_calendar(2024);
    let catalog = RotationCatalog::new();

    group.bench_function("solve_60_residents", |b| {
        b.iter(|| {
            let input = NfInput {
                residents: black_box(&residents),
                catalog: &catalog,
                calendar: &calendar,
                lc_block: 5,
                core_exam_block: 6,
            };
            let mut grid = ScheduleGrid::new(residents.iter().map(|r| r.name.clone()));
            black_box(nf_solver::solve(&input, &mut grid).unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_r2_matcher, bench_nf_solver);
criterion_main!(benches);
