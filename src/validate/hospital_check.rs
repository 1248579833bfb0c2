//! Hospital-conflict check: per (resident, block), the non-OTHER hospital
//! systems across the block's four cells must collapse to at most one.

use crate::domain::{derive_block_calendar, RotationCatalog, ScheduleGrid};

use super::report::{CheckKind, Finding, Severity, ValidationReport};

pub fn check(grid: &ScheduleGrid, catalog: &RotationCatalog, target_year: i32) -> ValidationReport {
    let mut report = ValidationReport::new();
    let calendar = derive_block_calendar(target_year);

    for resident in grid.residents() {
        for block in 1..=calendar.block_count() as u32 {
            let Some(range) = calendar.week_range(block) else {
                continue;
            };
            let systems = grid.hospital_systems_in_block(resident, range.weeks(), catalog);
            if systems.len() > 1 {
                report.push(
                    Finding::new(
                        CheckKind::HospitalConflict,
                        Severity::Error,
                        format!(
                            "{resident} spans {} hospital systems in block {block}: {systems:?}",
                            systems.len()
                        ),
                    )
                    .with_resident(resident.clone()),
                );
                report.stats.hospital_conflicts += 1;
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::Phase;
    use crate::domain::resident::Pgy;
    use crate::domain::rotation::{HospitalSystem, RotationCode, Section};

    fn catalog() -> RotationCatalog {
        let mut cat = RotationCatalog::new();
        cat.insert(RotationCode {
            code: "Mb".to_string(),
            hospital_system: HospitalSystem::Ucsf,
            section: Section::Msk,
            eligible_pgy: [Pgy::R3].into_iter().collect(),
            participates_nf: false,
        });
        cat.insert(RotationCode {
            code: "Sir".to_string(),
            hospital_system: HospitalSystem::Zsfg,
            section: Section::Ir,
            eligible_pgy: [Pgy::R3].into_iter().collect(),
            participates_nf: false,
        });
        cat
    }

    #[test]
    fn two_systems_in_one_block_is_flagged() {
        let cat = catalog();
        let mut grid = ScheduleGrid::new(["r1".to_string()]);
        grid.assign("r1", 0, "Mb", Phase::R3Builder).unwrap();
        grid.assign("r1", 1, "Sir", Phase::R3Builder).unwrap();

        let report = check(&grid, &cat, 2024);
        assert_eq!(report.stats.hospital_conflicts, 1);
        assert!(!report.is_ok());
    }

    #[test]
    fn single_system_per_block_passes() {
        let cat = catalog();
        let mut grid = ScheduleGrid::new(["r1".to_string()]);
        grid.assign("r1", 0, "Mb", Phase::R3Builder).unwrap();
        grid.assign("r1", 1, "Mb", Phase::R3Builder).unwrap();

        let report = check(&grid, &cat, 2024);
        assert!(report.is_ok());
    }
}
