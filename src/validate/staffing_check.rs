//! Staffing check: for each (rotation, week), compare head-count against
//! its configured envelope.

use std::collections::HashMap;

use crate::domain::{RotationCatalog, ScheduleGrid, StaffingEnvelope, WEEKS_PER_YEAR};

use super::report::{CheckKind, Finding, Severity, ValidationReport};

pub fn check(
    grid: &ScheduleGrid,
    catalog: &RotationCatalog,
    envelope: &StaffingEnvelope,
) -> ValidationReport {
    let mut report = ValidationReport::new();

    for week in 0..WEEKS_PER_YEAR {
        let mut counts: HashMap<&str, u32> = HashMap::new();
        for resident in grid.residents() {
            if let Some(code) = grid.get(resident, week) {
                *counts.entry(code).or_insert(0) += 1;
            }
        }

        for code in catalog_codes(catalog) {
            let count = counts.get(code).copied().unwrap_or(0);
            if let Some(env) = envelope.get(code, week) {
                if count < env.min {
                    report.push(
                        Finding::new(
                            CheckKind::Staffing,
                            Severity::Error,
                            format!(
                                "{code} understaffed in week {week}: {count} < min {}",
                                env.min
                            ),
                        )
                        .with_week(week),
                    );
                    report.stats.staffing_violations += 1;
                } else if count > env.max {
                    report.push(
                        Finding::new(
                            CheckKind::Staffing,
                            Severity::Error,
                            format!(
                                "{code} overstaffed in week {week}: {count} > max {}",
                                env.max
                            ),
                        )
                        .with_week(week),
                    );
                    report.stats.staffing_violations += 1;
                }
            }
        }
    }

    report
}

fn catalog_codes(catalog: &RotationCatalog) -> Vec<&str> {
    crate::domain::Section::all_sections()
        .into_iter()
        .flat_map(|s| catalog.codes_for_section(s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rotation::{HospitalSystem, RotationCode, Section};
    use crate::domain::resident::Pgy;
    use crate::domain::grid::Phase;

    fn catalog() -> RotationCatalog {
        let mut cat = RotationCatalog::new();
        cat.insert(RotationCode {
            code: "Mnuc".to_string(),
            hospital_system: HospitalSystem::Ucsf,
            section: Section::NucMed,
            eligible_pgy: [Pgy::R4].into_iter().collect(),
            participates_nf: false,
        });
        cat
    }

    #[test]
    fn understaffing_is_flagged() {
        let cat = catalog();
        let mut env = StaffingEnvelope::new();
        env.set("Mnuc", 0, 2, 4);
        let mut grid = ScheduleGrid::new(["r1".to_string()]);
        grid.assign("r1", 0, "Mnuc", Phase::R4Builder).unwrap();

        let report = check(&grid, &cat, &env);
        assert_eq!(report.stats.staffing_violations, 1);
        assert!(!report.is_ok());
    }

    #[test]
    fn satisfied_envelope_produces_no_findings() {
        let cat = catalog();
        let mut env = StaffingEnvelope::new();
        env.set("Mnuc", 0, 0, 4);
        let grid = ScheduleGrid::new(["r1".to_string()]);

        let report = check(&grid, &cat, &env);
        assert!(report.is_ok());
        assert_eq!(report.stats.staffing_violations, 0);
    }
}
