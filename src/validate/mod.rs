//! The four independent validator checks plus the aggregate report they
//! feed into.

pub mod graduation_check;
pub mod hospital_check;
pub mod nf_check;
pub mod report;
pub mod staffing_check;

pub use report::{CheckKind, Finding, Severity, ValidationReport};

use crate::domain::{GraduationRequirementTable, Resident, RotationCatalog, ScheduleGrid, StaffingEnvelope};

/// Run all four checks and merge their reports into one.
pub fn validate_all(
    residents: &[Resident],
    grid: &ScheduleGrid,
    catalog: &RotationCatalog,
    envelope: &StaffingEnvelope,
    requirements: &GraduationRequirementTable,
    target_year: i32,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    report.merge(staffing_check::check(grid, catalog, envelope));
    report.merge(graduation_check::check(residents, grid, catalog, requirements));
    report.merge(hospital_check::check(grid, catalog, target_year));
    report.merge(nf_check::check(residents, grid, catalog));
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn an_empty_grid_and_no_requirements_validates_clean() {
        let residents = Vec::new();
        let grid = ScheduleGrid::new(Vec::<String>::new());
        let catalog = RotationCatalog::new();
        let envelope = StaffingEnvelope::new();
        let requirements = GraduationRequirementTable::new();

        let report = validate_all(&residents, &grid, &catalog, &envelope, &requirements, 2024);
        assert!(report.is_ok());
    }
}
