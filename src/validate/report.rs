//! The validator's aggregate report: a flat list of findings plus summary
//! statistics, mirroring the errors/warnings/stats shape used elsewhere in
//! this codebase for multi-check validation passes.

use serde::{Deserialize, Serialize};

use crate::domain::Section;

/// How serious a finding is. Only `Error` makes the report non-`ok`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

/// Which of the four independent checks produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckKind {
    Staffing,
    Graduation,
    HospitalConflict,
    NightFloat,
}

/// One validator finding: a severity, a human-readable message, and the
/// (resident, week) pairs it implicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub check: CheckKind,
    pub severity: Severity,
    pub message: String,
    pub residents: Vec<String>,
    pub weeks: Vec<u32>,
}

impl Finding {
    pub fn new(check: CheckKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            check,
            severity,
            message: message.into(),
            residents: Vec::new(),
            weeks: Vec::new(),
        }
    }

    pub fn with_resident(mut self, resident: impl Into<String>) -> Self {
        self.residents.push(resident.into());
        self
    }

    pub fn with_week(mut self, week: u32) -> Self {
        self.weeks.push(week);
        self
    }
}

/// Per-check summary counters, surfaced alongside the findings list so a
/// caller can render a dashboard without re-scanning the findings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationStats {
    pub staffing_violations: usize,
    pub graduation_deficits: usize,
    pub hospital_conflicts: usize,
    pub nf_rule_violations: usize,
    pub residents_checked: usize,
    pub deficit_by_section: Vec<(Section, u32)>,
}

/// The aggregate output of the four validator checks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    findings: Vec<Finding>,
    pub stats: ValidationStats,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        self.findings.extend(findings);
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn error_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .count()
    }

    /// The report is `ok` when no error-severity finding exists; warnings
    /// never block it.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.findings.extend(other.findings);
        self.stats.staffing_violations += other.stats.staffing_violations;
        self.stats.graduation_deficits += other.stats.graduation_deficits;
        self.stats.hospital_conflicts += other.stats.hospital_conflicts;
        self.stats.nf_rule_violations += other.stats.nf_rule_violations;
        self.stats.residents_checked = self.stats.residents_checked.max(other.stats.residents_checked);
        self.stats.deficit_by_section.extend(other.stats.deficit_by_section);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_ok() {
        assert!(ValidationReport::new().is_ok());
    }

    #[test]
    fn a_single_error_finding_makes_the_report_not_ok() {
        let mut report = ValidationReport::new();
        report.push(Finding::new(
            CheckKind::HospitalConflict,
            Severity::Error,
            "conflict",
        ));
        assert!(!report.is_ok());
        assert_eq!(report.error_count(), 1);
    }

    #[test]
    fn warnings_alone_do_not_fail_the_report() {
        let mut report = ValidationReport::new();
        report.push(Finding::new(CheckKind::Staffing, Severity::Warning, "low"));
        assert!(report.is_ok());
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn merge_combines_findings_and_stats() {
        let mut a = ValidationReport::new();
        a.push(Finding::new(CheckKind::Staffing, Severity::Warning, "a"));
        a.stats.staffing_violations = 1;

        let mut b = ValidationReport::new();
        b.push(Finding::new(CheckKind::NightFloat, Severity::Error, "b"));
        b.stats.nf_rule_violations = 1;

        a.merge(b);
        assert_eq!(a.findings().len(), 2);
        assert_eq!(a.stats.staffing_violations, 1);
        assert_eq!(a.stats.nf_rule_violations, 1);
        assert!(!a.is_ok());
    }
}
