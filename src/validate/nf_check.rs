//! NF-rule check: per-resident count per kind, minimum spacing, and
//! no-call weeks honored.

use crate::domain::{nf_requirement, spacing_ok, NfKind, Resident, RotationCatalog, ScheduleGrid};

use super::report::{CheckKind, Finding, Severity, ValidationReport};

fn nf_kind_of(code: &str) -> Option<NfKind> {
    match code {
        "Mnf" => Some(NfKind::Mnf),
        "Snf" => Some(NfKind::Snf),
        "Snf2" => Some(NfKind::Snf2),
        _ => None,
    }
}

pub fn check(
    residents: &[Resident],
    grid: &ScheduleGrid,
    _catalog: &RotationCatalog,
) -> ValidationReport {
    let mut report = ValidationReport::new();

    for resident in residents {
        let nf_weeks: Vec<(u32, NfKind)> = (0..crate::domain::WEEKS_PER_YEAR)
            .filter_map(|w| grid.get(&resident.name, w).and_then(nf_kind_of).map(|k| (w, k)))
            .collect();

        if let Some(req) = nf_requirement(resident.future_pgy) {
            let matching: Vec<u32> = nf_weeks
                .iter()
                .filter(|(_, k)| req.kinds.contains(k))
                .map(|(w, _)| *w)
                .collect();

            if let Some(exact) = req.exact_count {
                if matching.len() as u32 != exact {
                    report.push(
                        Finding::new(
                            CheckKind::NightFloat,
                            Severity::Error,
                            format!(
                                "{} has {} NF week(s) of {:?}, expected exactly {exact}",
                                resident.name,
                                matching.len(),
                                req.kinds
                            ),
                        )
                        .with_resident(resident.name.clone()),
                    );
                    report.stats.nf_rule_violations += 1;
                }
            }
            if let Some(max) = req.max_count {
                if matching.len() as u32 > max {
                    report.push(
                        Finding::new(
                            CheckKind::NightFloat,
                            Severity::Error,
                            format!(
                                "{} has {} NF week(s) of {:?}, exceeding max {max}",
                                resident.name,
                                matching.len(),
                                req.kinds
                            ),
                        )
                        .with_resident(resident.name.clone()),
                    );
                    report.stats.nf_rule_violations += 1;
                }
            }
        }

        for i in 0..nf_weeks.len() {
            for j in (i + 1)..nf_weeks.len() {
                let (w1, _) = nf_weeks[i];
                let (w2, _) = nf_weeks[j];
                if !spacing_ok(w1, w2) {
                    report.push(
                        Finding::new(
                            CheckKind::NightFloat,
                            Severity::Error,
                            format!("{} has NF weeks {w1} and {w2} too close together", resident.name),
                        )
                        .with_resident(resident.name.clone())
                        .with_week(w1)
                        .with_week(w2),
                    );
                    report.stats.nf_rule_violations += 1;
                }
            }
        }

        for (week, _) in &nf_weeks {
            if resident.preferences.no_call_weeks.contains(week) {
                report.push(
                    Finding::new(
                        CheckKind::NightFloat,
                        Severity::Error,
                        format!("{} assigned NF in no-call week {week}", resident.name),
                    )
                    .with_resident(resident.name.clone())
                    .with_week(*week),
                );
                report.stats.nf_rule_violations += 1;
            }
        }
    }

    report
}
