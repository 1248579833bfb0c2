//! Crate-level error types.
//!
//! A solver-facing [`SchedulerError`] (infeasibility, data-integrity, and a
//! non-ok validation report) and a boundary-facing [`WorkbookError`] for the
//! peripheral workbook/survey inputs. Keeping them separate lets callers
//! distinguish "the input was malformed" from "the constraints cannot be
//! satisfied" without downcasting.

use crate::validate::report::ValidationReport;

/// Errors raised by the synthesis pipeline itself.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// A solver phase could not satisfy its hard constraints. Carries the
    /// name of the blocking constraint subset so the caller can report it
    /// without re-deriving which rule failed.
    #[error("infeasible: {constraint} — {detail}")]
    Infeasibility { constraint: String, detail: String },

    /// The input violated a structural invariant (duplicate resident name,
    /// unknown rotation code, missing pathway data, …). Fails fast rather
    /// than producing a partially-built grid.
    #[error("data integrity violation: {detail}")]
    DataIntegrity { detail: String },

    /// The build completed but the validator found error-severity findings.
    #[error("validation failed with {} error(s)", .0.error_count())]
    Validation(ValidationReport),
}

impl SchedulerError {
    pub fn infeasibility(constraint: impl Into<String>, detail: impl Into<String>) -> Self {
        SchedulerError::Infeasibility {
            constraint: constraint.into(),
            detail: detail.into(),
        }
    }

    pub fn data_integrity(detail: impl Into<String>) -> Self {
        SchedulerError::DataIntegrity {
            detail: detail.into(),
        }
    }
}

/// Errors at the workbook/survey boundary.
///
/// The core never returns these from a solver phase; they originate only in
/// the [`crate::workbook`] module, which this crate treats as a peripheral
/// collaborator rather than a first-class concern.
#[derive(Debug, thiserror::Error)]
pub enum WorkbookError {
    #[error("missing tab or column: {0}")]
    MissingData(String),

    #[error("unparseable cell at {location}: {detail}")]
    UnparseableCell { location: String, detail: String },

    #[error("duplicate resident name key: {0}")]
    DuplicateResident(String),

    #[error("unknown rotation code: {0}")]
    UnknownRotationCode(String),

    #[error("io error: {0}")]
    Io(String),
}
