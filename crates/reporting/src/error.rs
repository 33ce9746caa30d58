//! Report error model.

use thiserror::Error;

use tallyerp_core::DomainError;
use tallyerp_ledger::LedgerError;

pub type ReportResult<T> = Result<T, ReportError>;

/// Why a report could not be produced.
///
/// Numeric edge cases (division by zero in ratios) are not errors; they
/// resolve to zero where they occur.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// Caller-fixable input problem (bad id, inverted date range, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The requested employee/customer does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A ledger read failed; the report is not produced.
    #[error(transparent)]
    DataSource(#[from] LedgerError),
}

impl ReportError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<DomainError> for ReportError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ReportError::Validation(msg),
            DomainError::InvalidId(msg) => ReportError::Validation(msg),
            DomainError::NotFound(msg) => ReportError::NotFound(msg),
        }
    }
}
