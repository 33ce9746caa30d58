//! Typed query objects for ledger reads.
//!
//! Every filter a report can apply is enumerated here; providers translate a
//! query into their own access path (in-memory scan, parameterized SQL).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use tallyerp_core::{CompanyId, DomainError, DomainResult};

use crate::invoice::{Invoice, InvoiceStatus};

/// Inclusive date window; a missing bound is open-ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    /// Window with no bounds (matches every date).
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Build a window, rejecting `start > end`.
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> DomainResult<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(DomainError::validation(format!(
                    "start date {s} is after end date {e}"
                )));
            }
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }
}

/// Which companies a read covers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scope", content = "company_id")]
pub enum CompanyScope {
    Company(CompanyId),
    /// Cross-company read (company-less commission summary).
    AllCompanies,
}

impl CompanyScope {
    pub fn includes(&self, company_id: CompanyId) -> bool {
        match self {
            CompanyScope::Company(c) => *c == company_id,
            CompanyScope::AllCompanies => true,
        }
    }

    pub fn company_id(&self) -> Option<CompanyId> {
        match self {
            CompanyScope::Company(c) => Some(*c),
            CompanyScope::AllCompanies => None,
        }
    }
}

impl From<CompanyId> for CompanyScope {
    fn from(value: CompanyId) -> Self {
        CompanyScope::Company(value)
    }
}

impl From<Option<CompanyId>> for CompanyScope {
    fn from(value: Option<CompanyId>) -> Self {
        value.map_or(CompanyScope::AllCompanies, CompanyScope::Company)
    }
}

/// Set of invoice statuses a read accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusFilter(Vec<InvoiceStatus>);

impl StatusFilter {
    pub fn only(statuses: &[InvoiceStatus]) -> Self {
        let mut v = statuses.to_vec();
        v.sort();
        v.dedup();
        Self(v)
    }

    pub fn revenue_recognized() -> Self {
        Self::only(&InvoiceStatus::REVENUE_RECOGNIZED)
    }

    pub fn receivable() -> Self {
        Self::only(&InvoiceStatus::RECEIVABLE)
    }

    pub fn matches(&self, status: InvoiceStatus) -> bool {
        self.0.contains(&status)
    }

    pub fn statuses(&self) -> &[InvoiceStatus] {
        &self.0
    }
}

/// Balance condition on the invoice header.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceFilter {
    #[default]
    Any,
    /// `balance_due > 0`.
    Open,
}

impl BalanceFilter {
    pub fn matches(&self, invoice: &Invoice) -> bool {
        match self {
            BalanceFilter::Any => true,
            BalanceFilter::Open => invoice.has_open_balance(),
        }
    }
}

/// Invoice selection shared by header, line item and payment reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvoiceQuery {
    pub scope: CompanyScope,
    /// Filter on `invoice_date`.
    pub invoice_date: DateWindow,
    pub statuses: StatusFilter,
    pub balance: BalanceFilter,
}

impl InvoiceQuery {
    /// Revenue-recognized invoices dated inside `window`.
    pub fn revenue(scope: impl Into<CompanyScope>, window: DateWindow) -> Self {
        Self {
            scope: scope.into(),
            invoice_date: window,
            statuses: StatusFilter::revenue_recognized(),
            balance: BalanceFilter::Any,
        }
    }

    /// Receivable invoices with an open balance, whatever their date.
    pub fn open_receivables(scope: impl Into<CompanyScope>) -> Self {
        Self {
            scope: scope.into(),
            invoice_date: DateWindow::unbounded(),
            statuses: StatusFilter::receivable(),
            balance: BalanceFilter::Open,
        }
    }

    /// Every non-cancelled invoice with an open balance, whatever its date.
    pub fn outstanding_as_of(scope: impl Into<CompanyScope>) -> Self {
        Self {
            scope: scope.into(),
            invoice_date: DateWindow::unbounded(),
            statuses: StatusFilter::revenue_recognized(),
            balance: BalanceFilter::Open,
        }
    }

    pub fn matches(&self, invoice: &Invoice) -> bool {
        self.scope.includes(invoice.company_id)
            && self.invoice_date.contains(invoice.invoice_date)
            && self.statuses.matches(invoice.status)
            && self.balance.matches(invoice)
    }
}
