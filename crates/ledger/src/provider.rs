//! Read interface the reporting engine consumes.

use thiserror::Error;

use tallyerp_core::{CompanyId, EmployeeId};

use crate::invoice::{Invoice, InvoiceLineItem, Payment};
use crate::party::{Customer, Employee};
use crate::product::Product;
use crate::query::{CompanyScope, InvoiceQuery};

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Read-layer failure.
///
/// These are **infrastructure errors**. A report that hits one is not
/// produced; the engine never substitutes zero for a failed read.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The query was rejected or failed while executing.
    #[error("ledger query failed: {0}")]
    Query(String),

    /// The backing store could not be reached.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// A row could not be mapped into a ledger record.
    #[error("malformed ledger row: {0}")]
    Decode(String),
}

/// Read-only, company-scoped access to normalized transactional records.
///
/// Implementations must be safe to call concurrently; the engine issues the
/// independent reads of one report at the same time. Retries and timeouts
/// are the provider's concern.
#[async_trait::async_trait]
pub trait LedgerDataProvider: Send + Sync {
    /// Invoice headers matching the query.
    async fn invoices(&self, query: &InvoiceQuery) -> LedgerResult<Vec<Invoice>>;

    /// Line items belonging to invoices matching the query.
    async fn invoice_lines(&self, query: &InvoiceQuery) -> LedgerResult<Vec<InvoiceLineItem>>;

    /// Payments applied to invoices matching the query.
    async fn payments(&self, query: &InvoiceQuery) -> LedgerResult<Vec<Payment>>;

    /// Catalog products (active and inactive) in scope.
    async fn products(&self, scope: CompanyScope) -> LedgerResult<Vec<Product>>;

    /// Customers (active and inactive) of a company.
    async fn customers(&self, company_id: CompanyId) -> LedgerResult<Vec<Customer>>;

    /// Employees (active and inactive) in scope.
    async fn employees(&self, scope: CompanyScope) -> LedgerResult<Vec<Employee>>;

    /// A single employee by id, whatever its company.
    async fn employee(&self, employee_id: EmployeeId) -> LedgerResult<Option<Employee>>;

    /// Cheap reachability check for liveness probes.
    async fn health_check(&self) -> LedgerResult<()>;
}
