//! Ledger data provider: read-only access to a company's transactional rows.
//!
//! The reporting engine never owns persistence. It reads invoice, line item,
//! product, party and payment snapshots through [`LedgerDataProvider`], using
//! the typed query objects in [`query`] instead of assembling SQL at runtime.

pub mod invoice;
pub mod memory;
pub mod party;
pub mod product;
pub mod provider;
pub mod query;

pub use invoice::{Invoice, InvoiceLineItem, InvoiceStatus, Payment};
pub use memory::InMemoryLedger;
pub use party::{Customer, Employee};
pub use product::Product;
pub use provider::{LedgerDataProvider, LedgerError, LedgerResult};
pub use query::{BalanceFilter, CompanyScope, DateWindow, InvoiceQuery, StatusFilter};
