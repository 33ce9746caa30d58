//! `tallyerp-core`: shared kernel for the reporting workspace.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the domain error model, the entity trait and exact-decimal
//! money helpers.

pub mod entity;
pub mod error;
pub mod id;
pub mod money;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CompanyId, CustomerId, EmployeeId, InvoiceId, LineItemId, PaymentId, ProductId};
pub use money::{Amount, CurrencyCode, percentage, ratio_or_zero};
