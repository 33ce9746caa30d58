//! Who earns the commission on a sold line.

use serde::{Deserialize, Serialize};

use tallyerp_core::{DomainError, EmployeeId};
use tallyerp_ledger::{Invoice, Product};

/// Commission attribution policy.
///
/// The long-standing rule credits the employee who registered the product,
/// not the one who made the sale. The salesperson rule is available for
/// companies that pay on sales instead.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionPolicy {
    #[default]
    ProductRegistrant,
    InvoiceSalesperson,
}

impl AttributionPolicy {
    pub fn attribute(&self, product: &Product, invoice: &Invoice) -> Option<EmployeeId> {
        match self {
            AttributionPolicy::ProductRegistrant => product.added_employee_id,
            AttributionPolicy::InvoiceSalesperson => invoice.employee_id,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttributionPolicy::ProductRegistrant => "product_registrant",
            AttributionPolicy::InvoiceSalesperson => "invoice_salesperson",
        }
    }
}

impl core::str::FromStr for AttributionPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "product_registrant" => Ok(AttributionPolicy::ProductRegistrant),
            "invoice_salesperson" => Ok(AttributionPolicy::InvoiceSalesperson),
            other => Err(DomainError::validation(format!("unknown commission attribution policy: {other}"))),
        }
    }
}
