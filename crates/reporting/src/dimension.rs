//! Grouping dimensions shared by the P&L and sales reports.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use tallyerp_core::{CustomerId, DomainError, EmployeeId, ProductId};
use tallyerp_ledger::Invoice;

/// Dimension a report can be broken down by.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Customer,
    Employee,
    Product,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Customer => "customer",
            Dimension::Employee => "employee",
            Dimension::Product => "product",
        }
    }

    /// Group key of an invoice header for header-level dimensions.
    ///
    /// Product is a line-level dimension and has no header key.
    pub fn header_key(&self, invoice: &Invoice) -> Option<GroupKey> {
        match self {
            Dimension::Customer => invoice.customer_id.map(GroupKey::Customer),
            Dimension::Employee => invoice.employee_id.map(GroupKey::Employee),
            Dimension::Product => None,
        }
    }
}

impl core::str::FromStr for Dimension {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "customer" => Ok(Dimension::Customer),
            "employee" => Ok(Dimension::Employee),
            "product" => Ok(Dimension::Product),
            other => Err(DomainError::validation(format!(
                "group_by must be one of: customer, employee, product (got {other:?})"
            ))),
        }
    }
}

/// Row identity inside a grouped report.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum GroupKey {
    Customer(CustomerId),
    Employee(EmployeeId),
    Product(ProductId),
    /// Activity whose dimension value is missing, unknown or inactive.
    Unassigned,
    /// Company-wide inventory adjustments (shrinkage).
    InventoryAdjustment,
}

impl GroupKey {
    pub const UNASSIGNED_LABEL: &'static str = "Unassigned";
    pub const INVENTORY_ADJUSTMENT_LABEL: &'static str = "Inventory adjustments";
}

/// Collation for every name-ordered report: case-insensitive, then exact.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_collate_ignoring_case() {
        let mut names = vec!["bravo", "Charlie", "alpha", "Alpha"];
        names.sort_by(|a, b| compare_labels(a, b));
        assert_eq!(names, vec!["Alpha", "alpha", "bravo", "Charlie"]);
    }
}
