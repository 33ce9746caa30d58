//! Sales summary by product, customer or employee.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tallyerp_core::{InvoiceId, percentage};
use tallyerp_ledger::{Customer, DateWindow, Employee, Invoice, InvoiceLineItem, Product};

use crate::dimension::{Dimension, GroupKey, compare_labels};
use crate::profit_loss::index_products;

pub const DELETED_PRODUCT_LABEL: &str = "Deleted product";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRow {
    pub key: GroupKey,
    pub label: String,
    pub invoice_count: u64,
    pub quantity: Decimal,
    /// Σ quantity × actual unit price.
    pub revenue: Decimal,
    /// Σ quantity × cost price; unknown products cost 0.
    pub cost: Decimal,
}

impl SalesRow {
    fn empty(key: GroupKey, label: String) -> Self {
        Self {
            key,
            label,
            invoice_count: 0,
            quantity: Decimal::ZERO,
            revenue: Decimal::ZERO,
            cost: Decimal::ZERO,
        }
    }

    pub fn gross_profit(&self) -> Decimal {
        self.revenue - self.cost
    }

    pub fn margin(&self) -> Decimal {
        percentage(self.gross_profit(), self.revenue)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub window: DateWindow,
    pub group_by: Dimension,
    /// Rows with sales, ordered by revenue (highest first).
    pub rows: Vec<SalesRow>,
    pub total: SalesRow,
}

/// Everything needed to label rows.
pub struct SalesDirectory<'a> {
    pub products: &'a [Product],
    pub customers: &'a [Customer],
    pub employees: &'a [Employee],
}

pub fn summarize_sales(
    window: DateWindow,
    group_by: Dimension,
    invoices: &[Invoice],
    lines: &[InvoiceLineItem],
    directory: &SalesDirectory<'_>,
) -> SalesSummary {
    let products = index_products(directory.products);
    let invoices: HashMap<InvoiceId, &Invoice> = invoices.iter().map(|i| (i.id, i)).collect();
    let customers: HashMap<_, &str> = directory.customers.iter().map(|c| (c.id, c.name.as_str())).collect();
    let employees: HashMap<_, &str> = directory.employees.iter().map(|e| (e.id, e.name.as_str())).collect();

    let mut rows: BTreeMap<GroupKey, (SalesRow, BTreeSet<InvoiceId>)> = BTreeMap::new();
    let mut all_invoices: BTreeSet<InvoiceId> = BTreeSet::new();
    let mut total = SalesRow::empty(GroupKey::Unassigned, "Total".to_string());

    for line in lines {
        let Some(invoice) = invoices.get(&line.invoice_id) else {
            continue;
        };
        let product = line.product_id.and_then(|id| products.get(&id).copied());

        let (key, label) = match group_by {
            Dimension::Product => match (line.product_id, product) {
                (Some(_), Some(p)) => (GroupKey::Product(p.id), p.name.clone()),
                (Some(id), None) => (GroupKey::Product(id), DELETED_PRODUCT_LABEL.to_string()),
                (None, _) => (GroupKey::Unassigned, GroupKey::UNASSIGNED_LABEL.to_string()),
            },
            Dimension::Customer => match invoice.customer_id.and_then(|id| customers.get(&id).map(|n| (id, *n))) {
                Some((id, name)) => (GroupKey::Customer(id), name.to_string()),
                None => (GroupKey::Unassigned, GroupKey::UNASSIGNED_LABEL.to_string()),
            },
            Dimension::Employee => match invoice.employee_id.and_then(|id| employees.get(&id).map(|n| (id, *n))) {
                Some((id, name)) => (GroupKey::Employee(id), name.to_string()),
                None => (GroupKey::Unassigned, GroupKey::UNASSIGNED_LABEL.to_string()),
            },
        };

        let revenue = line.net_amount();
        let cost = line.quantity * product.map_or(Decimal::ZERO, |p| p.cost_price);

        let (row, seen) = rows
            .entry(key)
            .or_insert_with(|| (SalesRow::empty(key, label), BTreeSet::new()));
        row.quantity += line.quantity;
        row.revenue += revenue;
        row.cost += cost;
        seen.insert(invoice.id);

        total.quantity += line.quantity;
        total.revenue += revenue;
        total.cost += cost;
        all_invoices.insert(invoice.id);
    }
    total.invoice_count = all_invoices.len() as u64;

    let mut rows: Vec<SalesRow> = rows
        .into_values()
        .map(|(mut row, seen)| {
            row.invoice_count = seen.len() as u64;
            row
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| compare_labels(&a.label, &b.label)));

    SalesSummary {
        window,
        group_by,
        rows,
        total,
    }
}
