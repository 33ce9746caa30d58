//! Per-employee commission.
//!
//! Summary and detail are both derived from [`attributed_lines`], so the
//! detail lines for an employee always add up to that employee's summary
//! total.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tallyerp_core::{CustomerId, EmployeeId, InvoiceId, ProductId};
use tallyerp_ledger::{Customer, DateWindow, Employee, Invoice, InvoiceLineItem, Product};

use crate::attribution::AttributionPolicy;
use crate::dimension::compare_labels;
use crate::profit_loss::index_products;

/// One sold line that earns commission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionLine {
    pub employee_id: EmployeeId,
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub customer_id: Option<CustomerId>,
    pub customer_name: Option<String>,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit_commission: Decimal,
    pub line_commission: Decimal,
}

/// Attribute every line of `invoices` to an employee under `policy`.
///
/// Lines without a known product, or whose product has no attributed
/// employee, earn nothing and are left out. Ordered by invoice date, then
/// invoice number.
pub fn attributed_lines(
    policy: AttributionPolicy,
    invoices: &[Invoice],
    lines: &[InvoiceLineItem],
    products: &[Product],
    customers: &[Customer],
) -> Vec<CommissionLine> {
    let products = index_products(products);
    let invoices: HashMap<InvoiceId, &Invoice> = invoices.iter().map(|i| (i.id, i)).collect();
    let customers: HashMap<CustomerId, &str> = customers.iter().map(|c| (c.id, c.name.as_str())).collect();

    let mut out: Vec<CommissionLine> = lines
        .iter()
        .filter_map(|line| {
            let invoice = invoices.get(&line.invoice_id)?;
            let product = products.get(&line.product_id?)?;
            let employee_id = policy.attribute(product, invoice)?;
            Some(CommissionLine {
                employee_id,
                invoice_id: invoice.id,
                invoice_number: invoice.invoice_number.clone(),
                invoice_date: invoice.invoice_date,
                customer_id: invoice.customer_id,
                customer_name: invoice
                    .customer_id
                    .and_then(|id| customers.get(&id))
                    .map(|name| name.to_string()),
                product_id: product.id,
                product_name: product.name.clone(),
                quantity: line.quantity,
                unit_commission: product.commission,
                line_commission: line.quantity * product.commission,
            })
        })
        .collect();

    out.sort_by(|a, b| {
        a.invoice_date
            .cmp(&b.invoice_date)
            .then_with(|| a.invoice_number.cmp(&b.invoice_number))
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSummaryRow {
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub quantity_sold: Decimal,
    /// Distinct invoices contributing to the total.
    pub invoice_count: u64,
    pub total_commission: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSummary {
    pub window: DateWindow,
    pub policy: AttributionPolicy,
    /// One row per active employee, ordered by name.
    pub rows: Vec<CommissionSummaryRow>,
}

impl CommissionSummary {
    pub fn total_commission(&self) -> Decimal {
        self.rows.iter().map(|r| r.total_commission).sum()
    }

    pub fn row(&self, employee_id: EmployeeId) -> Option<&CommissionSummaryRow> {
        self.rows.iter().find(|r| r.employee_id == employee_id)
    }
}

/// One row per active employee, including employees with no sales.
pub fn summarize(
    window: DateWindow,
    policy: AttributionPolicy,
    employees: &[Employee],
    lines: &[CommissionLine],
) -> CommissionSummary {
    #[derive(Default)]
    struct Acc {
        quantity: Decimal,
        commission: Decimal,
        invoices: BTreeSet<InvoiceId>,
    }

    let mut acc: BTreeMap<EmployeeId, Acc> = BTreeMap::new();
    for line in lines {
        let entry = acc.entry(line.employee_id).or_default();
        entry.quantity += line.quantity;
        entry.commission += line.line_commission;
        entry.invoices.insert(line.invoice_id);
    }

    let mut rows: Vec<CommissionSummaryRow> = employees
        .iter()
        .filter(|e| e.is_active)
        .map(|employee| {
            let totals = acc.remove(&employee.id).unwrap_or_default();
            CommissionSummaryRow {
                employee_id: employee.id,
                employee_name: employee.name.clone(),
                quantity_sold: totals.quantity,
                invoice_count: totals.invoices.len() as u64,
                total_commission: totals.commission,
            }
        })
        .collect();
    rows.sort_by(|a, b| compare_labels(&a.employee_name, &b.employee_name).then(a.employee_id.cmp(&b.employee_id)));

    CommissionSummary { window, policy, rows }
}

/// Every contributing line for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionDetail {
    pub employee: Employee,
    pub window: DateWindow,
    pub policy: AttributionPolicy,
    pub lines: Vec<CommissionLine>,
}

impl CommissionDetail {
    pub fn total_commission(&self) -> Decimal {
        self.lines.iter().map(|l| l.line_commission).sum()
    }
}

pub fn detail_for(
    employee: Employee,
    window: DateWindow,
    policy: AttributionPolicy,
    lines: Vec<CommissionLine>,
) -> CommissionDetail {
    let lines = lines.into_iter().filter(|l| l.employee_id == employee.id).collect();
    CommissionDetail {
        employee,
        window,
        policy,
        lines,
    }
}
