//! Accounts-receivable aging.
//!
//! Open balances are bucketed by how far the due date is from a reference
//! date. Bucket bounds are exclusive below and inclusive above:
//!
//! | bucket         | due date (`d`), reference `r`           |
//! |----------------|-----------------------------------------|
//! | due today      | `d == r`                                |
//! | due 15 days    | `r < d <= r + 15`                       |
//! | due 30 days    | `r + 15 < d <= r + 30`                  |
//! | due 60 days    | `r + 30 < d <= r + 60`                  |
//! | over 60 days   | `d < r`, no due date, or `d > r + 60`   |
//!
//! The over-60 bucket mixes three different situations, so they are also
//! tracked separately.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tallyerp_core::CustomerId;
use tallyerp_ledger::{CompanyScope, Customer, Invoice, InvoiceQuery};

use crate::dimension::compare_labels;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgingBucket {
    DueToday,
    Due15Days,
    Due30Days,
    Due60Days,
    /// Due date already passed.
    Overdue,
    NoDueDate,
    /// Due more than 60 days after the reference date.
    DueBeyond60Days,
}

impl AgingBucket {
    pub fn classify(due_date: Option<NaiveDate>, reference: NaiveDate) -> Self {
        let Some(due) = due_date else {
            return AgingBucket::NoDueDate;
        };
        match (due - reference).num_days() {
            days if days < 0 => AgingBucket::Overdue,
            0 => AgingBucket::DueToday,
            1..=15 => AgingBucket::Due15Days,
            16..=30 => AgingBucket::Due30Days,
            31..=60 => AgingBucket::Due60Days,
            _ => AgingBucket::DueBeyond60Days,
        }
    }

    /// Part of the combined over-60 bucket.
    pub fn is_over_60(&self) -> bool {
        matches!(
            self,
            AgingBucket::Overdue | AgingBucket::NoDueDate | AgingBucket::DueBeyond60Days
        )
    }
}

/// Full-precision bucket sums.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgingBuckets {
    pub due_today: Decimal,
    pub due_15_days: Decimal,
    pub due_30_days: Decimal,
    pub due_60_days: Decimal,
    pub overdue: Decimal,
    pub no_due_date: Decimal,
    pub due_beyond_60_days: Decimal,
}

impl AgingBuckets {
    pub fn add(&mut self, bucket: AgingBucket, amount: Decimal) {
        let slot = match bucket {
            AgingBucket::DueToday => &mut self.due_today,
            AgingBucket::Due15Days => &mut self.due_15_days,
            AgingBucket::Due30Days => &mut self.due_30_days,
            AgingBucket::Due60Days => &mut self.due_60_days,
            AgingBucket::Overdue => &mut self.overdue,
            AgingBucket::NoDueDate => &mut self.no_due_date,
            AgingBucket::DueBeyond60Days => &mut self.due_beyond_60_days,
        };
        *slot += amount;
    }

    pub fn over_60_days(&self) -> Decimal {
        self.overdue + self.no_due_date + self.due_beyond_60_days
    }

    /// Sum of the five reported buckets.
    pub fn total(&self) -> Decimal {
        self.due_today + self.due_15_days + self.due_30_days + self.due_60_days + self.over_60_days()
    }

    pub fn merge(&mut self, other: &AgingBuckets) {
        self.due_today += other.due_today;
        self.due_15_days += other.due_15_days;
        self.due_30_days += other.due_30_days;
        self.due_60_days += other.due_60_days;
        self.overdue += other.overdue;
        self.no_due_date += other.no_due_date;
        self.due_beyond_60_days += other.due_beyond_60_days;
    }
}

/// One customer's receivables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgingRow {
    pub customer_id: Option<CustomerId>,
    pub customer_name: String,
    pub buckets: AgingBuckets,
    /// Σ `total − paid` over the same invoices. Differs from the bucket
    /// total only when a stored `balance_due` disagrees with its header.
    pub receivable_balance: Decimal,
    pub invoice_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArAging {
    pub reference_date: NaiveDate,
    /// Ordered by customer name.
    pub rows: Vec<AgingRow>,
}

impl ArAging {
    pub fn totals(&self) -> AgingBuckets {
        let mut totals = AgingBuckets::default();
        for row in &self.rows {
            totals.merge(&row.buckets);
        }
        totals
    }

    pub fn total_outstanding(&self) -> Decimal {
        self.totals().total()
    }
}

pub const UNKNOWN_CUSTOMER_LABEL: &str = "Unknown customer";

/// Age every open receivable in `invoices`, one row per customer.
///
/// Invoices that are not open receivables are skipped even if the caller
/// passes them. Customers are looked up for names only; an inactive
/// customer with an open balance still gets a named row.
pub fn compute_ar_aging(reference_date: NaiveDate, invoices: &[Invoice], customers: &[Customer]) -> ArAging {
    let names: HashMap<CustomerId, &str> = customers.iter().map(|c| (c.id, c.name.as_str())).collect();
    let receivable = InvoiceQuery::open_receivables(CompanyScope::AllCompanies);

    let mut by_customer: BTreeMap<Option<CustomerId>, AgingRow> = BTreeMap::new();
    for invoice in invoices.iter().filter(|i| receivable.matches(i)) {
        let row = by_customer.entry(invoice.customer_id).or_insert_with(|| AgingRow {
            customer_id: invoice.customer_id,
            customer_name: invoice
                .customer_id
                .and_then(|id| names.get(&id).copied())
                .unwrap_or(UNKNOWN_CUSTOMER_LABEL)
                .to_string(),
            buckets: AgingBuckets::default(),
            receivable_balance: Decimal::ZERO,
            invoice_count: 0,
        });
        let bucket = AgingBucket::classify(invoice.due_date, reference_date);
        row.buckets.add(bucket, invoice.balance_due);
        row.receivable_balance += invoice.computed_balance();
        row.invoice_count += 1;
    }

    let mut rows: Vec<AgingRow> = by_customer.into_values().collect();
    rows.sort_by(|a, b| compare_labels(&a.customer_name, &b.customer_name).then(a.customer_id.cmp(&b.customer_id)));

    ArAging { reference_date, rows }
}
