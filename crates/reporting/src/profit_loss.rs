//! Profit & Loss aggregation.
//!
//! Figures are accumulated per group key at full precision. The ungrouped,
//! grouped and monthly reports all run through [`accumulate`] so their
//! totals agree by construction.
//!
//! Inventory shrinkage is *not* part of [`PeriodFigures`]: it is a
//! point-in-time stock adjustment, computed separately (see
//! [`crate::shrinkage`]) and merged into [`ProfitAndLoss`].

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::{Add, AddAssign};

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tallyerp_core::{InvoiceId, ProductId, percentage};
use tallyerp_ledger::{DateWindow, Invoice, InvoiceLineItem, Product};

use crate::dimension::{Dimension, GroupKey, compare_labels};

/// Raw, additive figures for one group over one period.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PeriodFigures {
    /// Σ quantity × actual unit price (tax excluded).
    pub product_income: Decimal,
    pub shipping_income: Decimal,
    pub tax_income: Decimal,
    /// Σ header discounts, as a positive magnitude.
    pub discounts_given: Decimal,
    /// Σ quantity × cost price; missing or inactive products cost 0.
    pub cost_of_sales: Decimal,
    /// Σ paid amount of paid / partially paid invoices in the period.
    pub total_paid: Decimal,
    /// Σ positive balance due of invoices in the period.
    pub invoiced_outstanding: Decimal,
    /// Σ positive balance due of every non-cancelled invoice, any date.
    pub outstanding_as_of: Decimal,
    /// Σ overpayment owed back to customers for invoices in the period.
    pub credit_balance: Decimal,
    pub invoice_count: u64,
    pub line_item_count: u64,
}

impl PeriodFigures {
    pub fn total_income(&self) -> Decimal {
        self.product_income + self.shipping_income + self.tax_income
    }

    pub fn net_income(&self) -> Decimal {
        self.total_income() - self.discounts_given
    }

    pub fn is_empty(&self) -> bool {
        *self == PeriodFigures::default()
    }

    fn record_invoice(&mut self, invoice: &Invoice) {
        self.shipping_income += invoice.shipping_cost;
        self.tax_income += invoice.tax_amount;
        self.discounts_given += invoice.discount_amount;
        if invoice.status.is_collected() {
            self.total_paid += invoice.paid_amount;
        }
        if invoice.has_open_balance() {
            self.invoiced_outstanding += invoice.balance_due;
        }
        self.credit_balance += invoice.credit_balance();
        self.invoice_count += 1;
    }

    fn record_line(&mut self, line: &InvoiceLineItem, product: Option<&Product>) {
        self.product_income += line.net_amount();
        self.cost_of_sales += line.quantity * product.map_or(Decimal::ZERO, |p| p.cost_price);
        self.line_item_count += 1;
    }
}

impl AddAssign<&PeriodFigures> for PeriodFigures {
    fn add_assign(&mut self, rhs: &PeriodFigures) {
        self.product_income += rhs.product_income;
        self.shipping_income += rhs.shipping_income;
        self.tax_income += rhs.tax_income;
        self.discounts_given += rhs.discounts_given;
        self.cost_of_sales += rhs.cost_of_sales;
        self.total_paid += rhs.total_paid;
        self.invoiced_outstanding += rhs.invoiced_outstanding;
        self.outstanding_as_of += rhs.outstanding_as_of;
        self.credit_balance += rhs.credit_balance;
        self.invoice_count += rhs.invoice_count;
        self.line_item_count += rhs.line_item_count;
    }
}

impl Add for PeriodFigures {
    type Output = PeriodFigures;

    fn add(mut self, rhs: PeriodFigures) -> PeriodFigures {
        self += &rhs;
        self
    }
}

/// Income and expense slots with no data source yet.
///
/// Always zero today; kept so net earnings has a stable shape.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OtherActivity {
    pub other_income: Decimal,
    pub operating_expenses: Decimal,
    pub other_expenses: Decimal,
}

impl AddAssign<&OtherActivity> for OtherActivity {
    fn add_assign(&mut self, rhs: &OtherActivity) {
        self.other_income += rhs.other_income;
        self.operating_expenses += rhs.operating_expenses;
        self.other_expenses += rhs.other_expenses;
    }
}

/// Full P&L for one group (or the whole company) over one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitAndLoss {
    pub window: DateWindow,
    pub figures: PeriodFigures,
    /// Point-in-time stock adjustment; not filtered by the window.
    pub inventory_shrinkage: Decimal,
    pub other: OtherActivity,
}

impl ProfitAndLoss {
    pub fn new(window: DateWindow, figures: PeriodFigures) -> Self {
        Self {
            window,
            figures,
            inventory_shrinkage: Decimal::ZERO,
            other: OtherActivity::default(),
        }
    }

    pub fn with_shrinkage(mut self, shrinkage: Decimal) -> Self {
        self.inventory_shrinkage = shrinkage;
        self
    }

    pub fn total_income(&self) -> Decimal {
        self.figures.total_income()
    }

    pub fn net_income(&self) -> Decimal {
        self.figures.net_income()
    }

    pub fn total_cost_of_sales(&self) -> Decimal {
        self.figures.cost_of_sales + self.inventory_shrinkage
    }

    pub fn gross_profit(&self) -> Decimal {
        self.net_income() - self.total_cost_of_sales()
    }

    pub fn net_earnings(&self) -> Decimal {
        self.gross_profit() + self.other.other_income - self.other.operating_expenses - self.other.other_expenses
    }

    pub fn gross_profit_margin(&self) -> Decimal {
        percentage(self.gross_profit(), self.total_income())
    }

    pub fn net_profit_margin(&self) -> Decimal {
        percentage(self.net_earnings(), self.total_income())
    }

    pub fn collection_rate(&self) -> Decimal {
        percentage(self.figures.total_paid, self.total_income())
    }

    /// Sum of several results over the same window.
    pub fn combine<'a>(window: DateWindow, parts: impl IntoIterator<Item = &'a ProfitAndLoss>) -> Self {
        let mut total = ProfitAndLoss::new(window, PeriodFigures::default());
        for part in parts {
            total.figures += &part.figures;
            total.inventory_shrinkage += part.inventory_shrinkage;
            total.other += &part.other;
        }
        total
    }
}

/// One row of a grouped P&L.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRow {
    pub key: GroupKey,
    pub label: String,
    pub pnl: ProfitAndLoss,
}

/// P&L broken down by customer or employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedProfitAndLoss {
    pub window: DateWindow,
    pub group_by: Dimension,
    pub rows: Vec<GroupRow>,
}

impl GroupedProfitAndLoss {
    /// Company-wide total: the full-precision sum of every row.
    pub fn total(&self) -> ProfitAndLoss {
        ProfitAndLoss::combine(self.window, self.rows.iter().map(|r| &r.pnl))
    }
}

/// Calendar-month breakdown of one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyProfitAndLoss {
    pub year: i32,
    pub window: DateWindow,
    /// Months with at least one recognized invoice, January first.
    pub months: Vec<(u32, ProfitAndLoss)>,
    /// Reported once for the year, never spread across months.
    pub inventory_shrinkage: Decimal,
    /// Open balances today; a year-level figure only.
    pub outstanding_as_of: Decimal,
}

impl MonthlyProfitAndLoss {
    pub fn year_total(&self) -> ProfitAndLoss {
        let mut total = ProfitAndLoss::combine(self.window, self.months.iter().map(|(_, pnl)| pnl));
        total.inventory_shrinkage += self.inventory_shrinkage;
        total.figures.outstanding_as_of += self.outstanding_as_of;
        total
    }
}

/// Products by id, for joining lines to their cost.
pub(crate) type ProductIndex<'a> = HashMap<ProductId, &'a Product>;

pub(crate) fn index_products(products: &[Product]) -> ProductIndex<'_> {
    products.iter().map(|p| (p.id, p)).collect()
}

/// Accumulate period figures for `invoices` and their `lines`, keyed by
/// `key_of(invoice)`.
///
/// Lines whose invoice is not in `invoices` are ignored, so the line and
/// header sets always describe the same invoices.
pub(crate) fn accumulate<K, F>(
    invoices: &[Invoice],
    lines: &[InvoiceLineItem],
    products: &ProductIndex<'_>,
    key_of: F,
) -> BTreeMap<K, PeriodFigures>
where
    K: Ord + Clone,
    F: Fn(&Invoice) -> K,
{
    let mut out: BTreeMap<K, PeriodFigures> = BTreeMap::new();
    let mut keys: HashMap<InvoiceId, K> = HashMap::with_capacity(invoices.len());

    for invoice in invoices {
        let key = key_of(invoice);
        out.entry(key.clone()).or_default().record_invoice(invoice);
        keys.insert(invoice.id, key);
    }

    for line in lines {
        let Some(key) = keys.get(&line.invoice_id) else {
            continue;
        };
        let product = line
            .product_id
            .and_then(|id| products.get(&id).copied())
            .filter(|p| p.is_active);
        if let Some(figures) = out.get_mut(key) {
            figures.record_line(line, product);
        }
    }

    out
}

/// Add open balances (any invoice date) to the matching keys.
pub(crate) fn accumulate_outstanding<K, F>(out: &mut BTreeMap<K, PeriodFigures>, open_invoices: &[Invoice], key_of: F)
where
    K: Ord + Clone,
    F: Fn(&Invoice) -> K,
{
    for invoice in open_invoices.iter().filter(|i| i.has_open_balance()) {
        out.entry(key_of(invoice)).or_default().outstanding_as_of += invoice.balance_due;
    }
}

/// Company-wide figures (no grouping).
pub fn company_figures(
    invoices: &[Invoice],
    lines: &[InvoiceLineItem],
    products: &[Product],
    open_invoices: &[Invoice],
) -> PeriodFigures {
    let index = index_products(products);
    let mut out = accumulate(invoices, lines, &index, |_| ());
    accumulate_outstanding(&mut out, open_invoices, |_| ());
    out.remove(&()).unwrap_or_default()
}

/// A dimension value that gets its own row, zero or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMember {
    pub key: GroupKey,
    pub label: String,
}

/// Per-dimension figures.
///
/// Every member gets a row. Activity whose key is missing or not among
/// `members` lands on the `Unassigned` row, which only appears when it has
/// something on it. Shrinkage is carried by a trailing inventory
/// adjustments row.
#[allow(clippy::too_many_arguments)]
pub fn group_rows(
    window: DateWindow,
    group_by: Dimension,
    members: &[GroupMember],
    invoices: &[Invoice],
    lines: &[InvoiceLineItem],
    products: &[Product],
    open_invoices: &[Invoice],
    inventory_shrinkage: Decimal,
) -> Vec<GroupRow> {
    let known: BTreeSet<GroupKey> = members.iter().map(|m| m.key).collect();
    let key_of = |invoice: &Invoice| match group_by.header_key(invoice) {
        Some(key) if known.contains(&key) => key,
        _ => GroupKey::Unassigned,
    };

    let index = index_products(products);
    let mut figures = accumulate(invoices, lines, &index, key_of);
    accumulate_outstanding(&mut figures, open_invoices, key_of);

    let mut rows: Vec<GroupRow> = members
        .iter()
        .map(|member| GroupRow {
            key: member.key,
            label: member.label.clone(),
            pnl: ProfitAndLoss::new(window, figures.remove(&member.key).unwrap_or_default()),
        })
        .collect();
    rows.sort_by(|a, b| compare_labels(&a.label, &b.label).then(a.key.cmp(&b.key)));

    if let Some(unassigned) = figures.remove(&GroupKey::Unassigned).filter(|f| !f.is_empty()) {
        rows.push(GroupRow {
            key: GroupKey::Unassigned,
            label: GroupKey::UNASSIGNED_LABEL.to_string(),
            pnl: ProfitAndLoss::new(window, unassigned),
        });
    }

    rows.push(GroupRow {
        key: GroupKey::InventoryAdjustment,
        label: GroupKey::INVENTORY_ADJUSTMENT_LABEL.to_string(),
        pnl: ProfitAndLoss::new(window, PeriodFigures::default()).with_shrinkage(inventory_shrinkage),
    });

    rows
}

/// Per-month figures for invoices already restricted to one year.
pub fn month_rows(
    invoices: &[Invoice],
    lines: &[InvoiceLineItem],
    products: &[Product],
    window_of: impl Fn(u32) -> DateWindow,
) -> Vec<(u32, ProfitAndLoss)> {
    let index = index_products(products);
    accumulate(invoices, lines, &index, |invoice| invoice.invoice_date.month())
        .into_iter()
        .map(|(month, figures)| (month, ProfitAndLoss::new(window_of(month), figures)))
        .collect()
}
