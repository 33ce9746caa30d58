//! Response shaping.
//!
//! Every presented figure goes through [`Amount::round`] exactly once, on a
//! value that was summed at full precision. Nothing here sums rounded
//! amounts.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use tallyerp_core::{Amount, CurrencyCode, CustomerId, EmployeeId, InvoiceId, ProductId};
use tallyerp_ledger::{DateWindow, Invoice, Payment};

use crate::aging::{AgingBuckets, ArAging};
use crate::attribution::AttributionPolicy;
use crate::commission::{CommissionDetail, CommissionSummary};
use crate::dimension::{Dimension, GroupKey};
use crate::profit_loss::{GroupedProfitAndLoss, MonthlyProfitAndLoss, ProfitAndLoss};
use crate::sales::{SalesRow, SalesSummary};

/// A computed result plus the invariant warnings found while fetching it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Computed<T> {
    pub value: T,
    pub warnings: Vec<ReportWarning>,
}

impl<T> Computed<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<ReportWarning>) -> Self {
        self.warnings.extend(warnings);
        self
    }
}

/// Data anomaly surfaced beside a report instead of being corrected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportWarning {
    /// Stored total differs from `subtotal − discount + tax + shipping`.
    InvoiceTotalMismatch {
        invoice_id: InvoiceId,
        invoice_number: String,
        total_amount: Amount,
        expected_total: Amount,
    },
    PaymentsExceedTotal {
        invoice_id: InvoiceId,
        invoice_number: String,
        total_amount: Amount,
        payments: Amount,
    },
    OverpaidInvoice {
        invoice_id: InvoiceId,
        invoice_number: String,
        credit: Amount,
    },
    BucketTotalMismatch {
        customer_id: Option<CustomerId>,
        customer_name: String,
        bucket_total: Amount,
        receivable_balance: Amount,
    },
    /// A line's commission differs from `quantity × unit_commission`.
    CommissionLineMismatch {
        employee_id: EmployeeId,
        invoice_id: InvoiceId,
        product_id: ProductId,
        line_commission: Amount,
        expected: Amount,
    },
    CommissionTotalMismatch {
        employee_id: EmployeeId,
        expected_total: Amount,
        detail_total: Amount,
    },
}

/// Header and payment anomalies among `invoices`.
///
/// The stored total is checked against its components, payments are
/// compared with the total, and a negative balance is reported as an
/// overpayment credit.
pub fn payment_warnings(invoices: &[Invoice], payments: &[Payment]) -> Vec<ReportWarning> {
    let mut paid: HashMap<InvoiceId, Decimal> = HashMap::new();
    for payment in payments {
        *paid.entry(payment.invoice_id).or_default() += payment.amount;
    }

    let mut warnings = Vec::new();
    for invoice in invoices {
        let expected_total = invoice.expected_total();
        if expected_total != invoice.total_amount {
            warnings.push(ReportWarning::InvoiceTotalMismatch {
                invoice_id: invoice.id,
                invoice_number: invoice.invoice_number.clone(),
                total_amount: Amount::round(invoice.total_amount),
                expected_total: Amount::round(expected_total),
            });
        }
        let received = paid.get(&invoice.id).copied().unwrap_or_default();
        if received > invoice.total_amount {
            warnings.push(ReportWarning::PaymentsExceedTotal {
                invoice_id: invoice.id,
                invoice_number: invoice.invoice_number.clone(),
                total_amount: Amount::round(invoice.total_amount),
                payments: Amount::round(received),
            });
        }
        let credit = invoice.credit_balance();
        if !credit.is_zero() {
            warnings.push(ReportWarning::OverpaidInvoice {
                invoice_id: invoice.id,
                invoice_number: invoice.invoice_number.clone(),
                credit: Amount::round(credit),
            });
        }
    }
    warnings
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportPeriod {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl From<DateWindow> for ReportPeriod {
    fn from(window: DateWindow) -> Self {
        Self {
            start_date: window.start,
            end_date: window.end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomeSection {
    pub product_income: Amount,
    pub shipping_income: Amount,
    pub tax_income: Amount,
    pub total_income: Amount,
    /// Negative adjustment.
    pub discounts_given: Amount,
    pub net_income: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostOfSalesSection {
    pub cost_of_sales: Amount,
    pub inventory_shrinkage: Amount,
    pub total_cost_of_sales: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpensesSection {
    pub other_income: Amount,
    pub operating_expenses: Amount,
    pub other_expenses: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfitabilitySection {
    pub gross_profit: Amount,
    pub gross_profit_margin: Amount,
    pub net_earnings: Amount,
    pub net_profit_margin: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CashFlowSection {
    pub total_invoiced: Amount,
    pub total_paid: Amount,
    /// Open balance of invoices dated in the period.
    pub outstanding_balance: Amount,
    pub invoiced_and_still_outstanding: Amount,
    /// Open balance of every non-cancelled invoice, whatever its date.
    pub outstanding_as_of: Amount,
    pub credit_balance: Amount,
    pub collection_rate: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummarySection {
    pub total_income: Amount,
    pub total_cost_of_sales: Amount,
    pub gross_profit: Amount,
    pub net_earnings: Amount,
    pub invoice_count: u64,
    pub line_item_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfitAndLossSections {
    pub income: IncomeSection,
    pub cost_of_sales: CostOfSalesSection,
    pub expenses: ExpensesSection,
    pub profitability: ProfitabilitySection,
    pub cash_flow: CashFlowSection,
    pub summary: SummarySection,
}

impl From<&ProfitAndLoss> for ProfitAndLossSections {
    fn from(pnl: &ProfitAndLoss) -> Self {
        let f = &pnl.figures;
        Self {
            income: IncomeSection {
                product_income: Amount::round(f.product_income),
                shipping_income: Amount::round(f.shipping_income),
                tax_income: Amount::round(f.tax_income),
                total_income: Amount::round(pnl.total_income()),
                discounts_given: Amount::round(-f.discounts_given),
                net_income: Amount::round(pnl.net_income()),
            },
            cost_of_sales: CostOfSalesSection {
                cost_of_sales: Amount::round(f.cost_of_sales),
                inventory_shrinkage: Amount::round(pnl.inventory_shrinkage),
                total_cost_of_sales: Amount::round(pnl.total_cost_of_sales()),
            },
            expenses: ExpensesSection {
                other_income: Amount::round(pnl.other.other_income),
                operating_expenses: Amount::round(pnl.other.operating_expenses),
                other_expenses: Amount::round(pnl.other.other_expenses),
            },
            profitability: ProfitabilitySection {
                gross_profit: Amount::round(pnl.gross_profit()),
                gross_profit_margin: Amount::round(pnl.gross_profit_margin()),
                net_earnings: Amount::round(pnl.net_earnings()),
                net_profit_margin: Amount::round(pnl.net_profit_margin()),
            },
            cash_flow: CashFlowSection {
                total_invoiced: Amount::round(pnl.total_income()),
                total_paid: Amount::round(f.total_paid),
                outstanding_balance: Amount::round(f.invoiced_outstanding),
                invoiced_and_still_outstanding: Amount::round(f.invoiced_outstanding),
                outstanding_as_of: Amount::round(f.outstanding_as_of),
                credit_balance: Amount::round(f.credit_balance),
                collection_rate: Amount::round(pnl.collection_rate()),
            },
            summary: SummarySection {
                total_income: Amount::round(pnl.total_income()),
                total_cost_of_sales: Amount::round(pnl.total_cost_of_sales()),
                gross_profit: Amount::round(pnl.gross_profit()),
                net_earnings: Amount::round(pnl.net_earnings()),
                invoice_count: f.invoice_count,
                line_item_count: f.line_item_count,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfitAndLossReport {
    pub period: ReportPeriod,
    pub currency: CurrencyCode,
    #[serde(flatten)]
    pub sections: ProfitAndLossSections,
    pub warnings: Vec<ReportWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReportRow {
    pub key: GroupKey,
    pub label: String,
    #[serde(flatten)]
    pub sections: ProfitAndLossSections,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupedProfitAndLossReport {
    pub period: ReportPeriod,
    pub currency: CurrencyCode,
    pub group_by: Dimension,
    pub rows: Vec<GroupReportRow>,
    pub total: ProfitAndLossSections,
    pub warnings: Vec<ReportWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthReportRow {
    pub month: u32,
    pub period: ReportPeriod,
    #[serde(flatten)]
    pub sections: ProfitAndLossSections,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyProfitAndLossReport {
    pub year: i32,
    pub currency: CurrencyCode,
    pub months: Vec<MonthReportRow>,
    pub inventory_shrinkage: Amount,
    pub year_total: ProfitAndLossSections,
    pub warnings: Vec<ReportWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Over60Breakdown {
    pub overdue: Amount,
    pub no_due_date: Amount,
    pub due_beyond_60_days: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingReportRow {
    pub customer_id: Option<CustomerId>,
    pub customer_name: String,
    pub due_today: Amount,
    pub due_15_days: Amount,
    pub due_30_days: Amount,
    pub due_60_days: Amount,
    pub over_60_days: Amount,
    pub total: Amount,
    pub over_60_breakdown: Over60Breakdown,
}

impl AgingReportRow {
    fn new(customer_id: Option<CustomerId>, customer_name: String, buckets: &AgingBuckets) -> Self {
        Self {
            customer_id,
            customer_name,
            due_today: Amount::round(buckets.due_today),
            due_15_days: Amount::round(buckets.due_15_days),
            due_30_days: Amount::round(buckets.due_30_days),
            due_60_days: Amount::round(buckets.due_60_days),
            over_60_days: Amount::round(buckets.over_60_days()),
            total: Amount::round(buckets.total()),
            over_60_breakdown: Over60Breakdown {
                overdue: Amount::round(buckets.overdue),
                no_due_date: Amount::round(buckets.no_due_date),
                due_beyond_60_days: Amount::round(buckets.due_beyond_60_days),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArAgingReport {
    pub as_of: NaiveDate,
    pub currency: CurrencyCode,
    pub rows: Vec<AgingReportRow>,
    pub totals: AgingReportRow,
    pub warnings: Vec<ReportWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionReportRow {
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub quantity_sold: Decimal,
    pub invoice_count: u64,
    pub total_commission: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionReport {
    pub period: ReportPeriod,
    pub currency: CurrencyCode,
    pub attribution: AttributionPolicy,
    pub rows: Vec<CommissionReportRow>,
    pub total_commission: Amount,
    pub warnings: Vec<ReportWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSummary {
    pub id: EmployeeId,
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionLineReport {
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub customer_name: Option<String>,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit_commission: Amount,
    pub line_commission: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionDetailReport {
    pub period: ReportPeriod,
    pub currency: CurrencyCode,
    pub attribution: AttributionPolicy,
    pub employee: EmployeeSummary,
    pub total_commission: Amount,
    pub invoice_lines: Vec<CommissionLineReport>,
    pub warnings: Vec<ReportWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesReportRow {
    pub key: GroupKey,
    pub label: String,
    pub invoice_count: u64,
    pub quantity: Decimal,
    pub revenue: Amount,
    pub cost: Amount,
    pub gross_profit: Amount,
    pub margin: Amount,
}

impl From<&SalesRow> for SalesReportRow {
    fn from(row: &SalesRow) -> Self {
        Self {
            key: row.key,
            label: row.label.clone(),
            invoice_count: row.invoice_count,
            quantity: row.quantity.normalize(),
            revenue: Amount::round(row.revenue),
            cost: Amount::round(row.cost),
            gross_profit: Amount::round(row.gross_profit()),
            margin: Amount::round(row.margin()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesSummaryReport {
    pub period: ReportPeriod,
    pub currency: CurrencyCode,
    pub group_by: Dimension,
    pub rows: Vec<SalesReportRow>,
    pub total: SalesReportRow,
    pub warnings: Vec<ReportWarning>,
}

/// Builds response contracts in one currency.
#[derive(Debug, Clone, Default)]
pub struct ReportAssembler {
    currency: CurrencyCode,
}

impl ReportAssembler {
    pub fn new(currency: CurrencyCode) -> Self {
        Self { currency }
    }

    pub fn profit_and_loss(&self, computed: &Computed<ProfitAndLoss>) -> ProfitAndLossReport {
        ProfitAndLossReport {
            period: computed.value.window.into(),
            currency: self.currency.clone(),
            sections: (&computed.value).into(),
            warnings: computed.warnings.clone(),
        }
    }

    pub fn grouped_profit_and_loss(&self, computed: &Computed<GroupedProfitAndLoss>) -> GroupedProfitAndLossReport {
        let grouped = &computed.value;
        GroupedProfitAndLossReport {
            period: grouped.window.into(),
            currency: self.currency.clone(),
            group_by: grouped.group_by,
            rows: grouped
                .rows
                .iter()
                .map(|row| GroupReportRow {
                    key: row.key,
                    label: row.label.clone(),
                    sections: (&row.pnl).into(),
                })
                .collect(),
            total: (&grouped.total()).into(),
            warnings: computed.warnings.clone(),
        }
    }

    pub fn monthly_profit_and_loss(&self, computed: &Computed<MonthlyProfitAndLoss>) -> MonthlyProfitAndLossReport {
        let monthly = &computed.value;
        MonthlyProfitAndLossReport {
            year: monthly.year,
            currency: self.currency.clone(),
            months: monthly
                .months
                .iter()
                .map(|(month, pnl)| MonthReportRow {
                    month: *month,
                    period: pnl.window.into(),
                    sections: pnl.into(),
                })
                .collect(),
            inventory_shrinkage: Amount::round(monthly.inventory_shrinkage),
            year_total: (&monthly.year_total()).into(),
            warnings: computed.warnings.clone(),
        }
    }

    pub fn ar_aging(&self, computed: &Computed<ArAging>) -> ArAgingReport {
        let aging = &computed.value;
        let mut warnings = computed.warnings.clone();
        for row in &aging.rows {
            let bucket_total = row.buckets.total();
            if bucket_total != row.receivable_balance {
                warnings.push(ReportWarning::BucketTotalMismatch {
                    customer_id: row.customer_id,
                    customer_name: row.customer_name.clone(),
                    bucket_total: Amount::round(bucket_total),
                    receivable_balance: Amount::round(row.receivable_balance),
                });
            }
        }

        ArAgingReport {
            as_of: aging.reference_date,
            currency: self.currency.clone(),
            rows: aging
                .rows
                .iter()
                .map(|row| AgingReportRow::new(row.customer_id, row.customer_name.clone(), &row.buckets))
                .collect(),
            totals: AgingReportRow::new(None, "Total".to_string(), &aging.totals()),
            warnings,
        }
    }

    pub fn commission_summary(&self, computed: &Computed<CommissionSummary>) -> CommissionReport {
        let summary = &computed.value;
        CommissionReport {
            period: summary.window.into(),
            currency: self.currency.clone(),
            attribution: summary.policy,
            rows: summary
                .rows
                .iter()
                .map(|row| CommissionReportRow {
                    employee_id: row.employee_id,
                    employee_name: row.employee_name.clone(),
                    quantity_sold: row.quantity_sold.normalize(),
                    invoice_count: row.invoice_count,
                    total_commission: Amount::round(row.total_commission),
                })
                .collect(),
            total_commission: Amount::round(summary.total_commission()),
            warnings: computed.warnings.clone(),
        }
    }

    pub fn commission_detail(&self, computed: &Computed<CommissionDetail>) -> CommissionDetailReport {
        let detail = &computed.value;
        let detail_total = detail.total_commission();
        let mut warnings = computed.warnings.clone();

        let mut expected_total = Decimal::ZERO;
        for line in &detail.lines {
            let expected = line.quantity * line.unit_commission;
            expected_total += expected;
            if expected != line.line_commission {
                warnings.push(ReportWarning::CommissionLineMismatch {
                    employee_id: detail.employee.id,
                    invoice_id: line.invoice_id,
                    product_id: line.product_id,
                    line_commission: Amount::round(line.line_commission),
                    expected: Amount::round(expected),
                });
            }
        }
        if expected_total != detail_total {
            warnings.push(ReportWarning::CommissionTotalMismatch {
                employee_id: detail.employee.id,
                expected_total: Amount::round(expected_total),
                detail_total: Amount::round(detail_total),
            });
        }

        CommissionDetailReport {
            period: detail.window.into(),
            currency: self.currency.clone(),
            attribution: detail.policy,
            employee: EmployeeSummary {
                id: detail.employee.id,
                name: detail.employee.name.clone(),
                email: detail.employee.email.clone(),
            },
            total_commission: Amount::round(detail_total),
            invoice_lines: detail
                .lines
                .iter()
                .map(|line| CommissionLineReport {
                    invoice_id: line.invoice_id,
                    invoice_number: line.invoice_number.clone(),
                    invoice_date: line.invoice_date,
                    customer_name: line.customer_name.clone(),
                    product_name: line.product_name.clone(),
                    quantity: line.quantity.normalize(),
                    unit_commission: Amount::round(line.unit_commission),
                    line_commission: Amount::round(line.line_commission),
                })
                .collect(),
            warnings,
        }
    }

    pub fn sales_summary(&self, computed: &Computed<SalesSummary>) -> SalesSummaryReport {
        let summary = &computed.value;
        SalesSummaryReport {
            period: summary.window.into(),
            currency: self.currency.clone(),
            group_by: summary.group_by,
            rows: summary.rows.iter().map(SalesReportRow::from).collect(),
            total: (&summary.total).into(),
            warnings: computed.warnings.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profit_loss::PeriodFigures;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use crate::aging::compute_ar_aging;
    use crate::commission::CommissionLine;
    use tallyerp_core::{CompanyId, PaymentId};
    use tallyerp_ledger::{Employee, InvoiceStatus};

    fn invoice(total: Decimal, paid: Decimal) -> Invoice {
        Invoice {
            id: InvoiceId::new(),
            company_id: CompanyId::new(),
            invoice_number: "INV-7".to_string(),
            customer_id: None,
            employee_id: None,
            invoice_date: NaiveDate::from_ymd_opt(2026, 1, 9).unwrap(),
            due_date: None,
            subtotal: total,
            discount_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            shipping_cost: Decimal::ZERO,
            total_amount: total,
            paid_amount: paid,
            balance_due: total - paid,
            status: InvoiceStatus::Paid,
        }
    }

    #[test]
    fn overpayment_is_reported_not_clamped() {
        let inv = invoice(dec!(100), dec!(120));
        let payments = vec![
            Payment {
                id: PaymentId::new(),
                invoice_id: inv.id,
                payment_date: inv.invoice_date,
                amount: dec!(70),
            },
            Payment {
                id: PaymentId::new(),
                invoice_id: inv.id,
                payment_date: inv.invoice_date,
                amount: dec!(50),
            },
        ];

        let warnings = payment_warnings(std::slice::from_ref(&inv), &payments);
        assert_eq!(warnings.len(), 2);
        assert!(matches!(warnings[0], ReportWarning::PaymentsExceedTotal { .. }));
        assert!(matches!(
            &warnings[1],
            ReportWarning::OverpaidInvoice { credit, .. } if credit.to_string() == "20.00"
        ));
    }

    #[test]
    fn total_that_disagrees_with_its_components_is_flagged() {
        let mut inv = invoice(dec!(100), dec!(0));
        inv.tax_amount = dec!(8);

        let warnings = payment_warnings(std::slice::from_ref(&inv), &[]);
        assert!(matches!(
            &warnings[..],
            [ReportWarning::InvoiceTotalMismatch { expected_total, .. }] if expected_total.to_string() == "108.00"
        ));
        assert!(payment_warnings(&[invoice(dec!(100), dec!(0))], &[]).is_empty());
    }

    #[test]
    fn stale_balance_due_raises_bucket_mismatch() {
        let reference = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let mut stale = invoice(dec!(100), dec!(0));
        stale.status = InvoiceStatus::Sent;
        stale.balance_due = dec!(60);
        let consistent = Invoice {
            id: InvoiceId::new(),
            customer_id: Some(CustomerId::new()),
            ..invoice(dec!(50), dec!(20))
        };
        let consistent = Invoice {
            status: InvoiceStatus::PartiallyPaid,
            ..consistent
        };

        let aging = compute_ar_aging(reference, &[stale, consistent], &[]);
        let report = ReportAssembler::default().ar_aging(&Computed::new(aging));
        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(
            &report.warnings[0],
            ReportWarning::BucketTotalMismatch { bucket_total, receivable_balance, .. }
                if bucket_total.to_string() == "60.00" && receivable_balance.to_string() == "100.00"
        ));
    }

    #[test]
    fn commission_line_that_is_not_quantity_times_rate_is_flagged() {
        let employee = Employee {
            id: EmployeeId::new(),
            company_id: CompanyId::new(),
            name: "Ana".to_string(),
            email: None,
            is_active: true,
        };
        let line = CommissionLine {
            employee_id: employee.id,
            invoice_id: InvoiceId::new(),
            invoice_number: "INV-3".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            customer_id: None,
            customer_name: None,
            product_id: ProductId::new(),
            product_name: "Widget".to_string(),
            quantity: dec!(1),
            unit_commission: dec!(10),
            line_commission: dec!(999),
        };
        let detail = CommissionDetail {
            employee,
            window: DateWindow::unbounded(),
            policy: AttributionPolicy::default(),
            lines: vec![line.clone()],
        };

        let report = ReportAssembler::default().commission_detail(&Computed::new(detail.clone()));
        assert_eq!(report.warnings.len(), 2);
        assert!(matches!(
            &report.warnings[0],
            ReportWarning::CommissionLineMismatch { expected, .. } if expected.to_string() == "10.00"
        ));
        assert!(matches!(
            &report.warnings[1],
            ReportWarning::CommissionTotalMismatch { detail_total, .. } if detail_total.to_string() == "999.00"
        ));

        let fixed = CommissionDetail {
            lines: vec![CommissionLine {
                line_commission: dec!(10),
                ..line
            }],
            ..detail
        };
        assert!(ReportAssembler::default().commission_detail(&Computed::new(fixed)).warnings.is_empty());
    }

    #[test]
    fn sections_serialize_as_fixed_point_strings() {
        let figures = PeriodFigures {
            product_income: dec!(900),
            tax_income: dec!(50),
            discounts_given: dec!(100),
            cost_of_sales: dec!(400),
            ..PeriodFigures::default()
        };
        let pnl = ProfitAndLoss::new(DateWindow::unbounded(), figures);
        let report = ReportAssembler::default().profit_and_loss(&Computed::new(pnl));
        let body = serde_json::to_value(&report).unwrap();

        assert_eq!(body["currency"], json!("USD"));
        assert_eq!(body["income"]["total_income"], json!("950.00"));
        assert_eq!(body["income"]["discounts_given"], json!("-100.00"));
        assert_eq!(body["income"]["net_income"], json!("850.00"));
        assert_eq!(body["profitability"]["gross_profit"], json!("450.00"));
        assert_eq!(body["cash_flow"]["collection_rate"], json!("0.00"));
        assert_eq!(body["period"]["start_date"], json!(null));
    }

    #[test]
    fn rounds_once_after_summing() {
        // Each part rounds to 0.00 on its own.
        let mut buckets = AgingBuckets::default();
        for _ in 0..3 {
            buckets.due_today += dec!(0.0034);
        }
        let row = AgingReportRow::new(None, "Acme".to_string(), &buckets);
        assert_eq!(row.due_today.to_string(), "0.01");
        assert_eq!(row.total.to_string(), "0.01");
    }
}
