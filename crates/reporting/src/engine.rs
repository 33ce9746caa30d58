//! Report orchestration.
//!
//! The engine resolves the reporting window, issues the ledger reads a
//! report needs concurrently, and hands the joined rows to the pure
//! computation modules. A failed read fails the whole report.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tracing::{debug, instrument, warn};

use tallyerp_core::{CompanyId, EmployeeId};
use tallyerp_ledger::{CompanyScope, InvoiceQuery, LedgerDataProvider};

use crate::aging::{ArAging, compute_ar_aging};
use crate::assembler::{Computed, ReportWarning, payment_warnings};
use crate::attribution::AttributionPolicy;
use crate::commission::{CommissionDetail, CommissionSummary, attributed_lines, detail_for, summarize};
use crate::dimension::{Dimension, GroupKey};
use crate::error::{ReportError, ReportResult};
use crate::profit_loss::{
    GroupMember, GroupedProfitAndLoss, MonthlyProfitAndLoss, ProfitAndLoss, company_figures, group_rows, month_rows,
};
use crate::sales::{SalesDirectory, SalesSummary, summarize_sales};
use crate::shrinkage::inventory_shrinkage;
use crate::window::{Clock, SystemClock, month_window, resolve_window, year_window};

/// Computes reports from a ledger.
///
/// Holds no per-request state; clone freely.
#[derive(Clone)]
pub struct ReportingEngine {
    ledger: Arc<dyn LedgerDataProvider>,
    clock: Arc<dyn Clock>,
    attribution: AttributionPolicy,
}

impl core::fmt::Debug for ReportingEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReportingEngine")
            .field("clock", &self.clock)
            .field("attribution", &self.attribution)
            .finish_non_exhaustive()
    }
}

impl ReportingEngine {
    pub fn new(ledger: Arc<dyn LedgerDataProvider>) -> Self {
        Self {
            ledger,
            clock: Arc::new(SystemClock),
            attribution: AttributionPolicy::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_attribution(mut self, attribution: AttributionPolicy) -> Self {
        self.attribution = attribution;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Whether the ledger answers at all.
    pub async fn health_check(&self) -> ReportResult<()> {
        Ok(self.ledger.health_check().await?)
    }

    /// Company-wide P&L.
    #[instrument(skip(self))]
    pub async fn profit_and_loss(
        &self,
        company_id: CompanyId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> ReportResult<Computed<ProfitAndLoss>> {
        let window = resolve_window(start, end, self.today())?;
        let revenue = InvoiceQuery::revenue(company_id, window);
        let open = InvoiceQuery::outstanding_as_of(company_id);

        let (invoices, lines, payments, products, open_invoices) = tokio::try_join!(
            self.ledger.invoices(&revenue),
            self.ledger.invoice_lines(&revenue),
            self.ledger.payments(&revenue),
            self.ledger.products(CompanyScope::Company(company_id)),
            self.ledger.invoices(&open),
        )?;
        debug!(
            invoices = invoices.len(),
            lines = lines.len(),
            products = products.len(),
            "profit and loss inputs loaded"
        );

        let figures = company_figures(&invoices, &lines, &products, &open_invoices);
        let shrinkage = inventory_shrinkage(&products);
        let pnl = ProfitAndLoss::new(window, figures).with_shrinkage(shrinkage.total);

        let warnings = payment_warnings(&invoices, &payments);
        log_warnings("profit_and_loss", &warnings);
        Ok(Computed::new(pnl).with_warnings(warnings))
    }

    /// P&L with one row per active customer or employee.
    #[instrument(skip(self))]
    pub async fn grouped_profit_and_loss(
        &self,
        company_id: CompanyId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        group_by: Dimension,
    ) -> ReportResult<Computed<GroupedProfitAndLoss>> {
        if group_by == Dimension::Product {
            return Err(ReportError::validation(
                "profit and loss can be grouped by customer or employee; use the sales summary for products",
            ));
        }
        let window = resolve_window(start, end, self.today())?;
        let revenue = InvoiceQuery::revenue(company_id, window);
        let open = InvoiceQuery::outstanding_as_of(company_id);

        let (invoices, lines, payments, products, open_invoices, customers, employees) = tokio::try_join!(
            self.ledger.invoices(&revenue),
            self.ledger.invoice_lines(&revenue),
            self.ledger.payments(&revenue),
            self.ledger.products(CompanyScope::Company(company_id)),
            self.ledger.invoices(&open),
            self.ledger.customers(company_id),
            self.ledger.employees(CompanyScope::Company(company_id)),
        )?;

        let members: Vec<GroupMember> = match group_by {
            Dimension::Customer => customers
                .iter()
                .filter(|c| c.is_active)
                .map(|c| GroupMember {
                    key: GroupKey::Customer(c.id),
                    label: c.name.clone(),
                })
                .collect(),
            _ => employees
                .iter()
                .filter(|e| e.is_active)
                .map(|e| GroupMember {
                    key: GroupKey::Employee(e.id),
                    label: e.name.clone(),
                })
                .collect(),
        };
        debug!(members = members.len(), invoices = invoices.len(), "grouped inputs loaded");

        let shrinkage = inventory_shrinkage(&products);
        let rows = group_rows(
            window,
            group_by,
            &members,
            &invoices,
            &lines,
            &products,
            &open_invoices,
            shrinkage.total,
        );

        let warnings = payment_warnings(&invoices, &payments);
        log_warnings("grouped_profit_and_loss", &warnings);
        Ok(Computed::new(GroupedProfitAndLoss { window, group_by, rows }).with_warnings(warnings))
    }

    /// Month-by-month P&L for one calendar year (current year by default).
    #[instrument(skip(self))]
    pub async fn monthly_profit_and_loss(
        &self,
        company_id: CompanyId,
        year: Option<i32>,
    ) -> ReportResult<Computed<MonthlyProfitAndLoss>> {
        let year = year.unwrap_or_else(|| self.today().year());
        let window = year_window(year)?;
        let revenue = InvoiceQuery::revenue(company_id, window);
        let open = InvoiceQuery::outstanding_as_of(company_id);

        let (invoices, lines, payments, products, open_invoices) = tokio::try_join!(
            self.ledger.invoices(&revenue),
            self.ledger.invoice_lines(&revenue),
            self.ledger.payments(&revenue),
            self.ledger.products(CompanyScope::Company(company_id)),
            self.ledger.invoices(&open),
        )?;

        let months = month_rows(&invoices, &lines, &products, |month| {
            month_window(year, month).unwrap_or(window)
        });
        let outstanding_as_of = open_invoices
            .iter()
            .filter(|i| i.has_open_balance())
            .map(|i| i.balance_due)
            .sum();

        let monthly = MonthlyProfitAndLoss {
            year,
            window,
            months,
            inventory_shrinkage: inventory_shrinkage(&products).total,
            outstanding_as_of,
        };

        let warnings = payment_warnings(&invoices, &payments);
        log_warnings("monthly_profit_and_loss", &warnings);
        Ok(Computed::new(monthly).with_warnings(warnings))
    }

    /// Receivables aged against `as_of` (today by default).
    #[instrument(skip(self))]
    pub async fn ar_aging(&self, company_id: CompanyId, as_of: Option<NaiveDate>) -> ReportResult<Computed<ArAging>> {
        let reference = as_of.unwrap_or_else(|| self.today());
        let receivable = InvoiceQuery::open_receivables(company_id);

        let (invoices, customers) = tokio::try_join!(
            self.ledger.invoices(&receivable),
            self.ledger.customers(company_id),
        )?;
        debug!(invoices = invoices.len(), "open receivables loaded");

        Ok(Computed::new(compute_ar_aging(reference, &invoices, &customers)))
    }

    /// Commission per active employee; `None` spans every company.
    #[instrument(skip(self))]
    pub async fn commission_summary(
        &self,
        company_id: Option<CompanyId>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> ReportResult<Computed<CommissionSummary>> {
        let window = resolve_window(start, end, self.today())?;
        let scope = CompanyScope::from(company_id);
        let revenue = InvoiceQuery::revenue(scope, window);

        let (invoices, lines, products, employees) = tokio::try_join!(
            self.ledger.invoices(&revenue),
            self.ledger.invoice_lines(&revenue),
            self.ledger.products(scope),
            self.ledger.employees(scope),
        )?;

        let attributed = attributed_lines(self.attribution, &invoices, &lines, &products, &[]);
        Ok(Computed::new(summarize(window, self.attribution, &employees, &attributed)))
    }

    /// Every commission line earned by one employee.
    #[instrument(skip(self))]
    pub async fn commission_detail(
        &self,
        employee_id: EmployeeId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> ReportResult<Computed<CommissionDetail>> {
        let window = resolve_window(start, end, self.today())?;
        let employee = self
            .ledger
            .employee(employee_id)
            .await?
            .ok_or_else(|| ReportError::NotFound(format!("employee {employee_id}")))?;

        let company_id = employee.company_id;
        let revenue = InvoiceQuery::revenue(company_id, window);
        let (invoices, lines, products, customers) = tokio::try_join!(
            self.ledger.invoices(&revenue),
            self.ledger.invoice_lines(&revenue),
            self.ledger.products(CompanyScope::Company(company_id)),
            self.ledger.customers(company_id),
        )?;

        let attributed = attributed_lines(self.attribution, &invoices, &lines, &products, &customers);
        Ok(Computed::new(detail_for(employee, window, self.attribution, attributed)))
    }

    /// Sales rolled up by product, customer or employee.
    #[instrument(skip(self))]
    pub async fn sales_summary(
        &self,
        company_id: CompanyId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        group_by: Dimension,
    ) -> ReportResult<Computed<SalesSummary>> {
        let window = resolve_window(start, end, self.today())?;
        let revenue = InvoiceQuery::revenue(company_id, window);

        let (invoices, lines, products, customers, employees) = tokio::try_join!(
            self.ledger.invoices(&revenue),
            self.ledger.invoice_lines(&revenue),
            self.ledger.products(CompanyScope::Company(company_id)),
            self.ledger.customers(company_id),
            self.ledger.employees(CompanyScope::Company(company_id)),
        )?;

        let directory = SalesDirectory {
            products: &products,
            customers: &customers,
            employees: &employees,
        };
        Ok(Computed::new(summarize_sales(window, group_by, &invoices, &lines, &directory)))
    }
}

fn log_warnings(report: &'static str, warnings: &[ReportWarning]) {
    for warning in warnings {
        warn!(report, ?warning, "report data anomaly");
    }
}
