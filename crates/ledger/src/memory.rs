//! In-memory ledger for tests/dev.

use std::collections::BTreeMap;
use std::sync::RwLock;

use tallyerp_core::{CompanyId, EmployeeId, Entity};

use crate::invoice::{Invoice, InvoiceLineItem, Payment};
use crate::party::{Customer, Employee};
use crate::product::Product;
use crate::provider::{LedgerDataProvider, LedgerError, LedgerResult};
use crate::query::{CompanyScope, InvoiceQuery};

/// Id-keyed table of entity snapshots.
#[derive(Debug)]
struct Table<E: Entity> {
    rows: RwLock<BTreeMap<E::Id, E>>,
}

impl<E> Table<E>
where
    E: Entity + Clone,
    E::Id: Ord,
{
    fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    fn upsert(&self, row: E) {
        if let Ok(mut rows) = self.rows.write() {
            rows.insert(row.id(), row);
        }
    }

    fn get(&self, id: E::Id) -> LedgerResult<Option<E>> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.get(&id).cloned())
    }

    fn select(&self, mut keep: impl FnMut(&E) -> bool) -> LedgerResult<Vec<E>> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.values().filter(|r| keep(r)).cloned().collect())
    }
}

fn poisoned() -> LedgerError {
    LedgerError::Unavailable("in-memory ledger lock poisoned".to_string())
}

/// In-memory ledger holding every company's rows.
///
/// - No IO
/// - Deterministic iteration order (rows are kept sorted by id)
/// - Can be switched to "unavailable" to exercise failure paths
#[derive(Debug)]
pub struct InMemoryLedger {
    invoices: Table<Invoice>,
    lines: Table<InvoiceLineItem>,
    payments: Table<Payment>,
    products: Table<Product>,
    customers: Table<Customer>,
    employees: Table<Employee>,
    outage: RwLock<Option<String>>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            invoices: Table::new(),
            lines: Table::new(),
            payments: Table::new(),
            products: Table::new(),
            customers: Table::new(),
            employees: Table::new(),
            outage: RwLock::new(None),
        }
    }

    pub fn upsert_invoice(&self, invoice: Invoice) {
        self.invoices.upsert(invoice);
    }

    pub fn upsert_line(&self, line: InvoiceLineItem) {
        self.lines.upsert(line);
    }

    pub fn upsert_payment(&self, payment: Payment) {
        self.payments.upsert(payment);
    }

    pub fn upsert_product(&self, product: Product) {
        self.products.upsert(product);
    }

    pub fn upsert_customer(&self, customer: Customer) {
        self.customers.upsert(customer);
    }

    pub fn upsert_employee(&self, employee: Employee) {
        self.employees.upsert(employee);
    }

    /// Make every subsequent read fail with [`LedgerError::Unavailable`].
    pub fn simulate_outage(&self, reason: impl Into<String>) {
        if let Ok(mut outage) = self.outage.write() {
            *outage = Some(reason.into());
        }
    }

    pub fn restore(&self) {
        if let Ok(mut outage) = self.outage.write() {
            *outage = None;
        }
    }

    fn check_available(&self) -> LedgerResult<()> {
        let outage = self.outage.read().map_err(|_| poisoned())?;
        match outage.as_ref() {
            Some(reason) => Err(LedgerError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }

    fn matching_invoice_ids(&self, query: &InvoiceQuery) -> LedgerResult<Vec<tallyerp_core::InvoiceId>> {
        Ok(self
            .invoices
            .select(|inv| query.matches(inv))?
            .into_iter()
            .map(|inv| inv.id)
            .collect())
    }
}

#[async_trait::async_trait]
impl LedgerDataProvider for InMemoryLedger {
    async fn invoices(&self, query: &InvoiceQuery) -> LedgerResult<Vec<Invoice>> {
        self.check_available()?;
        self.invoices.select(|inv| query.matches(inv))
    }

    async fn invoice_lines(&self, query: &InvoiceQuery) -> LedgerResult<Vec<InvoiceLineItem>> {
        self.check_available()?;
        let ids = self.matching_invoice_ids(query)?;
        self.lines.select(|line| ids.binary_search(&line.invoice_id).is_ok())
    }

    async fn payments(&self, query: &InvoiceQuery) -> LedgerResult<Vec<Payment>> {
        self.check_available()?;
        let ids = self.matching_invoice_ids(query)?;
        self.payments.select(|p| ids.binary_search(&p.invoice_id).is_ok())
    }

    async fn products(&self, scope: CompanyScope) -> LedgerResult<Vec<Product>> {
        self.check_available()?;
        self.products.select(|p| scope.includes(p.company_id))
    }

    async fn customers(&self, company_id: CompanyId) -> LedgerResult<Vec<Customer>> {
        self.check_available()?;
        self.customers.select(|c| c.company_id == company_id)
    }

    async fn employees(&self, scope: CompanyScope) -> LedgerResult<Vec<Employee>> {
        self.check_available()?;
        self.employees.select(|e| scope.includes(e.company_id))
    }

    async fn employee(&self, employee_id: EmployeeId) -> LedgerResult<Option<Employee>> {
        self.check_available()?;
        self.employees.get(employee_id)
    }

    async fn health_check(&self) -> LedgerResult<()> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::InvoiceStatus;
    use crate::query::DateWindow;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tallyerp_core::{InvoiceId, LineItemId};

    fn invoice(company_id: CompanyId, date: NaiveDate, status: InvoiceStatus) -> Invoice {
        Invoice {
            id: InvoiceId::new(),
            company_id,
            invoice_number: "INV-1".to_string(),
            customer_id: None,
            employee_id: None,
            invoice_date: date,
            due_date: None,
            subtotal: dec!(100),
            discount_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            shipping_cost: Decimal::ZERO,
            total_amount: dec!(100),
            paid_amount: Decimal::ZERO,
            balance_due: dec!(100),
            status,
        }
    }

    fn line(invoice_id: InvoiceId) -> InvoiceLineItem {
        InvoiceLineItem {
            id: LineItemId::new(),
            invoice_id,
            product_id: None,
            quantity: dec!(1),
            unit_price: dec!(100),
            actual_unit_price: dec!(100),
            tax_rate: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total_price: dec!(100),
        }
    }

    #[tokio::test]
    async fn reads_are_company_isolated() {
        let ledger = InMemoryLedger::new();
        let c1 = CompanyId::new();
        let c2 = CompanyId::new();
        let day = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();

        let inv1 = invoice(c1, day, InvoiceStatus::Sent);
        let inv2 = invoice(c2, day, InvoiceStatus::Sent);
        ledger.upsert_line(line(inv1.id));
        ledger.upsert_line(line(inv2.id));
        ledger.upsert_invoice(inv1.clone());
        ledger.upsert_invoice(inv2);

        let q = InvoiceQuery::revenue(c1, DateWindow::unbounded());
        let invoices = ledger.invoices(&q).await.unwrap();
        assert_eq!(invoices, vec![inv1.clone()]);

        let lines = ledger.invoice_lines(&q).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].invoice_id, inv1.id);
    }

    #[tokio::test]
    async fn lines_follow_invoice_status_filter() {
        let ledger = InMemoryLedger::new();
        let c = CompanyId::new();
        let day = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let cancelled = invoice(c, day, InvoiceStatus::Cancelled);
        ledger.upsert_line(line(cancelled.id));
        ledger.upsert_invoice(cancelled);

        let q = InvoiceQuery::revenue(c, DateWindow::unbounded());
        assert!(ledger.invoice_lines(&q).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn outage_surfaces_as_unavailable() {
        let ledger = InMemoryLedger::new();
        ledger.simulate_outage("db down");
        let err = ledger.products(CompanyScope::AllCompanies).await.unwrap_err();
        assert_eq!(err, LedgerError::Unavailable("db down".to_string()));

        ledger.restore();
        assert!(ledger.products(CompanyScope::AllCompanies).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn health_check_follows_outage_state() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.health_check().await.is_ok());

        ledger.simulate_outage("maintenance");
        assert!(matches!(ledger.health_check().await, Err(LedgerError::Unavailable(_))));

        ledger.restore();
        assert!(ledger.health_check().await.is_ok());
    }
}
