//! Postgres-backed ledger reads.
//!
//! Every statement is static SQL; optional filters are expressed as
//! nullable parameters (`$n::date IS NULL OR ...`) so an [`InvoiceQuery`]
//! never turns into string concatenation.
//!
//! ## Error Mapping
//!
//! | SQLx error                              | LedgerError   |
//! |-----------------------------------------|---------------|
//! | `PoolTimedOut`, `PoolClosed`, `Io`, `Tls` | `Unavailable` |
//! | `ColumnDecode`, `ColumnNotFound`, `Decode` | `Decode`   |
//! | anything else                           | `Query`       |

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use tallyerp_core::{
    CompanyId, CustomerId, EmployeeId, InvoiceId, LineItemId, PaymentId, ProductId,
};
use tallyerp_ledger::{
    BalanceFilter, CompanyScope, Customer, Employee, Invoice, InvoiceLineItem, InvoiceQuery, InvoiceStatus,
    LedgerDataProvider, LedgerError, LedgerResult, Payment, Product,
};

/// Shared invoice predicate, bound as `$1..$5` by [`bind_invoice_query`].
const INVOICE_FILTER: &str = r#"
    ($1::uuid IS NULL OR i.company_id = $1)
    AND ($2::date IS NULL OR i.invoice_date >= $2)
    AND ($3::date IS NULL OR i.invoice_date <= $3)
    AND i.status = ANY($4)
    AND ($5::bool = FALSE OR i.balance_due > 0)
"#;

#[derive(Debug, Clone)]
pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> LedgerResult<Self> {
        info!(max_connections, "connecting to PostgreSQL");
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }
}

/// Parameters `$1..$5` of [`INVOICE_FILTER`].
struct InvoiceParams {
    company_id: Option<Uuid>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    statuses: Vec<String>,
    open_only: bool,
}

impl From<&InvoiceQuery> for InvoiceParams {
    fn from(query: &InvoiceQuery) -> Self {
        Self {
            company_id: query.scope.company_id().map(|id| *id.as_uuid()),
            start: query.invoice_date.start,
            end: query.invoice_date.end,
            statuses: status_labels(query.statuses.statuses()),
            open_only: matches!(query.balance, BalanceFilter::Open),
        }
    }
}

/// Stored spellings for each status, including legacy aliases.
fn status_labels(statuses: &[InvoiceStatus]) -> Vec<String> {
    let mut labels = Vec::with_capacity(statuses.len() + 2);
    for status in statuses {
        labels.push(status.as_str().to_string());
        match status {
            InvoiceStatus::Sent => labels.push("opened".to_string()),
            InvoiceStatus::Cancelled => labels.push("canceled".to_string()),
            _ => {}
        }
    }
    labels
}

fn scope_param(scope: CompanyScope) -> Option<Uuid> {
    scope.company_id().map(|id| *id.as_uuid())
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> LedgerError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
            LedgerError::Unavailable(format!("{operation}: {err}"))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) | sqlx::Error::Decode(_) => {
            LedgerError::Decode(format!("{operation}: {err}"))
        }
        other => LedgerError::Query(format!("{operation}: {other}")),
    }
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> LedgerResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| LedgerError::Decode(format!("column {column}: {e}")))
}

fn invoice_from_row(row: &PgRow) -> LedgerResult<Invoice> {
    let status: String = get(row, "status")?;
    Ok(Invoice {
        id: InvoiceId::from_uuid(get(row, "id")?),
        company_id: CompanyId::from_uuid(get(row, "company_id")?),
        invoice_number: get(row, "invoice_number")?,
        customer_id: get::<Option<Uuid>>(row, "customer_id")?.map(CustomerId::from_uuid),
        employee_id: get::<Option<Uuid>>(row, "employee_id")?.map(EmployeeId::from_uuid),
        invoice_date: get(row, "invoice_date")?,
        due_date: get(row, "due_date")?,
        subtotal: get(row, "subtotal")?,
        discount_amount: get(row, "discount_amount")?,
        tax_amount: get(row, "tax_amount")?,
        shipping_cost: get(row, "shipping_cost")?,
        total_amount: get(row, "total_amount")?,
        paid_amount: get(row, "paid_amount")?,
        balance_due: get(row, "balance_due")?,
        status: InvoiceStatus::from_str(&status).map_err(|e| LedgerError::Decode(e.to_string()))?,
    })
}

fn line_from_row(row: &PgRow) -> LedgerResult<InvoiceLineItem> {
    Ok(InvoiceLineItem {
        id: LineItemId::from_uuid(get(row, "id")?),
        invoice_id: InvoiceId::from_uuid(get(row, "invoice_id")?),
        product_id: get::<Option<Uuid>>(row, "product_id")?.map(ProductId::from_uuid),
        quantity: get(row, "quantity")?,
        unit_price: get(row, "unit_price")?,
        actual_unit_price: get(row, "actual_unit_price")?,
        tax_rate: get(row, "tax_rate")?,
        tax_amount: get(row, "tax_amount")?,
        total_price: get(row, "total_price")?,
    })
}

fn payment_from_row(row: &PgRow) -> LedgerResult<Payment> {
    Ok(Payment {
        id: PaymentId::from_uuid(get(row, "id")?),
        invoice_id: InvoiceId::from_uuid(get(row, "invoice_id")?),
        payment_date: get(row, "payment_date")?,
        amount: get::<Decimal>(row, "amount")?,
    })
}

fn product_from_row(row: &PgRow) -> LedgerResult<Product> {
    Ok(Product {
        id: ProductId::from_uuid(get(row, "id")?),
        company_id: CompanyId::from_uuid(get(row, "company_id")?),
        name: get(row, "name")?,
        cost_price: get(row, "cost_price")?,
        unit_price: get(row, "unit_price")?,
        commission: get(row, "commission")?,
        quantity_on_hand: get(row, "quantity_on_hand")?,
        manual_count: get(row, "manual_count")?,
        added_employee_id: get::<Option<Uuid>>(row, "added_employee_id")?.map(EmployeeId::from_uuid),
        is_active: get(row, "is_active")?,
    })
}

fn customer_from_row(row: &PgRow) -> LedgerResult<Customer> {
    Ok(Customer {
        id: CustomerId::from_uuid(get(row, "id")?),
        company_id: CompanyId::from_uuid(get(row, "company_id")?),
        name: get(row, "name")?,
        email: get(row, "email")?,
        is_active: get(row, "is_active")?,
    })
}

fn employee_from_row(row: &PgRow) -> LedgerResult<Employee> {
    Ok(Employee {
        id: EmployeeId::from_uuid(get(row, "id")?),
        company_id: CompanyId::from_uuid(get(row, "company_id")?),
        name: get(row, "name")?,
        email: get(row, "email")?,
        is_active: get(row, "is_active")?,
    })
}

#[async_trait]
impl LedgerDataProvider for PostgresLedger {
    #[instrument(skip(self, query), err)]
    async fn invoices(&self, query: &InvoiceQuery) -> LedgerResult<Vec<Invoice>> {
        let p = InvoiceParams::from(query);
        let sql = format!(
            r#"
            SELECT
                i.id, i.company_id, i.invoice_number, i.customer_id, i.employee_id,
                i.invoice_date, i.due_date,
                COALESCE(i.subtotal, 0) AS subtotal,
                COALESCE(i.discount_amount, 0) AS discount_amount,
                COALESCE(i.tax_amount, 0) AS tax_amount,
                COALESCE(i.shipping_cost, 0) AS shipping_cost,
                COALESCE(i.total_amount, 0) AS total_amount,
                COALESCE(i.paid_amount, 0) AS paid_amount,
                COALESCE(i.balance_due, 0) AS balance_due,
                i.status
            FROM invoices i
            WHERE {INVOICE_FILTER}
            ORDER BY i.invoice_date, i.invoice_number
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(p.company_id)
            .bind(p.start)
            .bind(p.end)
            .bind(&p.statuses)
            .bind(p.open_only)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("invoices", e))?;
        debug!(rows = rows.len(), "invoices fetched");
        rows.iter().map(invoice_from_row).collect()
    }

    #[instrument(skip(self, query), err)]
    async fn invoice_lines(&self, query: &InvoiceQuery) -> LedgerResult<Vec<InvoiceLineItem>> {
        let p = InvoiceParams::from(query);
        let sql = format!(
            r#"
            SELECT
                li.id, li.invoice_id, li.product_id,
                COALESCE(li.quantity, 0) AS quantity,
                COALESCE(li.unit_price, 0) AS unit_price,
                COALESCE(li.actual_unit_price, li.unit_price, 0) AS actual_unit_price,
                COALESCE(li.tax_rate, 0) AS tax_rate,
                COALESCE(li.tax_amount, 0) AS tax_amount,
                COALESCE(li.total_price, 0) AS total_price
            FROM invoice_items li
            JOIN invoices i ON i.id = li.invoice_id
            WHERE {INVOICE_FILTER}
            ORDER BY li.invoice_id, li.id
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(p.company_id)
            .bind(p.start)
            .bind(p.end)
            .bind(&p.statuses)
            .bind(p.open_only)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("invoice_lines", e))?;
        debug!(rows = rows.len(), "invoice lines fetched");
        rows.iter().map(line_from_row).collect()
    }

    #[instrument(skip(self, query), err)]
    async fn payments(&self, query: &InvoiceQuery) -> LedgerResult<Vec<Payment>> {
        let p = InvoiceParams::from(query);
        let sql = format!(
            r#"
            SELECT p.id, p.invoice_id, p.payment_date, COALESCE(p.amount, 0) AS amount
            FROM payments p
            JOIN invoices i ON i.id = p.invoice_id
            WHERE {INVOICE_FILTER}
            ORDER BY p.payment_date, p.id
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(p.company_id)
            .bind(p.start)
            .bind(p.end)
            .bind(&p.statuses)
            .bind(p.open_only)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("payments", e))?;
        rows.iter().map(payment_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn products(&self, scope: CompanyScope) -> LedgerResult<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT
                id, company_id, name,
                COALESCE(cost_price, 0) AS cost_price,
                COALESCE(unit_price, 0) AS unit_price,
                COALESCE(commission, 0) AS commission,
                COALESCE(quantity_on_hand, 0) AS quantity_on_hand,
                manual_count,
                added_employee_id,
                is_active
            FROM products
            WHERE ($1::uuid IS NULL OR company_id = $1)
            ORDER BY name, id
            "#,
        )
        .bind(scope_param(scope))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("products", e))?;
        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn customers(&self, company_id: CompanyId) -> LedgerResult<Vec<Customer>> {
        let rows = sqlx::query(
            r#"
            SELECT id, company_id, name, email, is_active
            FROM customers
            WHERE company_id = $1
            ORDER BY name, id
            "#,
        )
        .bind(*company_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("customers", e))?;
        rows.iter().map(customer_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn employees(&self, scope: CompanyScope) -> LedgerResult<Vec<Employee>> {
        let rows = sqlx::query(
            r#"
            SELECT id, company_id, name, email, is_active
            FROM employees
            WHERE ($1::uuid IS NULL OR company_id = $1)
            ORDER BY name, id
            "#,
        )
        .bind(scope_param(scope))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("employees", e))?;
        rows.iter().map(employee_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn employee(&self, employee_id: EmployeeId) -> LedgerResult<Option<Employee>> {
        let row = sqlx::query(
            r#"
            SELECT id, company_id, name, email, is_active
            FROM employees
            WHERE id = $1
            "#,
        )
        .bind(*employee_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("employee", e))?;
        row.as_ref().map(employee_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn health_check(&self) -> LedgerResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("health_check", e))?;
        Ok(())
    }
}
