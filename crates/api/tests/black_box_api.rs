use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use tallyerp_api::app::services::AppServices;
use tallyerp_core::{CompanyId, CurrencyCode, CustomerId, EmployeeId, InvoiceId, LineItemId, ProductId};
use tallyerp_ledger::{Customer, Employee, InMemoryLedger, Invoice, InvoiceLineItem, InvoiceStatus, Product};
use tallyerp_reporting::{AttributionPolicy, FixedClock, ReportingEngine};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(ledger: Arc<InMemoryLedger>) -> Self {
        // Same router as prod over a seeded ledger and a pinned clock.
        let engine = ReportingEngine::new(ledger.clone()).with_clock(Arc::new(FixedClock(today())));
        let services = AppServices::new(ledger, CurrencyCode::usd(), AttributionPolicy::default()).with_engine(engine);
        let app = tallyerp_api::app::build_app_with_services(Arc::new(services));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    async fn get(&self, company: Option<CompanyId>, path: &str) -> reqwest::Response {
        let mut req = self.client.get(format!("{}{}", self.base_url, path));
        if let Some(company) = company {
            req = req.header("X-Company-Id", company.to_string());
        }
        req.send().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn today() -> NaiveDate {
    d(2026, 6, 15)
}

struct Seeded {
    company: CompanyId,
    seller: EmployeeId,
    idle: EmployeeId,
}

/// One partially paid invoice (total 1000, discount 100, tax 50) selling ten
/// widgets at 90 that cost 40 and pay 2.50 commission each.
fn seed(ledger: &InMemoryLedger) -> Seeded {
    let company = CompanyId::new();

    let seller = Employee {
        id: EmployeeId::new(),
        company_id: company,
        name: "Ada".to_string(),
        email: Some("ada@example.com".to_string()),
        is_active: true,
    };
    let idle = Employee {
        id: EmployeeId::new(),
        company_id: company,
        name: "Idle".to_string(),
        email: None,
        is_active: true,
    };
    let customer = Customer {
        id: CustomerId::new(),
        company_id: company,
        name: "Acme".to_string(),
        email: None,
        is_active: true,
    };
    let widget = Product {
        id: ProductId::new(),
        company_id: company,
        name: "Widget".to_string(),
        cost_price: dec!(40),
        unit_price: dec!(90),
        commission: dec!(2.50),
        quantity_on_hand: Decimal::ZERO,
        manual_count: None,
        added_employee_id: Some(seller.id),
        is_active: true,
    };
    let invoice = Invoice {
        id: InvoiceId::new(),
        company_id: company,
        invoice_number: "INV-100".to_string(),
        customer_id: Some(customer.id),
        employee_id: Some(seller.id),
        invoice_date: d(2026, 3, 10),
        // Exactly fifteen days after the pinned "today".
        due_date: Some(d(2026, 6, 30)),
        subtotal: dec!(1050),
        discount_amount: dec!(100),
        tax_amount: dec!(50),
        shipping_cost: Decimal::ZERO,
        total_amount: dec!(1000),
        paid_amount: dec!(400),
        balance_due: dec!(600),
        status: InvoiceStatus::PartiallyPaid,
    };
    let line = InvoiceLineItem {
        id: LineItemId::new(),
        invoice_id: invoice.id,
        product_id: Some(widget.id),
        quantity: dec!(10),
        unit_price: dec!(90),
        actual_unit_price: dec!(90),
        tax_rate: Decimal::ZERO,
        tax_amount: Decimal::ZERO,
        total_price: dec!(900),
    };

    let seeded = Seeded {
        company,
        seller: seller.id,
        idle: idle.id,
    };
    ledger.upsert_employee(seller);
    ledger.upsert_employee(idle);
    ledger.upsert_customer(customer);
    ledger.upsert_product(widget);
    ledger.upsert_invoice(invoice);
    ledger.upsert_line(line);
    seeded
}

#[tokio::test]
async fn health_does_not_need_a_company() {
    let server = TestServer::spawn(Arc::new(InMemoryLedger::new())).await;

    let res = server.get(None, "/health").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn reports_require_a_company_header() {
    let server = TestServer::spawn(Arc::new(InMemoryLedger::new())).await;

    let res = server.get(None, "/reports/profit-loss").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = server
        .client
        .get(format!("{}/reports/profit-loss", server.base_url))
        .header("X-Company-Id", "not-a-uuid")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profit_and_loss_over_http_rounds_once_and_tags_currency() {
    let ledger = Arc::new(InMemoryLedger::new());
    let seeded = seed(&ledger);
    let server = TestServer::spawn(ledger).await;

    let res = server.get(Some(seeded.company), "/reports/profit-loss").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();

    assert_eq!(body["currency"], "USD");
    assert_eq!(body["period"]["start_date"], "2026-01-01");
    assert_eq!(body["period"]["end_date"], "2026-06-15");
    assert_eq!(body["income"]["product_income"], "900.00");
    assert_eq!(body["income"]["total_income"], "950.00");
    assert_eq!(body["income"]["discounts_given"], "-100.00");
    assert_eq!(body["income"]["net_income"], "850.00");
    assert_eq!(body["cost_of_sales"]["cost_of_sales"], "400.00");
    assert_eq!(body["profitability"]["gross_profit"], "450.00");
    assert_eq!(body["cash_flow"]["total_paid"], "400.00");
}

#[tokio::test]
async fn grouped_profit_and_loss_totals_match_the_flat_report() {
    let ledger = Arc::new(InMemoryLedger::new());
    let seeded = seed(&ledger);
    let server = TestServer::spawn(ledger).await;

    let flat: serde_json::Value = server
        .get(Some(seeded.company), "/reports/profit-loss")
        .await
        .json()
        .await
        .unwrap();
    let res = server
        .get(Some(seeded.company), "/reports/profit-loss?group_by=customer")
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let grouped: serde_json::Value = res.json().await.unwrap();

    assert_eq!(grouped["group_by"], "customer");
    assert_eq!(grouped["total"]["summary"], flat["summary"]);
}

#[tokio::test]
async fn invalid_query_values_are_bad_requests() {
    let ledger = Arc::new(InMemoryLedger::new());
    let seeded = seed(&ledger);
    let server = TestServer::spawn(ledger).await;

    for path in [
        "/reports/profit-loss?start_date=03/01/2026",
        "/reports/profit-loss?start_date=2026-05-01&end_date=2026-04-01",
        "/reports/profit-loss?group_by=product",
        "/reports/sales-summary?group_by=region",
        "/reports/commission/not-a-uuid",
    ] {
        let res = server.get(Some(seeded.company), path).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{path}");
    }
}

#[tokio::test]
async fn aging_places_a_fifteen_day_invoice_in_the_fifteen_day_bucket() {
    let ledger = Arc::new(InMemoryLedger::new());
    let seeded = seed(&ledger);
    let server = TestServer::spawn(ledger).await;

    let res = server.get(Some(seeded.company), "/reports/ar-aging").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();

    assert_eq!(body["asOf"], "2026-06-15");
    let row = &body["rows"][0];
    assert_eq!(row["customerName"], "Acme");
    assert_eq!(row["due15Days"], "600.00");
    assert_eq!(row["dueToday"], "0.00");
    assert_eq!(row["total"], "600.00");
    assert_eq!(body["totals"]["total"], "600.00");
}

#[tokio::test]
async fn commission_lists_idle_employees_and_detail_matches_summary() {
    let ledger = Arc::new(InMemoryLedger::new());
    let seeded = seed(&ledger);
    let server = TestServer::spawn(ledger).await;

    let summary: serde_json::Value = server
        .get(Some(seeded.company), "/reports/commission")
        .await
        .json()
        .await
        .unwrap();
    let rows = summary["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);

    let idle = rows
        .iter()
        .find(|r| r["employeeId"] == seeded.idle.to_string())
        .unwrap();
    assert_eq!(idle["totalCommission"], "0.00");
    let seller = rows
        .iter()
        .find(|r| r["employeeId"] == seeded.seller.to_string())
        .unwrap();
    assert_eq!(seller["totalCommission"], "25.00");

    let res = server
        .get(Some(seeded.company), &format!("/reports/commission/{}", seeded.seller))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let detail: serde_json::Value = res.json().await.unwrap();
    assert_eq!(detail["totalCommission"], seller["totalCommission"]);
    assert_eq!(detail["invoiceLines"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn commission_detail_hides_unknown_and_foreign_employees() {
    let ledger = Arc::new(InMemoryLedger::new());
    let seeded = seed(&ledger);
    let server = TestServer::spawn(ledger).await;

    let res = server
        .get(Some(seeded.company), &format!("/reports/commission/{}", EmployeeId::new()))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .get(Some(CompanyId::new()), &format!("/reports/commission/{}", seeded.seller))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sales_summary_defaults_to_products() {
    let ledger = Arc::new(InMemoryLedger::new());
    let seeded = seed(&ledger);
    let server = TestServer::spawn(ledger).await;

    let res = server.get(Some(seeded.company), "/reports/sales-summary").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();

    assert_eq!(body["group_by"], "product");
    assert_eq!(body["rows"][0]["label"], "Widget");
    assert_eq!(body["rows"][0]["revenue"], "900.00");
    assert_eq!(body["total"]["gross_profit"], "500.00");
}

#[tokio::test]
async fn ledger_outage_is_service_unavailable() {
    let ledger = Arc::new(InMemoryLedger::new());
    let seeded = seed(&ledger);
    let server = TestServer::spawn(ledger.clone()).await;

    ledger.simulate_outage("connection reset");
    let res = server.get(None, "/health").await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "unavailable");

    let res = server.get(Some(seeded.company), "/reports/profit-loss/monthly").await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "data_source_unavailable");

    ledger.restore();
    assert_eq!(server.get(None, "/health").await.status(), StatusCode::OK);
    let res = server
        .get(Some(seeded.company), "/reports/profit-loss/monthly?year=2026")
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["months"][0]["month"], 3);
}

#[tokio::test]
async fn all_companies_commission_spans_every_company() {
    let ledger = Arc::new(InMemoryLedger::new());
    let first = seed(&ledger);
    let second = seed(&ledger);
    let server = TestServer::spawn(ledger).await;

    let scoped: serde_json::Value = server
        .get(Some(first.company), "/reports/commission")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(scoped["rows"].as_array().unwrap().len(), 2);

    let res = server
        .get(Some(first.company), "/reports/commission?all_companies=true")
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let all: serde_json::Value = res.json().await.unwrap();
    let rows = all["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().any(|r| r["employeeId"] == second.seller.to_string()));
    assert_eq!(all["totalCommission"], "50.00");
}
