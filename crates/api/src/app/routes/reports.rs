use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use tallyerp_core::EmployeeId;
use tallyerp_reporting::Dimension;

use crate::app::dto::{
    AgingParams, CommissionParams, MonthlyParams, ProfitLossParams, SalesParams, parse_date, parse_group_by,
};
use crate::app::errors::{json_error, report_error_to_response};
use crate::app::services::AppServices;
use crate::context::CompanyContext;

pub fn router() -> Router {
    Router::new()
        .route("/profit-loss", get(get_profit_loss))
        .route("/profit-loss/monthly", get(get_monthly_profit_loss))
        .route("/ar-aging", get(get_ar_aging))
        .route("/commission", get(get_commission))
        .route("/commission/:employee_id", get(get_commission_detail))
        .route("/sales-summary", get(get_sales_summary))
}

pub async fn get_profit_loss(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Query(params): Query<ProfitLossParams>,
) -> Response {
    let (start, end) = match params.period.bounds() {
        Ok(bounds) => bounds,
        Err(resp) => return resp,
    };
    let group_by = match parse_group_by(params.group_by.as_deref()) {
        Ok(group_by) => group_by,
        Err(resp) => return resp,
    };

    match group_by {
        None => match services.engine.profit_and_loss(company.company_id(), start, end).await {
            Ok(computed) => (StatusCode::OK, Json(services.assembler.profit_and_loss(&computed))).into_response(),
            Err(e) => report_error_to_response(e),
        },
        Some(dimension) => match services
            .engine
            .grouped_profit_and_loss(company.company_id(), start, end, dimension)
            .await
        {
            Ok(computed) => {
                (StatusCode::OK, Json(services.assembler.grouped_profit_and_loss(&computed))).into_response()
            }
            Err(e) => report_error_to_response(e),
        },
    }
}

pub async fn get_monthly_profit_loss(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Query(params): Query<MonthlyParams>,
) -> Response {
    let year = match params.year() {
        Ok(year) => year,
        Err(resp) => return resp,
    };

    match services.engine.monthly_profit_and_loss(company.company_id(), year).await {
        Ok(computed) => (StatusCode::OK, Json(services.assembler.monthly_profit_and_loss(&computed))).into_response(),
        Err(e) => report_error_to_response(e),
    }
}

pub async fn get_ar_aging(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Query(params): Query<AgingParams>,
) -> Response {
    let as_of = match parse_date("as_of", params.as_of.as_deref()) {
        Ok(as_of) => as_of,
        Err(resp) => return resp,
    };

    match services.engine.ar_aging(company.company_id(), as_of).await {
        Ok(computed) => (StatusCode::OK, Json(services.assembler.ar_aging(&computed))).into_response(),
        Err(e) => report_error_to_response(e),
    }
}

/// Commission per active employee of the header's company.
///
/// `all_companies=true` drops the company filter and returns every
/// company's employees. This bypasses tenant isolation, so callers that
/// must not see other companies have to be kept off it upstream.
pub async fn get_commission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Query(params): Query<CommissionParams>,
) -> Response {
    let (start, end) = match params.period.bounds() {
        Ok(bounds) => bounds,
        Err(resp) => return resp,
    };
    let scope = match params.all_companies() {
        Ok(true) => None,
        Ok(false) => Some(company.company_id()),
        Err(resp) => return resp,
    };

    match services.engine.commission_summary(scope, start, end).await {
        Ok(computed) => (StatusCode::OK, Json(services.assembler.commission_summary(&computed))).into_response(),
        Err(e) => report_error_to_response(e),
    }
}

pub async fn get_commission_detail(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(employee_id): Path<String>,
    Query(params): Query<CommissionParams>,
) -> Response {
    let employee_id = match employee_id.parse::<EmployeeId>() {
        Ok(id) => id,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };
    let (start, end) = match params.period.bounds() {
        Ok(bounds) => bounds,
        Err(resp) => return resp,
    };

    match services.engine.commission_detail(employee_id, start, end).await {
        // Employees of other companies are invisible.
        Ok(computed) if computed.value.employee.company_id != company.company_id() => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("employee {employee_id}"),
        ),
        Ok(computed) => (StatusCode::OK, Json(services.assembler.commission_detail(&computed))).into_response(),
        Err(e) => report_error_to_response(e),
    }
}

pub async fn get_sales_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Query(params): Query<SalesParams>,
) -> Response {
    let (start, end) = match params.period.bounds() {
        Ok(bounds) => bounds,
        Err(resp) => return resp,
    };
    let group_by = match parse_group_by(params.group_by.as_deref()) {
        Ok(group_by) => group_by.unwrap_or(Dimension::Product),
        Err(resp) => return resp,
    };

    match services
        .engine
        .sales_summary(company.company_id(), start, end, group_by)
        .await
    {
        Ok(computed) => (StatusCode::OK, Json(services.assembler.sales_summary(&computed))).into_response(),
        Err(e) => report_error_to_response(e),
    }
}
