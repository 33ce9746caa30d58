use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use tallyerp_core::CompanyId;

use crate::app::errors::json_error;
use crate::context::CompanyContext;

pub const COMPANY_HEADER: &str = "x-company-id";

/// Resolve the company from `X-Company-Id`.
///
/// Authentication happens upstream; this only establishes which company's
/// books the request reads.
pub async fn company_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let company_id = extract_company(req.headers())?;
    req.extensions_mut().insert(CompanyContext::new(company_id));
    Ok(next.run(req).await)
}

fn extract_company(headers: &HeaderMap) -> Result<CompanyId, Response> {
    let header = headers.get(COMPANY_HEADER).ok_or_else(|| {
        json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "X-Company-Id header is required",
        )
    })?;

    let raw = header.to_str().map_err(|_| {
        json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "X-Company-Id header is not valid text",
        )
    })?;

    raw.parse::<CompanyId>()
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()))
}
