use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use tallyerp_ledger::LedgerError;
use tallyerp_reporting::ReportError;

pub fn report_error_to_response(err: ReportError) -> axum::response::Response {
    match err {
        ReportError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        ReportError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        ReportError::DataSource(e @ LedgerError::Unavailable(_)) => {
            tracing::error!(error = %e, "ledger unavailable");
            json_error(StatusCode::SERVICE_UNAVAILABLE, "data_source_unavailable", e.to_string())
        }
        // Rejected queries and malformed rows will not go away on retry.
        ReportError::DataSource(e) => {
            tracing::error!(error = %e, "ledger read failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "data_source_error", e.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
