//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: ledger selection and the reporting engine
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: query-string parsing
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use tallyerp_infra::AppConfig;
use tallyerp_ledger::LedgerResult;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router from configuration (used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> LedgerResult<Router> {
    let services = services::build_services(config).await?;
    Ok(build_app_with_services(Arc::new(services)))
}

/// Router over already-built services (tests inject a seeded ledger here).
pub fn build_app_with_services(services: Arc<services::AppServices>) -> Router {
    // Company-scoped routes: require X-Company-Id.
    let scoped = routes::router().layer(axum::middleware::from_fn(middleware::company_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(scoped)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
