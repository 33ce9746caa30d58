use axum::Router;

pub mod reports;
pub mod system;

/// Router for all company-scoped endpoints.
pub fn router() -> Router {
    Router::new().nest("/reports", reports::router())
}
