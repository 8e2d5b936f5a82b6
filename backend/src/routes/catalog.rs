use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// catalog_routes
///
/// Read-mostly endpoints backing the forms' dropdowns and the dashboard shell.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        .route("/health", get(|| async { "ok" }))
        // GET /catalog/cities
        .route("/catalog/cities", get(handlers::get_cities))
        // GET /catalog/clients
        .route("/catalog/clients", get(handlers::get_clients))
        // GET /catalog/dependencies
        .route("/catalog/dependencies", get(handlers::get_dependencies))
        // GET /catalog/providers
        .route("/catalog/providers", get(handlers::get_providers))
        // GET /catalog/tariffs?search=
        // POST /catalog/tariffs
        .route(
            "/catalog/tariffs",
            get(handlers::lookup_tariffs).post(handlers::add_tariff),
        )
        // POST /codes/generate
        .route("/codes/generate", post(handlers::generate_code))
        // GET /notices/latest
        .route("/notices/latest", get(handlers::get_latest_notice))
        // POST /notices/latest/dismiss
        .route(
            "/notices/latest/dismiss",
            post(handlers::dismiss_latest_notice),
        )
}
