use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// authorization_routes
///
/// The static `/authorizations/export` segment takes priority over `/authorizations/{id}`.
pub fn authorization_routes() -> Router<AppState> {
    Router::new()
        // GET /authorizations
        // POST /authorizations
        .route(
            "/authorizations",
            get(handlers::get_authorizations).post(handlers::create_authorizations),
        )
        // GET /authorizations/export?format=csv|txt
        .route(
            "/authorizations/export",
            get(handlers::export_authorizations),
        )
        // GET /authorizations/{id}
        // PUT /authorizations/{id}
        // DELETE /authorizations/{id}
        .route(
            "/authorizations/{id}",
            get(handlers::get_authorization)
                .put(handlers::update_authorization)
                .delete(handlers::annul_authorization),
        )
        // PUT /authorizations/{id}/code
        .route("/authorizations/{id}/code", put(handlers::reassign_code))
        // GET /authorizations/{id}/certificate
        .route(
            "/authorizations/{id}/certificate",
            get(handlers::download_certificate),
        )
}
