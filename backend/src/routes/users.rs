use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// user_routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        // GET /users
        .route("/users", get(handlers::get_users))
        // GET /users/by-identification/{identification}
        .route(
            "/users/by-identification/{identification}",
            get(handlers::get_user_by_identification),
        )
        // GET /users/{id}
        // PUT /users/{id}
        // DELETE /users/{id}
        .route(
            "/users/{id}",
            get(handlers::get_user_detail)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        // GET /users/{id}/authorizations
        .route(
            "/users/{id}/authorizations",
            get(handlers::get_user_authorizations),
        )
}
