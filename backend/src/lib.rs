use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Domain model, rules and read-side query engine.
pub mod catalog;
pub mod export;
pub mod lifecycle;
pub mod models;
pub mod notices;
pub mod query;
pub mod validation;
pub mod view_state;

// Service plumbing.
pub mod config;
pub mod error;
pub mod handlers;
pub mod repository;

// Module for routing segregation (Catalog, Users, Authorizations).
pub mod routes;
use routes::{authorizations, catalog as catalog_routes, users};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::AppError;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Auto-generates the OpenAPI document for the dashboard API, served at
/// `/api-docs/openapi.json` and browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_cities, handlers::get_clients, handlers::get_dependencies,
        handlers::get_providers, handlers::lookup_tariffs, handlers::add_tariff,
        handlers::get_users, handlers::get_user_detail, handlers::get_user_by_identification,
        handlers::update_user, handlers::delete_user, handlers::get_user_authorizations,
        handlers::get_authorizations, handlers::create_authorizations, handlers::get_authorization,
        handlers::update_authorization, handlers::reassign_code, handlers::annul_authorization,
        handlers::download_certificate, handlers::export_authorizations,
        handlers::generate_code, handlers::get_latest_notice, handlers::dismiss_latest_notice
    ),
    components(
        schemas(
            models::ValidityStatus, models::GroupState, models::User, models::AuthorizationGroup,
            models::Authorization, models::AuthorizationDetail, models::AuthorizationRow,
            models::AuthorizationListItem, models::UserSummary, models::UserDetail,
            models::NewAuthorization, models::GroupSelection, models::CreateAuthorizationBatch,
            models::CreatedBatch, models::UpdateAuthorizationRequest, models::ReassignCodeRequest,
            models::UpdateUserRequest, models::NewTariffRequest, models::GeneratedCode,
            models::CatalogEntry, notices::ChangeTarget, notices::ChangeEntry,
            notices::LatestChangesNotice, query::SortDirection, query::UserSortKey,
            query::ValidityFilter, query::AuthorizationSortKey, query::UserAuthorizationSortKey,
            export::ExportFormat, validation::FieldErrors,
        )
    ),
    tags(
        (name = "transport-authorizations", description = "Transport Authorization Dashboard API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Implements the **Unified State Pattern**: the single clonable container of the
/// services every request handler may need.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: Postgres in deployments, the seeded in-memory store otherwise.
    pub repo: RepositoryState,
    /// Configuration: The loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl AppState {
    /// in_memory
    ///
    /// State backed by the seeded in-memory store and a default configuration.
    pub fn in_memory() -> Self {
        Self {
            repo: std::sync::Arc::new(InMemoryRepository::seeded()),
            config: AppConfig::default(),
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, registers the state and wraps everything in the
/// request-id, tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any)
        .expose_headers([axum::http::header::CONTENT_DISPOSITION]);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(catalog_routes::catalog_routes())
        .merge(users::user_routes())
        .merge(authorizations::authorization_routes())
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: method, URI and the request id, so every log line of a
/// request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
