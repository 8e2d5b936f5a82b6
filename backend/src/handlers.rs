use crate::{
    AppState,
    catalog,
    error::AppError,
    export::{self, ExportFile, ExportParams},
    lifecycle,
    models::{
        AuthorizationDetail, AuthorizationListItem, CatalogEntry, CreateAuthorizationBatch,
        CreatedBatch, GeneratedCode, NewTariffRequest, Page, ReassignCodeRequest,
        UpdateAuthorizationRequest, UpdateUserRequest, User, UserDetail, UserSummary,
    },
    notices::{self, LatestChangesNotice},
    query::{AuthorizationFilter, AuthorizationListParams, AuthorizationQuery, UserAuthorizationQuery, UserQuery},
    validation::FieldErrors,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Datelike;
use serde::Deserialize;
use uuid::Uuid;

/// Header carrying the browser-generated id that first-run notices are tracked by.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

// --- Helpers ---

fn file_response(file: ExportFile) -> Response {
    (
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, file.content_disposition()),
        ],
        file.body,
    )
        .into_response()
}

fn client_id(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(CLIENT_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::Validation(FieldErrors::single(
                "client_id",
                "Falta el encabezado x-client-id",
            ))
        })
}

// --- Catalog ---

/// get_cities
///
/// Colombian cities available as route endpoints, ordered by label.
#[utoipa::path(
    get,
    path = "/catalog/cities",
    responses((status = 200, description = "Cities", body = [CatalogEntry]))
)]
pub async fn get_cities() -> Json<Vec<CatalogEntry>> {
    Json(catalog::cities().to_vec())
}

#[utoipa::path(
    get,
    path = "/catalog/clients",
    responses((status = 200, description = "Client classifications", body = [CatalogEntry]))
)]
pub async fn get_clients() -> Json<Vec<CatalogEntry>> {
    Json(catalog::entries(catalog::CLIENTS))
}

#[utoipa::path(
    get,
    path = "/catalog/dependencies",
    responses((status = 200, description = "Regional offices", body = [CatalogEntry]))
)]
pub async fn get_dependencies() -> Json<Vec<CatalogEntry>> {
    Json(catalog::entries(catalog::DEPENDENCIES))
}

#[utoipa::path(
    get,
    path = "/catalog/providers",
    responses((status = 200, description = "Provider companies", body = [CatalogEntry]))
)]
pub async fn get_providers() -> Json<Vec<CatalogEntry>> {
    Json(catalog::entries(catalog::PROVIDERS))
}

/// TariffSearch
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TariffSearch {
    /// Case-insensitive fragment of the tariff name. Empty lists every tariff.
    #[serde(default)]
    pub search: String,
}

/// lookup_tariffs
///
/// Tariff names for the create form's dropdown.
#[utoipa::path(
    get,
    path = "/catalog/tariffs",
    params(TariffSearch),
    responses((status = 200, description = "Tariff names", body = [String]))
)]
pub async fn lookup_tariffs(
    State(state): State<AppState>,
    Query(search): Query<TariffSearch>,
) -> Result<Json<Vec<String>>, AppError> {
    let tariffs = state.repo.lookup_tariffs(&search.search).await?;
    Ok(Json(tariffs))
}

/// add_tariff
///
/// Registers a tariff name. 201 when it is new, 200 when it already existed.
#[utoipa::path(
    post,
    path = "/catalog/tariffs",
    request_body = NewTariffRequest,
    responses(
        (status = 201, description = "Created", body = NewTariffRequest),
        (status = 200, description = "Already existed", body = NewTariffRequest),
        (status = 422, description = "Empty name")
    )
)]
pub async fn add_tariff(
    State(state): State<AppState>,
    Json(payload): Json<NewTariffRequest>,
) -> Result<(StatusCode, Json<NewTariffRequest>), AppError> {
    let name = payload.name.trim().to_uppercase();
    if name.is_empty() {
        return Err(AppError::Validation(FieldErrors::single(
            "name",
            "El nombre de la tarifa es requerido",
        )));
    }
    let status = if state.repo.add_tariff(&name).await? {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(NewTariffRequest { name })))
}

// --- Users ---

/// get_users
///
/// User management table: search, dependency/provider filters, sort and pagination.
#[utoipa::path(
    get,
    path = "/users",
    params(UserQuery),
    responses((status = 200, description = "One page of users", body = Page<UserSummary>))
)]
pub async fn get_users(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Page<UserSummary>>, AppError> {
    let page = state.repo.list_users(&query).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = UserDetail),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserDetail>, AppError> {
    let detail = lifecycle::user_detail(state.repo.as_ref(), id).await?;
    Ok(Json(detail))
}

/// get_user_by_identification
///
/// Lookup used by the create form to find the holder by national ID.
#[utoipa::path(
    get,
    path = "/users/by-identification/{identification}",
    params(("identification" = String, Path, description = "National ID")),
    responses(
        (status = 200, description = "Found", body = User),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user_by_identification(
    State(state): State<AppState>,
    Path(identification): Path<String>,
) -> Result<Json<User>, AppError> {
    state
        .repo
        .find_user_by_identification(identification.trim())
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Usuario"))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Invalid fields", body = FieldErrors)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    let user = lifecycle::update_user(state.repo.as_ref(), id, payload).await?;
    Ok(Json(user))
}

/// delete_user
///
/// Removes the user with their groups and authorizations. Refused with 409 while any
/// authorization has consumed services.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Services consumed")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    lifecycle::delete_user(state.repo.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/users/{id}/authorizations",
    params(("id" = Uuid, Path, description = "User ID"), UserAuthorizationQuery),
    responses(
        (status = 200, description = "One page of the user's authorizations", body = Page<AuthorizationDetail>),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user_authorizations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UserAuthorizationQuery>,
) -> Result<Json<Page<AuthorizationDetail>>, AppError> {
    if state.repo.get_user(id).await?.is_none() {
        return Err(AppError::NotFound("Usuario"));
    }
    let today = lifecycle::today();
    let page = state.repo.list_user_authorizations(id, &query).await?;
    Ok(Json(Page {
        total: page.total,
        data: page.data.into_iter().map(|a| a.into_detail(today)).collect(),
    }))
}

// --- Authorizations ---

/// get_authorizations
///
/// Authorization management table. Validity status is derived against today's date.
#[utoipa::path(
    get,
    path = "/authorizations",
    params(AuthorizationFilter, AuthorizationListParams),
    responses((status = 200, description = "One page of authorizations", body = Page<AuthorizationListItem>))
)]
pub async fn get_authorizations(
    State(state): State<AppState>,
    Query(filter): Query<AuthorizationFilter>,
    Query(params): Query<AuthorizationListParams>,
) -> Result<Json<Page<AuthorizationListItem>>, AppError> {
    let query = AuthorizationQuery::new(filter, params);
    let page = state
        .repo
        .list_authorizations(&query, lifecycle::today())
        .await?;
    Ok(Json(page))
}

/// create_authorizations
///
/// Creates one or more authorizations for a user under a single unique code.
#[utoipa::path(
    post,
    path = "/authorizations",
    request_body = CreateAuthorizationBatch,
    responses(
        (status = 201, description = "Created", body = CreatedBatch),
        (status = 404, description = "User Not Found"),
        (status = 409, description = "Unique code already exists"),
        (status = 422, description = "Invalid fields", body = FieldErrors),
        (status = 503, description = "No unique codes left")
    )
)]
pub async fn create_authorizations(
    State(state): State<AppState>,
    Json(payload): Json<CreateAuthorizationBatch>,
) -> Result<(StatusCode, Json<CreatedBatch>), AppError> {
    let created = lifecycle::create_batch(state.repo.as_ref(), payload, lifecycle::today()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/authorizations/{id}",
    params(("id" = Uuid, Path, description = "Authorization ID")),
    responses(
        (status = 200, description = "Found", body = AuthorizationDetail),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_authorization(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AuthorizationDetail>, AppError> {
    state
        .repo
        .get_authorization(id)
        .await?
        .map(|a| Json(a.into_detail(lifecycle::today())))
        .ok_or(AppError::NotFound("Autorización"))
}

/// update_authorization
///
/// Field-level edit. The consumed count is kept, so lowering the total below it fails.
#[utoipa::path(
    put,
    path = "/authorizations/{id}",
    request_body = UpdateAuthorizationRequest,
    responses(
        (status = 200, description = "Updated", body = AuthorizationDetail),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Invalid fields", body = FieldErrors)
    )
)]
pub async fn update_authorization(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAuthorizationRequest>,
) -> Result<Json<AuthorizationDetail>, AppError> {
    let detail =
        lifecycle::update_authorization(state.repo.as_ref(), id, payload, lifecycle::today()).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    put,
    path = "/authorizations/{id}/code",
    request_body = ReassignCodeRequest,
    responses(
        (status = 200, description = "Reassigned", body = AuthorizationDetail),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Invalid fields", body = FieldErrors)
    )
)]
pub async fn reassign_code(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReassignCodeRequest>,
) -> Result<Json<AuthorizationDetail>, AppError> {
    let detail = lifecycle::reassign_code(state.repo.as_ref(), id, payload, lifecycle::today()).await?;
    Ok(Json(detail))
}

/// annul_authorization
///
/// Irreversibly removes an authorization with no consumed services. Anything else is
/// refused with 409 and the consumed/authorized counts.
#[utoipa::path(
    delete,
    path = "/authorizations/{id}",
    responses(
        (status = 204, description = "Annulled"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Services consumed")
    )
)]
pub async fn annul_authorization(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    lifecycle::annul(state.repo.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/authorizations/{id}/certificate",
    responses(
        (status = 200, description = "Plain-text certificate", content_type = "text/plain", body = String),
        (status = 404, description = "Not Found")
    )
)]
pub async fn download_certificate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let authorization = state
        .repo
        .get_authorization(id)
        .await?
        .ok_or(AppError::NotFound("Autorización"))?;
    let file = export::render_certificate(&authorization, lifecycle::today());
    Ok(file_response(file))
}

/// export_authorizations
///
/// Downloads the rows the management table shows for the same filters, sort and page,
/// as comma- or pipe-delimited text.
#[utoipa::path(
    get,
    path = "/authorizations/export",
    params(ExportParams, AuthorizationFilter, AuthorizationListParams),
    responses((status = 200, description = "Delimited text file", content_type = "text/plain", body = String))
)]
pub async fn export_authorizations(
    State(state): State<AppState>,
    Query(export_params): Query<ExportParams>,
    Query(filter): Query<AuthorizationFilter>,
    Query(params): Query<AuthorizationListParams>,
) -> Result<Response, AppError> {
    let today = lifecycle::today();
    let query = AuthorizationQuery::new(filter, params);
    let page = state.repo.list_authorizations(&query, today).await?;
    let file = export::export_authorizations(&page.data, export_params.format, today);
    tracing::info!(rows = page.data.len(), filename = %file.filename, "authorizations exported");
    Ok(file_response(file))
}

// --- Codes & Notices ---

/// generate_code
///
/// Reserves nothing: it returns a code that is free right now. Creation re-checks it.
#[utoipa::path(
    post,
    path = "/codes/generate",
    responses(
        (status = 200, description = "Free unique code", body = GeneratedCode),
        (status = 503, description = "No unique codes left")
    )
)]
pub async fn generate_code(State(state): State<AppState>) -> Result<Json<GeneratedCode>, AppError> {
    let unique_code =
        lifecycle::allocate_unique_code(state.repo.as_ref(), lifecycle::today().year()).await?;
    Ok(Json(GeneratedCode { unique_code }))
}

#[utoipa::path(
    get,
    path = "/notices/latest",
    params(("x-client-id" = String, Header, description = "Browser client id")),
    responses((status = 200, description = "Latest changes", body = LatestChangesNotice))
)]
pub async fn get_latest_notice(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<LatestChangesNotice>, AppError> {
    let client = client_id(&headers)?;
    let seen = state
        .repo
        .has_seen_notice(&client, notices::LATEST_CHANGES_KEY)
        .await?;
    Ok(Json(notices::notice_for(seen)))
}

#[utoipa::path(
    post,
    path = "/notices/latest/dismiss",
    params(("x-client-id" = String, Header, description = "Browser client id")),
    responses((status = 204, description = "Dismissed"))
)]
pub async fn dismiss_latest_notice(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let client = client_id(&headers)?;
    state
        .repo
        .mark_notice_seen(&client, notices::LATEST_CHANGES_KEY)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
