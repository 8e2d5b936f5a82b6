use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Derived Status ---

/// ValidityStatus
///
/// Whether an authorization is currently usable. Never stored: it is always derived
/// from the end of the validity window and the current date at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum ValidityStatus {
    #[serde(rename = "NO VIGENTE")]
    NoVigente,
    #[serde(rename = "VIGENTE")]
    Vigente,
}

impl ValidityStatus {
    /// An authorization is VIGENTE only while its end date is strictly after `today`.
    pub fn derive(end_date: NaiveDate, today: NaiveDate) -> Self {
        if end_date > today {
            ValidityStatus::Vigente
        } else {
            ValidityStatus::NoVigente
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidityStatus::Vigente => "VIGENTE",
            ValidityStatus::NoVigente => "NO VIGENTE",
        }
    }
}

/// GroupState
///
/// Lifecycle flag of an authorization group. A group turns INACTIVO once its last
/// authorization is annulled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum GroupState {
    #[serde(rename = "ACTIVO")]
    Activo,
    #[serde(rename = "INACTIVO")]
    Inactivo,
}

impl GroupState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupState::Activo => "ACTIVO",
            GroupState::Inactivo => "INACTIVO",
        }
    }
}

impl std::str::FromStr for GroupState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVO" => Ok(GroupState::Activo),
            "INACTIVO" => Ok(GroupState::Inactivo),
            other => Err(format!("unknown group state '{other}'")),
        }
    }
}

// --- Core Records ---

/// User
///
/// A patient who holds transport authorizations. Mirrors the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    // National identification number, unique per user.
    pub national_id: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: Option<String>,
    pub city: Option<String>,
    // Client classification, e.g. "TUTELAS EPS".
    pub client: String,
    // Regional office the user is attached to.
    pub dependency: String,
    pub requests_service: bool,
    pub provider: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// AuthorizationGroup
///
/// A unique code shared by the authorizations that were issued together for one user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct AuthorizationGroup {
    pub unique_code: String,
    pub user_id: Uuid,
    pub created_on: NaiveDate,
    pub state: GroupState,
    pub notes: Option<String>,
}

/// Authorization
///
/// A single transport permit as it is stored. `remaining_services` never exceeds
/// `authorized_services`, and `km_range` is only present for distance-based permits.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[ts(export)]
pub struct Authorization {
    pub id: Uuid,
    pub user_id: Uuid,
    pub unique_code: String,
    pub mipres: String,
    pub voucher: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub authorized_services: i32,
    pub remaining_services: i32,
    pub is_trip: bool,
    pub is_transfer: bool,
    pub origin_city: String,
    pub destination_city: String,
    pub provider: String,
    pub tariff_code: Option<String>,
    pub tariff_name: Option<String>,
    pub km_range: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl Authorization {
    /// Services already used against this permit.
    pub fn consumed_services(&self) -> i32 {
        self.authorized_services - self.remaining_services
    }

    pub fn status(&self, today: NaiveDate) -> ValidityStatus {
        ValidityStatus::derive(self.end_date, today)
    }

    pub fn into_detail(self, today: NaiveDate) -> AuthorizationDetail {
        let validity_status = self.status(today);
        let consumed_services = self.consumed_services();
        AuthorizationDetail {
            authorization: self,
            validity_status,
            consumed_services,
        }
    }
}

/// AuthorizationDetail
///
/// An authorization enriched with the values derived at read time.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct AuthorizationDetail {
    #[serde(flatten)]
    pub authorization: Authorization,
    pub validity_status: ValidityStatus,
    pub consumed_services: i32,
}

/// AuthorizationRow
///
/// Management-table projection: an authorization joined with the holder's identity.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[ts(export)]
pub struct AuthorizationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub unique_code: String,
    pub full_name: String,
    pub identification: String,
    pub dependency: String,
    pub voucher: String,
    pub mipres: String,
    pub authorized_services: i32,
    pub remaining_services: i32,
    pub tariff_name: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub provider: String,
    pub origin_city: String,
    pub destination_city: String,
    pub km_range: Option<String>,
}

impl AuthorizationRow {
    pub fn from_parts(authorization: &Authorization, holder: &User) -> Self {
        Self {
            id: authorization.id,
            user_id: holder.id,
            unique_code: authorization.unique_code.clone(),
            full_name: holder.full_name.clone(),
            identification: holder.national_id.clone(),
            dependency: holder.dependency.clone(),
            voucher: authorization.voucher.clone(),
            mipres: authorization.mipres.clone(),
            authorized_services: authorization.authorized_services,
            remaining_services: authorization.remaining_services,
            tariff_name: authorization.tariff_name.clone(),
            start_date: authorization.start_date,
            end_date: authorization.end_date,
            provider: authorization.provider.clone(),
            origin_city: authorization.origin_city.clone(),
            destination_city: authorization.destination_city.clone(),
            km_range: authorization.km_range.clone(),
        }
    }

    pub fn into_item(self, today: NaiveDate) -> AuthorizationListItem {
        let validity_status = ValidityStatus::derive(self.end_date, today);
        AuthorizationListItem {
            row: self,
            validity_status,
        }
    }
}

/// AuthorizationListItem
///
/// One line of the authorization management table, as listed and exported.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct AuthorizationListItem {
    #[serde(flatten)]
    pub row: AuthorizationRow,
    pub validity_status: ValidityStatus,
}

// --- User Projections ---

/// UserSummary
///
/// User management table line: the user plus every authorization group they hold.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct UserSummary {
    #[serde(flatten)]
    pub user: User,
    pub authorization_groups: Vec<AuthorizationGroup>,
}

/// UserDetail
///
/// Header of the user detail view.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub authorization_groups: Vec<AuthorizationGroup>,
    pub authorization_count: usize,
    // Sum of remaining services across every authorization the user holds.
    pub remaining_services: i64,
}

// --- Request Payloads ---

/// NewAuthorization
///
/// One entry of a creation batch. `km_range` is only meaningful when `is_km` is set.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct NewAuthorization {
    #[serde(default)]
    pub mipres: String,
    #[serde(default)]
    pub voucher: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub authorized_services: i32,
    #[serde(default)]
    pub is_trip: bool,
    #[serde(default)]
    pub is_transfer: bool,
    #[serde(default)]
    pub is_km: bool,
    #[serde(default)]
    pub km_range: String,
    #[serde(default)]
    pub origin_city: String,
    #[serde(default)]
    pub destination_city: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub tariff_code: Option<String>,
    #[serde(default)]
    pub tariff_name: Option<String>,
}

/// GroupSelection
///
/// Which unique code a creation batch is filed under: one the user already holds,
/// or a new one (generated server-side when no code is supplied).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
#[ts(export)]
pub enum GroupSelection {
    Existing { unique_code: String },
    New {
        #[serde(default)]
        unique_code: Option<String>,
    },
}

/// CreateAuthorizationBatch
///
/// Input payload for POST /authorizations. Every entry ends up under the same unique code.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct CreateAuthorizationBatch {
    pub user_id: Uuid,
    pub group: GroupSelection,
    pub authorizations: Vec<NewAuthorization>,
}

/// CreatedBatch
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct CreatedBatch {
    pub unique_code: String,
    pub authorizations: Vec<AuthorizationDetail>,
}

/// UpdateAuthorizationRequest
///
/// Field-level edit of an existing authorization (PUT /authorizations/{id}).
/// Consumed services are preserved: the remaining count is recomputed from the new total.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct UpdateAuthorizationRequest {
    pub mipres: String,
    pub voucher: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub authorized_services: i32,
    pub is_trip: bool,
    pub is_transfer: bool,
    pub origin_city: String,
    pub destination_city: String,
    pub provider: String,
    #[serde(default)]
    pub tariff_code: Option<String>,
    #[serde(default)]
    pub tariff_name: Option<String>,
    #[serde(default)]
    pub km_range: Option<String>,
}

impl From<&Authorization> for UpdateAuthorizationRequest {
    fn from(a: &Authorization) -> Self {
        Self {
            mipres: a.mipres.clone(),
            voucher: a.voucher.clone(),
            start_date: a.start_date,
            end_date: a.end_date,
            authorized_services: a.authorized_services,
            is_trip: a.is_trip,
            is_transfer: a.is_transfer,
            origin_city: a.origin_city.clone(),
            destination_city: a.destination_city.clone(),
            provider: a.provider.clone(),
            tariff_code: a.tariff_code.clone(),
            tariff_name: a.tariff_name.clone(),
            km_range: a.km_range.clone(),
        }
    }
}

/// ReassignCodeRequest
///
/// Moves an authorization to another unique code and/or provider (PUT /authorizations/{id}/code).
/// A code the user does not hold yet opens a new ACTIVO group.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct ReassignCodeRequest {
    pub unique_code: String,
    pub provider: String,
    #[serde(default)]
    pub tariff_name: Option<String>,
}

/// UpdateUserRequest
///
/// Input payload for PUT /users/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, PartialEq)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "El nombre completo es requerido"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "La identificación es requerida"))]
    pub national_id: String,
    #[validate(email(message = "Formato de email inválido"))]
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub dependency: String,
    #[serde(default)]
    pub requests_service: bool,
    #[serde(default)]
    pub provider: String,
}

impl UpdateUserRequest {
    /// Applies the edit on top of the stored user, keeping identity and creation time.
    pub fn apply_to(self, user: &User) -> User {
        User {
            id: user.id,
            full_name: self.full_name,
            national_id: self.national_id,
            email: self.email.filter(|e| !e.trim().is_empty()),
            phone: self.phone,
            address: self.address,
            city: self.city,
            client: self.client,
            dependency: self.dependency,
            requests_service: self.requests_service,
            provider: self.provider,
            created_at: user.created_at,
        }
    }
}

/// NewTariffRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NewTariffRequest {
    pub name: String,
}

/// GeneratedCode
///
/// Output schema of POST /codes/generate.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct GeneratedCode {
    pub unique_code: String,
}

// --- Generic Output ---

/// Page
///
/// One page of a filtered collection. `total` counts the filtered collection, not the page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: usize,
}

/// CatalogEntry
///
/// A value/label pair for the dashboard's dropdowns.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct CatalogEntry {
    pub value: String,
    pub label: String,
}
