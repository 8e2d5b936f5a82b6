use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Authorization, AuthorizationGroup, AuthorizationListItem, Page, User, UserSummary,
};
use crate::query::{AuthorizationQuery, UserAuthorizationQuery, UserQuery};

mod memory;
mod postgres;
pub mod seed;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// RepositoryError
///
/// Failures of the data layer. Business-rule refusals are not errors here; they come
/// back as outcome enums such as [`AnnulOutcome`].
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("unique code {0} already exists")]
    DuplicateCode(String),

    #[error("data store unavailable")]
    Unavailable,

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Result of an annulment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnulOutcome {
    Annulled,
    NotFound,
    ServicesConsumed {
        unique_code: String,
        consumed: i32,
        authorized: i32,
    },
}

/// Result of a user deletion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteUserOutcome {
    Deleted,
    NotFound,
    ServicesConsumed { consumed: i64 },
}

/// Repository Trait
///
/// Contract of the data layer behind the dashboard. Handlers and the lifecycle rules only
/// ever see `Arc<dyn Repository>`, so the seeded in-memory store and Postgres are
/// interchangeable.
///
/// Implementations keep each call atomic: a batch insert lands completely or not at all,
/// and the annulment check and delete happen in one step.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn list_users(&self, query: &UserQuery) -> RepoResult<Page<UserSummary>>;
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn find_user_by_identification(&self, national_id: &str) -> RepoResult<Option<User>>;
    async fn get_user_groups(&self, user_id: Uuid) -> RepoResult<Vec<AuthorizationGroup>>;
    // Replaces the stored user with the same id. `None` if it does not exist.
    async fn update_user(&self, user: User) -> RepoResult<Option<User>>;
    // Removes the user with its groups and authorizations, unless services were consumed.
    async fn delete_user(&self, id: Uuid) -> RepoResult<DeleteUserOutcome>;

    // --- Authorizations ---
    async fn list_authorizations(
        &self,
        query: &AuthorizationQuery,
        today: NaiveDate,
    ) -> RepoResult<Page<AuthorizationListItem>>;
    async fn list_user_authorizations(
        &self,
        user_id: Uuid,
        query: &UserAuthorizationQuery,
    ) -> RepoResult<Page<Authorization>>;
    // Every authorization of the user, unpaged.
    async fn user_authorizations(&self, user_id: Uuid) -> RepoResult<Vec<Authorization>>;
    async fn get_authorization(&self, id: Uuid) -> RepoResult<Option<Authorization>>;

    // --- Groups & Codes ---
    async fn get_group(&self, unique_code: &str) -> RepoResult<Option<AuthorizationGroup>>;
    // Codes already taken that start with `prefix`, e.g. "AUTH-2025-".
    async fn codes_with_prefix(&self, prefix: &str) -> RepoResult<HashSet<String>>;

    /// insert_batch
    ///
    /// Stores `records` and, when given, the group they open. Fails with
    /// `RepositoryError::DuplicateCode` if `new_group` collides with an existing code.
    /// Filing under an existing INACTIVO group reactivates it.
    async fn insert_batch(
        &self,
        new_group: Option<AuthorizationGroup>,
        records: Vec<Authorization>,
    ) -> RepoResult<Vec<Authorization>>;

    /// save_authorization
    ///
    /// Replaces a stored authorization. `new_group` is created first when the record moves
    /// to a code that does not exist yet. A group left without authorizations turns INACTIVO.
    async fn save_authorization(
        &self,
        authorization: Authorization,
        new_group: Option<AuthorizationGroup>,
    ) -> RepoResult<Option<Authorization>>;

    /// annul_authorization
    ///
    /// Deletes the authorization only if none of its services were consumed.
    async fn annul_authorization(&self, id: Uuid) -> RepoResult<AnnulOutcome>;

    // --- Tariffs ---
    async fn lookup_tariffs(&self, search: &str) -> RepoResult<Vec<String>>;
    // Returns false when the tariff already existed.
    async fn add_tariff(&self, name: &str) -> RepoResult<bool>;

    // --- Notices ---
    async fn has_seen_notice(&self, client_id: &str, notice_key: &str) -> RepoResult<bool>;
    async fn mark_notice_seen(&self, client_id: &str, notice_key: &str) -> RepoResult<()>;
}

/// RepositoryState
///
/// The concrete type used to share the data layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
