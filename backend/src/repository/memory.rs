use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AnnulOutcome, DeleteUserOutcome, RepoResult, Repository, RepositoryError, seed};
use crate::catalog::DEFAULT_TARIFFS;
use crate::models::{
    Authorization, AuthorizationGroup, AuthorizationListItem, AuthorizationRow, GroupState, Page,
    User, UserSummary,
};
use crate::query::{
    AuthorizationQuery, UserAuthorizationQuery, UserQuery, active, contains_ci, run_query,
};

#[derive(Debug, Default)]
struct Store {
    users: Vec<User>,
    groups: Vec<AuthorizationGroup>,
    authorizations: Vec<Authorization>,
    tariffs: Vec<String>,
    acknowledgements: HashSet<(String, String)>,
}

impl Store {
    fn groups_of(&self, user_id: Uuid) -> Vec<AuthorizationGroup> {
        self.groups
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect()
    }

    fn group_mut(&mut self, unique_code: &str) -> Option<&mut AuthorizationGroup> {
        self.groups.iter_mut().find(|g| g.unique_code == unique_code)
    }

    /// Marks the group INACTIVO when no authorization is filed under it anymore.
    fn retire_if_empty(&mut self, unique_code: &str) {
        let in_use = self
            .authorizations
            .iter()
            .any(|a| a.unique_code == unique_code);
        if !in_use {
            if let Some(group) = self.group_mut(unique_code) {
                group.state = GroupState::Inactivo;
            }
        }
    }
}

/// InMemoryRepository
///
/// A `Repository` kept entirely in memory behind one async `RwLock`, so every call is a
/// single critical section. Used for local runs without a database and by the tests.
pub struct InMemoryRepository {
    store: RwLock<Store>,
    latency: Duration,
    failing: bool,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    /// An empty store with the default tariffs.
    pub fn new() -> Self {
        Self::from_store(Store::default())
    }

    /// A store loaded with the reference dataset.
    pub fn seeded() -> Self {
        Self::from_store(Store {
            users: seed::users(),
            groups: seed::groups(),
            authorizations: seed::authorizations(),
            ..Store::default()
        })
    }

    fn from_store(mut store: Store) -> Self {
        store.tariffs = DEFAULT_TARIFFS.iter().map(|t| t.to_string()).collect();
        Self {
            store: RwLock::new(store),
            latency: Duration::ZERO,
            failing: false,
        }
    }

    /// Delays every call by `latency` before it touches the store.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// A store whose every call fails, for exercising error paths.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    async fn enter(&self) -> RepoResult<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failing {
            return Err(RepositoryError::Unavailable);
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_users(&self, query: &UserQuery) -> RepoResult<Page<UserSummary>> {
        self.enter().await?;
        let store = self.store.read().await;
        let summaries = store.users.iter().map(|user| UserSummary {
            user: user.clone(),
            authorization_groups: store.groups_of(user.id),
        });
        Ok(run_query(
            summaries,
            |summary| query.matches(summary),
            query.sort_spec(),
            query.page_request(),
        ))
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        self.enter().await?;
        let store = self.store.read().await;
        Ok(store.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_identification(&self, national_id: &str) -> RepoResult<Option<User>> {
        self.enter().await?;
        let store = self.store.read().await;
        Ok(store
            .users
            .iter()
            .find(|u| u.national_id == national_id)
            .cloned())
    }

    async fn get_user_groups(&self, user_id: Uuid) -> RepoResult<Vec<AuthorizationGroup>> {
        self.enter().await?;
        Ok(self.store.read().await.groups_of(user_id))
    }

    async fn update_user(&self, user: User) -> RepoResult<Option<User>> {
        self.enter().await?;
        let mut store = self.store.write().await;
        match store.users.iter_mut().find(|u| u.id == user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<DeleteUserOutcome> {
        self.enter().await?;
        let mut store = self.store.write().await;
        if !store.users.iter().any(|u| u.id == id) {
            return Ok(DeleteUserOutcome::NotFound);
        }
        let consumed: i64 = store
            .authorizations
            .iter()
            .filter(|a| a.user_id == id)
            .map(|a| i64::from(a.consumed_services()))
            .sum();
        if consumed > 0 {
            return Ok(DeleteUserOutcome::ServicesConsumed { consumed });
        }
        store.authorizations.retain(|a| a.user_id != id);
        store.groups.retain(|g| g.user_id != id);
        store.users.retain(|u| u.id != id);
        Ok(DeleteUserOutcome::Deleted)
    }

    async fn list_authorizations(
        &self,
        query: &AuthorizationQuery,
        today: NaiveDate,
    ) -> RepoResult<Page<AuthorizationListItem>> {
        self.enter().await?;
        let store = self.store.read().await;
        let items = store.authorizations.iter().filter_map(|authorization| {
            let holder = store.users.iter().find(|u| u.id == authorization.user_id)?;
            Some(AuthorizationRow::from_parts(authorization, holder).into_item(today))
        });
        Ok(run_query(
            items,
            |item| query.filter.matches(item),
            query.params.sort_spec(),
            query.params.page_request(),
        ))
    }

    async fn list_user_authorizations(
        &self,
        user_id: Uuid,
        query: &UserAuthorizationQuery,
    ) -> RepoResult<Page<Authorization>> {
        self.enter().await?;
        let store = self.store.read().await;
        Ok(run_query(
            store.authorizations.iter().cloned(),
            |a| query.matches(user_id, a),
            query.sort_spec(),
            query.page_request(),
        ))
    }

    async fn user_authorizations(&self, user_id: Uuid) -> RepoResult<Vec<Authorization>> {
        self.enter().await?;
        let store = self.store.read().await;
        Ok(store
            .authorizations
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_authorization(&self, id: Uuid) -> RepoResult<Option<Authorization>> {
        self.enter().await?;
        let store = self.store.read().await;
        Ok(store.authorizations.iter().find(|a| a.id == id).cloned())
    }

    async fn get_group(&self, unique_code: &str) -> RepoResult<Option<AuthorizationGroup>> {
        self.enter().await?;
        let store = self.store.read().await;
        Ok(store
            .groups
            .iter()
            .find(|g| g.unique_code == unique_code)
            .cloned())
    }

    async fn codes_with_prefix(&self, prefix: &str) -> RepoResult<HashSet<String>> {
        self.enter().await?;
        let store = self.store.read().await;
        Ok(store
            .groups
            .iter()
            .filter(|g| g.unique_code.starts_with(prefix))
            .map(|g| g.unique_code.clone())
            .collect())
    }

    async fn insert_batch(
        &self,
        new_group: Option<AuthorizationGroup>,
        records: Vec<Authorization>,
    ) -> RepoResult<Vec<Authorization>> {
        self.enter().await?;
        let mut store = self.store.write().await;

        match new_group {
            Some(group) => {
                if store.groups.iter().any(|g| g.unique_code == group.unique_code) {
                    return Err(RepositoryError::DuplicateCode(group.unique_code));
                }
                store.groups.push(group);
            }
            None => {
                for record in &records {
                    if let Some(group) = store.group_mut(&record.unique_code) {
                        group.state = GroupState::Activo;
                    }
                }
            }
        }

        store.authorizations.extend(records.iter().cloned());
        Ok(records)
    }

    async fn save_authorization(
        &self,
        authorization: Authorization,
        new_group: Option<AuthorizationGroup>,
    ) -> RepoResult<Option<Authorization>> {
        self.enter().await?;
        let mut store = self.store.write().await;

        let Some(index) = store
            .authorizations
            .iter()
            .position(|a| a.id == authorization.id)
        else {
            return Ok(None);
        };

        if let Some(group) = new_group {
            if store.groups.iter().any(|g| g.unique_code == group.unique_code) {
                return Err(RepositoryError::DuplicateCode(group.unique_code));
            }
            store.groups.push(group);
        } else if let Some(group) = store.group_mut(&authorization.unique_code) {
            group.state = GroupState::Activo;
        }

        let previous_code = std::mem::replace(
            &mut store.authorizations[index],
            authorization.clone(),
        )
        .unique_code;
        if previous_code != authorization.unique_code {
            store.retire_if_empty(&previous_code);
        }
        Ok(Some(authorization))
    }

    async fn annul_authorization(&self, id: Uuid) -> RepoResult<AnnulOutcome> {
        self.enter().await?;
        let mut store = self.store.write().await;

        let Some(index) = store.authorizations.iter().position(|a| a.id == id) else {
            return Ok(AnnulOutcome::NotFound);
        };

        let target = &store.authorizations[index];
        let consumed = target.consumed_services();
        if consumed > 0 {
            return Ok(AnnulOutcome::ServicesConsumed {
                unique_code: target.unique_code.clone(),
                consumed,
                authorized: target.authorized_services,
            });
        }

        let removed = store.authorizations.remove(index);
        store.retire_if_empty(&removed.unique_code);
        Ok(AnnulOutcome::Annulled)
    }

    async fn lookup_tariffs(&self, search: &str) -> RepoResult<Vec<String>> {
        self.enter().await?;
        let store = self.store.read().await;
        let needle = Some(search.to_string());
        Ok(match active(&needle) {
            Some(needle) => store
                .tariffs
                .iter()
                .filter(|t| contains_ci(t, needle))
                .cloned()
                .collect(),
            None => store.tariffs.clone(),
        })
    }

    async fn add_tariff(&self, name: &str) -> RepoResult<bool> {
        self.enter().await?;
        let mut store = self.store.write().await;
        if store.tariffs.iter().any(|t| t == name) {
            return Ok(false);
        }
        store.tariffs.push(name.to_string());
        Ok(true)
    }

    async fn has_seen_notice(&self, client_id: &str, notice_key: &str) -> RepoResult<bool> {
        self.enter().await?;
        let store = self.store.read().await;
        Ok(store
            .acknowledgements
            .contains(&(client_id.to_string(), notice_key.to_string())))
    }

    async fn mark_notice_seen(&self, client_id: &str, notice_key: &str) -> RepoResult<()> {
        self.enter().await?;
        let mut store = self.store.write().await;
        store
            .acknowledgements
            .insert((client_id.to_string(), notice_key.to_string()));
        Ok(())
    }
}
