use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool, Postgres, Transaction, query_builder::QueryBuilder};
use uuid::Uuid;

use super::{AnnulOutcome, DeleteUserOutcome, RepoResult, Repository, RepositoryError};
use crate::models::{
    Authorization, AuthorizationGroup, AuthorizationListItem, AuthorizationRow, Page, User,
    UserSummary,
};
use crate::query::{
    AuthorizationFilter, AuthorizationQuery, AuthorizationSortKey, PageRequest, SortSpec,
    UserAuthorizationQuery, UserQuery, ValidityFilter, active, escape_like, like_pattern,
};

const USER_COLUMNS: &str = "u.id, u.full_name, u.national_id, u.email, u.phone, u.address, \
    u.city, u.client, u.dependency, u.requests_service, u.provider, u.created_at";

const AUTHORIZATION_COLUMNS: &str = "id, user_id, unique_code, mipres, voucher, start_date, \
    end_date, authorized_services, remaining_services, is_trip, is_transfer, origin_city, \
    destination_city, provider, tariff_code, tariff_name, km_range, created_at";

const ROW_COLUMNS: &str = "a.id, a.user_id, a.unique_code, u.full_name, \
    u.national_id AS identification, u.dependency, a.voucher, a.mipres, a.authorized_services, \
    a.remaining_services, a.tariff_name, a.start_date, a.end_date, a.provider, a.origin_city, \
    a.destination_city, a.km_range";

const GROUP_COLUMNS: &str = "unique_code, user_id, created_on, state, notes";

/// GroupRecord
///
/// Raw `authorization_groups` row. The state is stored as text and parsed on the way out.
#[derive(FromRow)]
struct GroupRecord {
    unique_code: String,
    user_id: Uuid,
    created_on: NaiveDate,
    state: String,
    notes: Option<String>,
}

impl TryFrom<GroupRecord> for AuthorizationGroup {
    type Error = RepositoryError;

    fn try_from(record: GroupRecord) -> Result<Self, Self::Error> {
        Ok(AuthorizationGroup {
            state: record.state.parse().map_err(RepositoryError::Corrupt)?,
            unique_code: record.unique_code,
            user_id: record.user_id,
            created_on: record.created_on,
            notes: record.notes,
        })
    }
}

#[derive(FromRow)]
struct ConsumptionRecord {
    unique_code: String,
    authorized_services: i32,
    remaining_services: i32,
}

fn into_groups(records: Vec<GroupRecord>) -> RepoResult<Vec<AuthorizationGroup>> {
    records.into_iter().map(AuthorizationGroup::try_from).collect()
}

fn push_page(builder: &mut QueryBuilder<'_, Postgres>, page: PageRequest) {
    builder
        .push(" LIMIT ")
        .push_bind(page.limit as i64)
        .push(" OFFSET ")
        .push_bind(page.offset() as i64);
}

fn push_ilike(builder: &mut QueryBuilder<'_, Postgres>, column: &str, fragment: &str) {
    builder
        .push(format!(" AND {column} ILIKE "))
        .push_bind(like_pattern(fragment));
}

// --- Filter Builders ---

fn push_user_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &UserQuery) {
    builder.push(" WHERE TRUE");
    if let Some(search) = active(&query.search) {
        let pattern = like_pattern(search);
        builder
            .push(" AND (u.full_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.national_id ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.phone ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR EXISTS (SELECT 1 FROM authorization_groups g WHERE g.user_id = u.id AND g.unique_code ILIKE ")
            .push_bind(pattern)
            .push("))");
    }
    if let Some(dependency) = active(&query.dependency) {
        builder.push(" AND u.dependency = ").push_bind(dependency.to_string());
    }
    if let Some(provider) = active(&query.provider) {
        builder.push(" AND u.provider = ").push_bind(provider.to_string());
    }
}

fn push_authorization_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    filter: &AuthorizationFilter,
    today: NaiveDate,
) {
    builder.push(" WHERE TRUE");
    if let Some(search) = active(&filter.search) {
        let pattern = like_pattern(search);
        builder.push(" AND (");
        let mut columns = builder.separated(" OR ");
        for column in ["a.unique_code", "u.full_name", "u.national_id", "a.voucher", "a.mipres"] {
            columns.push(format!("{column} ILIKE "));
            columns.push_bind_unseparated(pattern.clone());
        }
        builder.push(")");
    }
    if let Some(from) = filter.start_date {
        builder.push(" AND a.start_date >= ").push_bind(from);
    }
    if let Some(to) = filter.end_date {
        builder.push(" AND a.end_date <= ").push_bind(to);
    }
    if let Some(identification) = active(&filter.identification) {
        builder.push(" AND u.national_id = ").push_bind(identification.to_string());
    }
    if let Some(code) = active(&filter.unique_code) {
        push_ilike(builder, "a.unique_code", code);
    }
    if let Some(mipres) = active(&filter.mipres) {
        push_ilike(builder, "a.mipres", mipres);
    }
    if let Some(voucher) = active(&filter.voucher) {
        push_ilike(builder, "a.voucher", voucher);
    }
    if let Some(dependency) = active(&filter.dependency) {
        builder.push(" AND u.dependency = ").push_bind(dependency.to_string());
    }
    match filter.validity.unwrap_or_default() {
        ValidityFilter::Todos => {}
        ValidityFilter::Vigente => {
            builder.push(" AND a.end_date > ").push_bind(today);
        }
        ValidityFilter::NoVigente => {
            builder.push(" AND a.end_date <= ").push_bind(today);
        }
    }
}

fn push_authorization_order(
    builder: &mut QueryBuilder<'_, Postgres>,
    sort: Option<SortSpec<AuthorizationSortKey>>,
    today: NaiveDate,
) {
    builder.push(" ORDER BY ");
    if let Some(spec) = sort {
        match spec.key.column() {
            Some(column) => {
                builder.push(format!("{column} {}, ", spec.direction.as_sql()));
            }
            None => {
                builder
                    .push("(a.end_date > ")
                    .push_bind(today)
                    .push(format!(") {}, ", spec.direction.as_sql()));
            }
        }
    }
    builder.push("a.created_at, a.id");
}

/// PostgresRepository
///
/// The `Repository` backed by PostgreSQL. Queries are built at runtime with `QueryBuilder`
/// and every value is bound, never interpolated.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_group(
        tx: &mut Transaction<'_, Postgres>,
        group: &AuthorizationGroup,
    ) -> RepoResult<()> {
        let inserted = sqlx::query(
            "INSERT INTO authorization_groups (unique_code, user_id, created_on, state, notes) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT (unique_code) DO NOTHING",
        )
        .bind(&group.unique_code)
        .bind(group.user_id)
        .bind(group.created_on)
        .bind(group.state.as_str())
        .bind(&group.notes)
        .execute(&mut **tx)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(RepositoryError::DuplicateCode(group.unique_code.clone()));
        }
        Ok(())
    }

    async fn set_group_state(
        tx: &mut Transaction<'_, Postgres>,
        unique_code: &str,
        active: bool,
    ) -> RepoResult<()> {
        if active {
            sqlx::query("UPDATE authorization_groups SET state = 'ACTIVO' WHERE unique_code = $1")
                .bind(unique_code)
                .execute(&mut **tx)
                .await?;
        } else {
            sqlx::query(
                "UPDATE authorization_groups SET state = 'INACTIVO' WHERE unique_code = $1 \
                 AND NOT EXISTS (SELECT 1 FROM authorizations WHERE unique_code = $1)",
            )
            .bind(unique_code)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// list_users
    ///
    /// One COUNT over the filtered users, one page query, then the groups of that page.
    async fn list_users(&self, query: &UserQuery) -> RepoResult<Page<UserSummary>> {
        let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM users u");
        push_user_filters(&mut count, query);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users u"));
        push_user_filters(&mut builder, query);
        builder.push(" ORDER BY ");
        if let Some(spec) = query.sort_spec() {
            builder.push(format!("u.{} {}, ", spec.key.column(), spec.direction.as_sql()));
        }
        builder.push("u.created_at, u.id");
        push_page(&mut builder, query.page_request());
        let users = builder.build_query_as::<User>().fetch_all(&self.pool).await?;

        let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
        let records = sqlx::query_as::<_, GroupRecord>(&format!(
            "SELECT {GROUP_COLUMNS} FROM authorization_groups WHERE user_id = ANY($1) \
             ORDER BY created_on, unique_code"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        let groups = into_groups(records)?;

        let data = users
            .into_iter()
            .map(|user| UserSummary {
                authorization_groups: groups
                    .iter()
                    .filter(|g| g.user_id == user.id)
                    .cloned()
                    .collect(),
                user,
            })
            .collect();

        Ok(Page {
            data,
            total: total as usize,
        })
    }

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_identification(&self, national_id: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.national_id = $1"
        ))
        .bind(national_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_groups(&self, user_id: Uuid) -> RepoResult<Vec<AuthorizationGroup>> {
        let records = sqlx::query_as::<_, GroupRecord>(&format!(
            "SELECT {GROUP_COLUMNS} FROM authorization_groups WHERE user_id = $1 \
             ORDER BY created_on, unique_code"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        into_groups(records)
    }

    async fn update_user(&self, user: User) -> RepoResult<Option<User>> {
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users u
            SET full_name = $2, national_id = $3, email = $4, phone = $5, address = $6,
                city = $7, client = $8, dependency = $9, requests_service = $10, provider = $11
            WHERE u.id = $1
            RETURNING u.id, u.full_name, u.national_id, u.email, u.phone, u.address,
                      u.city, u.client, u.dependency, u.requests_service, u.provider, u.created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.full_name)
        .bind(&user.national_id)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(&user.city)
        .bind(&user.client)
        .bind(&user.dependency)
        .bind(user.requests_service)
        .bind(&user.provider)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    /// delete_user
    ///
    /// Locks the user row, checks consumption and deletes authorizations, groups and the
    /// user in one transaction.
    async fn delete_user(&self, id: Uuid) -> RepoResult<DeleteUserOutcome> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(DeleteUserOutcome::NotFound);
        }

        let consumed: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(authorized_services - remaining_services), 0)::BIGINT \
             FROM authorizations WHERE user_id = $1",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if consumed > 0 {
            return Ok(DeleteUserOutcome::ServicesConsumed { consumed });
        }

        sqlx::query("DELETE FROM authorizations WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM authorization_groups WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(DeleteUserOutcome::Deleted)
    }

    async fn list_authorizations(
        &self,
        query: &AuthorizationQuery,
        today: NaiveDate,
    ) -> RepoResult<Page<AuthorizationListItem>> {
        let mut count: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT COUNT(*) FROM authorizations a JOIN users u ON u.id = a.user_id",
        );
        push_authorization_filters(&mut count, &query.filter, today);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {ROW_COLUMNS} FROM authorizations a JOIN users u ON u.id = a.user_id"
        ));
        push_authorization_filters(&mut builder, &query.filter, today);
        push_authorization_order(&mut builder, query.params.sort_spec(), today);
        push_page(&mut builder, query.params.page_request());

        let rows = builder.build_query_as::<AuthorizationRow>().fetch_all(&self.pool).await?;
        Ok(Page {
            data: rows.into_iter().map(|row| row.into_item(today)).collect(),
            total: total as usize,
        })
    }

    async fn list_user_authorizations(
        &self,
        user_id: Uuid,
        query: &UserAuthorizationQuery,
    ) -> RepoResult<Page<Authorization>> {
        fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, user_id: Uuid, query: &UserAuthorizationQuery) {
            builder.push(" WHERE user_id = ").push_bind(user_id);
            if let Some(search) = active(&query.search) {
                let pattern = like_pattern(search);
                builder
                    .push(" AND (voucher ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR mipres ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
            if let Some(code) = active(&query.unique_code) {
                builder.push(" AND unique_code = ").push_bind(code.to_string());
            }
            if let Some(mipres) = active(&query.mipres) {
                push_ilike(builder, "mipres", mipres);
            }
            if let Some(voucher) = active(&query.voucher) {
                push_ilike(builder, "voucher", voucher);
            }
            if let Some(from) = query.start_date {
                builder.push(" AND start_date >= ").push_bind(from);
            }
            if let Some(to) = query.end_date {
                builder.push(" AND end_date <= ").push_bind(to);
            }
        }

        let mut count: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM authorizations");
        push_filters(&mut count, user_id, query);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {AUTHORIZATION_COLUMNS} FROM authorizations"));
        push_filters(&mut builder, user_id, query);
        builder.push(" ORDER BY ");
        if let Some(spec) = query.sort_spec() {
            builder.push(format!("{} {}, ", spec.key.column(), spec.direction.as_sql()));
        }
        builder.push("created_at, id");
        push_page(&mut builder, query.page_request());

        let data = builder.build_query_as::<Authorization>().fetch_all(&self.pool).await?;
        Ok(Page {
            data,
            total: total as usize,
        })
    }

    async fn user_authorizations(&self, user_id: Uuid) -> RepoResult<Vec<Authorization>> {
        let rows = sqlx::query_as::<_, Authorization>(&format!(
            "SELECT {AUTHORIZATION_COLUMNS} FROM authorizations WHERE user_id = $1 ORDER BY created_at, id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_authorization(&self, id: Uuid) -> RepoResult<Option<Authorization>> {
        let row = sqlx::query_as::<_, Authorization>(&format!(
            "SELECT {AUTHORIZATION_COLUMNS} FROM authorizations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_group(&self, unique_code: &str) -> RepoResult<Option<AuthorizationGroup>> {
        let record = sqlx::query_as::<_, GroupRecord>(&format!(
            "SELECT {GROUP_COLUMNS} FROM authorization_groups WHERE unique_code = $1"
        ))
        .bind(unique_code)
        .fetch_optional(&self.pool)
        .await?;
        record.map(AuthorizationGroup::try_from).transpose()
    }

    async fn codes_with_prefix(&self, prefix: &str) -> RepoResult<HashSet<String>> {
        let pattern = format!("{}%", escape_like(prefix));
        let codes: Vec<String> =
            sqlx::query_scalar("SELECT unique_code FROM authorization_groups WHERE unique_code LIKE $1")
                .bind(pattern)
                .fetch_all(&self.pool)
                .await?;
        Ok(codes.into_iter().collect())
    }

    /// insert_batch
    ///
    /// All-or-nothing: the group and every authorization are written in one transaction.
    async fn insert_batch(
        &self,
        new_group: Option<AuthorizationGroup>,
        records: Vec<Authorization>,
    ) -> RepoResult<Vec<Authorization>> {
        let mut tx = self.pool.begin().await?;

        match &new_group {
            Some(group) => Self::insert_group(&mut tx, group).await?,
            None => {
                let codes: HashSet<&str> = records.iter().map(|r| r.unique_code.as_str()).collect();
                for code in codes {
                    Self::set_group_state(&mut tx, code, true).await?;
                }
            }
        }

        let mut stored = Vec::with_capacity(records.len());
        for record in &records {
            let row = sqlx::query_as::<_, Authorization>(&format!(
                "INSERT INTO authorizations ({AUTHORIZATION_COLUMNS}) VALUES \
                 ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
                 RETURNING {AUTHORIZATION_COLUMNS}"
            ))
            .bind(record.id)
            .bind(record.user_id)
            .bind(&record.unique_code)
            .bind(&record.mipres)
            .bind(&record.voucher)
            .bind(record.start_date)
            .bind(record.end_date)
            .bind(record.authorized_services)
            .bind(record.remaining_services)
            .bind(record.is_trip)
            .bind(record.is_transfer)
            .bind(&record.origin_city)
            .bind(&record.destination_city)
            .bind(&record.provider)
            .bind(&record.tariff_code)
            .bind(&record.tariff_name)
            .bind(&record.km_range)
            .bind(record.created_at)
            .fetch_one(&mut *tx)
            .await?;
            stored.push(row);
        }

        tx.commit().await?;
        Ok(stored)
    }

    async fn save_authorization(
        &self,
        authorization: Authorization,
        new_group: Option<AuthorizationGroup>,
    ) -> RepoResult<Option<Authorization>> {
        let mut tx = self.pool.begin().await?;

        let previous_code = sqlx::query_scalar::<_, String>(
            "SELECT unique_code FROM authorizations WHERE id = $1 FOR UPDATE",
        )
        .bind(authorization.id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(previous_code) = previous_code else {
            return Ok(None);
        };

        match &new_group {
            Some(group) => Self::insert_group(&mut tx, group).await?,
            None => Self::set_group_state(&mut tx, &authorization.unique_code, true).await?,
        }

        let saved = sqlx::query_as::<_, Authorization>(&format!(
            r#"
            UPDATE authorizations
            SET unique_code = $2, mipres = $3, voucher = $4, start_date = $5, end_date = $6,
                authorized_services = $7, remaining_services = $8, is_trip = $9,
                is_transfer = $10, origin_city = $11, destination_city = $12, provider = $13,
                tariff_code = $14, tariff_name = $15, km_range = $16
            WHERE id = $1
            RETURNING {AUTHORIZATION_COLUMNS}
            "#
        ))
        .bind(authorization.id)
        .bind(&authorization.unique_code)
        .bind(&authorization.mipres)
        .bind(&authorization.voucher)
        .bind(authorization.start_date)
        .bind(authorization.end_date)
        .bind(authorization.authorized_services)
        .bind(authorization.remaining_services)
        .bind(authorization.is_trip)
        .bind(authorization.is_transfer)
        .bind(&authorization.origin_city)
        .bind(&authorization.destination_city)
        .bind(&authorization.provider)
        .bind(&authorization.tariff_code)
        .bind(&authorization.tariff_name)
        .bind(&authorization.km_range)
        .fetch_one(&mut *tx)
        .await?;

        if previous_code != saved.unique_code {
            Self::set_group_state(&mut tx, &previous_code, false).await?;
        }

        tx.commit().await?;
        Ok(Some(saved))
    }

    /// annul_authorization
    ///
    /// Conditional delete: the row only goes away while nothing was consumed. When the
    /// delete matches nothing, a second read tells "missing" apart from "consumed".
    async fn annul_authorization(&self, id: Uuid) -> RepoResult<AnnulOutcome> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query_scalar::<_, String>(
            "DELETE FROM authorizations WHERE id = $1 AND remaining_services = authorized_services \
             RETURNING unique_code",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = match deleted {
            Some(unique_code) => {
                Self::set_group_state(&mut tx, &unique_code, false).await?;
                AnnulOutcome::Annulled
            }
            None => {
                let record = sqlx::query_as::<_, ConsumptionRecord>(
                    "SELECT unique_code, authorized_services, remaining_services \
                     FROM authorizations WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
                match record {
                    Some(r) => AnnulOutcome::ServicesConsumed {
                        unique_code: r.unique_code,
                        consumed: r.authorized_services - r.remaining_services,
                        authorized: r.authorized_services,
                    },
                    None => AnnulOutcome::NotFound,
                }
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }

    async fn lookup_tariffs(&self, search: &str) -> RepoResult<Vec<String>> {
        let pattern = like_pattern(search.trim());
        let names = sqlx::query_scalar::<_, String>(
            "SELECT name FROM tariffs WHERE name ILIKE $1 ORDER BY name",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn add_tariff(&self, name: &str) -> RepoResult<bool> {
        let inserted = sqlx::query("INSERT INTO tariffs (name) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(inserted.rows_affected() > 0)
    }

    async fn has_seen_notice(&self, client_id: &str, notice_key: &str) -> RepoResult<bool> {
        let seen = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM notice_acknowledgements WHERE client_id = $1 AND notice_key = $2)",
        )
        .bind(client_id)
        .bind(notice_key)
        .fetch_one(&self.pool)
        .await?;
        Ok(seen)
    }

    async fn mark_notice_seen(&self, client_id: &str, notice_key: &str) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO notice_acknowledgements (client_id, notice_key) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(client_id)
        .bind(notice_key)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
