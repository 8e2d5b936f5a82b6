use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use serial_test::serial;
use sqlx::PgPool;
use transport_authorizations::{
    models::{Authorization, AuthorizationGroup, GroupState, User, ValidityStatus},
    query::{
        AuthorizationFilter, AuthorizationListParams, AuthorizationQuery, AuthorizationSortKey,
        SortDirection, UserAuthorizationQuery, UserQuery, UserSortKey, ValidityFilter,
    },
    repository::{
        AnnulOutcome, DeleteUserOutcome, InMemoryRepository, PostgresRepository, Repository,
        RepositoryError, seed,
    },
};
use uuid::Uuid;

// --- Test Data Helpers ---

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn authorization(user_id: Uuid, code: &str, authorized: i32, remaining: i32) -> Authorization {
    Authorization {
        id: Uuid::new_v4(),
        user_id,
        unique_code: code.to_string(),
        mipres: format!("MP-{}", Uuid::new_v4().simple()),
        voucher: "V-100".to_string(),
        start_date: date(2026, 9, 1),
        end_date: date(2026, 12, 31),
        authorized_services: authorized,
        remaining_services: remaining,
        is_trip: true,
        is_transfer: false,
        origin_city: "MEDELLIN".to_string(),
        destination_city: "BOGOTA".to_string(),
        provider: "NUEVO RUMBO".to_string(),
        tariff_code: None,
        tariff_name: Some("TARIFA BASICA".to_string()),
        km_range: None,
        created_at: Utc::now(),
    }
}

fn group(code: &str, user_id: Uuid) -> AuthorizationGroup {
    AuthorizationGroup {
        unique_code: code.to_string(),
        user_id,
        created_on: today(),
        state: GroupState::Activo,
        notes: None,
    }
}

fn user_query(search: Option<&str>) -> UserQuery {
    UserQuery {
        search: search.map(str::to_string),
        ..UserQuery::default()
    }
}

fn authorization_query(filter: AuthorizationFilter) -> AuthorizationQuery {
    AuthorizationQuery::new(filter, AuthorizationListParams::default())
}

// --- In-Memory: Users ---

#[tokio::test]
async fn test_list_users_search_spans_name_id_phone_and_codes() {
    let repo = InMemoryRepository::seeded();

    let all = repo.list_users(&user_query(None)).await.unwrap();
    assert_eq!(all.total, 5);

    let by_name = repo.list_users(&user_query(Some("maria"))).await.unwrap();
    assert_eq!(by_name.total, 1);
    assert_eq!(by_name.data[0].user.id, seed::MARIA);
    assert_eq!(by_name.data[0].authorization_groups.len(), 1);

    let by_code = repo.list_users(&user_query(Some("auth-2024-003"))).await.unwrap();
    assert_eq!(by_code.total, 1);
    assert_eq!(by_code.data[0].user.id, seed::ANA);

    let by_phone = repo.list_users(&user_query(Some("3157894561"))).await.unwrap();
    assert_eq!(by_phone.data[0].user.id, seed::JUAN);
}

#[tokio::test]
async fn test_list_users_filters_sort_and_pages() {
    let repo = InMemoryRepository::seeded();

    let central = repo
        .list_users(&UserQuery {
            dependency: Some("TRANSPORTE PACIENTES REGIONAL CENTRAL".to_string()),
            provider: Some("NUEVO RUMBO".to_string()),
            ..UserQuery::default()
        })
        .await
        .unwrap();
    let ids: Vec<Uuid> = central.data.iter().map(|s| s.user.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&seed::ANA) && ids.contains(&seed::PATRICIA));

    let sorted = repo
        .list_users(&UserQuery {
            sort_by: Some(UserSortKey::FullName),
            sort_direction: Some(SortDirection::Descending),
            page: Some(2),
            limit: Some(2),
            ..UserQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(sorted.total, 5);
    let names: Vec<&str> = sorted.data.iter().map(|s| s.user.full_name.as_str()).collect();
    assert_eq!(names, vec!["JUAN CARLOS MARTINEZ", "CARLOS ANDRES LOPEZ"]);
}

#[tokio::test]
async fn test_find_user_by_identification() {
    let repo = InMemoryRepository::seeded();
    let found = repo.find_user_by_identification("52789123").await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(seed::ANA));
    assert!(repo.find_user_by_identification("000").await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_user_replaces_stored_record() {
    let repo = InMemoryRepository::seeded();
    let mut maria = repo.get_user(seed::MARIA).await.unwrap().unwrap();
    maria.phone = "3000000000".to_string();

    let updated = repo.update_user(maria.clone()).await.unwrap();
    assert_eq!(updated, Some(maria.clone()));
    assert_eq!(repo.get_user(seed::MARIA).await.unwrap(), Some(maria));

    let ghost = User {
        id: Uuid::new_v4(),
        ..User::default()
    };
    assert!(repo.update_user(ghost).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_user_refused_with_consumption() {
    let repo = InMemoryRepository::seeded();

    // Maria has consumed 3 + 2 services.
    let outcome = repo.delete_user(seed::MARIA).await.unwrap();
    assert_eq!(outcome, DeleteUserOutcome::ServicesConsumed { consumed: 5 });
    assert!(repo.get_user(seed::MARIA).await.unwrap().is_some());

    // Ana has consumed nothing: the user, group and authorization go together.
    assert_eq!(repo.delete_user(seed::ANA).await.unwrap(), DeleteUserOutcome::Deleted);
    assert!(repo.get_user(seed::ANA).await.unwrap().is_none());
    assert!(repo.get_group("AUTH-2024-003").await.unwrap().is_none());
    assert!(repo.get_authorization(seed::ANA_AUTH).await.unwrap().is_none());

    assert_eq!(repo.delete_user(seed::ANA).await.unwrap(), DeleteUserOutcome::NotFound);
}

// --- In-Memory: Authorization Management ---

#[tokio::test]
async fn test_list_authorizations_joins_holder_and_derives_status() {
    let repo = InMemoryRepository::seeded();
    let page = repo
        .list_authorizations(&AuthorizationQuery::default(), today())
        .await
        .unwrap();
    assert_eq!(page.total, 6);
    assert!(page.data.iter().all(|i| i.validity_status == ValidityStatus::NoVigente));

    let maria_rows: Vec<_> = page.data.iter().filter(|i| i.row.user_id == seed::MARIA).collect();
    assert_eq!(maria_rows.len(), 2);
    assert!(maria_rows.iter().all(|i| i.row.identification == "43567890"));
}

#[tokio::test]
async fn test_list_authorizations_filters() {
    let repo = InMemoryRepository::seeded();

    let by_identification = repo
        .list_authorizations(
            &authorization_query(AuthorizationFilter {
                identification: Some("43567890".to_string()),
                ..AuthorizationFilter::default()
            }),
            today(),
        )
        .await
        .unwrap();
    assert_eq!(by_identification.total, 2);

    // Identification is exact, not a substring match.
    let partial = repo
        .list_authorizations(
            &authorization_query(AuthorizationFilter {
                identification: Some("4356".to_string()),
                ..AuthorizationFilter::default()
            }),
            today(),
        )
        .await
        .unwrap();
    assert_eq!(partial.total, 0);

    let by_window = repo
        .list_authorizations(
            &authorization_query(AuthorizationFilter {
                start_date: Some(date(2024, 2, 1)),
                end_date: Some(date(2024, 4, 15)),
                ..AuthorizationFilter::default()
            }),
            today(),
        )
        .await
        .unwrap();
    let ids: Vec<Uuid> = by_window.data.iter().map(|i| i.row.id).collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.contains(&seed::MARIA_TRANSFER));
    assert!(ids.contains(&seed::JUAN_AUTH));
    assert!(ids.contains(&seed::ANA_AUTH));

    let vigente = repo
        .list_authorizations(
            &authorization_query(AuthorizationFilter {
                validity: Some(ValidityFilter::Vigente),
                ..AuthorizationFilter::default()
            }),
            today(),
        )
        .await
        .unwrap();
    assert_eq!(vigente.total, 0);

    let by_search = repo
        .list_authorizations(
            &authorization_query(AuthorizationFilter {
                search: Some("26898467".to_string()),
                ..AuthorizationFilter::default()
            }),
            today(),
        )
        .await
        .unwrap();
    assert_eq!(by_search.data[0].row.id, seed::ANA_AUTH);
}

#[tokio::test]
async fn test_list_authorizations_validity_follows_today() {
    let repo = InMemoryRepository::seeded();
    let query = authorization_query(AuthorizationFilter {
        validity: Some(ValidityFilter::Vigente),
        ..AuthorizationFilter::default()
    });

    // On 2024-03-30 only the permits ending after that day are valid.
    let page = repo
        .list_authorizations(&query, date(2024, 3, 30))
        .await
        .unwrap();
    let ids: Vec<Uuid> = page.data.iter().map(|i| i.row.id).collect();
    assert_eq!(ids.len(), 4);
    assert!(!ids.contains(&seed::MARIA_PRIMARY));
    assert!(!ids.contains(&seed::JUAN_AUTH));
}

#[tokio::test]
async fn test_list_authorizations_sorted_paging() {
    let repo = InMemoryRepository::seeded();
    let query = AuthorizationQuery::new(
        AuthorizationFilter::default(),
        AuthorizationListParams {
            sort_by: Some(AuthorizationSortKey::AuthorizedServices),
            sort_direction: Some(SortDirection::Descending),
            page: Some(1),
            limit: Some(2),
        },
    );
    let page = repo.list_authorizations(&query, today()).await.unwrap();
    assert_eq!(page.total, 6);
    let totals: Vec<i32> = page.data.iter().map(|i| i.row.authorized_services).collect();
    assert_eq!(totals, vec![40, 30]);
}

#[tokio::test]
async fn test_list_user_authorizations() {
    let repo = InMemoryRepository::seeded();
    let query = UserAuthorizationQuery {
        unique_code: Some("AUTH-2024-001".to_string()),
        ..UserAuthorizationQuery::default()
    };
    let page = repo.list_user_authorizations(seed::MARIA, &query).await.unwrap();
    assert_eq!(page.total, 2);

    let other_user = repo.list_user_authorizations(seed::JUAN, &query).await.unwrap();
    assert_eq!(other_user.total, 0);

    let by_voucher = repo
        .list_user_authorizations(
            seed::MARIA,
            &UserAuthorizationQuery {
                search: Some("26898475".to_string()),
                ..UserAuthorizationQuery::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(by_voucher.data[0].id, seed::MARIA_TRANSFER);
}

// --- In-Memory: Lifecycle Storage ---

#[tokio::test]
async fn test_annul_refuses_consumed_and_removes_unused() {
    let repo = InMemoryRepository::seeded();

    let refused = repo.annul_authorization(seed::MARIA_PRIMARY).await.unwrap();
    assert_eq!(
        refused,
        AnnulOutcome::ServicesConsumed {
            unique_code: "AUTH-2024-001".to_string(),
            consumed: 3,
            authorized: 30,
        }
    );
    assert!(repo.get_authorization(seed::MARIA_PRIMARY).await.unwrap().is_some());

    assert_eq!(
        repo.annul_authorization(seed::ANA_AUTH).await.unwrap(),
        AnnulOutcome::Annulled
    );
    assert!(repo.get_authorization(seed::ANA_AUTH).await.unwrap().is_none());
    let group = repo.get_group("AUTH-2024-003").await.unwrap().unwrap();
    assert_eq!(group.state, GroupState::Inactivo);

    assert_eq!(
        repo.annul_authorization(seed::ANA_AUTH).await.unwrap(),
        AnnulOutcome::NotFound
    );
}

#[tokio::test]
async fn test_insert_batch_rejects_taken_code_and_reactivates_groups() {
    let repo = InMemoryRepository::seeded();

    let taken = repo
        .insert_batch(
            Some(group("AUTH-2024-002", seed::ANA)),
            vec![authorization(seed::ANA, "AUTH-2024-002", 5, 5)],
        )
        .await;
    assert!(matches!(taken, Err(RepositoryError::DuplicateCode(code)) if code == "AUTH-2024-002"));

    // Retire Ana's group, then file a new permit under it.
    repo.annul_authorization(seed::ANA_AUTH).await.unwrap();
    let stored = repo
        .insert_batch(None, vec![authorization(seed::ANA, "AUTH-2024-003", 5, 5)])
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    let group = repo.get_group("AUTH-2024-003").await.unwrap().unwrap();
    assert_eq!(group.state, GroupState::Activo);
}

#[tokio::test]
async fn test_codes_with_prefix() {
    let repo = InMemoryRepository::seeded();
    let codes = repo.codes_with_prefix("AUTH-2024-").await.unwrap();
    assert_eq!(codes.len(), 5);
    assert!(repo.codes_with_prefix("AUTH-2026-").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_save_authorization_moves_group() {
    let repo = InMemoryRepository::seeded();
    let mut ana = repo.get_authorization(seed::ANA_AUTH).await.unwrap().unwrap();
    ana.unique_code = "AUTH-2026-123".to_string();

    let saved = repo
        .save_authorization(ana.clone(), Some(group("AUTH-2026-123", seed::ANA)))
        .await
        .unwrap();
    assert_eq!(saved.map(|a| a.unique_code), Some("AUTH-2026-123".to_string()));

    let old = repo.get_group("AUTH-2024-003").await.unwrap().unwrap();
    assert_eq!(old.state, GroupState::Inactivo);
    let groups = repo.get_user_groups(seed::ANA).await.unwrap();
    assert_eq!(groups.len(), 2);

    let missing = Authorization {
        id: Uuid::new_v4(),
        ..ana
    };
    assert!(repo.save_authorization(missing, None).await.unwrap().is_none());
}

// --- In-Memory: Tariffs & Notices ---

#[tokio::test]
async fn test_tariff_lookup_and_add() {
    let repo = InMemoryRepository::new();
    assert_eq!(repo.lookup_tariffs("").await.unwrap().len(), 3);
    assert_eq!(
        repo.lookup_tariffs("prem").await.unwrap(),
        vec!["TARIFA PREMIUM".to_string()]
    );

    assert!(repo.add_tariff("TARIFA NOCTURNA").await.unwrap());
    assert!(!repo.add_tariff("TARIFA NOCTURNA").await.unwrap());
    assert_eq!(repo.lookup_tariffs("noct").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_notice_acknowledgement_is_per_client_and_key() {
    let repo = InMemoryRepository::new();
    assert!(!repo.has_seen_notice("browser-a", "k1").await.unwrap());
    repo.mark_notice_seen("browser-a", "k1").await.unwrap();
    repo.mark_notice_seen("browser-a", "k1").await.unwrap();
    assert!(repo.has_seen_notice("browser-a", "k1").await.unwrap());
    assert!(!repo.has_seen_notice("browser-b", "k1").await.unwrap());
    assert!(!repo.has_seen_notice("browser-a", "k2").await.unwrap());
}

#[tokio::test]
async fn test_failing_store_and_latency() {
    let failing = InMemoryRepository::failing();
    assert!(matches!(
        failing.list_users(&UserQuery::default()).await,
        Err(RepositoryError::Unavailable)
    ));

    let slow = InMemoryRepository::new().with_latency(Duration::from_millis(30));
    let started = Instant::now();
    slow.lookup_tariffs("").await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(30));
}

// --- Postgres (requires DATABASE_URL) ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }

    async fn create_user(&self) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO users (id, full_name, national_id, phone, client, dependency, provider)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(id)
        .bind("TEST USER")
        .bind(id.simple().to_string())
        .bind("3000000000")
        .bind("TUTELAS EPS")
        .bind("TRANSPORTE PACIENTES REGIONAL CENTRAL")
        .bind("NUEVO RUMBO")
        .execute(&self.pool)
        .await
        .expect("Failed to create test user");
        id
    }
}

fn random_code() -> String {
    format!("AUTH-{}-{:03}", 2000 + (Uuid::new_v4().as_u128() % 900) as i32, Uuid::new_v4().as_u128() % 1000)
}

#[tokio::test]
#[serial]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_postgres_batch_annul_and_group_state() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let user_id = ctx.create_user().await;
    let code = random_code();

    let consumed = authorization(user_id, &code, 10, 7);
    let unused = authorization(user_id, &code, 5, 5);
    repo.insert_batch(Some(group(&code, user_id)), vec![consumed.clone(), unused.clone()])
        .await
        .unwrap();

    let duplicate = repo
        .insert_batch(Some(group(&code, user_id)), vec![authorization(user_id, &code, 1, 1)])
        .await;
    assert!(matches!(duplicate, Err(RepositoryError::DuplicateCode(_))));

    assert!(matches!(
        repo.annul_authorization(consumed.id).await.unwrap(),
        AnnulOutcome::ServicesConsumed { consumed: 3, authorized: 10, .. }
    ));
    assert_eq!(repo.annul_authorization(unused.id).await.unwrap(), AnnulOutcome::Annulled);
    assert_eq!(
        repo.get_group(&code).await.unwrap().unwrap().state,
        GroupState::Activo
    );

    assert_eq!(
        repo.delete_user(user_id).await.unwrap(),
        DeleteUserOutcome::ServicesConsumed { consumed: 3 }
    );
}

#[tokio::test]
#[serial]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_postgres_user_listing_and_deletion() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let user_id = ctx.create_user().await;
    let code = random_code();
    let unused = authorization(user_id, &code, 5, 5);
    repo.insert_batch(Some(group(&code, user_id)), vec![unused.clone()])
        .await
        .unwrap();

    let page = repo.list_users(&user_query(Some(&code))).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].user.id, user_id);

    let listed = repo
        .list_authorizations(
            &authorization_query(AuthorizationFilter {
                unique_code: Some(code.clone()),
                ..AuthorizationFilter::default()
            }),
            today(),
        )
        .await
        .unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.data[0].validity_status, ValidityStatus::Vigente);

    assert_eq!(repo.delete_user(user_id).await.unwrap(), DeleteUserOutcome::Deleted);
    assert!(repo.get_authorization(unused.id).await.unwrap().is_none());
}
