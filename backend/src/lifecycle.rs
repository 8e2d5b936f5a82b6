//! Business rules for creating, editing, reassigning and annulling authorizations, and
//! for editing or removing users. Handlers call into here; the repository only stores.

use chrono::{Datelike, NaiveDate, Utc};
use rand::seq::SliceRandom;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    Authorization, AuthorizationDetail, AuthorizationGroup, CreateAuthorizationBatch,
    CreatedBatch, GroupSelection, GroupState, NewAuthorization, ReassignCodeRequest,
    UpdateAuthorizationRequest, UpdateUserRequest, User, UserDetail,
};
use crate::repository::{AnnulOutcome, DeleteUserOutcome, Repository, RepositoryError};
use crate::validation::{
    FIELD_GROUP, FieldErrors, is_well_formed_code, validate_authorization_update, validate_batch,
    validate_reassignment, validate_user_update,
};

/// Number of distinct serials per year: `000` to `999`.
pub const CODE_SPACE: u16 = 1000;

// Attempts for a batch whose generated code was taken between allocation and insert.
const INSERT_ATTEMPTS: usize = 3;

/// Current calendar date, the reference for every derived validity status.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// --- Unique Codes ---

pub fn code_for(year: i32, serial: u16) -> String {
    format!("AUTH-{year}-{serial:03}")
}

/// allocate_unique_code
///
/// Picks a random code of `year` that no group uses yet. Fails with
/// `AppError::CodeSpaceExhausted` once all serials of the year are taken.
pub async fn allocate_unique_code(repo: &dyn Repository, year: i32) -> Result<String, AppError> {
    let taken = repo.codes_with_prefix(&format!("AUTH-{year}-")).await?;
    let free: Vec<String> = (0..CODE_SPACE)
        .map(|serial| code_for(year, serial))
        .filter(|code| !taken.contains(code))
        .collect();

    // The rng is not Send; keep it out of any await.
    let picked = free.choose(&mut rand::thread_rng()).cloned();
    picked.ok_or(AppError::CodeSpaceExhausted(year))
}

fn new_group(unique_code: String, user_id: Uuid, today: NaiveDate) -> AuthorizationGroup {
    AuthorizationGroup {
        unique_code,
        user_id,
        created_on: today,
        state: GroupState::Activo,
        notes: None,
    }
}

fn group_error(message: &str) -> AppError {
    AppError::Validation(FieldErrors::single(FIELD_GROUP, message))
}

fn duplicate_to_conflict(error: RepositoryError) -> AppError {
    match error {
        RepositoryError::DuplicateCode(code) => AppError::DuplicateCode(code),
        other => AppError::Repository(other),
    }
}

// --- Creation ---

fn trimmed_opt(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Turns a validated entry into the record to store. Remaining starts at the authorized
/// total, and the KM range is only kept for distance-based permits.
pub fn build_authorization(
    entry: NewAuthorization,
    holder: &User,
    unique_code: &str,
) -> Authorization {
    let provider = match entry.provider.trim() {
        "" => holder.provider.clone(),
        provider => provider.to_string(),
    };
    Authorization {
        id: Uuid::new_v4(),
        user_id: holder.id,
        unique_code: unique_code.to_string(),
        mipres: entry.mipres.trim().to_string(),
        voucher: entry.voucher.trim().to_string(),
        start_date: entry.start_date,
        end_date: entry.end_date,
        authorized_services: entry.authorized_services,
        remaining_services: entry.authorized_services,
        is_trip: entry.is_trip,
        is_transfer: entry.is_transfer,
        origin_city: entry.origin_city.trim().to_string(),
        destination_city: entry.destination_city.trim().to_string(),
        provider,
        tariff_code: trimmed_opt(entry.tariff_code),
        tariff_name: trimmed_opt(entry.tariff_name),
        km_range: entry
            .is_km
            .then(|| entry.km_range.trim().to_string()),
        created_at: Utc::now(),
    }
}

/// create_batch
///
/// Validates every entry, resolves the unique code, then stores the whole batch at once.
pub async fn create_batch(
    repo: &dyn Repository,
    batch: CreateAuthorizationBatch,
    today: NaiveDate,
) -> Result<CreatedBatch, AppError> {
    validate_batch(&batch).into_result()?;

    let holder = repo
        .get_user(batch.user_id)
        .await?
        .ok_or(AppError::NotFound("Usuario"))?;

    let (mut unique_code, mut group, generated) = match &batch.group {
        GroupSelection::Existing { unique_code } => {
            let code = unique_code.trim().to_string();
            match repo.get_group(&code).await? {
                Some(existing) if existing.user_id == holder.id => (code, None, false),
                _ => {
                    return Err(group_error(
                        "El código único seleccionado no pertenece al usuario",
                    ));
                }
            }
        }
        GroupSelection::New {
            unique_code: Some(code),
        } => {
            let code = code.trim().to_string();
            if repo.get_group(&code).await?.is_some() {
                return Err(AppError::DuplicateCode(code));
            }
            let group = new_group(code.clone(), holder.id, today);
            (code, Some(group), false)
        }
        GroupSelection::New { unique_code: None } => {
            let code = allocate_unique_code(repo, today.year()).await?;
            let group = new_group(code.clone(), holder.id, today);
            (code, Some(group), true)
        }
    };

    let mut attempt = 1;
    loop {
        let records: Vec<Authorization> = batch
            .authorizations
            .iter()
            .cloned()
            .map(|entry| build_authorization(entry, &holder, &unique_code))
            .collect();

        match repo.insert_batch(group.clone(), records).await {
            Ok(stored) => {
                tracing::info!(
                    unique_code = %unique_code,
                    count = stored.len(),
                    user_id = %holder.id,
                    "authorization batch created"
                );
                return Ok(CreatedBatch {
                    unique_code,
                    authorizations: stored.into_iter().map(|a| a.into_detail(today)).collect(),
                });
            }
            Err(RepositoryError::DuplicateCode(code)) if generated && attempt < INSERT_ATTEMPTS => {
                tracing::warn!(unique_code = %code, attempt, "generated code taken, retrying");
                attempt += 1;
                unique_code = allocate_unique_code(repo, today.year()).await?;
                group = Some(new_group(unique_code.clone(), holder.id, today));
            }
            Err(e) => return Err(duplicate_to_conflict(e)),
        }
    }
}

// --- Edits ---

/// update_authorization
///
/// Field-level edit. Consumed services carry over: the remaining count becomes the new
/// total minus what was already used.
pub async fn update_authorization(
    repo: &dyn Repository,
    id: Uuid,
    req: UpdateAuthorizationRequest,
    today: NaiveDate,
) -> Result<AuthorizationDetail, AppError> {
    let existing = repo
        .get_authorization(id)
        .await?
        .ok_or(AppError::NotFound("Autorización"))?;

    validate_authorization_update(&existing, &req).into_result()?;

    let consumed = existing.consumed_services();
    let km_range = if existing.km_range.is_some() {
        trimmed_opt(req.km_range)
    } else {
        None
    };
    let updated = Authorization {
        mipres: req.mipres.trim().to_string(),
        voucher: req.voucher.trim().to_string(),
        start_date: req.start_date,
        end_date: req.end_date,
        authorized_services: req.authorized_services,
        remaining_services: req.authorized_services - consumed,
        is_trip: req.is_trip,
        is_transfer: req.is_transfer,
        origin_city: req.origin_city.trim().to_string(),
        destination_city: req.destination_city.trim().to_string(),
        provider: req.provider.trim().to_string(),
        tariff_code: trimmed_opt(req.tariff_code),
        tariff_name: trimmed_opt(req.tariff_name),
        km_range,
        ..existing
    };

    repo.save_authorization(updated, None)
        .await?
        .map(|a| a.into_detail(today))
        .ok_or(AppError::NotFound("Autorización"))
}

/// reassign_code
///
/// Moves an authorization to another code of the same user, or to a new code which opens
/// an ACTIVO group. Provider and tariff name are replaced at the same time.
pub async fn reassign_code(
    repo: &dyn Repository,
    id: Uuid,
    req: ReassignCodeRequest,
    today: NaiveDate,
) -> Result<AuthorizationDetail, AppError> {
    validate_reassignment(&req).into_result()?;

    let existing = repo
        .get_authorization(id)
        .await?
        .ok_or(AppError::NotFound("Autorización"))?;

    let code = req.unique_code.trim().to_string();
    let group = if code == existing.unique_code {
        None
    } else {
        match repo.get_group(&code).await? {
            Some(target) if target.user_id == existing.user_id => None,
            Some(_) => return Err(group_error("El código único pertenece a otro usuario")),
            None if is_well_formed_code(&code) => Some(new_group(code.clone(), existing.user_id, today)),
            None => {
                return Err(group_error(
                    "El código único debe tener el formato AUTH-AAAA-NNN",
                ));
            }
        }
    };

    let updated = Authorization {
        unique_code: code,
        provider: req.provider.trim().to_string(),
        tariff_name: trimmed_opt(req.tariff_name).or(existing.tariff_name.clone()),
        ..existing
    };

    repo.save_authorization(updated, group)
        .await
        .map_err(duplicate_to_conflict)?
        .map(|a| a.into_detail(today))
        .ok_or(AppError::NotFound("Autorización"))
}

// --- Annulment ---

pub async fn annul(repo: &dyn Repository, id: Uuid) -> Result<(), AppError> {
    match repo.annul_authorization(id).await? {
        AnnulOutcome::Annulled => {
            tracing::info!(authorization_id = %id, "authorization annulled");
            Ok(())
        }
        AnnulOutcome::NotFound => Err(AppError::NotFound("Autorización")),
        AnnulOutcome::ServicesConsumed {
            unique_code,
            consumed,
            authorized,
        } => Err(AppError::ServicesConsumed {
            unique_code,
            consumed,
            authorized,
        }),
    }
}

// --- Users ---

pub async fn user_detail(repo: &dyn Repository, id: Uuid) -> Result<UserDetail, AppError> {
    let user = repo.get_user(id).await?.ok_or(AppError::NotFound("Usuario"))?;
    let authorization_groups = repo.get_user_groups(id).await?;
    let authorizations = repo.user_authorizations(id).await?;
    Ok(UserDetail {
        user,
        authorization_groups,
        authorization_count: authorizations.len(),
        remaining_services: authorizations
            .iter()
            .map(|a| i64::from(a.remaining_services))
            .sum(),
    })
}

pub async fn update_user(
    repo: &dyn Repository,
    id: Uuid,
    req: UpdateUserRequest,
) -> Result<User, AppError> {
    // A cleared email field arrives as "".
    let req = UpdateUserRequest {
        email: trimmed_opt(req.email),
        ..req
    };
    let mut errors = validate_user_update(&req);

    let existing = repo.get_user(id).await?.ok_or(AppError::NotFound("Usuario"))?;

    let national_id = req.national_id.trim().to_string();
    if !national_id.is_empty() {
        if let Some(other) = repo.find_user_by_identification(&national_id).await? {
            if other.id != id {
                errors.insert("national_id", "La identificación ya está registrada");
            }
        }
    }
    errors.into_result()?;

    let updated = UpdateUserRequest {
        full_name: req.full_name.trim().to_string(),
        national_id,
        ..req
    }
    .apply_to(&existing);

    repo.update_user(updated)
        .await?
        .ok_or(AppError::NotFound("Usuario"))
}

pub async fn delete_user(repo: &dyn Repository, id: Uuid) -> Result<(), AppError> {
    match repo.delete_user(id).await? {
        DeleteUserOutcome::Deleted => {
            tracing::info!(user_id = %id, "user deleted");
            Ok(())
        }
        DeleteUserOutcome::NotFound => Err(AppError::NotFound("Usuario")),
        DeleteUserOutcome::ServicesConsumed { consumed } => {
            Err(AppError::UserServicesConsumed { consumed })
        }
    }
}
