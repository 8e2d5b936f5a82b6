//! Form validation for authorization and user edits.
//!
//! Every check collects into a [`FieldErrors`] map keyed by field name, so the
//! dashboard can render each message next to its input. Nothing is persisted while
//! the map is non-empty.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use validator::Validate;

use crate::catalog;
use crate::models::{
    Authorization, CreateAuthorizationBatch, GroupSelection, NewAuthorization,
    ReassignCodeRequest, UpdateAuthorizationRequest, UpdateUserRequest,
};

// Field keys shared by the create and edit forms.
pub const FIELD_MIPRES: &str = "mipres";
pub const FIELD_VOUCHER: &str = "voucher";
pub const FIELD_CITIES: &str = "cities";
pub const FIELD_SERVICES: &str = "authorized_services";
pub const FIELD_DATES: &str = "dates";
pub const FIELD_KM_RANGE: &str = "km_range";
pub const FIELD_GROUP: &str = "group";
pub const FIELD_AUTHORIZATIONS: &str = "authorizations";
pub const FIELD_PROVIDER: &str = "provider";

/// FieldErrors
///
/// Per-field validation messages. The first message recorded for a field wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.insert(field, message);
        errors
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    /// Merges `other` under `prefix.` so batch entries keep distinct keys.
    pub fn merge_prefixed(&mut self, prefix: &str, other: FieldErrors) {
        for (field, message) in other.0 {
            self.insert(format!("{prefix}.{field}"), message);
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for FieldErrors {}

/// Route, window and count rules shared by creation and edits.
fn check_permit_core(
    errors: &mut FieldErrors,
    origin_city: &str,
    destination_city: &str,
    authorized_services: i32,
    start_date: NaiveDate,
    end_date: NaiveDate,
) {
    let origin = origin_city.trim();
    let destination = destination_city.trim();
    if origin.is_empty() || destination.is_empty() {
        errors.insert(FIELD_CITIES, "Debe seleccionar tanto Ciudad A como Ciudad B");
    } else if !catalog::is_known_city(origin) || !catalog::is_known_city(destination) {
        errors.insert(FIELD_CITIES, "Las ciudades deben seleccionarse del catálogo");
    } else if origin == destination {
        errors.insert(FIELD_CITIES, "Ciudad A y Ciudad B deben ser diferentes");
    }

    if authorized_services <= 0 {
        errors.insert(FIELD_SERVICES, "El número de servicios debe ser mayor a 0");
    }

    if end_date <= start_date {
        errors.insert(FIELD_DATES, "La fecha de fin debe ser posterior a la fecha de inicio");
    }
}

fn check_references(errors: &mut FieldErrors, mipres: &str, voucher: &str) {
    if mipres.trim().is_empty() {
        errors.insert(FIELD_MIPRES, "El número MiPres es requerido");
    }
    if voucher.trim().is_empty() {
        errors.insert(FIELD_VOUCHER, "El número de volante es requerido");
    }
}

/// Validates one authorization to be created.
pub fn validate_new_authorization(input: &NewAuthorization) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_references(&mut errors, &input.mipres, &input.voucher);
    check_permit_core(
        &mut errors,
        &input.origin_city,
        &input.destination_city,
        input.authorized_services,
        input.start_date,
        input.end_date,
    );
    if input.is_km && input.km_range.trim().is_empty() {
        errors.insert(FIELD_KM_RANGE, "El rango de KM es requerido cuando se marca como KM");
    }
    errors
}

/// Validates a whole creation batch. Entry errors are keyed `authorizations[i].<field>`.
pub fn validate_batch(batch: &CreateAuthorizationBatch) -> FieldErrors {
    let mut errors = FieldErrors::new();

    match &batch.group {
        GroupSelection::Existing { unique_code } if unique_code.trim().is_empty() => {
            errors.insert(
                FIELD_GROUP,
                "Debe seleccionar un grupo de autorización existente o crear uno nuevo",
            );
        }
        GroupSelection::New {
            unique_code: Some(code),
        } if !is_well_formed_code(code.trim()) => {
            errors.insert(FIELD_GROUP, "El código único debe tener el formato AUTH-AAAA-NNN");
        }
        _ => {}
    }

    if batch.authorizations.is_empty() {
        errors.insert(FIELD_AUTHORIZATIONS, "Debe incluir al menos una autorización");
    }

    for (index, entry) in batch.authorizations.iter().enumerate() {
        let entry_errors = validate_new_authorization(entry);
        errors.merge_prefixed(&format!("{FIELD_AUTHORIZATIONS}[{index}]"), entry_errors);
    }

    errors
}

/// Validates an edit of `existing`.
///
/// The authorized total may not drop below what has already been consumed, and a
/// KM range can only be edited on permits that were created as distance-based.
pub fn validate_authorization_update(
    existing: &Authorization,
    req: &UpdateAuthorizationRequest,
) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_references(&mut errors, &req.mipres, &req.voucher);
    check_permit_core(
        &mut errors,
        &req.origin_city,
        &req.destination_city,
        req.authorized_services,
        req.start_date,
        req.end_date,
    );

    let consumed = existing.consumed_services();
    if req.authorized_services > 0 && req.authorized_services < consumed {
        errors.insert(
            FIELD_SERVICES,
            format!("El número de servicios no puede ser menor a los ya consumidos ({consumed})"),
        );
    }

    if existing.km_range.is_some()
        && req.km_range.as_deref().is_none_or(|range| range.trim().is_empty())
    {
        errors.insert(FIELD_KM_RANGE, "El rango de KM es requerido cuando se marca como KM");
    }

    errors
}

pub fn validate_reassignment(req: &ReassignCodeRequest) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if req.unique_code.trim().is_empty() {
        errors.insert(FIELD_GROUP, "Debe seleccionar o generar un código único");
    }
    if req.provider.trim().is_empty() {
        errors.insert(FIELD_PROVIDER, "Debe seleccionar una empresa prestadora");
    }
    errors
}

/// Validates the edit-user form through its `validator` rules.
pub fn validate_user_update(req: &UpdateUserRequest) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if let Err(report) = req.validate() {
        for (field, failures) in report.field_errors() {
            let message = failures
                .iter()
                .find_map(|failure| failure.message.as_ref())
                .map(|message| message.to_string())
                .unwrap_or_else(|| "Valor inválido".to_string());
            errors.insert(field.to_string(), message);
        }
    }
    errors
}

/// Checks the `AUTH-<year>-<NNN>` shape of a unique code.
pub fn is_well_formed_code(code: &str) -> bool {
    let mut parts = code.split('-');
    let (Some(prefix), Some(year), Some(serial), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    prefix == "AUTH"
        && year.len() == 4
        && year.chars().all(|c| c.is_ascii_digit())
        && serial.len() == 3
        && serial.chars().all(|c| c.is_ascii_digit())
}
