use chrono::{NaiveDate, Utc};
use transport_authorizations::{
    models::{
        Authorization, CreateAuthorizationBatch, GroupSelection, NewAuthorization,
        ReassignCodeRequest, UpdateAuthorizationRequest, UpdateUserRequest, ValidityStatus,
    },
    validation::{
        FIELD_CITIES, FIELD_DATES, FIELD_GROUP, FIELD_KM_RANGE, FIELD_MIPRES, FIELD_PROVIDER,
        FIELD_SERVICES, FIELD_VOUCHER, FieldErrors, is_well_formed_code,
        validate_authorization_update, validate_batch, validate_new_authorization,
        validate_reassignment, validate_user_update,
    },
};
use uuid::Uuid;

// --- Test Fixtures ---

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn valid_entry() -> NewAuthorization {
    NewAuthorization {
        mipres: "20240124126037795639".to_string(),
        voucher: "26898465".to_string(),
        start_date: date(2026, 1, 1),
        end_date: date(2026, 3, 1),
        authorized_services: 10,
        is_trip: true,
        is_transfer: false,
        is_km: false,
        km_range: String::new(),
        origin_city: "MEDELLIN".to_string(),
        destination_city: "BOGOTA".to_string(),
        provider: "NUEVO RUMBO".to_string(),
        tariff_code: None,
        tariff_name: Some("TARIFA BASICA".to_string()),
    }
}

fn stored(authorized: i32, remaining: i32, km_range: Option<&str>) -> Authorization {
    Authorization {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        unique_code: "AUTH-2026-001".to_string(),
        mipres: "M-1".to_string(),
        voucher: "V-1".to_string(),
        start_date: date(2026, 1, 1),
        end_date: date(2026, 3, 1),
        authorized_services: authorized,
        remaining_services: remaining,
        is_trip: true,
        is_transfer: false,
        origin_city: "MEDELLIN".to_string(),
        destination_city: "BOGOTA".to_string(),
        provider: "NUEVO RUMBO".to_string(),
        tariff_code: None,
        tariff_name: None,
        km_range: km_range.map(str::to_string),
        created_at: Utc::now(),
    }
}

fn user_form() -> UpdateUserRequest {
    UpdateUserRequest {
        full_name: "MARIA CARMEN JIMENEZ".to_string(),
        national_id: "43567890".to_string(),
        email: Some("maria@example.com".to_string()),
        phone: "3125222258".to_string(),
        address: None,
        city: Some("MEDELLIN".to_string()),
        client: "TUTELAS EPS".to_string(),
        dependency: "TRANSPORTE PACIENTES REGIONAL ANTIOQUIA".to_string(),
        requests_service: true,
        provider: "NUEVO RUMBO".to_string(),
    }
}

// --- New Authorizations ---

#[test]
fn test_valid_entry_has_no_errors() {
    assert!(validate_new_authorization(&valid_entry()).is_empty());
}

#[test]
fn test_missing_references_are_reported_per_field() {
    let entry = NewAuthorization {
        mipres: "  ".to_string(),
        voucher: String::new(),
        ..valid_entry()
    };
    let errors = validate_new_authorization(&entry);
    assert_eq!(errors.get(FIELD_MIPRES), Some("El número MiPres es requerido"));
    assert_eq!(errors.get(FIELD_VOUCHER), Some("El número de volante es requerido"));
}

#[test]
fn test_route_requires_two_different_cities() {
    let missing = NewAuthorization {
        destination_city: String::new(),
        ..valid_entry()
    };
    assert_eq!(
        validate_new_authorization(&missing).get(FIELD_CITIES),
        Some("Debe seleccionar tanto Ciudad A como Ciudad B")
    );

    let same = NewAuthorization {
        destination_city: "MEDELLIN".to_string(),
        ..valid_entry()
    };
    assert_eq!(
        validate_new_authorization(&same).get(FIELD_CITIES),
        Some("Ciudad A y Ciudad B deben ser diferentes")
    );
}

#[test]
fn test_route_cities_must_come_from_catalog() {
    let unknown = NewAuthorization {
        origin_city: "ATLANTIS".to_string(),
        destination_city: "medellin".to_string(),
        ..valid_entry()
    };
    assert_eq!(
        validate_new_authorization(&unknown).get(FIELD_CITIES),
        Some("Las ciudades deben seleccionarse del catálogo")
    );

    let padded = NewAuthorization {
        origin_city: " MEDELLIN ".to_string(),
        ..valid_entry()
    };
    assert!(validate_new_authorization(&padded).is_empty());

    let existing = stored(10, 10, None);
    let moved = UpdateAuthorizationRequest {
        destination_city: "ATLANTIS".to_string(),
        ..UpdateAuthorizationRequest::from(&existing)
    };
    assert!(validate_authorization_update(&existing, &moved).contains(FIELD_CITIES));
}

#[test]
fn test_services_must_be_positive() {
    for services in [0, -3] {
        let entry = NewAuthorization {
            authorized_services: services,
            ..valid_entry()
        };
        assert_eq!(
            validate_new_authorization(&entry).get(FIELD_SERVICES),
            Some("El número de servicios debe ser mayor a 0")
        );
    }
}

#[test]
fn test_end_date_must_follow_start_date() {
    let same_day = NewAuthorization {
        end_date: date(2026, 1, 1),
        ..valid_entry()
    };
    assert!(validate_new_authorization(&same_day).contains(FIELD_DATES));

    let reversed = NewAuthorization {
        end_date: date(2025, 12, 31),
        ..valid_entry()
    };
    assert_eq!(
        validate_new_authorization(&reversed).get(FIELD_DATES),
        Some("La fecha de fin debe ser posterior a la fecha de inicio")
    );
}

#[test]
fn test_km_range_required_only_when_marked_km() {
    let empty_range = NewAuthorization {
        is_km: true,
        km_range: " ".to_string(),
        ..valid_entry()
    };
    let errors = validate_new_authorization(&empty_range);
    assert_eq!(
        errors.get(FIELD_KM_RANGE),
        Some("El rango de KM es requerido cuando se marca como KM")
    );
    assert_eq!(errors.len(), 1);

    let with_range = NewAuthorization {
        is_km: true,
        km_range: "0-100 km".to_string(),
        ..valid_entry()
    };
    assert!(validate_new_authorization(&with_range).is_empty());

    let not_km = NewAuthorization {
        is_km: false,
        km_range: String::new(),
        ..valid_entry()
    };
    assert!(validate_new_authorization(&not_km).is_empty());
}

// --- Batches ---

#[test]
fn test_batch_errors_are_keyed_by_entry_index() {
    let batch = CreateAuthorizationBatch {
        user_id: Uuid::new_v4(),
        group: GroupSelection::New { unique_code: None },
        authorizations: vec![
            valid_entry(),
            NewAuthorization {
                mipres: String::new(),
                ..valid_entry()
            },
        ],
    };
    let errors = validate_batch(&batch);
    assert_eq!(errors.len(), 1);
    assert!(errors.contains("authorizations[1].mipres"));
    assert!(!errors.contains("authorizations[0].mipres"));
}

#[test]
fn test_batch_requires_entries_and_a_group() {
    let batch = CreateAuthorizationBatch {
        user_id: Uuid::new_v4(),
        group: GroupSelection::Existing {
            unique_code: String::new(),
        },
        authorizations: vec![],
    };
    let errors = validate_batch(&batch);
    assert_eq!(
        errors.get(FIELD_GROUP),
        Some("Debe seleccionar un grupo de autorización existente o crear uno nuevo")
    );
    assert_eq!(
        errors.get("authorizations"),
        Some("Debe incluir al menos una autorización")
    );
}

#[test]
fn test_batch_rejects_malformed_new_code() {
    let batch = CreateAuthorizationBatch {
        user_id: Uuid::new_v4(),
        group: GroupSelection::New {
            unique_code: Some("AUTH-26-1".to_string()),
        },
        authorizations: vec![valid_entry()],
    };
    assert_eq!(
        validate_batch(&batch).get(FIELD_GROUP),
        Some("El código único debe tener el formato AUTH-AAAA-NNN")
    );
}

#[test]
fn test_batch_accepts_new_code_with_surrounding_spaces() {
    let batch = CreateAuthorizationBatch {
        user_id: Uuid::new_v4(),
        group: GroupSelection::New {
            unique_code: Some(" AUTH-2031-001 ".to_string()),
        },
        authorizations: vec![valid_entry()],
    };
    assert!(validate_batch(&batch).is_empty());
}

#[test]
fn test_unique_code_shape() {
    assert!(is_well_formed_code("AUTH-2024-001"));
    assert!(is_well_formed_code("AUTH-2026-999"));
    assert!(!is_well_formed_code("AUTH-2024-1"));
    assert!(!is_well_formed_code("auth-2024-001"));
    assert!(!is_well_formed_code("AUTH-2024-001-X"));
    assert!(!is_well_formed_code("AUTH-20A4-001"));
}

// --- Edits ---

#[test]
fn test_update_cannot_drop_below_consumed() {
    let existing = stored(30, 27, None);
    let req = UpdateAuthorizationRequest {
        authorized_services: 2,
        ..UpdateAuthorizationRequest::from(&existing)
    };
    assert_eq!(
        validate_authorization_update(&existing, &req).get(FIELD_SERVICES),
        Some("El número de servicios no puede ser menor a los ya consumidos (3)")
    );

    let exactly_consumed = UpdateAuthorizationRequest {
        authorized_services: 3,
        ..UpdateAuthorizationRequest::from(&existing)
    };
    assert!(validate_authorization_update(&existing, &exactly_consumed).is_empty());
}

#[test]
fn test_update_keeps_km_range_required_for_km_permits() {
    let existing = stored(10, 10, Some("0-100 km"));
    let cleared = UpdateAuthorizationRequest {
        km_range: Some(String::new()),
        ..UpdateAuthorizationRequest::from(&existing)
    };
    assert!(validate_authorization_update(&existing, &cleared).contains(FIELD_KM_RANGE));

    let plain = stored(10, 10, None);
    let no_range = UpdateAuthorizationRequest::from(&plain);
    assert!(validate_authorization_update(&plain, &no_range).is_empty());
}

#[test]
fn test_reassignment_requires_code_and_provider() {
    let errors = validate_reassignment(&ReassignCodeRequest {
        unique_code: " ".to_string(),
        provider: String::new(),
        tariff_name: None,
    });
    assert_eq!(
        errors.get(FIELD_GROUP),
        Some("Debe seleccionar o generar un código único")
    );
    assert_eq!(
        errors.get(FIELD_PROVIDER),
        Some("Debe seleccionar una empresa prestadora")
    );
}

// --- Users ---

#[test]
fn test_user_form_rules() {
    assert!(validate_user_update(&user_form()).is_empty());

    let errors = validate_user_update(&UpdateUserRequest {
        full_name: String::new(),
        national_id: String::new(),
        email: Some("not-an-email".to_string()),
        ..user_form()
    });
    assert_eq!(errors.get("full_name"), Some("El nombre completo es requerido"));
    assert_eq!(errors.get("national_id"), Some("La identificación es requerida"));
    assert_eq!(errors.get("email"), Some("Formato de email inválido"));
}

#[test]
fn test_user_email_is_optional() {
    let errors = validate_user_update(&UpdateUserRequest {
        email: None,
        ..user_form()
    });
    assert!(errors.is_empty());
}

// --- Field Errors ---

#[test]
fn test_field_errors_keep_first_message() {
    let mut errors = FieldErrors::new();
    errors.insert("mipres", "first");
    errors.insert("mipres", "second");
    assert_eq!(errors.get("mipres"), Some("first"));
    assert!(errors.clone().into_result().is_err());
    assert!(FieldErrors::new().into_result().is_ok());

    let json = serde_json::to_value(&errors).unwrap();
    assert_eq!(json["mipres"], "first");
}

// --- Derived Status ---

#[test]
fn test_validity_is_derived_from_end_date() {
    let today = date(2026, 2, 1);
    assert_eq!(ValidityStatus::derive(date(2026, 2, 2), today), ValidityStatus::Vigente);
    // The end date itself is no longer valid.
    assert_eq!(ValidityStatus::derive(today, today), ValidityStatus::NoVigente);
    assert_eq!(ValidityStatus::derive(date(2024, 3, 29), today), ValidityStatus::NoVigente);

    let authorization = stored(30, 27, None);
    let detail = authorization.into_detail(today);
    assert_eq!(detail.consumed_services, 3);
    assert_eq!(detail.validity_status, ValidityStatus::Vigente);

    let json = serde_json::to_value(&detail).unwrap();
    assert_eq!(json["validity_status"], "VIGENTE");
    assert_eq!(json["unique_code"], "AUTH-2026-001");
}
