//! Reference dataset loaded into a fresh in-memory store.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::models::{Authorization, AuthorizationGroup, GroupState, User};

pub const MARIA: Uuid = Uuid::from_u128(1);
pub const JUAN: Uuid = Uuid::from_u128(2);
pub const ANA: Uuid = Uuid::from_u128(3);
pub const CARLOS: Uuid = Uuid::from_u128(4);
pub const PATRICIA: Uuid = Uuid::from_u128(5);

// 30 authorized, 27 remaining.
pub const MARIA_PRIMARY: Uuid = Uuid::from_u128(101);
// 20 authorized, 18 remaining, same code as MARIA_PRIMARY.
pub const MARIA_TRANSFER: Uuid = Uuid::from_u128(102);
pub const JUAN_AUTH: Uuid = Uuid::from_u128(201);
// 20 authorized, 20 remaining: the only seeded record that can be annulled.
pub const ANA_AUTH: Uuid = Uuid::from_u128(301);
pub const CARLOS_AUTH: Uuid = Uuid::from_u128(401);
pub const PATRICIA_AUTH: Uuid = Uuid::from_u128(501);

const ANTIOQUIA: &str = "TRANSPORTE PACIENTES REGIONAL ANTIOQUIA";
const CENTRAL: &str = "TRANSPORTE PACIENTES REGIONAL CENTRAL";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn timestamp(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

fn user(id: Uuid, name: &str, national_id: &str, phone: &str, client: &str, dependency: &str, provider: &str) -> User {
    User {
        id,
        full_name: name.to_string(),
        national_id: national_id.to_string(),
        email: None,
        phone: phone.to_string(),
        address: None,
        city: None,
        client: client.to_string(),
        dependency: dependency.to_string(),
        requests_service: true,
        provider: provider.to_string(),
        created_at: timestamp(2024, 1, 10),
    }
}

pub fn users() -> Vec<User> {
    vec![
        user(MARIA, "MARIA CARMEN JIMENEZ", "43567890", "3125222258", "TUTELAS EPS", ANTIOQUIA, "NUEVO RUMBO"),
        user(JUAN, "JUAN CARLOS MARTINEZ", "71234567", "3157894561", "SERVICIOS MEDICOS", CENTRAL, "RENETUR"),
        user(ANA, "ANA SOFIA RODRIGUEZ", "52789123", "3209876543", "TUTELAS EPS", CENTRAL, "NUEVO RUMBO"),
        user(CARLOS, "CARLOS ANDRES LOPEZ", "98456123", "3112345678", "SERVICIOS MEDICOS", ANTIOQUIA, "RENETUR"),
        user(PATRICIA, "PATRICIA ELENA GOMEZ", "43123789", "3145678901", "TUTELAS EPS", CENTRAL, "NUEVO RUMBO"),
    ]
}

fn group(code: &str, user_id: Uuid, created_on: NaiveDate, notes: &str) -> AuthorizationGroup {
    AuthorizationGroup {
        unique_code: code.to_string(),
        user_id,
        created_on,
        state: GroupState::Activo,
        notes: Some(notes.to_string()),
    }
}

pub fn groups() -> Vec<AuthorizationGroup> {
    vec![
        group("AUTH-2024-001", MARIA, date(2024, 1, 15), "Grupo de autorizaciones para servicios básicos"),
        group("AUTH-2024-002", JUAN, date(2024, 2, 1), "Grupo de autorizaciones para servicios especiales"),
        group("AUTH-2024-003", ANA, date(2024, 2, 15), "Grupo adicional de autorizaciones"),
        group("AUTH-2024-004", CARLOS, date(2024, 3, 1), "Autorizaciones de marzo"),
        group("AUTH-2024-005", PATRICIA, date(2024, 3, 15), "Autorizaciones especiales"),
    ]
}

struct SeedAuthorization {
    id: Uuid,
    user_id: Uuid,
    code: &'static str,
    mipres: &'static str,
    voucher: &'static str,
    window: (NaiveDate, NaiveDate),
    services: (i32, i32),
    trip: bool,
    route: (&'static str, &'static str),
    provider: &'static str,
}

impl From<SeedAuthorization> for Authorization {
    fn from(s: SeedAuthorization) -> Self {
        Authorization {
            id: s.id,
            user_id: s.user_id,
            unique_code: s.code.to_string(),
            mipres: s.mipres.to_string(),
            voucher: s.voucher.to_string(),
            start_date: s.window.0,
            end_date: s.window.1,
            authorized_services: s.services.0,
            remaining_services: s.services.1,
            is_trip: s.trip,
            is_transfer: !s.trip,
            origin_city: s.route.0.to_string(),
            destination_city: s.route.1.to_string(),
            provider: s.provider.to_string(),
            tariff_code: None,
            tariff_name: None,
            km_range: None,
            created_at: timestamp(s.window.0.year(), s.window.0.month(), s.window.0.day()),
        }
    }
}

pub fn authorizations() -> Vec<Authorization> {
    let seeds = [
        SeedAuthorization {
            id: MARIA_PRIMARY,
            user_id: MARIA,
            code: "AUTH-2024-001",
            mipres: "20240124126037795639",
            voucher: "26898465",
            window: (date(2024, 1, 29), date(2024, 3, 29)),
            services: (30, 27),
            trip: true,
            route: ("MEDELLIN", "BOGOTA"),
            provider: "NUEVO RUMBO",
        },
        SeedAuthorization {
            id: MARIA_TRANSFER,
            user_id: MARIA,
            code: "AUTH-2024-001",
            mipres: "20240124126037795650",
            voucher: "26898475",
            window: (date(2024, 2, 1), date(2024, 4, 1)),
            services: (20, 18),
            trip: false,
            route: ("MEDELLIN", "CALI"),
            provider: "NUEVO RUMBO",
        },
        SeedAuthorization {
            id: JUAN_AUTH,
            user_id: JUAN,
            code: "AUTH-2024-002",
            mipres: "20240124126037795640",
            voucher: "26898466",
            window: (date(2024, 2, 1), date(2024, 2, 29)),
            services: (15, 12),
            trip: false,
            route: ("BOGOTA", "CALI"),
            provider: "RENETUR",
        },
        SeedAuthorization {
            id: ANA_AUTH,
            user_id: ANA,
            code: "AUTH-2024-003",
            mipres: "20240124126037795641",
            voucher: "26898467",
            window: (date(2024, 2, 15), date(2024, 4, 15)),
            services: (20, 20),
            trip: true,
            route: ("CALI", "BARRANQUILLA"),
            provider: "NUEVO RUMBO",
        },
        SeedAuthorization {
            id: CARLOS_AUTH,
            user_id: CARLOS,
            code: "AUTH-2024-004",
            mipres: "20240124126037795642",
            voucher: "26898468",
            window: (date(2024, 3, 1), date(2024, 5, 1)),
            services: (25, 20),
            trip: true,
            route: ("BUCARAMANGA", "CARTAGENA"),
            provider: "RENETUR",
        },
        SeedAuthorization {
            id: PATRICIA_AUTH,
            user_id: PATRICIA,
            code: "AUTH-2024-005",
            mipres: "20240124126037795643",
            voucher: "26898469",
            window: (date(2024, 3, 15), date(2024, 5, 15)),
            services: (40, 35),
            trip: true,
            route: ("PEREIRA", "MANIZALES"),
            provider: "NUEVO RUMBO",
        },
    ];
    seeds.into_iter().map(Authorization::from).collect()
}
