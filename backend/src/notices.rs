use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Acknowledgement key of the current "latest changes" notice. A new release ships a new key,
/// so clients that dismissed an older notice see the new one.
pub const LATEST_CHANGES_KEY: &str = "hasSeenLatestChanges_2025-06-18";

/// ChangeTarget
///
/// Where the dashboard goes when the user picks a change from the notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ChangeTarget {
    /// User management, then the detail view of the first listed user.
    FirstUserDetail,
    /// Authorization management list.
    Authorizations,
    /// Authorization management with the create modal open.
    CreateAuthorization,
}

/// ChangeEntry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ChangeEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    pub section: String,
    pub target: ChangeTarget,
}

/// LatestChangesNotice
///
/// Output schema of GET /notices/latest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LatestChangesNotice {
    pub key: String,
    pub released_on: NaiveDate,
    // False once this client has dismissed the notice.
    pub should_show: bool,
    pub changes: Vec<ChangeEntry>,
}

fn entry(id: &str, title: &str, description: &str, section: &str, target: ChangeTarget) -> ChangeEntry {
    ChangeEntry {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        section: section.to_string(),
        target,
    }
}

pub fn latest_changes() -> Vec<ChangeEntry> {
    vec![
        entry(
            "user-detail-status",
            "Eliminación del estado de vigencia en detalles de usuario",
            "Se removió la visualización del estado \"vigente/no vigente\" de los datos generales del usuario en la vista de detalles.",
            "Gestión de Usuarios",
            ChangeTarget::FirstUserDetail,
        ),
        entry(
            "authorization-delete-protection",
            "Protección contra eliminación de autorizaciones con servicios",
            "No es posible anular autorizaciones que tengan servicios asociados. La acción \"Eliminar\" ahora se llama \"Anular\".",
            "Gestión de Autorizaciones",
            ChangeTarget::Authorizations,
        ),
        entry(
            "tariff-dropdown",
            "Lista desplegable para tarifas autorizadas",
            "El nombre de tarifa autorizada se selecciona entre las tarifas existentes.",
            "Gestión de Autorizaciones",
            ChangeTarget::CreateAuthorization,
        ),
        entry(
            "multiple-authorizations",
            "Creación múltiple de autorizaciones con código único compartido",
            "Se pueden crear varias autorizaciones a la vez bajo el mismo código único.",
            "Gestión de Autorizaciones",
            ChangeTarget::CreateAuthorization,
        ),
    ]
}

pub fn target_of(change_id: &str) -> Option<ChangeTarget> {
    latest_changes()
        .into_iter()
        .find(|change| change.id == change_id)
        .map(|change| change.target)
}

/// Builds the notice for a client, given whether it already acknowledged the current key.
pub fn notice_for(already_seen: bool) -> LatestChangesNotice {
    LatestChangesNotice {
        key: LATEST_CHANGES_KEY.to_string(),
        released_on: NaiveDate::from_ymd_opt(2025, 6, 18).unwrap_or_default(),
        should_show: !already_seen,
        changes: latest_changes(),
    }
}
