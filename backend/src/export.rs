use std::borrow::Cow;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::catalog::city_label;
use crate::models::{Authorization, AuthorizationListItem};

pub const EXPORT_HEADERS: [&str; 14] = [
    "Código único",
    "Nombre",
    "Identificación",
    "Volante",
    "Mipres",
    "Ciudad A",
    "Ciudad B",
    "Cantidad servicios autorizados",
    "Cantidad servicios restantes",
    "Fecha inicio vigencia",
    "Fecha fin vigencia",
    "Dependencia",
    "Estado vigencia",
    "Empresa Prestadora",
];

/// ExportFormat
///
/// `csv` is comma-delimited, `txt` is pipe-delimited. Both are UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Txt,
}

impl ExportFormat {
    pub fn delimiter(&self) -> char {
        match self {
            ExportFormat::Csv => ',',
            ExportFormat::Txt => '|',
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Txt => "txt",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Txt => "text/plain; charset=utf-8",
        }
    }
}

/// ExportParams
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportParams {
    pub format: ExportFormat,
}

/// A rendered download: file name, MIME type and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

impl ExportFile {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// dd/mm/yyyy
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Quotes a field that contains the delimiter, a quote or a line break. Inner quotes are doubled.
fn escape_field(value: &str, delimiter: char) -> Cow<'_, str> {
    if value.contains(delimiter) || value.contains('"') || value.contains('\n') || value.contains('\r') {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn join_line<'a>(fields: impl IntoIterator<Item = Cow<'a, str>>, delimiter: char) -> String {
    fields
        .into_iter()
        .map(|field| escape_field(&field, delimiter).into_owned())
        .collect::<Vec<_>>()
        .join(&delimiter.to_string())
}

fn export_line(item: &AuthorizationListItem) -> [Cow<'_, str>; 14] {
    let row = &item.row;
    [
        Cow::Borrowed(row.unique_code.as_str()),
        Cow::Borrowed(row.full_name.as_str()),
        Cow::Borrowed(row.identification.as_str()),
        Cow::Borrowed(row.voucher.as_str()),
        Cow::Borrowed(row.mipres.as_str()),
        Cow::Borrowed(city_label(&row.origin_city)),
        Cow::Borrowed(city_label(&row.destination_city)),
        Cow::Owned(row.authorized_services.to_string()),
        Cow::Owned(row.remaining_services.to_string()),
        Cow::Owned(format_date(row.start_date)),
        Cow::Owned(format_date(row.end_date)),
        Cow::Borrowed(row.dependency.as_str()),
        Cow::Borrowed(item.validity_status.as_str()),
        Cow::Borrowed(row.provider.as_str()),
    ]
}

/// Renders the header plus one line per record, joined by `\n` with no trailing newline.
pub fn render_rows(items: &[AuthorizationListItem], format: ExportFormat) -> String {
    let delimiter = format.delimiter();
    std::iter::once(join_line(EXPORT_HEADERS.map(Cow::Borrowed), delimiter))
        .chain(items.iter().map(|item| join_line(export_line(item), delimiter)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn export_authorizations(
    items: &[AuthorizationListItem],
    format: ExportFormat,
    today: NaiveDate,
) -> ExportFile {
    ExportFile {
        filename: format!("autorizaciones_{}.{}", today.format("%Y-%m-%d"), format.extension()),
        content_type: format.content_type(),
        body: render_rows(items, format),
    }
}

/// render_certificate
///
/// Plain-text certificate for one authorization. The KM line only appears on
/// distance-based permits.
pub fn render_certificate(authorization: &Authorization, today: NaiveDate) -> ExportFile {
    let mut lines = vec![
        "CERTIFICADO DE AUTORIZACIÓN".to_string(),
        String::new(),
        format!("Código Único: {}", authorization.unique_code),
        format!("No. MiPres: {}", authorization.mipres),
        format!("No. Volante: {}", authorization.voucher),
        format!("Servicios Autorizados: {}", authorization.authorized_services),
        format!("Servicios Restantes: {}", authorization.remaining_services),
        format!(
            "Ruta: {} → {}",
            city_label(&authorization.origin_city),
            city_label(&authorization.destination_city)
        ),
        format!(
            "Vigencia: {} - {}",
            format_date(authorization.start_date),
            format_date(authorization.end_date)
        ),
        format!("Estado: {}", authorization.status(today).as_str()),
    ];
    if let Some(range) = &authorization.km_range {
        lines.push(format!("Rango KM: {range}"));
    }
    lines.push(String::new());
    lines.push("Este certificado es válido únicamente para los servicios especificados.".to_string());

    ExportFile {
        filename: format!(
            "certificado_{}_{}.txt",
            authorization.unique_code, authorization.mipres
        ),
        content_type: ExportFormat::Txt.content_type(),
        body: lines.join("\n"),
    }
}
