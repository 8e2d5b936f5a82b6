//! Static option lists for the dashboard's dropdowns.

use std::sync::LazyLock;

use crate::models::CatalogEntry;

pub const CLIENTS: &[&str] = &["TUTELAS EPS", "SERVICIOS MEDICOS"];

pub const DEPENDENCIES: &[&str] = &[
    "TRANSPORTE PACIENTES REGIONAL ANTIOQUIA",
    "TRANSPORTE PACIENTES REGIONAL CENTRAL",
];

pub const PROVIDERS: &[&str] = &["NUEVO RUMBO", "RENETUR"];

/// Tariffs every fresh store starts with.
pub const DEFAULT_TARIFFS: &[&str] = &["TARIFA BASICA", "TARIFA PREMIUM", "TARIFA ESPECIAL"];

// (code, label) pairs of the Colombian cities a route can use.
const CITY_TABLE: &[(&str, &str)] = &[
    ("BOGOTA", "Bogotá D.C."),
    ("MEDELLIN", "Medellín"),
    ("CALI", "Cali"),
    ("BARRANQUILLA", "Barranquilla"),
    ("CARTAGENA", "Cartagena"),
    ("CUCUTA", "Cúcuta"),
    ("BUCARAMANGA", "Bucaramanga"),
    ("PEREIRA", "Pereira"),
    ("SANTA_MARTA", "Santa Marta"),
    ("IBAGUE", "Ibagué"),
    ("PASTO", "Pasto"),
    ("MANIZALES", "Manizales"),
    ("NEIVA", "Neiva"),
    ("VILLAVICENCIO", "Villavicencio"),
    ("ARMENIA", "Armenia"),
    ("VALLEDUPAR", "Valledupar"),
    ("MONTERIA", "Montería"),
    ("SINCELEJO", "Sincelejo"),
    ("POPAYAN", "Popayán"),
    ("TUNJA", "Tunja"),
    ("FLORENCIA", "Florencia"),
    ("RIOHACHA", "Riohacha"),
    ("YOPAL", "Yopal"),
    ("QUIBDO", "Quibdó"),
    ("MOCOA", "Mocoa"),
    ("SAN_JOSE_DEL_GUAVIARE", "San José del Guaviare"),
    ("LETICIA", "Leticia"),
    ("INIRIDA", "Inírida"),
    ("PUERTO_CARRENO", "Puerto Carreño"),
    ("MITU", "Mitú"),
    ("BELLO", "Bello"),
    ("ITAGUI", "Itagüí"),
    ("ENVIGADO", "Envigado"),
    ("APARTADO", "Apartadó"),
    ("TURBO", "Turbo"),
    ("RIONEGRO", "Rionegro"),
    ("SABANETA", "Sabaneta"),
    ("LA_ESTRELLA", "La Estrella"),
    ("COPACABANA", "Copacabana"),
    ("GIRARDOTA", "Girardota"),
    ("PALMIRA", "Palmira"),
    ("BUENAVENTURA", "Buenaventura"),
    ("TULUA", "Tuluá"),
    ("CARTAGO", "Cartago"),
    ("BUGA", "Buga"),
    ("JAMUNDI", "Jamundí"),
    ("YUMBO", "Yumbo"),
    ("SOACHA", "Soacha"),
    ("GIRARDOT", "Girardot"),
    ("ZIPAQUIRA", "Zipaquirá"),
    ("FACATATIVA", "Facatativá"),
    ("CHÍA", "Chía"),
    ("MOSQUERA", "Mosquera"),
    ("MADRID", "Madrid"),
    ("FUNZA", "Funza"),
    ("CAJICA", "Cajicá"),
    ("SOLEDAD", "Soledad"),
    ("MALAMBO", "Malambo"),
    ("SABANALARGA", "Sabanalarga"),
    ("PUERTO_COLOMBIA", "Puerto Colombia"),
    ("FLORIDABLANCA", "Floridablanca"),
    ("GIRON", "Girón"),
    ("PIEDECUESTA", "Piedecuesta"),
    ("BARRANCABERMEJA", "Barrancabermeja"),
    ("SAN_GIL", "San Gil"),
    ("BARBOSA", "Barbosa"),
    ("MAGANGUE", "Magangué"),
    ("TURBACO", "Turbaco"),
    ("ARJONA", "Arjona"),
    ("DOSQUEBRADAS", "Dosquebradas"),
    ("LA_VIRGINIA", "La Virginia"),
    ("SANTA_ROSA_DE_CABAL", "Santa Rosa de Cabal"),
    ("ESPINAL", "Espinal"),
    ("MELGAR", "Melgar"),
    ("HONDA", "Honda"),
    ("CHAPARRAL", "Chaparral"),
    ("VILLA_DEL_ROSARIO", "Villa del Rosario"),
    ("LOS_PATIOS", "Los Patios"),
    ("OCAÑA", "Ocaña"),
    ("VILLAMARIA", "Villamaría"),
    ("CHINCHINA", "Chinchiná"),
    ("LA_DORADA", "La Dorada"),
    ("CALARCA", "Calarcá"),
    ("LA_TEBAIDA", "La Tebaida"),
    ("MONTENEGRO", "Montenegro"),
    ("TUMACO", "Tumaco"),
    ("IPIALES", "Ipiales"),
    ("GARZON", "Garzón"),
    ("PITALITO", "Pitalito"),
    ("ACACIAS", "Acacías"),
    ("GRANADA", "Granada"),
    ("LORICA", "Lorica"),
    ("CERETE", "Cereté"),
    ("SAHAGUN", "Sahagún"),
    ("COROZAL", "Corozal"),
    ("AGUACHICA", "Aguachica"),
    ("BOSCONIA", "Bosconia"),
    ("CIENAGA", "Ciénaga"),
    ("FUNDACION", "Fundación"),
    ("MAICAO", "Maicao"),
    ("DUITAMA", "Duitama"),
    ("SOGAMOSO", "Sogamoso"),
    ("CHIQUINQUIRA", "Chiquinquirá"),
    ("SANTANDER_DE_QUILICHAO", "Santander de Quilichao"),
    ("AGUAZUL", "Aguazul"),
    ("ARAUCA", "Arauca"),
    ("PUERTO_ASIS", "Puerto Asís"),
    ("SAN_VICENTE_DEL_CAGUAN", "San Vicente del Caguán"),
    ("PUERTO_NARIÑO", "Puerto Nariño"),
    ("BARRANCO_MINAS", "Barranco Minas"),
    ("CALAMAR", "Calamar"),
    ("CARURU", "Carurú"),
];

static CITIES: LazyLock<Vec<CatalogEntry>> = LazyLock::new(|| {
    let mut cities: Vec<CatalogEntry> = CITY_TABLE
        .iter()
        .map(|(value, label)| CatalogEntry {
            value: value.to_string(),
            label: label.to_string(),
        })
        .collect();
    cities.sort_by(|a, b| {
        fold_accents(&a.label)
            .cmp(&fold_accents(&b.label))
            .then_with(|| a.label.cmp(&b.label))
    });
    cities
});

/// Cities ordered by label, ignoring accents.
pub fn cities() -> &'static [CatalogEntry] {
    &CITIES
}

/// Display label for a city code. Unknown codes are shown as-is.
pub fn city_label(code: &str) -> &str {
    CITY_TABLE
        .iter()
        .find(|(value, _)| *value == code)
        .map_or(code, |(_, label)| *label)
}

pub fn is_known_city(code: &str) -> bool {
    CITY_TABLE.iter().any(|(value, _)| *value == code)
}

pub fn entries(values: &[&str]) -> Vec<CatalogEntry> {
    values
        .iter()
        .map(|v| CatalogEntry {
            value: v.to_string(),
            label: v.to_string(),
        })
        .collect()
}

/// Lowercases and strips Spanish diacritics so "Ibagué" sorts next to "Ibague".
pub fn fold_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'Á' => 'a',
            'é' | 'É' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'Ó' => 'o',
            'ú' | 'Ú' | 'ü' | 'Ü' => 'u',
            'ñ' | 'Ñ' => 'n',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}
