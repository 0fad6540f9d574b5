// Read-only reference data: countries, languages, units of measure
// Seeded out of band; the serving path only lists and fetches them

use serde::Serialize;

/// ISO 3166-1 country
#[derive(Debug, Clone, Serialize)]
pub struct Country {
    pub id: i64,
    /// ISO 3166-1 alpha-2 code, e.g. "TR"
    pub code: String,
    pub name: String,
}

/// ISO 639-1 language
#[derive(Debug, Clone, Serialize)]
pub struct Language {
    pub id: i64,
    /// e.g. "en", "en-US"
    pub code: String,
    pub name: String,
    pub is_active: bool,
}

/// Unit of measurement
#[derive(Debug, Clone, Serialize)]
pub struct Unit {
    pub id: i64,
    /// UN/ECE recommendation 20 code, e.g. "KGM"
    pub code: String,
    pub name: String,
}
