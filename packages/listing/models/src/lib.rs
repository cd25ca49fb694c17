#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Listing documents and the canonical flat property record.
//!
//! Every saved listing page is wrapped in a [`RawDocument`]. Extraction turns
//! it into at most one [`PropertyRecord`], whose serialized field names and
//! order define the exported CSV columns (see [`COLUMNS`]).

use serde::{Serialize, Serializer};

/// Placeholder stored in `url_publicacion` when the page has no usable
/// canonical link.
pub const URL_NOT_FOUND: &str = "URL no encontrada";

/// Placeholder for `tipo_propiedad` when the listing omits its type.
pub const UNKNOWN_PROPERTY_TYPE: &str = "Indeterminado";

/// Placeholder for missing free-text fields (neighborhood, address, currency).
pub const NOT_AVAILABLE: &str = "N/A";

/// Exported column names, in output order.
pub const COLUMNS: &[&str] = &[
    "origen_archivo",
    "url_publicacion",
    "tipo_propiedad",
    "sup_total",
    "sup_cubierta",
    "ambientes",
    "banos",
    "toilettes",
    "cocheras",
    "dormitorios",
    "antiguedad_anos",
    "dias_publicado",
    "apto_credito",
    "permite_mascotas",
    "apto_profesional",
    "parrilla",
    "dormitorio_en_suite",
    "patio",
    "barrio",
    "direccion",
    "moneda",
    "precio",
    "expensas",
    "latitud",
    "longitud",
    "flag_terraza",
    "flag_quincho",
    "flag_luminoso",
    "flag_sotano",
    "flag_pileta",
    "flag_lavadero",
    "flag_subte",
    "flag_a_reciclar",
];

/// A saved listing page: HTML text plus the filename it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// File name (not the full path) used to attribute records and errors.
    pub filename: String,
    /// Full HTML text of the page.
    pub html: String,
}

impl RawDocument {
    /// Creates a document from its filename and HTML text.
    #[must_use]
    pub fn new(filename: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            html: html.into(),
        }
    }
}

/// One extracted listing, flattened for tabular export.
///
/// Boolean attributes serialize as `0`/`1`. Optional side-channel values
/// (`dias_publicado`, `latitud`, `longitud`) serialize as empty cells when
/// absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyRecord {
    /// Source HTML filename.
    #[serde(rename = "origen_archivo")]
    pub source_file: String,
    /// Canonical URL of the listing, or [`URL_NOT_FOUND`].
    #[serde(rename = "url_publicacion")]
    pub listing_url: String,
    /// Property type name (e.g. "Casa", "PH").
    #[serde(rename = "tipo_propiedad")]
    pub property_type: String,
    /// Total surface in m².
    #[serde(rename = "sup_total")]
    pub total_area: f64,
    /// Covered surface in m².
    #[serde(rename = "sup_cubierta")]
    pub covered_area: f64,
    #[serde(rename = "ambientes")]
    pub rooms: i64,
    #[serde(rename = "banos")]
    pub bathrooms: i64,
    #[serde(rename = "toilettes")]
    pub toilets: i64,
    #[serde(rename = "cocheras")]
    pub garages: i64,
    #[serde(rename = "dormitorios")]
    pub bedrooms: i64,
    /// Building age in years. Textual ages ("A estrenar") count as 0.
    #[serde(rename = "antiguedad_anos")]
    pub age_years: i64,
    /// Days since the listing was published, when the page states it.
    #[serde(rename = "dias_publicado")]
    pub days_published: Option<u32>,
    #[serde(rename = "apto_credito", serialize_with = "as_flag")]
    pub mortgage_eligible: bool,
    #[serde(rename = "permite_mascotas", serialize_with = "as_flag")]
    pub pets_allowed: bool,
    #[serde(rename = "apto_profesional", serialize_with = "as_flag")]
    pub professional_use: bool,
    #[serde(rename = "parrilla", serialize_with = "as_flag")]
    pub grill: bool,
    #[serde(rename = "dormitorio_en_suite", serialize_with = "as_flag")]
    pub en_suite_bedroom: bool,
    #[serde(rename = "patio", serialize_with = "as_flag")]
    pub patio: bool,
    /// Neighborhood name, or [`NOT_AVAILABLE`].
    #[serde(rename = "barrio")]
    pub neighborhood: String,
    /// Street address, or [`NOT_AVAILABLE`].
    #[serde(rename = "direccion")]
    pub address: String,
    /// Currency code of the first listed price, or [`NOT_AVAILABLE`].
    #[serde(rename = "moneda")]
    pub currency: String,
    #[serde(rename = "precio")]
    pub price: f64,
    /// Monthly building expenses.
    #[serde(rename = "expensas")]
    pub expenses: f64,
    /// Decoded latitude text.
    #[serde(rename = "latitud")]
    pub latitude: Option<String>,
    /// Decoded longitude text.
    #[serde(rename = "longitud")]
    pub longitude: Option<String>,
    #[serde(rename = "flag_terraza", serialize_with = "as_flag")]
    pub terrace: bool,
    #[serde(rename = "flag_quincho", serialize_with = "as_flag")]
    pub quincho: bool,
    #[serde(rename = "flag_luminoso", serialize_with = "as_flag")]
    pub bright: bool,
    #[serde(rename = "flag_sotano", serialize_with = "as_flag")]
    pub basement: bool,
    #[serde(rename = "flag_pileta", serialize_with = "as_flag")]
    pub pool: bool,
    #[serde(rename = "flag_lavadero", serialize_with = "as_flag")]
    pub laundry: bool,
    #[serde(rename = "flag_subte", serialize_with = "as_flag")]
    pub near_subway: bool,
    #[serde(rename = "flag_a_reciclar", serialize_with = "as_flag")]
    pub needs_renovation: bool,
}

impl PropertyRecord {
    /// Creates a record for `source_file` with every field at its default:
    /// sentinels for text, zero for numbers, `false` for flags and `None`
    /// for side-channel values.
    #[must_use]
    pub fn empty(source_file: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            listing_url: URL_NOT_FOUND.to_owned(),
            property_type: UNKNOWN_PROPERTY_TYPE.to_owned(),
            total_area: 0.0,
            covered_area: 0.0,
            rooms: 0,
            bathrooms: 0,
            toilets: 0,
            garages: 0,
            bedrooms: 0,
            age_years: 0,
            days_published: None,
            mortgage_eligible: false,
            pets_allowed: false,
            professional_use: false,
            grill: false,
            en_suite_bedroom: false,
            patio: false,
            neighborhood: NOT_AVAILABLE.to_owned(),
            address: NOT_AVAILABLE.to_owned(),
            currency: NOT_AVAILABLE.to_owned(),
            price: 0.0,
            expenses: 0.0,
            latitude: None,
            longitude: None,
            terrace: false,
            quincho: false,
            bright: false,
            basement: false,
            pool: false,
            laundry: false,
            near_subway: false,
            needs_renovation: false,
        }
    }
}

/// Serializes a boolean as the integer `0` or `1`.
#[allow(clippy::trivially_copy_pass_by_ref)]
fn as_flag<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_uses_sentinels() {
        let record = PropertyRecord::empty("propiedad_1.html");
        assert_eq!(record.source_file, "propiedad_1.html");
        assert_eq!(record.listing_url, URL_NOT_FOUND);
        assert_eq!(record.property_type, UNKNOWN_PROPERTY_TYPE);
        assert_eq!(record.currency, NOT_AVAILABLE);
        assert_eq!(record.rooms, 0);
        assert!(record.days_published.is_none());
        assert!(!record.grill);
    }

    #[test]
    fn column_list_has_no_duplicates() {
        let mut sorted = COLUMNS.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), COLUMNS.len());
        assert_eq!(COLUMNS.len(), 33);
    }
}
