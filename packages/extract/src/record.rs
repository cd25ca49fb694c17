//! Builds a [`PropertyRecord`] from a decoded listing object.
//!
//! Every field is derived on its own and falls back to its default when the
//! listing lacks it or holds something unusable. Nothing here can fail.

use propscrape_listing_models::{
    NOT_AVAILABLE, PropertyRecord, UNKNOWN_PROPERTY_TYPE, URL_NOT_FOUND,
};
use serde_json::Value;

use crate::page::ParsedPage;
use crate::side_channel;

// Codes of the `mainFeatures` entries.
const TOTAL_AREA: &str = "CFT100";
const COVERED_AREA: &str = "CFT101";
const ROOMS: &str = "CFT1";
const BEDROOMS: &str = "CFT2";
const BATHROOMS: &str = "CFT3";
const TOILETS: &str = "CFT4";
const AGE: &str = "CFT5";
const GARAGES: &str = "CFT7";

// Groups of `generalFeatures`.
const GENERAL_GROUP: &str = "Características generales";
const ROOMS_GROUP: &str = "Ambientes";

/// Builds the record for `page` from its decoded listing object.
///
/// Listing age and coordinates come from the page scripts and the URL from
/// the canonical link, not from `listing`.
#[must_use]
pub fn build_record(page: &ParsedPage<'_>, listing: &Value) -> PropertyRecord {
    let mut record = PropertyRecord::empty(page.filename());

    record.listing_url =
        side_channel::canonical_url(&page.html).unwrap_or_else(|| URL_NOT_FOUND.to_owned());
    record.property_type = text_or(
        listing.get("realEstateType").and_then(|t| t.get("name")),
        UNKNOWN_PROPERTY_TYPE,
    );

    record.total_area = main_feature(listing, TOTAL_AREA).and_then(to_f64).unwrap_or(0.0);
    record.covered_area = main_feature(listing, COVERED_AREA).and_then(to_f64).unwrap_or(0.0);
    record.rooms = main_feature(listing, ROOMS).and_then(to_i64).unwrap_or(0);
    record.bathrooms = main_feature(listing, BATHROOMS).and_then(to_i64).unwrap_or(0);
    record.toilets = main_feature(listing, TOILETS).and_then(to_i64).unwrap_or(0);
    record.garages = main_feature(listing, GARAGES).and_then(to_i64).unwrap_or(0);
    record.bedrooms = main_feature(listing, BEDROOMS).and_then(to_i64).unwrap_or(0);
    record.age_years = main_feature(listing, AGE).and_then(to_i64).unwrap_or(0);

    record.days_published = side_channel::days_published(&page.scripts);

    record.mortgage_eligible = has_feature(listing, GENERAL_GROUP, "Apto crédito");
    record.pets_allowed = has_feature(listing, GENERAL_GROUP, "Permite mascotas");
    record.professional_use = has_feature(listing, GENERAL_GROUP, "Apto profesional");
    record.grill = has_feature(listing, GENERAL_GROUP, "Parrilla");
    record.en_suite_bedroom = has_feature(listing, ROOMS_GROUP, "Dormitorio en suite");
    record.patio = has_feature(listing, ROOMS_GROUP, "Patio");

    record.neighborhood = text_or(
        listing.get("location").and_then(|l| l.get("name")),
        NOT_AVAILABLE,
    );
    record.address = text_or(
        listing.get("address").and_then(|a| a.get("name")),
        NOT_AVAILABLE,
    );

    let price = listing
        .get("pricesData")
        .and_then(|data| data.get(0))
        .and_then(|data| data.get("prices"))
        .and_then(|prices| prices.get(0));
    record.currency = text_or(price.and_then(|p| p.get("currency")), NOT_AVAILABLE);
    record.price = price
        .and_then(|p| p.get("amount"))
        .and_then(to_f64)
        .unwrap_or(0.0);
    record.expenses = listing.get("expenses").and_then(expenses).unwrap_or(0.0);

    (record.latitude, record.longitude) = side_channel::coordinates(&page.scripts);

    let description = listing
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|k| description.contains(k));

    record.grill = record.grill || mentions(&["parrilla"]);
    record.patio = record.patio || mentions(&["patio"]);
    record.terrace = mentions(&["terraza"]);
    record.quincho = mentions(&["quincho"]);
    record.bright = mentions(&["luminoso"]);
    record.basement = mentions(&["sótano", "sotano"]);
    record.pool = mentions(&["pileta", "piscina"]);
    record.laundry = mentions(&["lavadero"]);
    record.near_subway = mentions(&["subte"]);
    record.needs_renovation = mentions(&["a reciclar", "reciclado"]);

    record
}

/// The `value` of a `mainFeatures` entry.
fn main_feature<'v>(listing: &'v Value, code: &str) -> Option<&'v Value> {
    listing.get("mainFeatures")?.get(code)?.get("value")
}

/// Whether any entry of a `generalFeatures` group is labeled exactly
/// `label`. Groups may be maps keyed by feature id or plain arrays.
fn has_feature(listing: &Value, group: &str, label: &str) -> bool {
    let is_match = |entry: &Value| entry.get("label").and_then(Value::as_str) == Some(label);
    match listing.get("generalFeatures").and_then(|g| g.get(group)) {
        Some(Value::Object(entries)) => entries.values().any(is_match),
        Some(Value::Array(entries)) => entries.iter().any(is_match),
        _ => false,
    }
}

fn text_or(value: Option<&Value>, default: &str) -> String {
    value
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_owned()
}

/// Numbers and numeric strings as `f64`. Non-finite results are rejected.
fn to_f64(value: &Value) -> Option<f64> {
    let number: Option<f64> = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Integers, integral strings, and numbers with a fraction truncated
/// toward zero.
#[allow(clippy::cast_possible_truncation)]
fn to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Expenses are usually a string in Argentine format ("1.234,56"):
/// `.` groups thousands and `,` marks decimals.
fn expenses(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => parse_local_amount(s),
        other => to_f64(other),
    }
}

/// Parses an amount written with `.` thousands separators and a `,`
/// decimal separator.
#[must_use]
pub fn parse_local_amount(text: &str) -> Option<f64> {
    text.replace('.', "")
        .replace(',', ".")
        .trim()
        .parse()
        .ok()
        .filter(|n: &f64| n.is_finite())
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use propscrape_listing_models::RawDocument;
    use serde_json::json;

    use super::*;

    fn build(listing: &Value, html: &str) -> PropertyRecord {
        let doc = RawDocument::new("propiedad_x.html", html);
        let page = ParsedPage::parse(&doc);
        build_record(&page, listing)
    }

    #[test]
    fn parses_local_amounts() {
        assert_eq!(parse_local_amount("1.234,56"), Some(1234.56));
        assert_eq!(parse_local_amount("85.000"), Some(85000.0));
        assert_eq!(parse_local_amount("950"), Some(950.0));
        assert_eq!(parse_local_amount("consultar"), None);
    }

    #[test]
    fn expense_values_fall_back_to_zero() {
        assert_eq!(build(&json!({"expenses": "1.234,56"}), "").expenses, 1234.56);
        assert_eq!(build(&json!({"expenses": 5000}), "").expenses, 5000.0);
        assert_eq!(build(&json!({"expenses": null}), "").expenses, 0.0);
        assert_eq!(build(&json!({}), "").expenses, 0.0);
    }

    #[test]
    fn coerces_main_features() {
        let listing = json!({
            "mainFeatures": {
                "CFT100": {"value": "120.5"},
                "CFT101": {"value": 95},
                "CFT1": {"value": "4"},
                "CFT2": {"value": 3.0},
                "CFT3": {"value": " 2 "},
                "CFT4": {"value": "uno"},
                "CFT5": {"value": "A estrenar"},
                "CFT7": "not a map",
            }
        });
        let record = build(&listing, "");
        assert_eq!(record.total_area, 120.5);
        assert_eq!(record.covered_area, 95.0);
        assert_eq!(record.rooms, 4);
        assert_eq!(record.bedrooms, 3);
        assert_eq!(record.bathrooms, 2);
        assert_eq!(record.toilets, 0);
        assert_eq!(record.age_years, 0);
        assert_eq!(record.garages, 0);
    }

    #[test]
    fn structured_features_match_labels_exactly() {
        let listing = json!({
            "generalFeatures": {
                "Características generales": {
                    "1": {"label": "Apto crédito", "value": null},
                    "2": {"label": "Permite mascotas "},
                },
                "Ambientes": [
                    {"label": "Dormitorio en suite"},
                ],
            }
        });
        let record = build(&listing, "");
        assert!(record.mortgage_eligible);
        assert!(!record.pets_allowed);
        assert!(!record.professional_use);
        assert!(record.en_suite_bedroom);
        assert!(!record.patio);
    }

    #[test]
    fn grill_uses_label_or_description() {
        let by_text = json!({"description": "Casa con PARRILLA"});
        assert!(build(&by_text, "").grill);

        let by_label = json!({
            "generalFeatures": {"Características generales": {"9": {"label": "Parrilla"}}},
            "description": "Casa amplia",
        });
        assert!(build(&by_label, "").grill);

        assert!(!build(&json!({"description": "Casa amplia"}), "").grill);
    }

    #[test]
    fn patio_uses_label_or_description() {
        let by_label = json!({"generalFeatures": {"Ambientes": {"3": {"label": "Patio"}}}});
        assert!(build(&by_label, "").patio);
        assert!(build(&json!({"description": "Lindo patio"}), "").patio);
        assert!(!build(&json!({}), "").patio);
    }

    #[test]
    fn description_flags() {
        let listing = json!({
            "description": "Luminoso, con Sótano, piscina y lavadero. Cerca del subte. Reciclado."
        });
        let record = build(&listing, "");
        assert!(record.bright);
        assert!(record.basement);
        assert!(record.pool);
        assert!(record.laundry);
        assert!(record.near_subway);
        assert!(record.needs_renovation);
        assert!(!record.terrace);
        assert!(!record.quincho);
    }

    #[test]
    fn non_string_description_sets_no_flags() {
        let record = build(&json!({"description": null}), "");
        assert!(!record.grill && !record.terrace && !record.pool);
    }

    #[test]
    fn missing_blocks_use_defaults() {
        let record = build(&json!({"pricesData": []}), "");
        assert_eq!(record.property_type, UNKNOWN_PROPERTY_TYPE);
        assert_eq!(record.neighborhood, NOT_AVAILABLE);
        assert_eq!(record.address, NOT_AVAILABLE);
        assert_eq!(record.currency, NOT_AVAILABLE);
        assert_eq!(record.price, 0.0);
        assert_eq!(record.listing_url, URL_NOT_FOUND);
        assert_eq!(record.days_published, None);
        assert_eq!(record.latitude, None);
    }

    #[test]
    fn reads_first_price_and_location() {
        let listing = json!({
            "pricesData": [
                {"prices": [{"currency": "USD", "amount": 185000}, {"currency": "ARS", "amount": 1}]},
                {"prices": [{"currency": "EUR", "amount": 2}]},
            ],
            "location": {"name": "Palermo"},
            "address": {"name": "Honduras 4800"},
        });
        let record = build(&listing, "");
        assert_eq!(record.currency, "USD");
        assert_eq!(record.price, 185000.0);
        assert_eq!(record.neighborhood, "Palermo");
        assert_eq!(record.address, "Honduras 4800");
    }

    #[test]
    fn side_channels_come_from_markup() {
        let html = r#"<html><head><link rel="canonical" href="https://example.com/p/1.html"></head>
            <body><script>const antiquity = 'Publicado hace 45 días'; const mapLatOf = "LTM0LjYwMzc=";
            const mapLngOf = "LTU4LjM4MTY=";</script></body></html>"#;
        let record = build(&json!({"mapLat": "ignored"}), html);
        assert_eq!(record.listing_url, "https://example.com/p/1.html");
        assert_eq!(record.days_published, Some(45));
        assert_eq!(record.latitude.as_deref(), Some("-34.6037"));
        assert_eq!(record.longitude.as_deref(), Some("-58.3816"));
    }
}
