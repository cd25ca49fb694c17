//! Values read from the page markup outside the listing object.
//!
//! The listing age and coordinates are declared as separate script
//! constants, and the public URL lives in the canonical `<link>` tag. Each
//! lookup here is independent and yields `None` rather than an error.

use std::sync::LazyLock;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use scraper::{Html, Selector};

use crate::embedded::{MAP_LAT_RE, MAP_LNG_RE};
use crate::page::string_constant;

static ANTIQUITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"const\s+antiquity\s*=\s*'(.*?)'").expect("valid regex"));

static DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u:\d)+").expect("valid regex"));

static CANONICAL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"link[rel~="canonical"]"#).expect("valid selector"));

/// Days the listing has been published, from `const antiquity = '...'`.
///
/// The first ASCII digit run inside the quoted phrase is used (e.g.
/// "Publicado hace 12 días" → 12). Scripts whose phrase holds no digits are
/// passed over. The first digit run found is final: if it does not fit a
/// `u32` the age is absent.
#[must_use]
pub fn days_published(scripts: &[String]) -> Option<u32> {
    scripts
        .iter()
        .find_map(|script| DIGITS_RE.find(string_constant(script, &ANTIQUITY_RE)?))
        .and_then(|digits| digits.as_str().parse().ok())
}

/// Latitude and longitude from the base64 `mapLatOf` / `mapLngOf`
/// constants, decoded to text.
///
/// Scripts are scanned in order until both values are known. A constant
/// that fails to decode leaves its coordinate as previously found.
#[must_use]
pub fn coordinates(scripts: &[String]) -> (Option<String>, Option<String>) {
    let mut latitude = None;
    let mut longitude = None;

    for script in scripts {
        if let Some(lat) = string_constant(script, &MAP_LAT_RE).and_then(decode_coordinate) {
            latitude = Some(lat);
        }
        if let Some(lng) = string_constant(script, &MAP_LNG_RE).and_then(decode_coordinate) {
            longitude = Some(lng);
        }
        if latitude.is_some() && longitude.is_some() {
            break;
        }
    }

    (latitude, longitude)
}

/// Decodes a standard base64 string into UTF-8 text.
#[must_use]
pub fn decode_coordinate(encoded: &str) -> Option<String> {
    let bytes = STANDARD.decode(encoded).ok()?;
    String::from_utf8(bytes).ok()
}

/// `href` of the first `<link rel="canonical">` element, if it has one.
#[must_use]
pub fn canonical_url(html: &Html) -> Option<String> {
    html.select(&CANONICAL_SELECTOR)
        .next()
        .and_then(|link| link.value().attr("href"))
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn reads_days_from_antiquity_phrase() {
        let s = scripts(&["const antiquity = 'Publicado hace 12 días';"]);
        assert_eq!(days_published(&s), Some(12));
    }

    #[test]
    fn skips_antiquity_without_digits() {
        let s = scripts(&[
            "const antiquity = 'Publicado hoy';",
            "const antiquity = 'Publicado hace 3 días';",
        ]);
        assert_eq!(days_published(&s), Some(3));
        assert_eq!(days_published(&scripts(&["const antiquity = 'hoy';"])), None);
        assert_eq!(days_published(&scripts(&["var x = 1;"])), None);
    }

    #[test]
    fn first_digit_run_is_final() {
        let s = scripts(&[
            "const antiquity = 'Publicado hace 99999999999 días';",
            "const antiquity = 'Publicado hace 3 días';",
        ]);
        assert_eq!(days_published(&s), None);
    }

    #[test]
    fn only_ascii_digits_count() {
        let s = scripts(&[
            "const antiquity = 'Publicado hace \u{0663} días';",
            "const antiquity = 'Publicado hace 4 días';",
        ]);
        assert_eq!(days_published(&s), Some(4));
    }

    #[test]
    fn decodes_base64_coordinates() {
        // "-34.6037" / "-58.3816"
        let s = scripts(&[r#"const mapLatOf = "LTM0LjYwMzc="; const mapLngOf = "LTU4LjM4MTY=";"#]);
        assert_eq!(
            coordinates(&s),
            (Some("-34.6037".to_owned()), Some("-58.3816".to_owned()))
        );
    }

    #[test]
    fn bad_coordinate_is_absent_without_affecting_the_other() {
        let s = scripts(&[r#"const mapLatOf = "not base64!"; const mapLngOf = "LTU4LjM4MTY=";"#]);
        assert_eq!(coordinates(&s), (None, Some("-58.3816".to_owned())));
    }

    #[test]
    fn coordinates_may_come_from_different_scripts() {
        let s = scripts(&[
            r#"const mapLatOf = "LTM0LjYwMzc=";"#,
            r#"const mapLngOf = "LTU4LjM4MTY=";"#,
        ]);
        assert_eq!(
            coordinates(&s),
            (Some("-34.6037".to_owned()), Some("-58.3816".to_owned()))
        );
    }

    #[test]
    fn rejects_non_utf8_payload() {
        // 0xFF 0xFE
        assert_eq!(decode_coordinate("//4="), None);
    }

    #[test]
    fn reads_canonical_href() {
        let html = Html::parse_document(
            r#"<html><head><link rel="stylesheet" href="a.css"><link rel="canonical" href="https://example.com/propiedades/1.html"></head></html>"#,
        );
        assert_eq!(
            canonical_url(&html).as_deref(),
            Some("https://example.com/propiedades/1.html")
        );
    }

    #[test]
    fn canonical_without_href_is_none() {
        let html = Html::parse_document(r#"<html><head><link rel="canonical"></head></html>"#);
        assert_eq!(canonical_url(&html), None);
        assert_eq!(canonical_url(&Html::parse_document("<p>x</p>")), None);
    }
}
