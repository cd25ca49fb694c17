//! Locates and decodes the listing object embedded in a page script.
//!
//! Listing pages declare the listing as `const avisoInfo = { ... }`. A few
//! of its fields do not hold literal values but refer to sibling string
//! constants declared in the same script (`urlMapOf`, `mapLatOf`,
//! `mapLngOf`). Those references are replaced textually with the constants'
//! values before the literal is handed to the [relaxed decoder](crate::relaxed).
//!
//! The closing brace is found by plain depth counting. A `{` or `}` inside a
//! string value of the literal throws the count off; listing pages have not
//! been seen to contain one.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::page::{ParsedPage, string_constant};
use crate::{ExtractError, relaxed};

/// Text that introduces the listing object assignment.
pub const MARKER: &str = "const avisoInfo = ";

static URL_MAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"const\s+urlMapOf\s*=\s*"(.*?)""#).expect("valid regex"));

/// Matches the base64 latitude constant. Shared with the coordinate scan.
pub(crate) static MAP_LAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"const\s+mapLatOf\s*=\s*"(.*?)""#).expect("valid regex"));

/// Matches the base64 longitude constant. Shared with the coordinate scan.
pub(crate) static MAP_LNG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"const\s+mapLngOf\s*=\s*"(.*?)""#).expect("valid regex"));

/// Values of the string constants the listing object refers to by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders<'s> {
    pub url_map: Option<&'s str>,
    pub map_lat: Option<&'s str>,
    pub map_lng: Option<&'s str>,
}

impl<'s> Placeholders<'s> {
    /// Looks up each constant in `script`. Any of them may be missing.
    #[must_use]
    pub fn scan(script: &'s str) -> Self {
        Self {
            url_map: string_constant(script, &URL_MAP_RE),
            map_lat: string_constant(script, &MAP_LAT_RE),
            map_lng: string_constant(script, &MAP_LNG_RE),
        }
    }

    /// Replaces `'<key>': <constant>` references in `literal` with the
    /// quoted constant values that were found. References to missing or
    /// empty constants are left untouched.
    #[must_use]
    pub fn substitute(&self, literal: &str) -> String {
        let bindings = [
            ("urlMap", "urlMapOf", self.url_map),
            ("mapLat", "mapLatOf", self.map_lat),
            ("mapLng", "mapLngOf", self.map_lng),
        ];

        let mut resolved = literal.to_owned();
        for (key, constant, value) in bindings {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                resolved = resolved.replace(
                    &format!("'{key}': {constant}"),
                    &format!("'{key}': '{value}'"),
                );
            }
        }
        resolved
    }
}

/// Returns the object literal following [`MARKER`] in `script`: from the
/// first `{` after the marker through its matching `}`.
///
/// Returns `None` if the marker is missing, no `{` follows it, or the braces
/// never balance.
#[must_use]
pub fn object_literal(script: &str) -> Option<&str> {
    let marker = script.find(MARKER)?;
    let start = marker + script[marker..].find('{')?;

    let mut depth = 0_usize;
    for (offset, ch) in script[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&script[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Finds and decodes the listing object of `page`.
///
/// Scripts are tried in document order. The first script containing the
/// marker and a balanced literal is decoded; if decoding fails, later
/// scripts are not tried.
///
/// # Errors
///
/// * [`ExtractError::MarkerAbsent`] if no script contains [`MARKER`].
/// * [`ExtractError::LiteralMissing`] if scripts contain the marker but none
///   is followed by a balanced object literal.
/// * [`ExtractError::Decode`] if the literal cannot be decoded.
pub fn find_listing_object(page: &ParsedPage<'_>) -> Result<Value, ExtractError> {
    let mut saw_marker = false;

    for script in page.scripts.iter().filter(|s| s.contains(MARKER)) {
        saw_marker = true;
        let placeholders = Placeholders::scan(script);
        let Some(literal) = object_literal(script) else {
            continue;
        };
        let resolved = placeholders.substitute(literal);
        return relaxed::decode(&resolved).map_err(|source| ExtractError::Decode {
            filename: page.filename().to_owned(),
            source,
        });
    }

    let filename = page.filename().to_owned();
    Err(if saw_marker {
        ExtractError::LiteralMissing { filename }
    } else {
        ExtractError::MarkerAbsent { filename }
    })
}
