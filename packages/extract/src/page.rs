//! Parsed view of a saved listing page.
//!
//! Both the listing-object extractor and the record builder work from the
//! inline `<script>` bodies, so a page is parsed once and its script texts
//! are collected up front.

use std::sync::LazyLock;

use propscrape_listing_models::RawDocument;
use regex::Regex;
use scraper::{Html, Selector};

static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("valid selector"));

/// A listing page parsed into an HTML tree plus its inline script bodies.
pub struct ParsedPage<'a> {
    /// The document this page was parsed from.
    pub document: &'a RawDocument,
    /// Parsed HTML tree.
    pub html: Html,
    /// Text of every non-empty inline `<script>` element, in document order.
    pub scripts: Vec<String>,
}

impl<'a> ParsedPage<'a> {
    /// Parses `document` and collects its inline script bodies.
    #[must_use]
    pub fn parse(document: &'a RawDocument) -> Self {
        let html = Html::parse_document(&document.html);
        let scripts = html
            .select(&SCRIPT_SELECTOR)
            .map(|el| el.text().collect::<String>())
            .filter(|text| !text.is_empty())
            .collect();
        Self {
            document,
            html,
            scripts,
        }
    }

    /// Source filename of the page.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.document.filename
    }
}

/// Returns the value of the first double-quoted string constant matched by
/// `pattern` (a regex whose first capture group is the quoted value).
#[must_use]
pub fn string_constant<'s>(script: &'s str, pattern: &Regex) -> Option<&'s str> {
    pattern
        .captures(script)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
