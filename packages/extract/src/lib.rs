#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Listing extraction for saved classifieds pages.
//!
//! A listing page carries its data in a script-level object literal
//! (`const avisoInfo = {...}`). [`extract_document`] finds and decodes that
//! object ([`embedded`], [`relaxed`]) and flattens it into a
//! [`PropertyRecord`] ([`record`]), reading a few extra values straight from
//! the markup ([`side_channel`]).
//!
//! A page without a decodable listing object yields no record at all; every
//! other gap falls back to a per-field default. Extraction is pure: it
//! performs no I/O and never logs. [`batch`] runs it over many documents,
//! logging one line per skipped document.

pub mod batch;
pub mod embedded;
pub mod page;
pub mod progress;
pub mod record;
pub mod relaxed;
pub mod side_channel;

use propscrape_listing_models::{PropertyRecord, RawDocument};

use crate::page::ParsedPage;
use crate::relaxed::DecodeError;

/// Reasons a document produced no record.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// No inline script declares the listing object. Common for pages that
    /// are not listings (removed ads, error pages).
    #[error("{filename}: no script declares the listing object")]
    MarkerAbsent {
        /// Source filename.
        filename: String,
    },

    /// The declaration was found but no balanced object literal follows it.
    #[error("{filename}: listing object declaration has no object literal")]
    LiteralMissing {
        /// Source filename.
        filename: String,
    },

    /// The object literal could not be decoded.
    #[error("{filename}: failed to decode listing object: {source}")]
    Decode {
        /// Source filename.
        filename: String,
        /// Decoder error with position.
        source: DecodeError,
    },

    /// The extraction task died before returning.
    #[error("{filename}: extraction task failed: {message}")]
    Task {
        /// Source filename.
        filename: String,
        /// Panic or cancellation message.
        message: String,
    },
}

impl ExtractError {
    /// Filename of the document that failed.
    #[must_use]
    pub fn filename(&self) -> &str {
        match self {
            Self::MarkerAbsent { filename }
            | Self::LiteralMissing { filename }
            | Self::Decode { filename, .. }
            | Self::Task { filename, .. } => filename,
        }
    }

    /// Whether this is an ordinary non-listing page rather than a failure.
    #[must_use]
    pub const fn is_expected(&self) -> bool {
        matches!(self, Self::MarkerAbsent { .. } | Self::LiteralMissing { .. })
    }
}

/// Extracts the property record of one saved listing page.
///
/// # Errors
///
/// Returns [`ExtractError`] when the page has no decodable listing object.
/// Missing or malformed individual fields never cause an error.
pub fn extract_document(document: &RawDocument) -> Result<PropertyRecord, ExtractError> {
    let page = ParsedPage::parse(document);
    let listing = embedded::find_listing_object(&page)?;
    Ok(record::build_record(&page, &listing))
}
