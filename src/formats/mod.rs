//! # Vendor Text Formats
//!
//! Parsers for the fixed-layout text files the networks ship as. Two rules
//! hold across all of them:
//!
//! - Header problems fail the whole file with [`crate::Error::Parse`]. The
//!   scales and layout come from the header; without it nothing downstream
//!   can be trusted.
//! - Malformed data rows are skipped with a debug log. Vendor exports carry
//!   trailing junk and half-filled rows, and one bad row must not take down
//!   a 50k-row network.
//!
//! All input is stripped of stray ASCII control characters up front (tab,
//! newline and carriage return survive); the vendor tools emit form feeds
//! and NULs in the wild.

pub mod config;
pub mod road;
pub mod train;

use crate::{Error, Result};

/// Drop control characters the tokenizers must never see.
pub(crate) fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

/// Parse a header token or fail the whole file.
pub(crate) fn parse_header<T: std::str::FromStr>(token: &str, line: usize, what: &str) -> Result<T> {
    token.trim().parse().map_err(|_| Error::Parse {
        line,
        message: format!("invalid {what}: '{token}'"),
    })
}

/// Vendor truthiness: `1` or `true` in any casing; everything else is false.
pub(crate) fn truthy(token: &str) -> bool {
    token == "1" || token.eq_ignore_ascii_case("true")
}
