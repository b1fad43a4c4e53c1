//! # Quote Extraction Module
//!
//! This module turns free-form completion text into a quote and its author.
//!
//! ## Expected format
//!
//! The model is asked to answer with a single quotation in guillemets,
//! optionally followed by a dash and the author:
//!
//! ```text
//! «Courage is grace under pressure» - Hemingway
//! «Courage is grace under pressure» — Hemingway
//! «Courage is grace under pressure»
//! ```
//!
//! Anything that does not start with a «quoted» segment is rejected.

use lazy_static::lazy_static;
use log::{debug, trace, warn};
use regex::Regex;

use crate::errors::QuoteError;

/// Author used when the completion names nobody
pub const NO_AUTHOR: &str = "no author";

// Leading «quote», optionally followed by a dash separator
const QUOTE_PATTERN: &str = r"^«(.*?)»\s*[-—]?\s*";
// Whatever follows the quote, minus a leading dash
const AUTHOR_PATTERN: &str = r"[-—]?\s*(.+)$";

lazy_static! {
    static ref QUOTE_REGEX: Regex = Regex::new(QUOTE_PATTERN).expect("Quote pattern should be valid");
    static ref AUTHOR_REGEX: Regex =
        Regex::new(AUTHOR_PATTERN).expect("Author pattern should be valid");
    static ref REPEATED_OPEN_REGEX: Regex =
        Regex::new(r"«{2,}").expect("Repeated glyph pattern should be valid");
    static ref REPEATED_CLOSE_REGEX: Regex =
        Regex::new(r"»{2,}").expect("Repeated glyph pattern should be valid");
}

/// A quote and its attributed author
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedQuote {
    pub quote: String,
    pub author: String,
}

/// Extract a quote and author from completion text
///
/// # Errors
///
/// Returns [`QuoteError::MalformedFormat`] when the trimmed text does not
/// begin with a «quoted» segment. No partial result is produced.
///
/// # Examples
///
/// ```rust
/// use quotecard::quote_extractor::extract;
///
/// let parsed = extract("«Courage is grace under pressure» - Hemingway").unwrap();
/// assert_eq!(parsed.quote, "Courage is grace under pressure");
/// assert_eq!(parsed.author, "Hemingway");
/// ```
pub fn extract(response: &str) -> Result<ExtractedQuote, QuoteError> {
    debug!("Response to parse: {response}");

    let response = response.trim();

    let captures = match QUOTE_REGEX.captures(response) {
        Some(captures) => captures,
        None => {
            warn!("Completion does not start with a quoted segment");
            return Err(QuoteError::MalformedFormat(response.to_string()));
        }
    };

    let prefix_len = captures.get(0).map(|m| m.end()).unwrap_or(0);
    let quote = captures
        .get(1)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    let remaining = response[prefix_len..].trim();
    trace!("Text after quote: {remaining:?}");

    let author = if remaining.is_empty() {
        NO_AUTHOR.to_string()
    } else {
        AUTHOR_REGEX
            .captures(remaining)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| NO_AUTHOR.to_string())
    };

    debug!("Extracted quote of {} chars attributed to {author:?}", quote.len());

    Ok(ExtractedQuote { quote, author })
}

/// Clean up quotation glyphs around a quote
///
/// Collapses runs of `«` or `»` into a single glyph, trims whitespace and
/// stray straight quotes, and folds `«"` and `"»` into plain guillemets.
///
/// ```rust
/// use quotecard::quote_extractor::clean_quote;
///
/// assert_eq!(clean_quote("««text»»"), "«text»");
/// ```
pub fn clean_quote(quote: &str) -> String {
    let collapsed = REPEATED_OPEN_REGEX.replace_all(quote, "«");
    let collapsed = REPEATED_CLOSE_REGEX.replace_all(&collapsed, "»");

    collapsed
        .trim()
        .trim_matches('"')
        .replace("«\"", "«")
        .replace("\"»", "»")
}
