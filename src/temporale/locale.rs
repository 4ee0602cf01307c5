//! Locale resolution
//!
//! Two independent cascades share the same exact → base → Latin logic:
//! one against the set of locales with name translations, one against the
//! set of locales with lectionary data. They may legitimately diverge.
//! An explicit `locale` query parameter resolves strictly; anything
//! derived from Accept-Language resolves leniently.

use std::collections::BTreeSet;

use crate::types::{ApiError, Result};

/// Ultimate fallback locale
pub const LATIN: &str = "la";

/// Language subtags the system recognizes. Requests outside this set fail
/// in strict mode and fall back to Latin in lenient mode.
const KNOWN_LANGUAGES: [&str; 32] = [
    "la", "en", "it", "fr", "de", "es", "pt", "nl", "pl", "hu", "sk", "cs", "hr", "sl", "lt",
    "lv", "et", "ro", "ca", "eu", "gl", "ga", "mt", "sv", "da", "no", "fi", "id", "tl", "vi",
    "sw", "zh",
];

/// Canonicalize a locale string: a 2-3 letter language subtag lowercased,
/// optionally followed by a 2 letter region subtag uppercased, joined with
/// an underscore. Returns None when the input is not a locale at all.
pub fn canonicalize(input: &str) -> Option<String> {
    let mut parts = input.split(['-', '_']);

    let lang = parts.next()?;
    if !(2..=3).contains(&lang.len()) || !lang.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let lang = lang.to_ascii_lowercase();

    match parts.next() {
        None => Some(lang),
        Some(region) => {
            if parts.next().is_some() {
                return None;
            }
            if region.len() != 2 || !region.chars().all(|c| c.is_ascii_alphabetic()) {
                return None;
            }
            Some(format!("{}_{}", lang, region.to_ascii_uppercase()))
        }
    }
}

/// The base (language) part of a canonical locale
pub fn base(locale: &str) -> &str {
    locale.split('_').next().unwrap_or(locale)
}

fn is_known(locale: &str) -> bool {
    KNOWN_LANGUAGES.contains(&base(locale))
}

/// Resolve a requested locale against the available set.
///
/// Strict mode surfaces every failure as a Validation error; lenient mode
/// falls back to Latin instead.
pub fn select_locale(
    requested: &str,
    available: &BTreeSet<String>,
    strict: bool,
) -> Result<String> {
    let fallback = |reason: String| {
        if strict {
            Err(ApiError::Validation(reason))
        } else {
            Ok(LATIN.to_string())
        }
    };

    let canonical = match canonicalize(requested) {
        Some(c) => c,
        None => return fallback(format!("invalid locale '{}'", requested)),
    };

    if !is_known(&canonical) {
        return fallback(format!("unknown locale '{}'", canonical));
    }

    if available.contains(&canonical) {
        return Ok(canonical);
    }

    let base_locale = base(&canonical);
    if available.contains(base_locale) {
        return Ok(base_locale.to_string());
    }

    fallback(format!("locale '{}' is not available", canonical))
}

/// Resolve the lectionary locale: same exact → base → Latin cascade, but
/// against the lectionary availability set, and returning None when not
/// even Latin has lectionary data.
pub fn lectionary_locale(requested: &str, available: &BTreeSet<String>) -> Option<String> {
    if let Some(canonical) = canonicalize(requested) {
        if available.contains(&canonical) {
            return Some(canonical);
        }
        let base_locale = base(&canonical);
        if available.contains(base_locale) {
            return Some(base_locale.to_string());
        }
    }
    if available.contains(LATIN) {
        return Some(LATIN.to_string());
    }
    None
}

/// Pick the preferred locale from an Accept-Language header value.
///
/// Tags are ordered by descending q-value (header order breaks ties) and
/// the first canonicalizable tag wins. Wildcards and malformed tags are
/// skipped. Resolution of the returned tag is always lenient.
pub fn from_accept_language(header: &str) -> Option<String> {
    let mut tags: Vec<(f32, usize, String)> = Vec::new();

    for (position, entry) in header.split(',').enumerate() {
        let mut parts = entry.split(';');
        let tag = parts.next()?.trim();
        if tag.is_empty() || tag == "*" {
            continue;
        }

        let mut quality = 1.0f32;
        for param in parts {
            let param = param.trim();
            if let Some(q) = param.strip_prefix("q=") {
                quality = q.parse().unwrap_or(0.0);
            }
        }
        if quality <= 0.0 {
            continue;
        }
        tags.push((quality, position, tag.to_string()));
    }

    tags.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.cmp(&b.1))
    });

    tags.into_iter().find_map(|(_, _, tag)| canonicalize(&tag))
}
