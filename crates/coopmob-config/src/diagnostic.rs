// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rich diagnostics for configuration failures.
//!
//! Figment reports deserialization problems as a flat error chain; this
//! module turns each entry into a miette diagnostic carrying a source span
//! into the offending TOML file, the list of keys the section accepts, and
//! a Jaro-Winkler "did you mean" suggestion for close typos.

#![allow(unused_assignments)] // the Diagnostic derive expands to code tripping this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Similarity floor below which no suggestion is offered. At 0.75 a typo
/// like `acess_token` still resolves to `access_token` while unrelated
/// words stay quiet.
const MIN_SIMILARITY: f64 = 0.75;

/// A configuration problem, shaped for miette's graphical report.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key no section accepts.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(coopmob::config::unknown_key),
        help("{}", unknown_key_help(suggestion, valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Closest accepted key, when one is similar enough.
        suggestion: Option<String>,
        /// Comma-joined keys the section accepts.
        valid_keys: String,
        #[label("no section accepts this key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value whose TOML type does not match the model.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(coopmob::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        #[label("this value has the wrong type")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A key the model requires but no layer provided.
    #[error("required key `{key}` was never set")]
    #[diagnostic(
        code(coopmob::config::missing_key),
        help("add `{key} = <value>` to your coopmob.toml")
    )]
    MissingKey { key: String },

    /// A well-formed value that fails a semantic check.
    #[error("validation failed: {message}")]
    #[diagnostic(code(coopmob::config::validation))]
    Validation { message: String },

    /// Anything figment reports that has no richer mapping.
    #[error("configuration problem: {0}")]
    #[diagnostic(code(coopmob::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: &Option<String>, valid_keys: &str) -> String {
    match suggestion {
        Some(name) => format!("did you mean `{name}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Map every entry of a figment error chain onto a `ConfigError`.
///
/// `toml_sources` pairs file names with their content so unknown-key errors
/// can carry a span pointing at the typo.
pub fn figment_to_config_errors(
    error: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    error
        .into_iter()
        .map(|entry| classify(entry, toml_sources))
        .collect()
}

fn classify(error: figment::Error, toml_sources: &[(String, String)]) -> ConfigError {
    use figment::error::Kind;

    match &error.kind {
        Kind::UnknownField(field, allowed) => {
            let allowed: Vec<&str> = allowed.to_vec();
            let (span, src) = locate_key(&error, field, toml_sources);
            ConfigError::UnknownKey {
                key: field.clone(),
                suggestion: suggest_key(field, &allowed),
                valid_keys: allowed.join(", "),
                span,
                src,
            }
        }
        Kind::MissingField(field) => ConfigError::MissingKey {
            key: field.clone().into_owned(),
        },
        Kind::InvalidType(found, wanted) => ConfigError::InvalidType {
            key: error.path.join("."),
            detail: format!("found {found}, expected {wanted}"),
            expected: wanted.to_string(),
            span: None,
            src: None,
        },
        _ => ConfigError::Other(error.to_string()),
    }
}

/// Resolve the span and source file a figment error points into, when the
/// error came from a file layer we have the content of.
fn locate_key(
    error: &figment::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let path = match error.metadata.as_ref().and_then(|m| m.source.as_ref()) {
        Some(figment::Source::File(path)) => path.display().to_string(),
        _ => return (None, None),
    };
    let Some((_, content)) = toml_sources.iter().find(|(name, _)| *name == path) else {
        return (None, None);
    };

    let segments: Vec<String> = error.path.iter().map(|s| s.to_string()).collect();
    match find_key_offset(content, &segments, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(&path, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` as a key within its TOML section.
///
/// The scan starts after the `[section]` header named by the first path
/// element (or at the top for top-level keys) and accepts a hit only where
/// the field name opens a line, ignoring leading indentation, and is
/// followed by `=` or whitespace. Occurrences inside values are skipped.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let start = match path.first() {
        None => 0,
        Some(section) => {
            let marker = format!("[{section}]");
            content.find(&marker)? + marker.len()
        }
    };

    for (pos, _) in content[start..].match_indices(field) {
        let abs = start + pos;
        let line_start = content[..abs].rfind('\n').map_or(0, |nl| nl + 1);
        let lead_is_indent = content[line_start..abs]
            .chars()
            .all(|c| c == ' ' || c == '\t');
        let follower = content[abs + field.len()..].chars().next();
        if lead_is_indent && matches!(follower, Some(' ' | '\t' | '=')) {
            return Some(abs);
        }
    }
    None
}

/// Closest accepted key by Jaro-Winkler similarity, if any clears the floor.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > MIN_SIMILARITY)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print every error to stderr through miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    let mut out = String::new();
    for err in errors {
        if handler.render_report(&mut out, err as &dyn Diagnostic).is_err() {
            out.push_str(&format!("error: {err}\n"));
        }
    }
    eprint!("{out}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_typos_resolve_to_the_accepted_key() {
        let valid = &["access_token", "phone_number_id", "verify_token"];
        assert_eq!(
            suggest_key("acess_token", valid),
            Some("access_token".to_string())
        );
        assert_eq!(
            suggest_key("verify_tokn", valid),
            Some("verify_token".to_string())
        );
    }

    #[test]
    fn distant_strings_get_no_suggestion() {
        let valid = &["registration_link", "recap_after_minutes"];
        assert_eq!(suggest_key("qqqqqq", valid), None);
    }

    #[test]
    fn key_offset_lands_on_the_key_inside_its_section() {
        let content = "[whatsapp]\nacess_token = \"x\"\n";
        let path = vec!["whatsapp".to_string()];
        let offset = find_key_offset(content, &path, "acess_token").unwrap();
        assert_eq!(&content[offset..offset + 11], "acess_token");
    }

    #[test]
    fn key_offset_skips_mentions_inside_values() {
        let content = "[store]\nnote = \"redis_ur\"\nredis_ur = \"redis://x\"\n";
        let path = vec!["store".to_string()];
        let offset = find_key_offset(content, &path, "redis_ur").unwrap();
        assert_eq!(content.as_bytes()[offset + 9], b'=');
        assert!(content[..offset].contains("note"));
    }

    #[test]
    fn top_level_keys_search_from_the_start() {
        let content = "stray = 1\n[server]\nport = 8080\n";
        assert_eq!(find_key_offset(content, &[], "stray"), Some(0));
    }
}
