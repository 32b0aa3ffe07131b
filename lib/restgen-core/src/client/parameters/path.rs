use std::collections::BTreeSet;
use std::sync::LazyLock;

use indexmap::IndexMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use super::value::to_path_value;
use crate::client::ApiClientError;

/// Regular expression for matching placeholders in the format `{name}` or `{+name}`.
static RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(?<plus>\+)?(?<name>\w+)}").expect("a valid regex"));

/// Escaped in a `{name}` value on the wire: everything but unreserved characters.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Escaped in a `{+name}` value on the wire: `/` separates segments.
const RESERVED_EXPANSION: &AsciiSet = &SEGMENT.remove(b'/');

/// A path template with its placeholders substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(in crate::client) struct PathResolved {
    /// Values inserted verbatim, as exposed on the request descriptor.
    pub(in crate::client) verbatim: String,
    /// Values percent-encoded, as sent on the wire.
    pub(in crate::client) encoded: String,
}

/// Placeholder names of a path template, in order of appearance.
pub(in crate::client) fn placeholders(template: &str) -> impl Iterator<Item = &str> {
    RE.captures_iter(template)
        .filter_map(|caps| caps.name("name"))
        .map(|name| name.as_str())
}

/// Substitutes path parameters into a template.
///
/// The verbatim path keeps values as given. The encoded path escapes each value
/// so it stays within its segment, except `/` in a `{+name}` expansion.
/// Parameters without a placeholder are dropped with a warning; they never reach
/// the query string.
pub(in crate::client) fn build_path(
    template: &str,
    params: &IndexMap<String, Value>,
) -> Result<PathResolved, ApiClientError> {
    let mut verbatim = String::with_capacity(template.len());
    let mut encoded = String::with_capacity(template.len());
    let mut missings = BTreeSet::new();
    let mut used = BTreeSet::new();
    let mut last = 0;

    for caps in RE.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
            continue;
        };
        let literal = template.get(last..whole.start()).unwrap_or_default();
        verbatim.push_str(literal);
        encoded.push_str(literal);
        last = whole.end();

        let name = name.as_str();
        match params.get(name) {
            Some(value) => {
                let value = to_path_value(name, value)?;
                let escaped = if caps.name("plus").is_some() {
                    RESERVED_EXPANSION
                } else {
                    SEGMENT
                };
                encoded.extend(utf8_percent_encode(&value, escaped));
                verbatim.push_str(&value);
                used.insert(name);
            }
            None => {
                missings.insert(name.to_string());
            }
        }
    }
    let rest = template.get(last..).unwrap_or_default();
    verbatim.push_str(rest);
    encoded.push_str(rest);

    if !missings.is_empty() {
        return Err(ApiClientError::PathUnresolved {
            path: template.to_string(),
            missings: missings.into_iter().collect(),
        });
    }

    for name in params.keys().filter(|name| !used.contains(name.as_str())) {
        warn!(%name, %template, "path parameter has no placeholder");
    }

    Ok(PathResolved { verbatim, encoded })
}
