use indexmap::IndexMap;
use serde_json::Value;

use super::value::to_query_values;
use crate::client::ApiClientError;

/// Ordered `key=value` pairs of a query string. Keys may repeat.
pub(in crate::client) type QueryPairs = Vec<(String, String)>;

/// Expands query parameters into ordered pairs.
///
/// Array values repeat their key once per element.
pub(in crate::client) fn to_pairs(params: &IndexMap<String, Value>) -> Result<QueryPairs, ApiClientError> {
    let mut pairs = Vec::with_capacity(params.len());
    for (name, value) in params {
        for literal in to_query_values(name, value)? {
            pairs.push((name.clone(), literal));
        }
    }
    Ok(pairs)
}

/// Renders pairs into a query string, or `None` when there is nothing to send.
///
/// Values are written unescaped.
pub(in crate::client) fn render_query(pairs: &[(String, String)]) -> Option<String> {
    if pairs.is_empty() {
        return None;
    }
    let query = pairs
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    Some(query)
}
