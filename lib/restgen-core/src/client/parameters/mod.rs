//! Call parameters and their resolution into path and query values.
//!
//! - [`CallParams`] - what a caller hands to a method
//! - `resolve` - merges defaults, rewrites aliases, validates and partitions
//! - `path` - substitutes placeholders into a path template
//! - `query` - serializes the remaining parameters into a query string

use indexmap::IndexMap;
use serde_json::Value;

use super::auth::Authentication;
use super::media::Media;
use super::ApiClientError;

mod path;
pub(in crate::client) use self::path::{build_path, placeholders};

mod query;
pub(in crate::client) use self::query::{QueryPairs, render_query, to_pairs};

mod resolve;
pub(in crate::client) use self::resolve::resolve;

mod value;

/// Reserved key carrying the JSON request resource.
pub const RESOURCE_KEY: &str = "resource";
/// Reserved key carrying the media upload.
pub const MEDIA_KEY: &str = "media";
/// Reserved key carrying call-level credentials.
pub const AUTH_KEY: &str = "auth";

/// Parameters of one method call.
///
/// Plain values keep their insertion order. A [`Value::Null`] is treated as absent.
/// The reserved `resource`, `media`, and `auth` slots are never written into the
/// path or query.
///
/// # Examples
///
/// ```rust
/// use restgen_core::{CallParams, Media};
/// use serde_json::json;
///
/// let params = CallParams::new()
///     .param("fileId", "abc")
///     .param("metadataHeaders", json!(["To", "Date"]))
///     .with_resource(json!({ "title": "notes" }))
///     .with_media(Media::new("hello").with_mime_type("text/plain"));
///
/// assert_eq!(params.values().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct CallParams {
    values: IndexMap<String, Value>,
    resource: Option<Value>,
    media: Option<Media>,
    auth: Option<Authentication>,
}

impl CallParams {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a plain parameter, replacing any previous value for `name`.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Sets the JSON resource sent as request body or multipart metadata.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<Value>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Sets the media to upload.
    #[must_use]
    pub fn with_media(mut self, media: Media) -> Self {
        self.media = Some(media);
        self
    }

    /// Sets call-level credentials.
    #[must_use]
    pub fn with_auth(mut self, auth: Authentication) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Reads parameters from a JSON object.
    ///
    /// `null` yields an empty set. The reserved keys stay in the map and are
    /// routed when the call is resolved.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::UnsupportedParameterValue`] if `json` is neither an object nor `null`.
    pub fn from_json(json: Value) -> Result<Self, ApiClientError> {
        match json {
            Value::Null => Ok(Self::default()),
            Value::Object(object) => Ok(object.into_iter().collect()),
            other => Err(ApiClientError::UnsupportedParameterValue {
                name: "params".to_string(),
                value: other,
            }),
        }
    }

    /// The plain parameter values, in insertion order.
    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    pub(in crate::client) fn into_parts(
        self,
    ) -> (IndexMap<String, Value>, Option<Value>, Option<Media>, Option<Authentication>) {
        (self.values, self.resource, self.media, self.auth)
    }
}

impl From<IndexMap<String, Value>> for CallParams {
    fn from(values: IndexMap<String, Value>) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }
}

impl<K, V> FromIterator<(K, V)> for CallParams
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let values: IndexMap<String, Value> = iter
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        Self::from(values)
    }
}
