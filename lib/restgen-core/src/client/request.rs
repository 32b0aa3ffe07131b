//! The assembled request, exposed for inspection before it is sent.

use bytes::Bytes;
use http::{HeaderMap, Method};
use indexmap::IndexMap;
use serde_json::Value;
use url::Url;

use super::ApiClientError;
use super::auth::{Authentication, AuthorizationTarget};
use super::parameters::{QueryPairs, render_query};

/// Target URI of an assembled request.
///
/// Path and query values are written verbatim; nothing is percent-encoded.
/// The URL actually sent is [`RequestDescriptor::wire_url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUri {
    href: String,
    origin: String,
    path: String,
    pathname: String,
    query: Option<String>,
}

impl RequestUri {
    fn new(origin: String, pathname: String, query: Option<String>) -> Self {
        let path = match &query {
            Some(query) => format!("{pathname}?{query}"),
            None => pathname.clone(),
        };
        let href = format!("{origin}{path}");
        Self {
            href,
            origin,
            path,
            pathname,
            query,
        }
    }

    /// The full URI, e.g. `https://www.googleapis.com/drive/v2/files/abc?fields=id`.
    pub fn href(&self) -> &str {
        &self.href
    }

    /// Scheme, host and port, e.g. `https://www.googleapis.com`.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Path and query, e.g. `/drive/v2/files/abc?fields=id`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path only, e.g. `/drive/v2/files/abc`.
    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    /// The query string without `?`, or `None` when the request has no query.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }
}

/// Body of an assembled request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// A text body: JSON resource, simple text media, or a text multipart envelope.
    Text(String),
    /// A binary body.
    Bytes(Bytes),
    /// A streamed body. Its bytes are only read when the request is sent.
    Stream,
}

impl RequestBody {
    /// The body as text, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bytes(_) | Self::Stream => None,
        }
    }

    /// The body bytes, unless it is streamed.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Text(text) => Some(text.as_bytes()),
            Self::Bytes(bytes) => Some(bytes),
            Self::Stream => None,
        }
    }
}

/// A fully assembled request.
///
/// Immutable once built: every accessor is read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    uri: RequestUri,
    headers: HeaderMap,
    body: Option<RequestBody>,
    params: IndexMap<String, Value>,
    wire: WireTarget,
}

/// Path and query as they go on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
struct WireTarget {
    pathname: String,
    query: QueryPairs,
}

impl RequestDescriptor {
    /// The HTTP verb.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The target URI.
    pub fn uri(&self) -> &RequestUri {
        &self.uri
    }

    /// The request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The `content-type` header, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// The request body, if any.
    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// The plain parameters the caller supplied, before defaults and aliases.
    pub fn params(&self) -> &IndexMap<String, Value> {
        &self.params
    }

    /// The URL sent on the wire.
    ///
    /// Unlike [`uri`](Self::uri), values are escaped: each path value stays in
    /// its segment and query pairs are form-encoded, so `&`, `#`, `?`, `=` and `%`
    /// reach the server as part of the value.
    ///
    /// # Errors
    ///
    /// Returns an error if the origin is not a valid URL.
    pub fn wire_url(&self) -> Result<Url, ApiClientError> {
        let mut url = Url::parse(&self.uri.origin)?;
        url.set_path(&self.wire.pathname);
        if !self.wire.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.wire.query);
        }
        Ok(url)
    }
}

/// Everything the assembler needs besides credentials.
#[derive(Debug)]
pub(in crate::client) struct RequestParts {
    pub(in crate::client) method: Method,
    pub(in crate::client) origin: String,
    pub(in crate::client) pathname: String,
    pub(in crate::client) wire_pathname: String,
    pub(in crate::client) query: QueryPairs,
    pub(in crate::client) headers: HeaderMap,
    pub(in crate::client) body: Option<RequestBody>,
    pub(in crate::client) params: IndexMap<String, Value>,
}

impl RequestParts {
    /// Applies the credentials, then freezes the request.
    pub(in crate::client) fn assemble(
        self,
        authentications: &[&Authentication],
    ) -> Result<RequestDescriptor, ApiClientError> {
        let Self {
            method,
            origin,
            pathname,
            wire_pathname,
            mut query,
            mut headers,
            body,
            params,
        } = self;

        for authentication in authentications {
            let mut target = AuthorizationTarget::new(&method, &mut headers, &mut query);
            authentication.decorate(&mut target)?;
        }

        let uri = RequestUri::new(origin, pathname, render_query(&query));
        Ok(RequestDescriptor {
            method,
            uri,
            headers,
            body,
            params,
            wire: WireTarget {
                pathname: wire_pathname,
                query,
            },
        })
    }
}
