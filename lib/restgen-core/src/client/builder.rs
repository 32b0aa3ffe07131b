use std::sync::Arc;
use std::time::Duration;

use http::HeaderValue;
use indexmap::IndexMap;
use serde_json::Value;
use url::Url;

use super::{ApiClient, ApiClientError, Authentication, ClientContext};

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("restgen/", env!("CARGO_PKG_VERSION"));

/// Builder for creating [`ApiClient`] instances.
///
/// # Default Configuration
///
/// - **Root URL**: taken from each [`ApiDescriptor`](crate::ApiDescriptor)
/// - **Default parameters**: none
/// - **Authentication**: none
/// - **User agent**: `restgen/<version>`
/// - **Timeout**: none (the reqwest client's own setting applies)
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use restgen_core::{ApiClient, Authentication};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::builder()
///     .with_root_url("http://127.0.0.1:8080/")
///     .with_default_param("quotaUser", "tests")
///     .with_authentication(Authentication::ApiKey("my-key".into()))
///     .with_timeout(Duration::from_secs(30))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClientBuilder {
    client: reqwest::Client,
    root_url: Option<String>,
    default_params: IndexMap<String, Value>,
    authentication: Option<Authentication>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
}

impl ApiClientBuilder {
    /// Builds the client.
    ///
    /// # Errors
    ///
    /// This method can fail if:
    /// - The root URL is not an absolute URL
    /// - The user agent contains characters not allowed in a header
    pub fn build(self) -> Result<ApiClient, ApiClientError> {
        let Self {
            client,
            root_url,
            default_params,
            authentication,
            user_agent,
            timeout,
        } = self;

        let root_url = root_url.as_deref().map(parse_root_url).transpose()?;
        let user_agent = match user_agent {
            Some(user_agent) => HeaderValue::from_str(&user_agent)?,
            None => HeaderValue::from_static(DEFAULT_USER_AGENT),
        };

        let context = ClientContext {
            client,
            root_url,
            default_params,
            authentication,
            user_agent,
            timeout,
        };
        Ok(ApiClient {
            context: Arc::new(context),
        })
    }

    /// Uses a preconfigured reqwest client (proxy, TLS, connection pool).
    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Overrides the root URL of every API, e.g. to target a local test server.
    pub fn with_root_url(mut self, root_url: impl Into<String>) -> Self {
        self.root_url = Some(root_url.into());
        self
    }

    /// Adds a parameter merged under every call's parameters.
    ///
    /// Call parameters win on key collision.
    pub fn with_default_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.default_params.insert(name.into(), value.into());
        self
    }

    /// Adds several default parameters.
    pub fn with_default_params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.default_params
            .extend(params.into_iter().map(|(name, value)| (name.into(), value.into())));
        self
    }

    /// Sets client-level credentials.
    ///
    /// Call-level credentials that authorize on their own replace them.
    pub fn with_authentication(mut self, authentication: Authentication) -> Self {
        self.authentication = Some(authentication);
        self
    }

    /// Sets the `user-agent` header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets a timeout for each exchange, from sending the request to reading the response headers.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
            root_url: None,
            default_params: IndexMap::new(),
            authentication: None,
            user_agent: None,
            timeout: None,
        }
    }
}

/// Parses an absolute root URL.
pub(in crate::client) fn parse_root_url(root_url: &str) -> Result<Url, ApiClientError> {
    let invalid = |error: String| ApiClientError::InvalidRootUrl {
        root_url: root_url.to_string(),
        error,
    };
    let url = Url::parse(root_url).map_err(|err| invalid(err.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("expected an http(s) URL".to_string()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("a root URL has no query or fragment".to_string()));
    }
    Ok(url)
}
