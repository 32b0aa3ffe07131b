use std::fmt;
use std::sync::Arc;

use http::{HeaderMap, HeaderValue, Method};
use reqwest::header::AUTHORIZATION;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Query parameter used to carry an API key.
pub const API_KEY_PARAM: &str = "key";

/// Errors that can occur while decorating a request with credentials.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
pub enum AuthenticationError {
    /// Bearer token contains invalid characters for HTTP headers.
    #[display("Bearer token contains invalid characters: {message}")]
    InvalidBearerToken {
        /// Description of the invalid characters or format issue.
        message: String,
    },

    /// Basic authentication username contains invalid characters.
    #[display("Basic auth username contains invalid characters: {message}")]
    InvalidUsername {
        /// Description of the invalid characters or format issue.
        message: String,
    },

    /// Basic authentication password contains invalid characters.
    #[display("Basic auth password contains invalid characters: {message}")]
    InvalidPassword {
        /// Description of the invalid characters or format issue.
        message: String,
    },

    /// A custom authorizer refused the request.
    #[display("Authorizer failed: {message}")]
    AuthorizerFailed {
        /// Why the authorizer failed.
        message: String,
    },
}

/// A credential string, zeroed on drop and masked when printed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureString(String);

impl SecureString {
    /// Wraps a credential.
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// The clear-text credential. Only borrow it while decorating a request.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn mask_sensitive(value: &str) -> String {
        if value.len() <= 8 {
            "***".to_string()
        } else {
            let head = value.get(..4).unwrap_or_default();
            let tail = value.get(value.len() - 4..).unwrap_or_default();
            format!("{head}...{tail}")
        }
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureString")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Self::mask_sensitive(&self.0))
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

/// The parts of an outgoing request an [`Authorizer`] may decorate.
#[derive(Debug)]
pub struct AuthorizationTarget<'a> {
    method: &'a Method,
    headers: &'a mut HeaderMap,
    query: &'a mut Vec<(String, String)>,
}

impl<'a> AuthorizationTarget<'a> {
    pub(in crate::client) fn new(
        method: &'a Method,
        headers: &'a mut HeaderMap,
        query: &'a mut Vec<(String, String)>,
    ) -> Self {
        Self {
            method,
            headers,
            query,
        }
    }

    /// The HTTP verb of the request being decorated.
    pub fn method(&self) -> &Method {
        self.method
    }

    /// Mutable access to the request headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.headers
    }

    /// Returns `true` if the query already carries `name`.
    pub fn has_query_param(&self, name: &str) -> bool {
        self.query.iter().any(|(key, _)| key == name)
    }

    /// Appends a query pair after every parameter of the call.
    pub fn append_query_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.query.push((name.into(), value.into()));
    }
}

/// An opaque credential capability.
///
/// The request engine does not know how credentials work; it only asks the
/// authorizer to decorate each request before it is frozen into a
/// [`RequestDescriptor`](crate::RequestDescriptor).
pub trait Authorizer: fmt::Debug + Send + Sync {
    /// Decorates the outgoing request.
    ///
    /// # Errors
    ///
    /// Returns an error when the credentials cannot be attached.
    fn authorize(&self, target: &mut AuthorizationTarget<'_>) -> Result<(), AuthenticationError>;

    /// Whether this authorizer fully authorizes the request on its own.
    ///
    /// An authorized carrier suppresses the client-level API key.
    fn is_authorized_carrier(&self) -> bool {
        true
    }
}

/// Credentials attached to a request, either per client or per call.
///
/// # Examples
///
/// ```rust
/// use restgen_core::Authentication;
///
/// // API key, sent as `?key=...`
/// let auth = Authentication::ApiKey("my-api-key".into());
///
/// // OAuth2 access token, sent as `Authorization: Bearer ...`
/// let auth = Authentication::Bearer("ya29.token".into());
/// ```
#[derive(Clone)]
pub enum Authentication {
    /// API key appended as the `key` query parameter, unless the call already sets `key`.
    ApiKey(SecureString),

    /// OAuth2 access token, sent as `authorization: Bearer <token>` (RFC 6750).
    Bearer(SecureString),

    /// Username and password, sent as `authorization: Basic ...` (RFC 7617).
    Basic {
        /// User name, must not contain `:`.
        username: String,
        /// Password, zeroed on drop.
        password: SecureString,
    },

    /// A caller-supplied authorizer.
    Custom(Arc<dyn Authorizer>),
}

impl Authentication {
    /// Wraps a custom authorizer.
    pub fn custom(authorizer: impl Authorizer + 'static) -> Self {
        Self::Custom(Arc::new(authorizer))
    }

    /// Whether these credentials authorize the request on their own.
    ///
    /// Only the plain API key is not a carrier.
    pub fn is_authorized_carrier(&self) -> bool {
        match self {
            Self::ApiKey(_) => false,
            Self::Bearer(_) | Self::Basic { .. } => true,
            Self::Custom(authorizer) => authorizer.is_authorized_carrier(),
        }
    }

    /// Decorates the request with these credentials.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationError` if the credentials contain invalid characters
    /// or a custom authorizer fails.
    pub fn decorate(&self, target: &mut AuthorizationTarget<'_>) -> Result<(), AuthenticationError> {
        match self {
            Self::ApiKey(key) => {
                if !target.has_query_param(API_KEY_PARAM) {
                    target.append_query_param(API_KEY_PARAM, key.as_str());
                }
                Ok(())
            }

            Self::Bearer(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {}", token.as_str())).map_err(|err| {
                    AuthenticationError::InvalidBearerToken {
                        message: err.to_string(),
                    }
                })?;
                target.headers_mut().insert(AUTHORIZATION, value);
                Ok(())
            }

            Self::Basic { username, password } => {
                use base64::Engine;

                if username.contains(':') {
                    return Err(AuthenticationError::InvalidUsername {
                        message: format!("'{username}' contains ':'"),
                    });
                }

                let credentials =
                    base64::engine::general_purpose::STANDARD.encode(format!("{username}:{}", password.as_str()));
                let value = HeaderValue::from_str(&format!("Basic {credentials}")).map_err(|err| {
                    AuthenticationError::InvalidPassword {
                        message: err.to_string(),
                    }
                })?;
                target.headers_mut().insert(AUTHORIZATION, value);
                Ok(())
            }

            Self::Custom(authorizer) => authorizer.authorize(target),
        }
    }
}

/// Picks the credentials that apply to one call.
///
/// Call-level credentials always apply. Client-level credentials apply too,
/// unless the call-level credentials are an authorized carrier.
pub(in crate::client) fn effective_authentications<'a>(
    call: Option<&'a Authentication>,
    client: Option<&'a Authentication>,
) -> Vec<&'a Authentication> {
    match (call, client) {
        (Some(call), Some(_)) if call.is_authorized_carrier() => vec![call],
        (Some(call), Some(client)) => vec![client, call],
        (Some(single), None) | (None, Some(single)) => vec![single],
        (None, None) => Vec::new(),
    }
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.debug_tuple("ApiKey").field(&"[REDACTED]").finish(),
            Self::Bearer(_) => f.debug_tuple("Bearer").field(&"[REDACTED]").finish(),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::Custom(authorizer) => f.debug_tuple("Custom").field(authorizer).finish(),
        }
    }
}

impl fmt::Display for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(key) => write!(f, "ApiKey ({key})"),
            Self::Bearer(token) => write!(f, "Bearer {token}"),
            Self::Basic { username, .. } => write!(f, "Basic (username: {username})"),
            Self::Custom(_) => write!(f, "Custom authorizer"),
        }
    }
}
