use super::auth::AuthenticationError;
use super::response::ResponseBody;

/// Errors that can occur when building or invoking an API method.
///
/// Construction errors (missing parameters, unsupported values, invalid headers,
/// upload encoding, credentials) are never returned from the call itself: they settle
/// the [`Invocation`](crate::Invocation) as rejected, and
/// [`Invocation::construction_error`](crate::Invocation::construction_error) reports them
/// before anything is awaited. Transport and application errors are only observed once
/// the exchange completes.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum ApiClientError {
    /// HTTP client error from the underlying reqwest library.
    ///
    /// Occurs when the request cannot be sent, or the response cannot be read.
    ReqwestError(reqwest::Error),

    /// URL parsing error when turning the assembled `href` into a wire URL.
    UrlError(url::ParseError),

    /// Invalid HTTP header value.
    ///
    /// Occurs when a content type or user agent contains invalid characters.
    InvalidHeaderValue(http::header::InvalidHeaderValue),

    /// JSON serialization/deserialization error.
    JsonValueError(serde_json::Error),

    /// The authorization decorator refused to decorate the request.
    #[display("Authentication error: {_0}")]
    Authentication(AuthenticationError),

    /// A declared required parameter is absent after defaults and aliases were applied.
    #[display("Missing required parameters for '{method}': {}", missing.join(", "))]
    #[from(skip)]
    MissingRequiredParameters {
        /// The method identifier.
        method: String,
        /// Canonical names of the missing parameters.
        missing: Vec<String>,
    },

    /// Path template contains unresolved placeholders.
    ///
    /// Only reachable when a descriptor declares a placeholder without a matching parameter.
    #[display("Path '{path}' is missing required arguments: {missings:?}")]
    #[from(skip)]
    PathUnresolved {
        /// The path template that couldn't be resolved.
        path: String,
        /// List of missing parameter names.
        missings: Vec<String>,
    },

    /// Parameter value cannot be written into a path or query string.
    #[display("Unsupported value for parameter '{name}': {value}")]
    #[from(skip)]
    UnsupportedParameterValue {
        /// The parameter name.
        name: String,
        /// The value that failed to convert.
        value: serde_json::Value,
    },

    /// The media body could not be encoded or read.
    #[display("Upload encoding error: {message}")]
    #[from(skip)]
    UploadEncoding {
        /// Description of the failure.
        message: String,
    },

    /// The transport failed while the request was in flight.
    #[display("Transport error: {message}")]
    #[from(skip)]
    TransportError {
        /// Description of the transport failure.
        message: String,
    },

    /// The API answered with a non-2xx status.
    #[display("Application error {status_code}: {body}")]
    #[from(skip)]
    ApplicationError {
        /// The HTTP status code received.
        status_code: u16,
        /// The response body, parsed when possible.
        body: ResponseBody,
    },

    /// The method identifier is not part of the descriptor table.
    #[display("Unknown method: {id}")]
    #[from(skip)]
    UnknownMethod {
        /// The requested method identifier.
        id: String,
    },

    /// The configured root URL is not an absolute URL.
    #[display("Invalid root URL '{root_url}': {error}")]
    #[from(skip)]
    InvalidRootUrl {
        /// The rejected root URL.
        root_url: String,
        /// Why it was rejected.
        error: String,
    },

    /// The exchange was dropped before it settled.
    #[display("Invocation cancelled before completion")]
    #[from(skip)]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_client_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<ApiClientError>();
        assert_sync::<ApiClientError>();
    }

    #[test]
    fn test_missing_required_parameters_names_every_parameter() {
        let error = ApiClientError::MissingRequiredParameters {
            method: "compute.instances.get".to_string(),
            missing: vec!["project".to_string(), "zone".to_string()],
        };

        insta::assert_snapshot!(error, @"Missing required parameters for 'compute.instances.get': project, zone");
    }

    #[test]
    fn test_application_error_display() {
        let error = ApiClientError::ApplicationError {
            status_code: 404,
            body: ResponseBody::Text("not found".to_string()),
        };

        insta::assert_snapshot!(error, @"Application error 404: not found");
    }
}
