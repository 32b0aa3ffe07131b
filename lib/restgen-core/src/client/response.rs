use std::fmt;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::ApiClientError;

/// Body of a response, parsed as far as its content allows.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// No content.
    Empty,
    /// A JSON document.
    Json(Value),
    /// UTF-8 text that is not JSON.
    Text(String),
    /// Anything else.
    Bytes(Bytes),
}

impl ResponseBody {
    /// Parses raw response bytes: JSON when possible, else text, else bytes.
    pub fn parse(bytes: Bytes) -> Self {
        if bytes.is_empty() {
            return Self::Empty;
        }
        if let Ok(json) = serde_json::from_slice(&bytes) {
            return Self::Json(json);
        }
        match String::from_utf8(bytes.to_vec()) {
            Ok(text) => Self::Text(text),
            Err(_) => Self::Bytes(bytes),
        }
    }
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Json(json) => write!(f, "{json}"),
            Self::Text(text) => f.write_str(text),
            Self::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

/// A settled exchange with a 2xx status.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
}

impl ApiResponse {
    /// Reads a transport response.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::ApplicationError`] for a non-2xx status, or the
    /// transport error if the body cannot be read.
    pub(in crate::client) async fn read(response: reqwest::Response) -> Result<Self, ApiClientError> {
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;
        let body = ResponseBody::parse(bytes);

        if !status.is_success() {
            debug!(%status, %body, "application error");
            return Err(ApiClientError::ApplicationError {
                status_code: status.as_u16(),
                body,
            });
        }

        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// The HTTP status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The parsed body.
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Consumes the response, returning the parsed body.
    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    /// The body as JSON, if it parsed as JSON.
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(json) => Some(json),
            _ => None,
        }
    }

    /// The body as text, if it is text.
    ///
    /// A JSON body is not text; use [`json`](Self::json) or [`as_json`](Self::as_json).
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            ResponseBody::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Deserializes the body.
    ///
    /// An empty body deserializes from `null`, so `Option<T>` accepts it.
    ///
    /// # Errors
    ///
    /// Returns an error if the body does not match `T`.
    pub fn as_json<T: DeserializeOwned>(&self) -> Result<T, ApiClientError> {
        let value = match &self.body {
            ResponseBody::Empty => serde_json::from_value(Value::Null)?,
            ResponseBody::Json(json) => T::deserialize(json)?,
            ResponseBody::Text(text) => serde_json::from_str(text)?,
            ResponseBody::Bytes(bytes) => serde_json::from_slice(bytes)?,
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[test]
    fn should_parse_response_bodies() {
        assert_eq!(ResponseBody::parse(Bytes::new()), ResponseBody::Empty);
        assert_eq!(
            ResponseBody::parse(Bytes::from_static(br#"{"id":"abc"}"#)),
            ResponseBody::Json(json!({"id": "abc"}))
        );
        assert_eq!(
            ResponseBody::parse(Bytes::from_static(b"hello world")),
            ResponseBody::Text("hello world".to_string())
        );
        assert_eq!(
            ResponseBody::parse(Bytes::from_static(&[0xff, 0xfe])),
            ResponseBody::Bytes(Bytes::from_static(&[0xff, 0xfe]))
        );
    }

    #[test]
    fn should_display_response_bodies() {
        insta::assert_snapshot!(ResponseBody::Json(json!({"error": "nope"})), @r#"{"error":"nope"}"#);
        insta::assert_snapshot!(ResponseBody::Bytes(Bytes::from_static(b"\x00\x01")), @"<2 bytes>");
        assert_eq!(ResponseBody::Empty.to_string(), "");
    }

    #[test]
    fn should_deserialize_json_body() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct File {
            id: String,
        }

        let response = ApiResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: ResponseBody::Json(json!({"id": "abc", "title": "t"})),
        };

        let file: File = response.as_json().expect("a file");
        assert_eq!(file, File { id: "abc".to_string() });
        assert!(response.text().is_none());

        let empty = ApiResponse {
            status: StatusCode::NO_CONTENT,
            headers: HeaderMap::new(),
            body: ResponseBody::Empty,
        };
        let file: Option<File> = empty.as_json().expect("empty is null");
        assert_eq!(file, None);
    }
}
