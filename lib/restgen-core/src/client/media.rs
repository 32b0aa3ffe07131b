//! Media upload encoding.
//!
//! The upload shape is decided once per call from the `resource` and `media`
//! reserved parameters:
//!
//! | resource | media body | outcome                                           |
//! |----------|------------|---------------------------------------------------|
//! | no       | no         | no body                                           |
//! | no       | yes        | `uploadType=media`, the media body verbatim       |
//! | yes      | yes        | `uploadType=multipart`, `multipart/related` body  |
//! | yes      | no         | the resource as a JSON body                       |
//!
//! A streamed media body is never buffered: a multipart envelope around it is
//! streamed as prefix, media, suffix.

use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt, TryStreamExt, stream};
use serde_json::Value;
use tracing::warn;

use super::ApiClientError;
use super::descriptor::MethodDescriptor;
use super::request::RequestBody;

/// Content type of a JSON body or metadata part.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type of a media part when the caller gives none.
pub const DEFAULT_MEDIA_TYPE: &str = "text/plain";

const OCTET_STREAM: &str = "application/octet-stream";

/// A fallible stream of bytes used as a media body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync>>;

/// The payload of a media upload.
pub enum MediaBody {
    /// Text, sent as-is.
    Text(String),
    /// Binary content.
    Bytes(Bytes),
    /// A byte stream, read at most once when the request is sent.
    Stream(ByteStream),
}

impl MediaBody {
    /// Wraps a byte stream.
    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + 'static,
    {
        Self::Stream(Box::pin(stream))
    }
}

impl fmt::Debug for MediaBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl From<String> for MediaBody {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for MediaBody {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Bytes> for MediaBody {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<u8>> for MediaBody {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(value))
    }
}

/// The `media` reserved parameter.
///
/// A media without body only carries a MIME type: the call then sends the
/// resource as a plain JSON request.
#[derive(Debug, Default)]
pub struct Media {
    /// MIME type of the media part.
    pub mime_type: Option<String>,
    /// The payload, when there is one.
    pub body: Option<MediaBody>,
}

impl Media {
    /// Creates a media with a body and no explicit MIME type.
    pub fn new(body: impl Into<MediaBody>) -> Self {
        Self {
            mime_type: None,
            body: Some(body.into()),
        }
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Decodes `{ "mimeType": ..., "body": ... }` where the body is a string.
    pub(in crate::client) fn from_json(value: Value) -> Result<Self, ApiClientError> {
        let Value::Object(mut fields) = value else {
            return Err(ApiClientError::UploadEncoding {
                message: format!("media must be an object, got {value}"),
            });
        };
        let mime_type = match fields.remove("mimeType") {
            None | Some(Value::Null) => None,
            Some(Value::String(mime_type)) => Some(mime_type),
            Some(other) => {
                return Err(ApiClientError::UploadEncoding {
                    message: format!("media mimeType must be a string, got {other}"),
                });
            }
        };
        let body = match fields.remove("body") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(MediaBody::Text(text)),
            Some(other) => {
                return Err(ApiClientError::UploadEncoding {
                    message: format!("media body must be a string, got {other}"),
                });
            }
        };
        Ok(Self { mime_type, body })
    }
}

/// The `uploadType` query parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub(in crate::client) enum UploadType {
    #[display("media")]
    Media,
    #[display("multipart")]
    Multipart,
}

/// The bytes actually handed to the transport.
pub(in crate::client) enum OutgoingBody {
    Empty,
    Bytes(Bytes),
    Stream {
        stream: ByteStream,
        failure: Arc<OnceLock<String>>,
    },
}

impl OutgoingBody {
    fn streamed(stream: ByteStream) -> Self {
        let failure = Arc::new(OnceLock::new());
        let slot = Arc::clone(&failure);
        let stream = stream.inspect_err(move |err| {
            let _ = slot.set(err.to_string());
        });
        Self::Stream {
            stream: Box::pin(stream),
            failure,
        }
    }

    /// Shared slot recording the first read failure of a streamed media body.
    pub(in crate::client) fn failure_slot(&self) -> Option<Arc<OnceLock<String>>> {
        match self {
            Self::Stream { failure, .. } => Some(Arc::clone(failure)),
            Self::Empty | Self::Bytes(_) => None,
        }
    }

    pub(in crate::client) fn into_reqwest_body(self) -> Option<reqwest::Body> {
        match self {
            Self::Empty => None,
            Self::Bytes(bytes) => Some(reqwest::Body::from(bytes)),
            Self::Stream { stream, .. } => Some(reqwest::Body::wrap_stream(stream)),
        }
    }
}

impl fmt::Debug for OutgoingBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Stream { .. } => f.write_str("Stream"),
        }
    }
}

/// The encoder output: what to append to the query, which content type to
/// announce, what the descriptor shows, and what the transport sends.
#[derive(Debug)]
pub(in crate::client) struct UploadPlan {
    pub(in crate::client) upload_type: Option<UploadType>,
    pub(in crate::client) content_type: Option<String>,
    pub(in crate::client) body: Option<RequestBody>,
    pub(in crate::client) payload: OutgoingBody,
}

impl UploadPlan {
    fn none() -> Self {
        Self {
            upload_type: None,
            content_type: None,
            body: None,
            payload: OutgoingBody::Empty,
        }
    }

    fn json(resource: &Value) -> Self {
        let json = resource.to_string();
        Self {
            upload_type: None,
            content_type: Some(JSON_CONTENT_TYPE.to_string()),
            payload: OutgoingBody::Bytes(Bytes::from(json.clone())),
            body: Some(RequestBody::Text(json)),
        }
    }

    /// Whether the request goes to the upload endpoint.
    pub(in crate::client) fn is_upload(&self) -> bool {
        self.upload_type.is_some()
    }
}

/// Decides the upload shape and encodes the body.
pub(in crate::client) fn plan_upload(
    method: &MethodDescriptor,
    resource: Option<Value>,
    media: Option<Media>,
) -> UploadPlan {
    let (mime_type, media_body) = match media {
        Some(Media { mime_type, body }) => (mime_type, body),
        None => (None, None),
    };

    let Some(media_body) = media_body else {
        return resource.as_ref().map_or_else(UploadPlan::none, UploadPlan::json);
    };

    match &method.media_upload {
        None => warn!(method = %method.id, "method does not declare media upload"),
        Some(upload) => {
            if let Some(mime_type) = &mime_type
                && !upload.accepts_mime(mime_type)
            {
                warn!(method = %method.id, %mime_type, accepts = ?upload.accepts, "media type not accepted");
            }
        }
    }

    match resource {
        None => simple_media(mime_type, media_body),
        Some(resource) => multipart(&resource, mime_type, media_body),
    }
}

fn simple_media(mime_type: Option<String>, body: MediaBody) -> UploadPlan {
    let (content_type, body, payload) = match body {
        MediaBody::Text(text) => (
            mime_type.unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string()),
            RequestBody::Text(text.clone()),
            OutgoingBody::Bytes(Bytes::from(text)),
        ),
        MediaBody::Bytes(bytes) => (
            mime_type.unwrap_or_else(|| OCTET_STREAM.to_string()),
            RequestBody::Bytes(bytes.clone()),
            OutgoingBody::Bytes(bytes),
        ),
        MediaBody::Stream(stream) => (
            mime_type.unwrap_or_else(|| OCTET_STREAM.to_string()),
            RequestBody::Stream,
            OutgoingBody::streamed(stream),
        ),
    };

    UploadPlan {
        upload_type: Some(UploadType::Media),
        content_type: Some(content_type),
        body: Some(body),
        payload,
    }
}

/// A `multipart/related` envelope: a JSON metadata part followed by one media part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(in crate::client) struct MultipartRelated {
    boundary: String,
}

impl MultipartRelated {
    pub(in crate::client) fn new() -> Self {
        Self {
            boundary: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub(in crate::client) fn content_type(&self) -> String {
        format!("multipart/related; boundary={}", self.boundary)
    }

    /// Everything before the media bytes.
    pub(in crate::client) fn head(&self, resource: &Value, media_type: &str) -> Bytes {
        let boundary = &self.boundary;
        Bytes::from(format!(
            "--{boundary}\r\nContent-Type: {JSON_CONTENT_TYPE}\r\n\r\n{resource}\r\n\
             --{boundary}\r\nContent-Type: {media_type}\r\n\r\n"
        ))
    }

    /// Everything after the media bytes.
    pub(in crate::client) fn tail(&self) -> Bytes {
        Bytes::from(format!("\r\n--{}--", self.boundary))
    }
}

fn multipart(resource: &Value, mime_type: Option<String>, body: MediaBody) -> UploadPlan {
    let envelope = MultipartRelated::new();
    let media_type = mime_type.unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string());
    let head = envelope.head(resource, &media_type);
    let tail = envelope.tail();

    let (body, payload) = match body {
        MediaBody::Stream(media) => {
            let parts = stream::iter([Ok(head)])
                .chain(media)
                .chain(stream::iter([Ok(tail)]));
            (RequestBody::Stream, OutgoingBody::streamed(Box::pin(parts)))
        }
        MediaBody::Text(text) => {
            let bytes = concat(&head, text.as_bytes(), &tail);
            let preview = match std::str::from_utf8(&bytes) {
                Ok(text) => RequestBody::Text(text.to_string()),
                Err(_) => RequestBody::Bytes(bytes.clone()),
            };
            (preview, OutgoingBody::Bytes(bytes))
        }
        MediaBody::Bytes(media) => {
            let bytes = concat(&head, &media, &tail);
            (RequestBody::Bytes(bytes.clone()), OutgoingBody::Bytes(bytes))
        }
    };

    UploadPlan {
        upload_type: Some(UploadType::Multipart),
        content_type: Some(envelope.content_type()),
        body: Some(body),
        payload,
    }
}

fn concat(head: &[u8], media: &[u8], tail: &[u8]) -> Bytes {
    let mut buffer = BytesMut::with_capacity(head.len() + media.len() + tail.len());
    buffer.extend_from_slice(head);
    buffer.extend_from_slice(media);
    buffer.extend_from_slice(tail);
    buffer.freeze()
}
