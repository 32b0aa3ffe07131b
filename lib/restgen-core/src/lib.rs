//! # Restgen Core
//!
//! Call REST APIs from their method descriptors, without per-API code.
//!
//! An [`ApiDescriptor`] lists the methods of one API version: HTTP verb, path
//! template, declared parameters, and upload capability. Binding it to an
//! [`ApiClient`] gives an [`Api`] whose methods build and send correctly formed
//! requests from a plain [`CallParams`] object.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use restgen_core::{ApiClient, ApiDescriptor, CallParams};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let drive = ApiDescriptor::from_json(include_str!("../tests/fixtures/drive.json"))?;
//!
//! let client = ApiClient::builder()
//!     .with_default_param("quotaUser", "restgen")
//!     .build()?;
//! let drive = client.api(drive)?;
//!
//! let invocation = drive.call("drive.files.get", CallParams::new().param("fileId", "abc"));
//!
//! // The request is assembled synchronously, before anything is sent
//! let request = invocation.request().expect("fileId is set");
//! assert_eq!(request.uri().pathname(), "/drive/v2/files/abc");
//! assert_eq!(request.uri().query(), Some("quotaUser=restgen"));
//!
//! // Awaiting the invocation sends it
//! let response = invocation.await?;
//! println!("{:?}", response.json());
//! # Ok(())
//! # }
//! ```
//!
//! ## Building Requests
//!
//! - Path placeholders (`files/{fileId}`) are filled from the parameters and the
//!   consumed values never reach the query string.
//! - Everything else goes to the query, declared parameters first, then unknown
//!   extras in the order supplied. Falsy values are kept (`size=0`, `autoDelete=false`),
//!   arrays repeat their key (`metadataHeaders=To&metadataHeaders=Date`), and a
//!   request without parameters has no query at all.
//! - Path and query values are written verbatim, without percent-encoding, in the
//!   inspected [`RequestUri`]. The URL sent on the wire
//!   ([`RequestDescriptor::wire_url`]) escapes them so they arrive intact.
//! - Declared aliases (`resource_`) are rewritten to their API name (`resource`).
//! - Client default parameters are merged under the call parameters.
//! - A missing required parameter fails the call before anything is sent:
//!   [`Invocation::request`] is `None` and the invocation rejects with
//!   [`ApiClientError::MissingRequiredParameters`].
//!
//! ## Uploading Media
//!
//! ```rust,no_run
//! use restgen_core::{ApiClient, ApiDescriptor, CallParams, Media};
//! use serde_json::json;
//!
//! # async fn example(drive: ApiDescriptor) -> Result<(), Box<dyn std::error::Error>> {
//! let drive = ApiClient::builder().build()?.api(drive)?;
//!
//! // JSON metadata and media: multipart/related upload
//! let params = CallParams::new()
//!     .with_resource(json!({ "title": "notes.txt" }))
//!     .with_media(Media::new("hello").with_mime_type("text/plain"));
//! let invocation = drive.call("drive.files.insert", params);
//! assert_eq!(invocation.request().and_then(|it| it.uri().query()), Some("uploadType=multipart"));
//! invocation.await?;
//! # Ok(())
//! # }
//! ```
//!
//! Media alone is sent as a simple `uploadType=media` upload, and a resource
//! alone is a plain JSON body. Stream bodies ([`MediaBody::Stream`]) are piped
//! to the transport without buffering.
//!
//! ## Authentication
//!
//! Client-level credentials are set with [`ApiClientBuilder::with_authentication`],
//! call-level ones with [`CallParams::with_auth`]. Credentials that authorize on
//! their own (bearer, basic, custom [`Authorizer`]s by default) suppress the
//! client-level API key.
//!
//! ## Callbacks
//!
//! [`Invocation::on_complete`] spawns the exchange on the current tokio runtime
//! and runs the callback once it settles. The invocation can still be awaited
//! afterwards and yields the same outcome.

mod client;

// Public API - only expose user-facing types and functions
pub use self::client::{
    API_KEY_PARAM, AUTH_KEY, Api, ApiClient, ApiClientBuilder, ApiClientError, ApiDescriptor, ApiMethod,
    ApiResponse, Authentication, AuthenticationError, AuthorizationTarget, Authorizer, ByteStream,
    CallParams, DEFAULT_MEDIA_TYPE, DEFAULT_USER_AGENT, Invocation, MEDIA_KEY, Media, MediaBody, MediaUpload,
    MethodDescriptor, Outcome, ParamLocation, ParameterSpec, RESOURCE_KEY, RequestBody, RequestDescriptor,
    RequestUri, ResponseBody, SecureString,
};
