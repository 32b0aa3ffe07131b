use std::sync::Arc;
use std::time::Duration;

use http::HeaderValue;
use indexmap::IndexMap;
use serde_json::Value;
use url::Url;

mod builder;
pub use self::builder::{ApiClientBuilder, DEFAULT_USER_AGENT};

mod auth;
pub use self::auth::{
    API_KEY_PARAM, Authentication, AuthenticationError, AuthorizationTarget, Authorizer, SecureString,
};

mod descriptor;
pub use self::descriptor::{ApiDescriptor, MediaUpload, MethodDescriptor, ParamLocation, ParameterSpec};

mod parameters;
pub use self::parameters::{AUTH_KEY, CallParams, MEDIA_KEY, RESOURCE_KEY};

mod media;
pub use self::media::{ByteStream, DEFAULT_MEDIA_TYPE, Media, MediaBody};

mod request;
pub use self::request::{RequestBody, RequestDescriptor, RequestUri};

mod invocation;
pub use self::invocation::{Invocation, Outcome};

mod response;
pub use self::response::{ApiResponse, ResponseBody};

mod error;
pub use self::error::ApiClientError;

/// Configuration shared, read-only, by every call of a client.
#[derive(Debug)]
pub(in crate::client) struct ClientContext {
    pub(in crate::client) client: reqwest::Client,
    pub(in crate::client) root_url: Option<Url>,
    pub(in crate::client) default_params: IndexMap<String, Value>,
    pub(in crate::client) authentication: Option<Authentication>,
    pub(in crate::client) user_agent: HeaderValue,
    pub(in crate::client) timeout: Option<Duration>,
}

/// Entry point: turns [`ApiDescriptor`]s into callable [`Api`]s.
///
/// Cloning is cheap; clones share the configuration.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use restgen_core::{ApiClient, ApiDescriptor, CallParams, MethodDescriptor, ParameterSpec};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let drive = ApiDescriptor::new("drive", "v2", "https://www.googleapis.com/", "drive/v2/")
///     .with_method(
///         MethodDescriptor::new("drive.files.get", Method::GET, "files/{fileId}")
///             .with_parameter(ParameterSpec::path("fileId")),
///     );
///
/// let client = ApiClient::builder().build()?;
/// let drive = client.api(drive)?;
///
/// let invocation = drive.call("drive.files.get", CallParams::new().param("fileId", "abc"));
/// let request = invocation.request().expect("fileId is set");
/// assert_eq!(request.uri().href(), "https://www.googleapis.com/drive/v2/files/abc");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    context: Arc<ClientContext>,
}

// Create
impl ApiClient {
    /// Creates a builder.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Binds a descriptor table to this client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::InvalidRootUrl`] if the descriptor's root URL is
    /// not absolute and the client does not override it.
    pub fn api(&self, descriptor: ApiDescriptor) -> Result<Api, ApiClientError> {
        let root_url = match &self.context.root_url {
            Some(root_url) => root_url.clone(),
            None => builder::parse_root_url(&descriptor.root_url)?,
        };
        Ok(Api {
            context: Arc::clone(&self.context),
            descriptor: Arc::new(descriptor),
            root_url,
        })
    }
}

/// One API version bound to a client: a table-driven method dispatcher.
#[derive(Debug, Clone)]
pub struct Api {
    context: Arc<ClientContext>,
    descriptor: Arc<ApiDescriptor>,
    root_url: Url,
}

impl Api {
    /// The bound descriptor.
    pub fn descriptor(&self) -> &ApiDescriptor {
        &self.descriptor
    }

    /// The root URL requests are sent to.
    pub fn root_url(&self) -> &Url {
        &self.root_url
    }

    /// Identifiers of every callable method, in declaration order.
    pub fn method_ids(&self) -> impl Iterator<Item = &str> {
        self.descriptor.methods.keys().map(String::as_str)
    }

    /// Looks up a callable method.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::UnknownMethod`] if the table has no such method.
    pub fn method(&self, id: &str) -> Result<ApiMethod, ApiClientError> {
        let method = self.descriptor.method(id)?;
        Ok(ApiMethod {
            api: self.clone(),
            method: Arc::new(method.clone()),
        })
    }

    /// Calls a method by identifier.
    ///
    /// An unknown identifier settles the invocation as rejected.
    pub fn call(&self, id: &str, params: CallParams) -> Invocation {
        match self.method(id) {
            Ok(method) => method.call(params),
            Err(error) => Invocation::failed(id, error),
        }
    }
}

/// A callable method of an [`Api`].
#[derive(Debug, Clone)]
pub struct ApiMethod {
    api: Api,
    method: Arc<MethodDescriptor>,
}

impl ApiMethod {
    /// The static description of this method.
    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.method
    }

    /// Calls the method.
    ///
    /// Never fails synchronously: construction errors settle the returned
    /// [`Invocation`] as rejected, with no request attached.
    pub fn call(&self, params: CallParams) -> Invocation {
        let method = &self.method;
        let Api {
            context,
            descriptor,
            root_url,
        } = &self.api;

        match invocation::prepare(context, root_url, &descriptor.service_path, method, params) {
            Ok((request, payload)) => {
                let exchange = invocation::Exchange {
                    client: context.client.clone(),
                    request: request.clone(),
                    payload,
                    timeout: context.timeout,
                };
                Invocation::ready(request, exchange)
            }
            Err(error) => Invocation::failed(&method.id, error),
        }
    }

    /// Calls the method with the client's default parameters only.
    pub fn call_default(&self) -> Invocation {
        self.call(CallParams::default())
    }

    /// Calls the method and registers a completion callback.
    ///
    /// See [`Invocation::on_complete`].
    pub fn call_with_callback<F>(&self, params: CallParams, callback: F) -> Invocation
    where
        F: FnOnce(&Outcome) + Send + 'static,
    {
        self.call(params).on_complete(callback)
    }
}
