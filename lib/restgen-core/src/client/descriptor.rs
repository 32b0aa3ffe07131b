//! Static method descriptors.
//!
//! An [`ApiDescriptor`] is the read-only table a client dispatches on: one
//! [`MethodDescriptor`] per callable method, keyed by its dotted identifier
//! (e.g. `drive.files.get`). Descriptors are usually produced from a discovery
//! document by an external loader; they can also be written by hand or loaded
//! from JSON with [`ApiDescriptor::from_json`].

use http::Method;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::ApiClientError;

/// Description of one API version: where it lives and which methods it exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDescriptor {
    /// API name, e.g. `drive`.
    pub name: String,
    /// API version, e.g. `v2`.
    pub version: String,
    /// Root URL shared by all APIs of a deployment, e.g. `https://www.googleapis.com/`.
    pub root_url: String,
    /// Path of this API below the root URL, e.g. `drive/v2/`.
    pub service_path: String,
    /// Methods indexed by identifier.
    #[serde(default)]
    pub methods: IndexMap<String, MethodDescriptor>,
}

impl ApiDescriptor {
    /// Creates an empty descriptor.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        root_url: impl Into<String>,
        service_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            root_url: root_url.into(),
            service_path: service_path.into(),
            methods: IndexMap::new(),
        }
    }

    /// Adds a method, keyed by its identifier.
    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.insert(method.id.clone(), method);
        self
    }

    /// Loads a descriptor table from JSON.
    ///
    /// Methods without an `id` take the key they are stored under.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe an API.
    pub fn from_json(json: &str) -> Result<Self, ApiClientError> {
        let mut descriptor: Self = serde_json::from_str(json)?;
        for (key, method) in &mut descriptor.methods {
            if method.id.is_empty() {
                method.id.clone_from(key);
            }
        }
        Ok(descriptor)
    }

    /// Looks up a method by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::UnknownMethod`] when the table has no such method.
    pub fn method(&self, id: &str) -> Result<&MethodDescriptor, ApiClientError> {
        self.methods
            .get(id)
            .ok_or_else(|| ApiClientError::UnknownMethod { id: id.to_string() })
    }
}

/// Static description of a single API method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDescriptor {
    /// Dotted identifier, e.g. `drive.files.insert`.
    #[serde(default)]
    pub id: String,
    /// HTTP verb.
    #[serde(with = "http_method")]
    pub http_method: Method,
    /// Path template relative to the service path, e.g. `files/{fileId}`.
    pub path: String,
    /// Declared parameters, in declaration order.
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    /// Upload capability, when the method accepts media.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_upload: Option<MediaUpload>,
}

impl MethodDescriptor {
    /// Creates a method without parameters.
    pub fn new(id: impl Into<String>, http_method: Method, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            http_method,
            path: path.into(),
            parameters: Vec::new(),
            media_upload: None,
        }
    }

    /// Declares a parameter.
    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Declares the upload capability.
    pub fn with_media_upload(mut self, media_upload: MediaUpload) -> Self {
        self.media_upload = Some(media_upload);
        self
    }

    /// Finds a declared parameter by canonical name.
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|param| param.name == name)
    }
}

/// Where a declared parameter is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    /// Substituted into the path template.
    Path,
    /// Appended to the query string.
    Query,
}

/// A declared method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    /// Canonical API name, used on the wire.
    pub name: String,
    /// Path or query.
    pub location: ParamLocation,
    /// The call fails when this parameter is absent.
    #[serde(default)]
    pub required: bool,
    /// The parameter may carry several values.
    #[serde(default)]
    pub repeated: bool,
    /// Name callers use instead of the canonical one,
    /// typically because the canonical name is reserved (`resource` → `resource_`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl ParameterSpec {
    fn new(name: impl Into<String>, location: ParamLocation) -> Self {
        Self {
            name: name.into(),
            location,
            required: false,
            repeated: false,
            alias: None,
        }
    }

    /// Declares a path parameter. Path parameters are required.
    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Path).required()
    }

    /// Declares an optional query parameter.
    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Query)
    }

    /// Marks the parameter as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the parameter as repeatable.
    #[must_use]
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Sets the caller-facing alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// Media upload capability of a method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUpload {
    /// Absolute upload path template, e.g. `/upload/drive/v2/files`.
    ///
    /// When absent, uploads go to `upload/<service path><method path>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Accepted MIME patterns, e.g. `*/*` or `image/*`. Empty accepts everything.
    #[serde(default)]
    pub accepts: Vec<String>,
    /// Maximum size as advertised by the API, e.g. `5120GB`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<String>,
}

impl MediaUpload {
    /// Checks a MIME type against the accepted patterns.
    ///
    /// Unparseable types and patterns never match.
    pub fn accepts_mime(&self, mime_type: &str) -> bool {
        if self.accepts.is_empty() {
            return true;
        }
        let Ok(candidate) = mime_type.parse::<mime::Mime>() else {
            return false;
        };
        self.accepts.iter().any(|pattern| {
            let Ok(pattern) = pattern.parse::<mime::Mime>() else {
                return false;
            };
            let type_matches = pattern.type_() == mime::STAR || pattern.type_() == candidate.type_();
            let subtype_matches =
                pattern.subtype() == mime::STAR || pattern.subtype() == candidate.subtype();
            type_matches && subtype_matches
        })
    }
}

mod http_method {
    use http::Method;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(method: &Method, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(method.as_str())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Method, D::Error> {
        let name = String::deserialize(deserializer)?;
        Method::from_bytes(name.to_ascii_uppercase().as_bytes()).map_err(serde::de::Error::custom)
    }
}
