use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;

use super::{AUTH_KEY, CallParams, MEDIA_KEY, RESOURCE_KEY};
use crate::client::ApiClientError;
use crate::client::auth::Authentication;
use crate::client::descriptor::{MethodDescriptor, ParamLocation};
use crate::client::media::Media;

/// The reserved group of a call: never written into the path or query.
#[derive(Debug, Default)]
pub(in crate::client) struct Reserved {
    pub(in crate::client) resource: Option<Value>,
    pub(in crate::client) media: Option<Media>,
    pub(in crate::client) auth: Option<Authentication>,
}

/// Call parameters split by destination.
#[derive(Debug)]
pub(in crate::client) struct ResolvedParams {
    /// Values bound to path placeholders.
    pub(in crate::client) path: IndexMap<String, Value>,
    /// Values bound to the query string, declared parameters first, then extras.
    pub(in crate::client) query: IndexMap<String, Value>,
    pub(in crate::client) reserved: Reserved,
    /// The plain values exactly as the caller supplied them.
    pub(in crate::client) original: IndexMap<String, Value>,
}

/// Merges defaults under the call parameters, then validates and partitions them.
///
/// `placeholders` lists every name a path template of the method may consume.
pub(in crate::client) fn resolve<'a>(
    method: &MethodDescriptor,
    defaults: &IndexMap<String, Value>,
    params: CallParams,
    placeholders: impl IntoIterator<Item = &'a str>,
) -> Result<ResolvedParams, ApiClientError> {
    let (values, resource, media, auth) = params.into_parts();

    let mut merged = defaults.clone();
    for (name, value) in &values {
        merged.insert(name.clone(), value.clone());
    }

    let reserved = extract_reserved(&mut merged, resource, media, auth)?;

    for spec in &method.parameters {
        let Some(alias) = spec.alias.as_deref() else {
            continue;
        };
        if let Some(value) = merged.shift_remove(alias)
            && !value.is_null()
        {
            merged.insert(spec.name.clone(), value);
        }
    }

    merged.retain(|_, value| !value.is_null());

    let missing: Vec<_> = method
        .parameters
        .iter()
        .filter(|spec| spec.required && !merged.contains_key(&spec.name))
        .map(|spec| spec.name.clone())
        .collect();
    if !missing.is_empty() {
        return Err(ApiClientError::MissingRequiredParameters {
            method: method.id.clone(),
            missing,
        });
    }

    let placeholders: Vec<&str> = placeholders.into_iter().collect();
    let is_path = |name: &str| {
        placeholders.iter().any(|placeholder| *placeholder == name)
            || method
                .parameters
                .iter()
                .any(|spec| spec.location == ParamLocation::Path && spec.name == name)
    };

    let mut path = IndexMap::new();
    let mut query = IndexMap::new();
    let declared = method.parameters.iter().map(|spec| spec.name.as_str());
    let declared_values: Vec<_> = declared
        .filter_map(|name| merged.shift_remove_entry(name))
        .collect();
    for (name, value) in declared_values.into_iter().chain(merged) {
        if is_path(&name) {
            path.insert(name, value);
        } else {
            query.insert(name, value);
        }
    }

    Ok(ResolvedParams {
        path,
        query,
        reserved,
        original: values,
    })
}

fn extract_reserved(
    merged: &mut IndexMap<String, Value>,
    resource: Option<Value>,
    media: Option<Media>,
    auth: Option<Authentication>,
) -> Result<Reserved, ApiClientError> {
    let plain_resource = merged.shift_remove(RESOURCE_KEY).filter(|value| !value.is_null());
    let plain_media = merged.shift_remove(MEDIA_KEY).filter(|value| !value.is_null());
    if let Some(value) = merged.shift_remove(AUTH_KEY)
        && !value.is_null()
    {
        warn!("plain 'auth' parameter dropped, credentials must be set with `CallParams::with_auth`");
    }

    let media = match (media, plain_media) {
        (Some(media), _) => Some(media),
        (None, Some(value)) => Some(Media::from_json(value)?),
        (None, None) => None,
    };

    Ok(Reserved {
        resource: resource.or(plain_resource),
        media,
        auth,
    })
}

#[cfg(test)]
mod tests {
    use http::Method;
    use serde_json::json;

    use super::*;
    use crate::client::descriptor::ParameterSpec;
    use crate::client::media::MediaBody;

    fn get_file() -> MethodDescriptor {
        MethodDescriptor::new("drive.files.get", Method::GET, "files/{fileId}")
            .with_parameter(ParameterSpec::path("fileId"))
            .with_parameter(ParameterSpec::query("projection"))
            .with_parameter(ParameterSpec::query("resource").with_alias("resource_"))
    }

    fn run(method: &MethodDescriptor, defaults: Value, params: CallParams) -> Result<ResolvedParams, ApiClientError> {
        let defaults: IndexMap<String, Value> = serde_json::from_value(defaults).expect("an object");
        let placeholders: Vec<_> = crate::client::parameters::placeholders(&method.path).collect();
        resolve(method, &defaults, params, placeholders)
    }

    #[test]
    fn should_partition_path_and_query() {
        let params = CallParams::new()
            .param("extra", "x")
            .param("projection", "FULL")
            .param("fileId", "abc");

        let resolved = run(&get_file(), json!({}), params).expect("resolved");

        insta::assert_debug_snapshot!((&resolved.path, &resolved.query), @r#"
        (
            {
                "fileId": String("abc"),
            },
            {
                "projection": String("FULL"),
                "extra": String("x"),
            },
        )
        "#);
    }

    #[test]
    fn should_report_missing_required_parameters() {
        let error = run(&get_file(), json!({}), CallParams::new().param("projection", "FULL"))
            .expect_err("fileId is required");

        insta::assert_snapshot!(error, @"Missing required parameters for 'drive.files.get': fileId");
    }

    #[test]
    fn should_treat_null_as_absent() {
        let params = CallParams::new().param("fileId", Value::Null);

        let error = run(&get_file(), json!({}), params).expect_err("null is absent");

        assert!(matches!(error, ApiClientError::MissingRequiredParameters { .. }));
    }

    #[test]
    fn should_accept_empty_required_values() {
        let resolved = run(&get_file(), json!({}), CallParams::new().param("fileId", "")).expect("resolved");

        assert_eq!(resolved.path.get("fileId"), Some(&json!("")));
    }

    #[test]
    fn should_rewrite_alias_to_canonical_name() {
        let params = CallParams::new()
            .param("fileId", "abc")
            .param("resource_", "my-resource")
            .param("resource", json!({"title": "body"}));

        let resolved = run(&get_file(), json!({}), params).expect("resolved");

        assert_eq!(resolved.query.get("resource"), Some(&json!("my-resource")));
        assert!(!resolved.query.contains_key("resource_"));
        assert_eq!(resolved.reserved.resource, Some(json!({"title": "body"})));
    }

    #[test]
    fn should_let_call_params_override_defaults() {
        let params = CallParams::new().param("fileId", "abc").param("myParam", "456");

        let resolved = run(&get_file(), json!({"myParam": "123", "other": true}), params).expect("resolved");

        insta::assert_debug_snapshot!(resolved.query, @r#"
        {
            "myParam": String("456"),
            "other": Bool(true),
        }
        "#);
        assert_eq!(resolved.original.len(), 2);
    }

    #[test]
    fn should_fill_required_from_defaults() {
        let resolved = run(&get_file(), json!({"fileId": "from-defaults"}), CallParams::new()).expect("resolved");

        assert_eq!(resolved.path.get("fileId"), Some(&json!("from-defaults")));
    }

    #[test]
    fn should_route_reserved_keys() {
        let params = CallParams::from_json(json!({
            "fileId": "abc",
            "media": {"mimeType": "text/plain", "body": "hey"},
            "auth": "not-a-credential",
        }))
        .expect("an object");

        let resolved = run(&get_file(), json!({}), params).expect("resolved");

        assert!(resolved.query.is_empty());
        assert!(resolved.reserved.auth.is_none());
        let media = resolved.reserved.media.expect("media routed");
        assert_eq!(media.mime_type.as_deref(), Some("text/plain"));
        assert!(matches!(media.body, Some(MediaBody::Text(ref text)) if text == "hey"));
    }

    #[test]
    fn should_bind_undeclared_placeholders_to_path() {
        let method = MethodDescriptor::new("storage.objects.get", Method::GET, "b/{bucket}/o/{object}");
        let params = CallParams::new().param("object", "o1").param("bucket", "b1");

        let resolved = run(&method, json!({}), params).expect("resolved");

        assert_eq!(resolved.path.len(), 2);
        assert!(resolved.query.is_empty());
    }
}
