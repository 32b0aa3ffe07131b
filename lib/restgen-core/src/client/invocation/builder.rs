use http::header::{CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderValue};
use url::Url;

use crate::client::auth::effective_authentications;
use crate::client::descriptor::MethodDescriptor;
use crate::client::media::{OutgoingBody, plan_upload};
use crate::client::parameters::{CallParams, build_path, placeholders, resolve, to_pairs};
use crate::client::request::{RequestDescriptor, RequestParts};
use crate::client::{ApiClientError, ClientContext};

/// Query parameter selecting the upload protocol.
const UPLOAD_TYPE_PARAM: &str = "uploadType";

/// Builds the request of one call.
///
/// Runs synchronously: parameter resolution, path and query building, upload
/// encoding, then credentials. Nothing is sent.
pub(in crate::client) fn prepare(
    context: &ClientContext,
    root: &Url,
    service_path: &str,
    method: &MethodDescriptor,
    params: CallParams,
) -> Result<(RequestDescriptor, OutgoingBody), ApiClientError> {
    let template = join_path(service_path, &method.path);
    let upload_template = upload_template(service_path, method);

    let names = placeholders(&template).chain(placeholders(&upload_template));
    let resolved = resolve(method, &context.default_params, params, names)?;

    let plan = plan_upload(method, resolved.reserved.resource, resolved.reserved.media);
    let template = if plan.is_upload() { upload_template } else { template };
    let path = build_path(&template, &resolved.path)?;

    let mut query = to_pairs(&resolved.query)?;
    if let Some(upload_type) = plan.upload_type {
        query.retain(|(name, _)| name != UPLOAD_TYPE_PARAM);
        query.push((UPLOAD_TYPE_PARAM.to_string(), upload_type.to_string()));
    }

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, context.user_agent.clone());
    if let Some(content_type) = &plan.content_type {
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type)?);
    }

    let parts = RequestParts {
        method: method.http_method.clone(),
        origin: root.origin().ascii_serialization(),
        pathname: join_path(root.path(), &path.verbatim),
        wire_pathname: join_path(root.path(), &path.encoded),
        query,
        headers,
        body: plan.body,
        params: resolved.original,
    };
    let authentications =
        effective_authentications(resolved.reserved.auth.as_ref(), context.authentication.as_ref());
    let request = parts.assemble(&authentications)?;

    Ok((request, plan.payload))
}

/// Path template of the upload endpoint, relative to the root URL.
fn upload_template(service_path: &str, method: &MethodDescriptor) -> String {
    match method.media_upload.as_ref().and_then(|upload| upload.path.as_deref()) {
        Some(path) => path.trim_start_matches('/').to_string(),
        None => join_path("upload", &join_path(service_path, &method.path)),
    }
}

/// Joins two path fragments with exactly one `/`.
///
/// A `rest` starting with `/` is absolute: it replaces `base` entirely, except
/// when `base` itself is absolute, in which case `rest` is rebased onto it.
fn join_path(base: &str, rest: &str) -> String {
    if base.starts_with('/') {
        return format!("{}/{}", base.trim_end_matches('/'), rest.trim_start_matches('/'));
    }
    if rest.starts_with('/') || base.is_empty() {
        return rest.trim_start_matches('/').to_string();
    }
    format!("{}/{rest}", base.trim_end_matches('/'))
}
