use anyhow::Context;
use axum::Router;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use percent_encoding::percent_decode_str;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use url::form_urlencoded;

use restgen_core::{Api, ApiClient, ApiClientBuilder};

use super::load_descriptor;

/// A local server answering every request with a JSON description of it.
///
/// The description carries the raw path and query, and their decoded forms
/// (`decodedPath`, and `params` as `[name, value]` pairs).
/// Requests with a body answer `201 Created`, others `200 OK`.
/// A path ending with `/missing` answers `404 Not Found`.
pub struct EchoServer {
    root_url: String,
    handle: JoinHandle<()>,
}

impl EchoServer {
    pub async fn start() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await.context("bind a local port")?;
        let addr = listener.local_addr()?;
        let root_url = format!("http://{addr}/");

        let handle = tokio::spawn(async move {
            if let Err(error) = axum::serve(listener, Router::new().fallback(echo)).await {
                info!(?error, "echo server stopped");
            }
        });

        info!(%root_url, "echo server started");
        Ok(Self { root_url, handle })
    }

    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    /// A client builder already pointing at this server.
    pub fn client_builder(&self) -> ApiClientBuilder {
        ApiClient::builder().with_root_url(self.root_url.clone())
    }

    /// Binds a fixture API to this server.
    pub fn api(&self, name: &str) -> anyhow::Result<Api> {
        let api = self.client_builder().build()?.api(load_descriptor(name))?;
        Ok(api)
    }
}

impl Drop for EchoServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    debug!(%method, %uri, "echo");
    let status = if uri.path().ends_with("/missing") {
        StatusCode::NOT_FOUND
    } else if body.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    let body = json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "decodedPath": percent_decode_str(uri.path()).decode_utf8_lossy(),
        "params": form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes()).into_owned().collect::<Vec<_>>(),
        "contentType": header(&headers, "content-type"),
        "userAgent": header(&headers, "user-agent"),
        "authorization": header(&headers, "authorization"),
        "body": String::from_utf8_lossy(&body),
    });
    (status, axum::Json(body))
}
