use std::sync::{Arc, OnceLock};
use std::time::Duration;

use reqwest::Request;
use tracing::debug;

use crate::client::media::OutgoingBody;
use crate::client::request::RequestDescriptor;
use crate::client::{ApiClientError, ApiResponse};

/// A request ready to go on the wire, with the body to stream.
#[derive(Debug)]
pub(in crate::client) struct Exchange {
    pub(in crate::client) client: reqwest::Client,
    pub(in crate::client) request: RequestDescriptor,
    pub(in crate::client) payload: OutgoingBody,
    pub(in crate::client) timeout: Option<Duration>,
}

impl Exchange {
    /// Sends the request and reads the response.
    pub(in crate::client) async fn run(self) -> Result<ApiResponse, ApiClientError> {
        let Self {
            client,
            request,
            payload,
            timeout,
        } = self;

        let failure = payload.failure_slot();
        let request = Self::build_request(&request, payload, timeout)?;

        debug!(?request, "sending...");
        let response = match client.execute(request).await {
            Ok(response) => response,
            Err(error) => return Err(Self::classify(error, failure.as_ref())),
        };
        debug!(?response, "...receiving");

        ApiResponse::read(response).await
    }

    fn build_request(
        descriptor: &RequestDescriptor,
        payload: OutgoingBody,
        timeout: Option<Duration>,
    ) -> Result<Request, ApiClientError> {
        let url = descriptor.wire_url()?;
        let mut request = Request::new(descriptor.method().clone(), url);
        request.headers_mut().clone_from(descriptor.headers());
        *request.body_mut() = payload.into_reqwest_body();
        *request.timeout_mut() = timeout;
        Ok(request)
    }

    /// A transport failure caused by the media stream is an upload encoding failure.
    fn classify(error: reqwest::Error, failure: Option<&Arc<OnceLock<String>>>) -> ApiClientError {
        match failure.and_then(|slot| slot.get()) {
            Some(message) => ApiClientError::UploadEncoding {
                message: format!("media stream failed: {message}"),
            },
            None => ApiClientError::ReqwestError(error),
        }
    }
}
