use std::future::{Future, IntoFuture};
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::request::RequestDescriptor;
use super::{ApiClientError, ApiResponse};

mod builder;
pub(in crate::client) use self::builder::prepare;

mod execution;
pub(in crate::client) use self::execution::Exchange;


/// The outcome of an invocation.
pub type Outcome = Result<ApiResponse, ApiClientError>;

type Receiver = oneshot::Receiver<Outcome>;

/// Handle returned by every method call.
///
/// The assembled request is available right away through [`request`](Self::request),
/// before anything is sent. The outcome is observed either by awaiting the handle,
/// or through a callback registered with [`on_complete`](Self::on_complete), or both:
/// each observer sees the same terminal outcome exactly once.
///
/// Without a callback nothing is sent until the handle is awaited.
///
/// # Example
///
/// ```rust,no_run
/// use restgen_core::{ApiClient, ApiDescriptor, CallParams};
///
/// # async fn example(drive: ApiDescriptor) -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::builder().build()?;
/// let files = client.api(drive)?;
///
/// let invocation = files.call("drive.files.get", CallParams::new().param("fileId", "abc"));
/// if let Some(request) = invocation.request() {
///     println!("{}", request.uri().href());
/// }
/// let response = invocation.await?;
/// # Ok(())
/// # }
/// ```
#[derive(derive_more::Debug)]
pub struct Invocation {
    request: Option<RequestDescriptor>,
    state: State,
}

#[derive(derive_more::Debug)]
enum State {
    /// Settled without a network exchange, or after a callback already observed it.
    Settled(#[debug(skip)] Outcome),
    /// Assembled, nothing sent yet.
    Ready(Exchange),
    /// The exchange runs on the runtime.
    Spawned(#[debug(skip)] Receiver),
}

impl Invocation {
    pub(in crate::client) fn ready(request: RequestDescriptor, exchange: Exchange) -> Self {
        Self {
            request: Some(request),
            state: State::Ready(exchange),
        }
    }

    pub(in crate::client) fn failed(method: &str, error: ApiClientError) -> Self {
        debug!(%method, %error, "request construction failed");
        Self {
            request: None,
            state: State::Settled(Err(error)),
        }
    }

    /// The assembled request, or `None` if construction failed.
    pub fn request(&self) -> Option<&RequestDescriptor> {
        self.request.as_ref()
    }

    /// The construction error, if the request could not be assembled.
    pub fn construction_error(&self) -> Option<&ApiClientError> {
        match &self.state {
            State::Settled(Err(error)) if self.request.is_none() => Some(error),
            _ => None,
        }
    }

    /// Registers a completion callback.
    ///
    /// The exchange is spawned on the current tokio runtime and the callback runs
    /// once it settles. A failed construction runs the callback immediately.
    /// Awaiting the returned handle yields the same outcome.
    ///
    /// Outside a tokio runtime the invocation settles as a transport error.
    ///
    /// A callback that panics on the runtime is logged and does not change the
    /// awaited outcome. Callbacks that run synchronously (failed construction,
    /// no runtime) panic in the caller.
    #[must_use]
    pub fn on_complete<F>(self, callback: F) -> Self
    where
        F: FnOnce(&Outcome) + Send + 'static,
    {
        let Self { request, state } = self;

        let exchange: Pin<Box<dyn Future<Output = Outcome> + Send>> = match state {
            State::Settled(outcome) => {
                callback(&outcome);
                return Self {
                    request,
                    state: State::Settled(outcome),
                };
            }
            State::Ready(exchange) => Box::pin(exchange.run()),
            State::Spawned(receiver) => Box::pin(settle(receiver)),
        };

        let Ok(runtime) = Handle::try_current() else {
            let outcome = Err(ApiClientError::TransportError {
                message: "no tokio runtime to run the exchange".to_string(),
            });
            callback(&outcome);
            return Self {
                request,
                state: State::Settled(outcome),
            };
        };

        let (sender, receiver) = oneshot::channel();
        runtime.spawn(async move {
            let outcome = exchange.await;
            if panic::catch_unwind(AssertUnwindSafe(|| callback(&outcome))).is_err() {
                warn!("completion callback panicked");
            }
            let _ = sender.send(outcome);
        });

        Self {
            request,
            state: State::Spawned(receiver),
        }
    }
}

async fn settle(receiver: Receiver) -> Outcome {
    receiver.await.unwrap_or_else(|_| Err(ApiClientError::Cancelled))
}

impl IntoFuture for Invocation {
    type Output = Outcome;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        match self.state {
            State::Settled(outcome) => Box::pin(std::future::ready(outcome)),
            State::Ready(exchange) => Box::pin(exchange.run()),
            State::Spawned(receiver) => Box::pin(settle(receiver)),
        }
    }
}
