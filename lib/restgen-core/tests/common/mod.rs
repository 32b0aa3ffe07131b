use std::path::PathBuf;

use rstest::fixture;
use tracing::info;

use restgen_core::{Api, ApiClient, ApiDescriptor};

mod echo_server;
pub use self::echo_server::*;

pub fn init_tracing() {
    // should be run once, fail otherwise, we skip that error
    let _ = tracing_subscriber::fmt()
        .pretty()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    info!("Tracing initialized");
}

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn load_descriptor(name: &str) -> ApiDescriptor {
    let path = fixture_path(&format!("{name}.json"));
    let json = std::fs::read_to_string(&path).unwrap_or_else(|error| panic!("fail to read {path:?}: {error}"));
    ApiDescriptor::from_json(&json).unwrap_or_else(|error| panic!("invalid descriptor {name}: {error}"))
}

/// Binds a fixture API to a client that never leaves the descriptor's root URL.
pub fn offline_api(name: &str) -> Api {
    init_tracing();
    match ApiClient::builder().build().and_then(|client| client.api(load_descriptor(name))) {
        Ok(api) => api,
        Err(error) => panic!("fail to bind {name}: {error:?}"),
    }
}

#[fixture]
pub fn drive() -> Api {
    offline_api("drive")
}

#[fixture]
pub fn gmail() -> Api {
    offline_api("gmail")
}

#[fixture]
pub fn compute() -> Api {
    offline_api("compute")
}

#[fixture]
pub async fn echo() -> EchoServer {
    init_tracing();
    match EchoServer::start().await {
        Ok(server) => server,
        Err(error) => {
            panic!("fail to start echo server: {error:?}");
        }
    }
}
