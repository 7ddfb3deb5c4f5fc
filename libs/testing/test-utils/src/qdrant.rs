//! Qdrant test infrastructure

use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage};

const QDRANT_IMAGE: &str = "qdrant/qdrant";
const QDRANT_TAG: &str = "v1.15.1";
const GRPC_PORT: u16 = 6334;

/// Qdrant container for integration tests.
///
/// The container is stopped and removed when this struct is dropped.
pub struct TestQdrant {
    #[allow(dead_code)]
    container: ContainerAsync<GenericImage>,
    /// gRPC endpoint, e.g. `http://127.0.0.1:49160`.
    pub grpc_url: String,
}

impl TestQdrant {
    pub async fn new() -> Self {
        let container = GenericImage::new(QDRANT_IMAGE, QDRANT_TAG)
            .with_exposed_port(GRPC_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stdout("gRPC listening on"))
            .start()
            .await
            .expect("Failed to start Qdrant container");

        let port = container
            .get_host_port_ipv4(GRPC_PORT)
            .await
            .expect("Failed to get Qdrant gRPC port");

        let grpc_url = format!("http://127.0.0.1:{}", port);
        tracing::info!(port, "Test Qdrant ready");

        Self {
            container,
            grpc_url,
        }
    }
}
