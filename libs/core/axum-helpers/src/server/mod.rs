//! Server infrastructure: router assembly, health endpoints and graceful
//! shutdown.
//!
//! ```ignore
//! let shutdown = ShutdownCoordinator::new();
//! let router = create_router::<ApiDoc>(root_routes, api_routes, &server_config)?;
//! create_app(router, &server_config, shutdown).await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{create_app, create_router};
pub use health::{AppInfo, HealthCheckFuture, HealthResponse, health_router, run_health_checks};
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
