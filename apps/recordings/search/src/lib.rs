//! Recordings Search Service
//!
//! One process, two tasks sharing the same clients:
//!
//! ```text
//! HTTP (axum)                          Redis list (REDIS_QUEUE_NAME)
//!   POST /api/upsert  ─ RPUSH ───────▶   │
//!   POST /api/delete  ─ RPUSH ───────▶   │ BLPOP (bounded)
//!   POST /api/search  ─┐                 ▼
//!                      │          QueueWorker<QueueMessage, IngestionProcessor>
//!                      ▼                 │
//!               RecordingService ◀───────┘
//!                      │
//!          EmbeddingProvider + RecordingRepository
//! ```
//!
//! On SIGINT/SIGTERM the server stops accepting requests and the worker
//! finishes its current message before `run()` returns.

pub mod config;

use std::sync::Arc;

use axum::{Router, extract::State, response::Response, routing::get};
use axum_helpers::{
    AppInfo, HealthCheckFuture, ShutdownCoordinator, create_app, create_router, health_router,
    run_health_checks,
};
use core_config::{server::ServerConfig, tracing::init_tracing, tracing::install_color_eyre};
use domain_recordings::{
    ApiDoc, IngestionProcessor, QueueMessage, RecordingService, WeightedVectorBuilder,
    build_provider, build_repository, handlers,
};
use eyre::{Result, WrapErr};
use queue_worker::{JobQueue, QueueWorker, RedisListQueue, init_metrics, metrics_router};
use tracing::{error, info};

use crate::config::Config;

/// Assemble the full HTTP surface around `service`.
///
/// - `GET /` plain text version
/// - `GET /health` liveness, `GET /ready` queue and vector store checks
/// - `GET /metrics` Prometheus text
/// - `POST /api/{upsert,delete,search}`
pub fn build_router(
    service: Arc<RecordingService>,
    app_info: AppInfo,
    server_config: &ServerConfig,
) -> std::io::Result<Router> {
    let version = format!("version: {}", app_info.version);

    let root = Router::new()
        .route(
            "/",
            get(move || {
                let version = version.clone();
                async move { version }
            }),
        )
        .route("/ready", get(ready).with_state(service.clone()))
        .merge(health_router(app_info))
        .merge(metrics_router());

    create_router::<ApiDoc>(root, handlers::router(service), server_config)
}

async fn ready(State(service): State<Arc<RecordingService>>) -> Response {
    let queue = service.queue();
    let repository = service.repository();

    let checks: Vec<(&str, HealthCheckFuture)> = vec![
        (
            "queue",
            Box::pin(async move { queue.ping().await.map_err(|e| e.to_string()) }),
        ),
        (
            "vector_store",
            Box::pin(async move { repository.health_check().await.map_err(|e| e.to_string()) }),
        ),
    ];

    run_health_checks(checks).await
}

/// Run the service until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error if:
/// - configuration is missing or invalid
/// - the embedding provider or vector store client cannot be built
/// - Redis is unreachable at startup
/// - the collection exists with a different dimension than the provider
/// - the HTTP listener cannot bind
pub async fn run() -> Result<()> {
    install_color_eyre();

    let config = Config::from_env().wrap_err("Failed to load configuration")?;
    init_tracing(&config.environment);
    init_metrics().wrap_err("Failed to initialize metrics")?;

    info!(
        name = %config.app.name,
        version = %config.app.version,
        environment = ?config.environment,
        embedding = %config.recordings.embedding.backend(),
        store = %config.recordings.store.backend(),
        collection = %config.recordings.collection_name,
        "Starting recordings search service"
    );

    let provider = build_provider(config.recordings.embedding.clone())
        .wrap_err("Failed to build embedding provider")?;
    let repository = build_repository(
        config.recordings.store.clone(),
        &config.recordings.collection_name,
    )
    .wrap_err("Failed to build vector store client")?;

    info!("Connecting to Redis...");
    let redis = RedisListQueue::connect(&config.redis.url(), config.worker.block_timeout)
        .await
        .wrap_err("Failed to connect to Redis")?;
    let queue = RedisListQueue::new(redis, &config.worker.queue_name);
    let dead_letter = config
        .worker
        .dead_letter_queue
        .as_ref()
        .map(|name| Arc::new(queue.sibling(name)) as Arc<dyn JobQueue>);
    let queue: Arc<dyn JobQueue> = Arc::new(queue);

    let builder = WeightedVectorBuilder::new(provider)
        .with_scenario_weight(config.recordings.scenario_weight);
    let service = Arc::new(
        RecordingService::new(queue.clone(), builder, repository)
            .with_search_limit(config.recordings.search_limit),
    );

    service
        .ensure_collection(&config.recordings.collection_name)
        .await
        .wrap_err("Vector store collection is not usable")?;

    let shutdown = ShutdownCoordinator::new();

    let mut worker = QueueWorker::<QueueMessage, _>::new(
        queue,
        Arc::new(IngestionProcessor::new(service.clone())),
        config.worker.clone(),
    );
    if let Some(dead_letter) = dead_letter {
        worker = worker.with_dead_letter(dead_letter);
    }

    let worker_shutdown = shutdown.subscribe();
    let worker_handle = tokio::spawn(async move { worker.run(worker_shutdown).await });

    let signals = shutdown.clone();
    tokio::spawn(async move { signals.wait_for_signal().await });

    let router = build_router(service, config.app.clone(), &config.server)
        .wrap_err("Failed to build router")?;

    let served = create_app(router, &config.server, shutdown.clone()).await;

    // Stop the worker even when the server exits on its own.
    shutdown.shutdown();
    match worker_handle.await {
        Ok(Ok(())) => info!("Ingestion worker stopped"),
        Ok(Err(e)) => error!(error = %e, "Ingestion worker failed"),
        Err(e) => error!(error = %e, "Ingestion worker task panicked"),
    }

    served.wrap_err("HTTP server failed")?;
    info!("Recordings search service shutdown complete");
    Ok(())
}
