use axum_helpers::AppInfo;
use core_config::{Environment, FromEnv, redis::RedisConfig, server::ServerConfig};
use domain_recordings::RecordingsConfig;
use queue_worker::WorkerConfig;

/// Process configuration, composed from the shared config components.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub worker: WorkerConfig,
    pub recordings: RecordingsConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?;
        let redis = RedisConfig::from_env()?;
        let worker = WorkerConfig::from_env()?;
        let recordings = RecordingsConfig::from_env()?;

        Ok(Self {
            app: AppInfo {
                name: env!("CARGO_PKG_NAME"),
                version: server.version.clone(),
            },
            environment,
            server,
            redis,
            worker,
            recordings,
        })
    }
}
