use crate::{env_optional, env_or_default, env_parse, ConfigError, FromEnv};

/// Redis connection settings.
///
/// `REDIS_HOST` may hold either a bare hostname or a full `redis://` URL.
/// When it is a URL, port and password variables are ignored.
#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
}

impl RedisConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            password: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Connection URL understood by the redis client.
    pub fn url(&self) -> String {
        if self.host.starts_with("redis://") || self.host.starts_with("rediss://") {
            return self.host.clone();
        }
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{}:{}",
                urlencoding::encode(password),
                self.host,
                self.port
            ),
            None => format!("redis://{}:{}", self.host, self.port),
        }
    }
}

impl FromEnv for RedisConfig {
    /// - REDIS_HOST: defaults to localhost
    /// - REDIS_PORT: defaults to 6379
    /// - REDIS_PASSWORD: optional
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env_or_default("REDIS_HOST", "localhost"),
            port: env_parse("REDIS_PORT", 6379)?,
            password: env_optional("REDIS_PASSWORD"),
        })
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self::new("localhost", 6379)
    }
}
