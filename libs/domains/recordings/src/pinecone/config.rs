use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse, env_required};

pub const DEFAULT_CONTROL_URL: &str = "https://api.pinecone.io";
pub const API_VERSION: &str = "2025-01";

/// Pinecone configuration.
///
/// The index host is discovered from the control plane unless set
/// explicitly.
#[derive(Debug, Clone)]
pub struct PineconeConfig {
    pub api_key: String,
    pub control_url: String,
    pub index_host: Option<String>,
    pub cloud: String,
    pub region: String,
    pub timeout_secs: u64,
}

impl PineconeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            control_url: DEFAULT_CONTROL_URL.to_string(),
            index_host: None,
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            timeout_secs: 30,
        }
    }

    pub fn with_control_url(mut self, url: impl Into<String>) -> Self {
        self.control_url = url.into();
        self
    }

    pub fn with_index_host(mut self, host: impl Into<String>) -> Self {
        self.index_host = Some(host.into());
        self
    }

    pub fn with_serverless(mut self, cloud: impl Into<String>, region: impl Into<String>) -> Self {
        self.cloud = cloud.into();
        self.region = region.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl FromEnv for PineconeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: env_required("PINECONE_API_KEY")?,
            control_url: env_or_default("PINECONE_CONTROL_URL", DEFAULT_CONTROL_URL),
            index_host: env_optional("PINECONE_INDEX_HOST"),
            cloud: env_or_default("PINECONE_CLOUD", "aws"),
            region: env_or_default("PINECONE_REGION", "us-east-1"),
            timeout_secs: env_parse("PINECONE_TIMEOUT_SECS", 30)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_defaults() {
        temp_env::with_vars(
            [
                ("PINECONE_API_KEY", Some("pc-key")),
                ("PINECONE_CONTROL_URL", None),
                ("PINECONE_INDEX_HOST", None),
                ("PINECONE_CLOUD", None),
                ("PINECONE_REGION", Some("eu-west-1")),
                ("PINECONE_TIMEOUT_SECS", None),
            ],
            || {
                let config = PineconeConfig::from_env().unwrap();
                assert_eq!(config.api_key, "pc-key");
                assert_eq!(config.control_url, DEFAULT_CONTROL_URL);
                assert_eq!(config.index_host, None);
                assert_eq!(config.cloud, "aws");
                assert_eq!(config.region, "eu-west-1");
                assert_eq!(config.timeout_secs, 30);
            },
        );
    }

    #[test]
    fn test_from_env_requires_api_key() {
        temp_env::with_var_unset("PINECONE_API_KEY", || {
            assert!(PineconeConfig::from_env().is_err());
        });
    }
}
