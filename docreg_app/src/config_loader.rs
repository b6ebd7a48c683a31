use std::path::Path;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use config::File;
use docreg_http::HttpClientConfig;
use docreg_http::RegistryClient;
use docreg_http::registry::DEFAULT_ENDPOINT;
use serde::Deserialize;

/// Settings for the document submitter, read from a TOML file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmitterConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    pub bearer_token: String,
    #[serde(default = "default_request_limit")]
    pub request_limit: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Give up on admission after this long; wait indefinitely when unset
    #[serde(default)]
    pub max_wait_secs: Option<u64>,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_request_limit() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for SubmitterConfig {
    /// Every optional setting at its default; the bearer token is left empty
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            bearer_token: String::new(),
            request_limit: default_request_limit(),
            window_secs: default_window_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            max_wait_secs: None,
            log_dir: default_log_dir(),
        }
    }
}

impl SubmitterConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }

    /// Build a registry client from these settings; must run inside a tokio runtime
    pub fn build_client(&self) -> docreg_http::Result<RegistryClient> {
        RegistryClient::builder()
            .endpoint(self.endpoint.as_str())
            .bearer_token(self.bearer_token.as_str())
            .request_limit(self.request_limit)
            .window(self.window())
            .http_config(HttpClientConfig::default().with_request_timeout(self.request_timeout()))
            .build()
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SubmitterConfig, ConfigError> {
    let config = Config::builder().add_source(File::from(path.as_ref())).build()?;

    let loaded: SubmitterConfig = config.try_deserialize()?;
    tracing::info!(endpoint = %loaded.endpoint, request_limit = loaded.request_limit, window_secs = loaded.window_secs, "Loaded submitter config");

    Ok(loaded)
}

/// Load submitter config with fallback to default
///
/// The defaults carry no bearer token, so building a client from them fails
/// until one is configured.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> SubmitterConfig {
    let path = path.as_ref();
    match load_config(path) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to load submitter config from {}: {}. Using defaults.", path.display(), err);
            SubmitterConfig::default()
        }
    }
}
