use std::time::Duration;

use reqwest::Client;
use reqwest::ClientBuilder;

use crate::errors::RegistryError;
use crate::errors::Result;

/// Configuration for the registry HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Maximum idle connections per host (default: 8)
    pub pool_max_idle_per_host: usize,

    /// Idle timeout for connections (default: 90s)
    pub pool_idle_timeout: Duration,

    /// Connection establishment timeout (default: 10s)
    pub connect_timeout: Duration,

    /// Total request timeout (default: 30s)
    pub request_timeout: Duration,

    /// TCP keepalive interval (default: 60s)
    pub tcp_keepalive: Duration,

    /// Enable TCP_NODELAY (default: true)
    pub tcp_nodelay: bool,

    /// HTTP/2 adaptive window sizing (default: true)
    pub http2_adaptive_window: bool,

    /// Enable Hickory DNS for async resolution (default: true)
    pub hickory_dns: bool,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 8,
            pool_idle_timeout: Duration::from_secs(90),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            tcp_keepalive: Duration::from_secs(60),
            tcp_nodelay: true,
            http2_adaptive_window: true,
            hickory_dns: true,
            user_agent: concat!("docreg/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpClientConfig {
    /// Override the total request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let builder = ClientBuilder::new()
            // Connection pooling
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            // TCP
            .tcp_nodelay(config.tcp_nodelay)
            .tcp_keepalive(Some(config.tcp_keepalive))
            // Timeouts
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            // TLS with rustls
            .use_rustls_tls()
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .http2_adaptive_window(config.http2_adaptive_window)
            .hickory_dns(config.hickory_dns)
            .user_agent(config.user_agent)
            .gzip(true)
            .brotli(true);

        let client = builder.build().map_err(RegistryError::ClientBuild)?;

        Ok(Self { client })
    }

    /// Create a POST request builder
    pub fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.post(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpClientConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.tcp_nodelay);
        assert!(config.hickory_dns);
        assert!(config.user_agent.starts_with("docreg/"));
    }

    #[test]
    fn test_request_timeout_override() {
        let config = HttpClientConfig::default().with_request_timeout(Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
    }
}
