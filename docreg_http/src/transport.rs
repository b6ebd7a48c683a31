use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;

use crate::client::HttpClient;
use crate::client::HttpClientConfig;
use crate::errors::Result;

/// Header carrying the detached document signature
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// One fully built document submission
#[derive(Debug, Clone)]
pub struct RegistryRequest {
    pub url: String,
    pub bearer_token: String,
    pub signature: String,
    /// Serialized JSON document
    pub body: Vec<u8>,
}

/// Status and raw body of a registry answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryResponse {
    pub status: u16,
    pub body: String,
}

impl RegistryResponse {
    pub fn is_accepted(&self) -> bool {
        self.status == 200
    }
}

/// Sends a single request to the registry
///
/// Implementations must not retry; network failures surface as
/// [`crate::RegistryError::Transport`].
pub trait Transport: Send + Sync {
    fn send(&self, request: RegistryRequest) -> Pin<Box<dyn Future<Output = Result<RegistryResponse>> + Send + '_>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: RegistryRequest) -> Pin<Box<dyn Future<Output = Result<RegistryResponse>> + Send + '_>> {
        (**self).send(request)
    }
}

/// Transport backed by the pooled reqwest client
pub struct ReqwestTransport {
    client: HttpClient,
}

impl ReqwestTransport {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        Ok(Self::new(HttpClient::with_config(config)?))
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: RegistryRequest) -> Pin<Box<dyn Future<Output = Result<RegistryResponse>> + Send + '_>> {
        Box::pin(async move {
            let mut builder = self.client.post(&request.url).header(CONTENT_TYPE, "application/json").bearer_auth(&request.bearer_token);

            if !request.signature.is_empty() {
                builder = builder.header(SIGNATURE_HEADER, &request.signature);
            }

            let response = builder.body(request.body).send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;

            Ok(RegistryResponse { status, body })
        })
    }
}
