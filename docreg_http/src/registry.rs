use std::sync::Arc;
use std::time::Duration;

use docreg_ratelimit::RateLimiter;
use docreg_ratelimit::WindowLimiter;
use tracing::debug;
use tracing::warn;

use crate::client::HttpClientConfig;
use crate::document::Document;
use crate::errors::RegistryError;
use crate::errors::Result;
use crate::transport::RegistryRequest;
use crate::transport::ReqwestTransport;
use crate::transport::Transport;

pub const DEFAULT_ENDPOINT: &str = "https://ismp.crpt.ru/api/v3/lk/documents/create";

const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
const DEFAULT_REQUEST_LIMIT: u32 = 5;

/// Document registry client with window-based admission control
///
/// Every call to [`RegistryClient::create_document`] takes one permit from the
/// shared [`WindowLimiter`] right before sending, whatever the outcome of the
/// request. Permits come back only when the window resets.
pub struct RegistryClient<T = ReqwestTransport> {
    transport: T,
    endpoint: String,
    bearer_token: String,
    limiter: Arc<WindowLimiter>,
}

impl RegistryClient<ReqwestTransport> {
    /// Create a client admitting `request_limit` documents per `window` against the default endpoint
    pub fn new(window: Duration, request_limit: u32, bearer_token: impl Into<String>) -> Result<Self> {
        Self::builder().window(window).request_limit(request_limit).bearer_token(bearer_token).build()
    }

    /// Create a new client builder
    pub fn builder() -> RegistryClientBuilder {
        RegistryClientBuilder::default()
    }
}

impl<T: Transport> RegistryClient<T> {
    /// Submit a document, waiting as long as needed for admission
    pub async fn create_document(&self, document: &Document, signature: &str) -> Result<()> {
        let body = serde_json::to_vec(document)?;

        self.limiter.acquire().await?;

        self.submit(body, signature).await
    }

    /// Submit a document, giving up if no permit is granted within `max_wait`
    ///
    /// On expiry nothing is sent and no permit is consumed.
    pub async fn create_document_within(&self, document: &Document, signature: &str, max_wait: Duration) -> Result<()> {
        let body = serde_json::to_vec(document)?;

        self.limiter.acquire_timeout(max_wait).await?;

        self.submit(body, signature).await
    }

    async fn submit(&self, body: Vec<u8>, signature: &str) -> Result<()> {
        debug!(endpoint = %self.endpoint, bytes = body.len(), "Sending document");

        let request =
            RegistryRequest { url: self.endpoint.clone(), bearer_token: self.bearer_token.clone(), signature: signature.to_string(), body };

        let response = self.transport.send(request).await?;

        if !response.is_accepted() {
            warn!(status = response.status, "Registry rejected document");
            return Err(RegistryError::RequestRejected { status: response.status, body: response.body });
        }

        debug!("Document accepted");
        Ok(())
    }

    /// Limiter shared by every caller of this client
    pub fn limiter(&self) -> &Arc<WindowLimiter> {
        &self.limiter
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Builder for configuring a registry client
pub struct RegistryClientBuilder {
    http_config: HttpClientConfig,
    endpoint: String,
    bearer_token: Option<String>,
    window: Duration,
    request_limit: u32,
    limiter: Option<Arc<WindowLimiter>>,
}

impl Default for RegistryClientBuilder {
    fn default() -> Self {
        Self {
            http_config: HttpClientConfig::default(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            bearer_token: None,
            window: DEFAULT_WINDOW,
            request_limit: DEFAULT_REQUEST_LIMIT,
            limiter: None,
        }
    }
}

impl RegistryClientBuilder {
    /// Set the document creation endpoint
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    /// Set the bearer token sent in the Authorization header
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set the admission window
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Set the maximum number of requests per window
    pub fn request_limit(mut self, limit: u32) -> Self {
        self.request_limit = limit;
        self
    }

    /// Configure HTTP client settings
    pub fn http_config(mut self, config: HttpClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Share an existing limiter instead of creating one from window and limit
    pub fn limiter(mut self, limiter: Arc<WindowLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Build a client sending over reqwest
    pub fn build(self) -> Result<RegistryClient<ReqwestTransport>> {
        self.validate()?;
        let transport = ReqwestTransport::with_config(self.http_config.clone())?;
        self.build_with_transport(transport)
    }

    /// Build a client sending over a custom transport
    pub fn build_with_transport<T: Transport>(self, transport: T) -> Result<RegistryClient<T>> {
        self.validate()?;

        let bearer_token = self.bearer_token.ok_or_else(|| RegistryError::InvalidConfig("bearer token must be set".into()))?;

        let limiter = match self.limiter {
            Some(limiter) => limiter,
            None => Arc::new(WindowLimiter::new(self.request_limit, self.window).map_err(|err| RegistryError::InvalidConfig(err.to_string()))?),
        };

        Ok(RegistryClient { transport, endpoint: self.endpoint, bearer_token, limiter })
    }

    fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.endpoint).map_err(|err| RegistryError::InvalidConfig(format!("invalid endpoint {}: {}", self.endpoint, err)))?;

        match &self.bearer_token {
            Some(token) if !token.is_empty() => Ok(()),
            _ => Err(RegistryError::InvalidConfig("bearer token must be set".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use docreg_ratelimit::RateLimitError;

    use super::*;
    use crate::document::Description;
    use crate::transport::RegistryResponse;

    /// Records every request and answers from a script, 200 once the script runs out
    struct ScriptedTransport {
        sent: Mutex<Vec<RegistryRequest>>,
        script: Mutex<VecDeque<Result<RegistryResponse>>>,
    }

    impl ScriptedTransport {
        fn answering(responses: Vec<Result<RegistryResponse>>) -> Arc<Self> {
            Arc::new(Self { sent: Mutex::new(Vec::new()), script: Mutex::new(responses.into()) })
        }

        fn sent(&self) -> Vec<RegistryRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&self, request: RegistryRequest) -> Pin<Box<dyn Future<Output = Result<RegistryResponse>> + Send + '_>> {
            self.sent.lock().unwrap().push(request);
            let next = self.script.lock().unwrap().pop_front();
            Box::pin(async move { next.unwrap_or_else(|| Ok(RegistryResponse { status: 200, body: "{}".into() })) })
        }
    }

    fn sample_document() -> Document {
        Document {
            description: Description { participant_inn: Some("7700000000".into()) },
            doc_id: Some("doc-42".into()),
            ..Default::default()
        }
    }

    fn client_with(transport: Arc<ScriptedTransport>, limit: u32, window: Duration) -> RegistryClient<Arc<ScriptedTransport>> {
        RegistryClient::builder()
            .endpoint("https://registry.test/api/v3/lk/documents/create")
            .bearer_token("secret-token")
            .request_limit(limit)
            .window(window)
            .build_with_transport(transport)
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_accepted_document_consumes_one_permit() {
        let transport = ScriptedTransport::answering(vec![]);
        let client = client_with(Arc::clone(&transport), 5, Duration::from_secs(60));

        client.create_document(&sample_document(), "sig").await.unwrap();

        assert_eq!(client.limiter().available(), 4);
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "https://registry.test/api/v3/lk/documents/create");
        assert_eq!(sent[0].bearer_token, "secret-token");
        assert_eq!(sent[0].signature, "sig");
        let body: Document = serde_json::from_slice(&sent[0].body).unwrap();
        assert_eq!(body, sample_document());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_document_still_consumes_permit() {
        let transport = ScriptedTransport::answering(vec![Ok(RegistryResponse { status: 500, body: "error".into() })]);
        let client = client_with(Arc::clone(&transport), 5, Duration::from_secs(60));

        let err = client.create_document(&sample_document(), "sig").await.unwrap_err();

        match err {
            RegistryError::RequestRejected { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "error");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(client.limiter().available(), 4);
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_surfaces() {
        let failure: Result<RegistryResponse> = Err(RegistryError::Transport("connection reset".into()));
        let transport = ScriptedTransport::answering(vec![failure]);
        let client = client_with(Arc::clone(&transport), 2, Duration::from_secs(60));

        let err = client.create_document(&sample_document(), "sig").await.unwrap_err();

        assert!(matches!(err, RegistryError::Transport(_)));
        assert!(!err.never_sent());
        assert_eq!(client.limiter().available(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_wait_expires_without_sending() {
        let transport = ScriptedTransport::answering(vec![]);
        let client = client_with(Arc::clone(&transport), 1, Duration::from_secs(60));
        client.create_document(&sample_document(), "sig").await.unwrap();

        let err = client.create_document_within(&sample_document(), "sig", Duration::from_secs(5)).await.unwrap_err();

        assert!(matches!(err, RegistryError::InterruptedWait(RateLimitError::Timeout(_))));
        assert!(err.never_sent());
        assert_eq!(transport.sent().len(), 1);

        // The expired wait left the next window intact
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(client.limiter().available(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_waiting_submission() {
        let transport = ScriptedTransport::answering(vec![]);
        let client = Arc::new(client_with(Arc::clone(&transport), 1, Duration::from_secs(60)));
        client.create_document(&sample_document(), "sig").await.unwrap();

        let waiting = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.create_document(&sample_document(), "sig").await })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;
        client.limiter().shutdown();

        let err = waiting.await.unwrap().unwrap_err();
        assert!(matches!(err, RegistryError::InterruptedWait(RateLimitError::Closed)));
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_submissions_throttled_per_window() {
        let transport = ScriptedTransport::answering(vec![]);
        let client = Arc::new(client_with(Arc::clone(&transport), 2, Duration::from_secs(10)));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let client = Arc::clone(&client);
                tokio::spawn(async move { client.create_document(&sample_document(), "sig").await })
            })
            .collect();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(transport.sent().len(), 2);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(transport.sent().len(), 3);

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_clients_share_limiter() {
        let limiter = Arc::new(WindowLimiter::new(2, Duration::from_secs(60)).unwrap());
        let transport = ScriptedTransport::answering(vec![]);

        let first =
            RegistryClient::builder().bearer_token("t").limiter(Arc::clone(&limiter)).build_with_transport(Arc::clone(&transport)).unwrap();
        let second =
            RegistryClient::builder().bearer_token("t").limiter(Arc::clone(&limiter)).build_with_transport(Arc::clone(&transport)).unwrap();

        first.create_document(&sample_document(), "a").await.unwrap();
        second.create_document(&sample_document(), "b").await.unwrap();

        assert_eq!(limiter.available(), 0);
        let err = second.create_document_within(&sample_document(), "c", Duration::from_millis(10)).await.unwrap_err();
        assert!(err.never_sent());
    }

    #[tokio::test]
    async fn test_builder_validation() {
        let transport = ScriptedTransport::answering(vec![]);

        let missing_token = RegistryClient::builder().build_with_transport(Arc::clone(&transport));
        assert!(matches!(missing_token, Err(RegistryError::InvalidConfig(_))));

        let bad_endpoint = RegistryClient::builder().bearer_token("t").endpoint("not a url").build_with_transport(Arc::clone(&transport));
        assert!(matches!(bad_endpoint, Err(RegistryError::InvalidConfig(_))));

        let zero_limit = RegistryClient::builder().bearer_token("t").request_limit(0).build_with_transport(Arc::clone(&transport));
        assert!(matches!(zero_limit, Err(RegistryError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_builder_defaults() {
        let client = RegistryClient::builder().bearer_token("t").build_with_transport(ScriptedTransport::answering(vec![])).unwrap();

        assert_eq!(client.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(client.limiter().capacity(), DEFAULT_REQUEST_LIMIT);
        assert_eq!(client.limiter().window(), DEFAULT_WINDOW);
    }
}
