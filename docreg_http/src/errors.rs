use docreg_ratelimit::RateLimitError;
use thiserror::Error;

/// Boxed error carried by transport failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum RegistryError {
    /// Connection or network failure; the request may not have reached the registry
    #[error("Transport failure: {0}")]
    Transport(#[source] BoxError),

    /// The registry answered with something other than 200
    #[error("Registry rejected document: HTTP {status}: {body}")]
    RequestRejected { status: u16, body: String },

    /// The wait for a permit ended without admission; nothing was sent
    #[error("Wait for admission interrupted: {0}")]
    InterruptedWait(#[from] RateLimitError),

    #[error("Document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Invalid registry client configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        RegistryError::Transport(Box::new(err))
    }
}

impl RegistryError {
    /// True when the document never left this process
    pub fn never_sent(&self) -> bool {
        matches!(self, RegistryError::InterruptedWait(_) | RegistryError::Serialization(_))
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
