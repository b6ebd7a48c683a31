//! # docreg_http
//!
//! Rate-limited client for the document registry API.

pub mod client;
pub mod document;
pub mod errors;
pub mod registry;
pub mod transport;

pub use client::HttpClient;
pub use client::HttpClientConfig;
pub use document::Description;
pub use document::Document;
pub use document::Product;
pub use errors::RegistryError;
pub use errors::Result;
pub use registry::RegistryClient;
pub use registry::RegistryClientBuilder;
pub use transport::RegistryRequest;
pub use transport::RegistryResponse;
pub use transport::ReqwestTransport;
pub use transport::Transport;
