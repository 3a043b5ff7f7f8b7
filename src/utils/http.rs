//! HTTP client utilities.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Shared HTTP client with sensible defaults.
///
/// One client (and so one connection pool) is shared across all producers
/// of a run; the searcher and the summarizer configure their own user agent
/// and request timeout since the sites they talk to care about different
/// things.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start configuring a client
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Create from an existing reqwest Client
    pub fn from_client(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Get the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`HttpClient`]
#[derive(Debug, Clone)]
pub struct HttpClientBuilder {
    user_agent: String,
    timeout: Duration,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))
                .to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl HttpClientBuilder {
    /// Override the user agent sent with every request
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Override the total per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client
    pub fn build(self) -> HttpClient {
        let client = Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .expect("Failed to create HTTP client");

        HttpClient {
            client: Arc::new(client),
        }
    }
}
