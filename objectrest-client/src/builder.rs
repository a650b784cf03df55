//! Client builder.

use std::sync::Arc;

use objectrest_core::{TypeRegistry, TypeSpec};
use tokio::runtime::Builder as RuntimeBuilder;

use crate::auth::Credentials;
use crate::client::{ApiClient, ClientInner};
use crate::transport::{HyperTransport, Transport};

/// Builder for [`ApiClient`].
///
/// # Example
///
/// ```ignore
/// let client = ApiClient::builder("https://api.example.com/rest/v3/")
///     .credentials(Credentials::basic("user", "key"))
///     .build()?;
/// ```
pub struct ClientBuilder {
    base_url: String,
    credentials: Option<Credentials>,
    transport: Option<Arc<dyn Transport>>,
    registry: Option<TypeRegistry>,
    worker_threads: Option<usize>,
}

impl ClientBuilder {
    /// Create a builder targeting `base_url`. A missing trailing slash is
    /// appended at build time.
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientBuilder {
            base_url: base_url.into(),
            credentials: None,
            transport: None,
            registry: None,
            worker_threads: None,
        }
    }

    /// Set the request credentials.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Shorthand for bearer-token credentials.
    pub fn bearer_token(self, token: impl Into<String>) -> Self {
        self.credentials(Credentials::bearer(token))
    }

    /// Use a custom transport instead of the built-in hyper one.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use an explicit generated type table for polymorphic decode.
    ///
    /// Without this, the client uses the process-wide registry
    /// ([`TypeRegistry::install`]).
    pub fn types(mut self, specs: &[&'static TypeSpec]) -> Self {
        self.registry = Some(TypeRegistry::new(specs));
        self
    }

    /// Number of worker threads for async dispatch. Defaults to the tokio
    /// runtime default.
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.worker_threads = Some(count);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ApiClient, BuildError> {
        let mut base_url = self.base_url;
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                HyperTransport::new().map_err(|e| BuildError::Transport(e.to_string()))?,
            ),
        };

        let registry = Arc::new(
            self.registry
                .unwrap_or_else(|| TypeRegistry::global().clone()),
        );

        let mut runtime = RuntimeBuilder::new_multi_thread();
        runtime.enable_all().thread_name("objectrest-worker");
        if let Some(count) = self.worker_threads {
            runtime.worker_threads(count);
        }
        let runtime = runtime
            .build()
            .map_err(|e| BuildError::Runtime(e.to_string()))?;

        Ok(ApiClient::from_inner(ClientInner {
            base_url,
            credentials: self.credentials,
            transport,
            registry,
            runtime,
        }))
    }
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .field("transport", &self.transport.is_some())
            .field("types", &self.registry.as_ref().map(TypeRegistry::len))
            .field("worker_threads", &self.worker_threads)
            .finish()
    }
}

/// Errors from [`ClientBuilder::build`].
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to start worker runtime: {0}")]
    Runtime(String),
    #[error("failed to create HTTP transport: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_appends_trailing_slash() {
        let client = ApiClient::builder("http://example.com").build().unwrap();
        assert_eq!(client.base_url(), "http://example.com/");
    }

    #[test]
    fn test_build_keeps_existing_slash() {
        let client = ApiClient::builder("http://example.com/").build().unwrap();
        assert_eq!(client.base_url(), "http://example.com/");
    }
}
