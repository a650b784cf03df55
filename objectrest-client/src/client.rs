//! The API client.

use std::fmt;
use std::sync::Arc;

use objectrest_core::{ServiceSpec, TypeRegistry};
use tokio::runtime::Runtime;

use crate::auth::Credentials;
use crate::builder::ClientBuilder;
use crate::service::ServiceHandle;
use crate::transport::Transport;

/// Shared client configuration and the worker pool backing async dispatch.
///
/// Cloning is cheap; clones share the transport, credentials and worker
/// pool. Handles created through [`service`](ApiClient::service) keep the
/// client alive.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    /// Base URL, always ending with a slash.
    pub(crate) base_url: String,
    pub(crate) credentials: Option<Credentials>,
    pub(crate) transport: Arc<dyn Transport>,
    /// Shared with in-flight calls so worker tasks never have to keep the
    /// whole client (and its runtime) alive.
    pub(crate) registry: Arc<TypeRegistry>,
    /// One shared multi-thread runtime serves all async dispatch; sync calls
    /// block on the caller's thread instead.
    pub(crate) runtime: Runtime,
}

impl ApiClient {
    /// Create a builder for a client targeting `base_url`.
    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    pub(crate) fn from_inner(inner: ClientInner) -> Self {
        ApiClient {
            inner: Arc::new(inner),
        }
    }

    /// The normalized base URL (trailing slash included).
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.inner.credentials.as_ref()
    }

    /// Bind a dispatcher handle to a service, optionally to one instance.
    ///
    /// Generated service constructors call this; application code normally
    /// goes through them.
    pub fn service(&self, spec: &'static ServiceSpec, id: Option<String>) -> ServiceHandle {
        ServiceHandle::new(Arc::clone(&self.inner), spec, id)
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("credentials", &self.inner.credentials)
            .field("registered_types", &self.inner.registry.len())
            .finish_non_exhaustive()
    }
}
