//! Hyper-based default transport.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::{TokioExecutor, TokioTimer};

use super::{Transport, TransportRequest, TransportResponse};
use crate::error::Error;

type HyperClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// HTTP transport using hyper_util's legacy client with rustls.
///
/// Supports HTTP/1.1 and HTTP/2 (negotiated via ALPN), native root
/// certificates and connection pooling.
#[derive(Clone)]
pub struct HyperTransport {
    client: HyperClient,
}

impl HyperTransport {
    /// Create a new transport builder.
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::new()
    }

    /// Create a new transport with default settings.
    pub fn new() -> Result<Self, Error> {
        Self::builder().build()
    }
}

impl fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperTransport").finish_non_exhaustive()
    }
}

impl Transport for HyperTransport {
    fn round_trip(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'static, Result<TransportResponse, Error>> {
        let client = self.client.clone();
        Box::pin(async move {
            let mut builder = http::Request::builder()
                .method(request.method)
                .uri(&request.url);
            for (name, value) in request.headers.iter() {
                builder = builder.header(name, value);
            }
            let body = Full::new(request.body.unwrap_or_default());
            let req = builder
                .body(body)
                .map_err(|e| Error::Transport(format!("failed to build request: {e}")))?;

            let response = client
                .request(req)
                .await
                .map_err(|e| Error::Transport(format!("request failed: {e}")))?;

            let (parts, body) = response.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|e| Error::Transport(format!("failed to read response body: {e}")))?
                .to_bytes();

            Ok(TransportResponse {
                status: parts.status,
                headers: parts.headers,
                body,
            })
        })
    }
}

/// Builder for [`HyperTransport`].
#[derive(Debug)]
pub struct HyperTransportBuilder {
    pool_idle_timeout: Option<Duration>,
    pool_max_idle_per_host: usize,
}

impl HyperTransportBuilder {
    pub fn new() -> Self {
        Self {
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
        }
    }

    /// Close pooled connections idle for longer than this. Default 90s.
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Maximum idle connections kept per host. Default 32.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<HyperTransport, Error> {
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| {
                Error::Transport(format!("failed to load native root certificates: {e}"))
            })?
            .https_or_http()
            .enable_all_versions()
            .build();

        let mut builder = Client::builder(TokioExecutor::new());
        builder.pool_timer(TokioTimer::new());
        if let Some(timeout) = self.pool_idle_timeout {
            builder.pool_idle_timeout(timeout);
        }
        builder.pool_max_idle_per_host(self.pool_max_idle_per_host);

        Ok(HyperTransport {
            client: builder.build(connector),
        })
    }
}

impl Default for HyperTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
