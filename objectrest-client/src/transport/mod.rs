//! The HTTP transport collaborator interface.
//!
//! The dispatcher needs exactly one thing from the transport: a single
//! request/response exchange with fully materialized bodies. Everything
//! below that line — sockets, TLS, pooling — stays behind [`Transport`], so
//! tests substitute a recording fake and never touch the network.

use bytes::Bytes;
use futures::future::BoxFuture;
use http::{HeaderMap, Method, StatusCode};

use crate::error::Error;

mod hyper;

pub use self::hyper::{HyperTransport, HyperTransportBuilder};

/// One outgoing HTTP exchange, fully described.
#[derive(Clone, Debug)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    /// The JSON body, present only when the call has arguments.
    pub body: Option<Bytes>,
}

/// The peer's answer to one exchange.
#[derive(Clone, Debug)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Issues one HTTP exchange.
///
/// Implementations must be cheap to share: the client holds one transport
/// behind an `Arc` and every dispatch goes through it. The returned future
/// is driven on the caller's thread for sync calls and on the client's
/// worker pool for async calls.
pub trait Transport: Send + Sync + 'static {
    fn round_trip(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'static, Result<TransportResponse, Error>>;
}
