//! Client-side error type.

use objectrest_core::{CodecError, Fault, FaultKind};

/// Errors surfaced by the dispatcher.
///
/// All variants are `Clone` so a future can cache its outcome and report it
/// on every retrieval.
#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    /// The peer answered with a non-2xx status and a fault envelope.
    #[error(transparent)]
    Fault(#[from] Fault),

    /// The HTTP exchange itself failed (connect, TLS, read, worker loss).
    #[error("transport error: {0}")]
    Transport(String),

    /// Encoding the request or decoding the response failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A precondition on the handle failed before any network attempt.
    #[error("invalid call state: {0}")]
    State(String),

    /// A timed wait on a future elapsed before the call completed.
    #[error("timed out waiting for the call result")]
    Timeout,

    /// The call was canceled before it produced a result.
    #[error("the call was canceled")]
    Canceled,
}

impl Error {
    /// The fault category, for remote faults.
    pub fn fault_kind(&self) -> Option<FaultKind> {
        match self {
            Error::Fault(fault) => Some(fault.kind),
            _ => None,
        }
    }

    /// The peer's fault envelope, for remote faults.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Error::Fault(fault) => Some(fault),
            _ => None,
        }
    }
}
