//! Codec errors and the remote fault envelope.

/// Errors raised while encoding or decoding wire values.
///
/// Every variant is fatal to the call it occurred in; the codec never
/// produces a partial result.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The response body or an entity object did not have the expected shape.
    #[error("malformed wire value: {0}")]
    Malformed(String),

    /// An entity object did not carry the type tag as its first property.
    #[error("expected 'complexType' as the first property of an entity object")]
    TagNotFirst,

    /// The wire tag named a registered type that is not a subtype of the
    /// statically expected one.
    #[error("wire type '{actual}' is not a subtype of expected '{expected}'")]
    NotSubtype {
        expected: &'static str,
        actual: String,
    },

    /// A typed decode received a registered subtype where the exact type was
    /// required. Use [`Poly`](crate::Poly) for slots that accept subtypes.
    #[error("wire type '{actual}' cannot be stored in an exact '{expected}' slot")]
    UnexpectedSubtype {
        expected: &'static str,
        actual: &'static str,
    },

    /// A scalar value failed its adapter (date-time, big integer, base64).
    #[error("invalid scalar: {0}")]
    Scalar(String),

    /// A value could not be serialized to JSON.
    #[error("encode error: {0}")]
    Encode(String),
}

/// Category of a remote fault, derived from the HTTP status code.
///
/// The peer reports faults with a JSON envelope; the four well-known statuses
/// get their own kind, anything else is [`FaultKind::Other`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// HTTP 400.
    BadRequest,
    /// HTTP 401.
    Unauthorized,
    /// HTTP 404.
    NotFound,
    /// HTTP 500.
    Internal,
    /// Any other non-2xx status.
    Other,
}

impl FaultKind {
    /// Derive the fault kind from an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => FaultKind::BadRequest,
            401 => FaultKind::Unauthorized,
            404 => FaultKind::NotFound,
            500 => FaultKind::Internal,
            _ => FaultKind::Other,
        }
    }

    /// Get the string representation of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::BadRequest => "bad request",
            FaultKind::Unauthorized => "unauthorized",
            FaultKind::NotFound => "not found",
            FaultKind::Internal => "internal",
            FaultKind::Other => "error",
        }
    }
}

/// A fault reported by the peer on a non-2xx response.
///
/// Carries the peer's message and machine-readable code verbatim, plus the
/// HTTP status and its derived [`FaultKind`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message} (code: {code}, status: {status})")]
pub struct Fault {
    pub kind: FaultKind,
    pub message: String,
    pub code: String,
    pub status: u16,
}

impl Fault {
    /// Build a fault from the peer's error envelope and the response status.
    pub fn from_error(message: impl Into<String>, code: impl Into<String>, status: u16) -> Self {
        Fault {
            kind: FaultKind::from_status(status),
            message: message.into(),
            code: code.into(),
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_kind_from_status() {
        assert_eq!(FaultKind::from_status(400), FaultKind::BadRequest);
        assert_eq!(FaultKind::from_status(401), FaultKind::Unauthorized);
        assert_eq!(FaultKind::from_status(404), FaultKind::NotFound);
        assert_eq!(FaultKind::from_status(500), FaultKind::Internal);
        assert_eq!(FaultKind::from_status(418), FaultKind::Other);
        assert_eq!(FaultKind::from_status(503), FaultKind::Other);
    }

    #[test]
    fn test_fault_carries_peer_fields_verbatim() {
        let fault = Fault::from_error("Access denied", "ACCESS_DENIED", 401);
        assert_eq!(fault.kind, FaultKind::Unauthorized);
        assert_eq!(fault.message, "Access denied");
        assert_eq!(fault.code, "ACCESS_DENIED");
        assert_eq!(fault.status, 401);
        assert_eq!(
            fault.to_string(),
            "Access denied (code: ACCESS_DENIED, status: 401)"
        );
    }
}
