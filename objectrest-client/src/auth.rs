//! Request credentials.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

/// Credential kinds the peer accepts on the `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Username and API key, sent as HTTP Basic.
    Basic { username: String, api_key: String },
    /// An opaque bearer token.
    Bearer { token: String },
}

impl Credentials {
    pub fn basic(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Credentials::Basic {
            username: username.into(),
            api_key: api_key.into(),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Credentials::Bearer {
            token: token.into(),
        }
    }

    /// The `Authorization` header value for this credential.
    pub fn authorization(&self) -> String {
        match self {
            Credentials::Basic { username, api_key } => {
                let encoded = BASE64.encode(format!("{username}:{api_key}"));
                format!("Basic {encoded}")
            }
            Credentials::Bearer { token } => format!("Bearer {token}"),
        }
    }
}

// Keep secrets out of debug output.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("api_key", &"…")
                .finish(),
            Credentials::Bearer { .. } => {
                f.debug_struct("Bearer").field("token", &"…").finish()
            }
        }
    }
}
