use thiserror::Error;

/// Top-level error type for the `icontrol-api` crate.
///
/// Covers every transport-layer failure mode: authentication, connection,
/// URL construction, and HTTP status errors. `icontrol-core` maps these
/// into its resource-level taxonomy; anything it does not specifically
/// interpret is re-raised to the caller unchanged.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token login failed (wrong credentials, locked account, bad provider).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The device returned a login response without a usable token.
    #[error("Login response carried no token")]
    MissingToken,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── HTTP status ─────────────────────────────────────────────────
    /// Non-2xx response from the device. The body is kept verbatim so the
    /// caller can inspect the device's JSON error payload.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns the HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if this error indicates the auth token has expired
    /// and re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. }) || self.status() == Some(401)
    }
}
