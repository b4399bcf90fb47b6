use std::time::Duration;

use strum::{AsRefStr, Display, IntoStaticStr};
use thiserror::Error;

/// Top-level error type for the `sonnenbat-api` crate.
///
/// Every variant is scoped to a single request against a single battery.
/// `sonnenbat-core` folds these into per-source scrape outcomes; none of
/// them is meant to abort a whole collection cycle.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The battery rejected the auth token (HTTP 401 or 403).
    #[error("authentication rejected by {url} (HTTP {status})")]
    Authentication { url: String, status: u16 },

    /// The configured token cannot be sent as a header value.
    #[error("invalid auth token: {message}")]
    InvalidCredential { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// DNS, connect or read failure.
    #[error("failed to fetch {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Request exceeded the configured timeout.
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The shared HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    // ── Response ────────────────────────────────────────────────────
    /// Any non-2xx status other than 401/403.
    #[error("unexpected status code {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    /// The body did not decode into the expected shape.
    #[error("failed to decode JSON from {url}: {message}")]
    Deserialization { url: String, message: String },
}

/// Coarse failure classification used for logs and scrape outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    Network,
    Timeout,
    Auth,
    UnexpectedStatus,
    Decode,
}

impl Error {
    /// Classify this error for outcome reporting.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Authentication { .. } | Self::InvalidCredential { .. } => FailureKind::Auth,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::UnexpectedStatus { .. } => FailureKind::UnexpectedStatus,
            Self::Deserialization { .. } => FailureKind::Decode,
            Self::Connection { .. } | Self::InvalidUrl(_) | Self::Client(_) => FailureKind::Network,
        }
    }

    /// Returns `true` if the battery rejected our credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self.kind(), FailureKind::Auth)
    }
}
