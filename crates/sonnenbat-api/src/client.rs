// Battery HTTP client
//
// Wraps `reqwest::Client` with URL construction, the `Auth-Token` header,
// status classification, and JSON decoding. Endpoint methods for each
// API flavor live in `v2.rs` and `proxy.rs` as inherent methods so this
// module stays focused on transport mechanics.

use std::time::Duration;

use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Header carrying the battery's API token.
pub const AUTH_HEADER: &str = "Auth-Token";

/// Maximum number of body characters kept in a decode error preview.
const BODY_PREVIEW_CHARS: usize = 200;

/// Raw HTTP client for sonnenBatterie telemetry endpoints.
///
/// Cheap to clone; every clone shares the same connection pool, so one
/// instance serves all concurrent source tasks of a scrape.
#[derive(Debug, Clone)]
pub struct BatteryClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl BatteryClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            timeout: transport.timeout,
        })
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/{path}`, keeping any path prefix on `base`.
    pub(crate) fn endpoint_url(base: &Url, path: &str) -> Result<Url, Error> {
        let base = base.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body into `T`.
    ///
    /// The token, when present, goes into the [`AUTH_HEADER`] header. A
    /// missing token is legal and simply sends no header.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        token: Option<&SecretString>,
    ) -> Result<T, Error> {
        debug!("GET {url}");

        let mut request = self.http.get(url.clone());
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(token.expose_secret()).map_err(|e| {
                Error::InvalidCredential {
                    message: format!("invalid header value: {e}"),
                }
            })?;
            value.set_sensitive(true);
            request = request.header(AUTH_HEADER, value);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| self.transport_error(&url, e))?;

        self.handle_response(&url, resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        url: &Url,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        trace!(%url, status = status.as_u16(), "response received");

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            return Err(Error::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            url: url.to_string(),
            message: format!("{e} (body preview: {:?})", preview(&body)),
        })
    }

    fn transport_error(&self, url: &Url, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            Error::Connection {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

/// Truncate a body to [`BODY_PREVIEW_CHARS`] characters without splitting
/// a multi-byte character.
fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_CHARS) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}
