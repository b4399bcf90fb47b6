// ── Runtime collection configuration ──
//
// These types describe *what* to scrape. They never touch disk or the
// environment; `sonnenbat-config` resolves files and env vars into them.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use sonnenbat_api::DEFAULT_TIMEOUT;

/// Which upstream API the exporter talks to.
///
/// Global per process: the two flavors expose different label sets, and
/// every source in one process must share the same metric schema.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ApiFlavor {
    /// Device API v2, polled directly on the battery.
    #[default]
    V2,
    /// A sonnenBatterie-api proxy in front of the battery.
    Proxy,
}

/// Which upstream shape wins when both carry the same power figure.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PowerSource {
    /// Prefer `/api/v2/status`, fall back to `/api/v2/latestdata`.
    #[default]
    Status,
    /// Prefer `/api/v2/latestdata`, fall back to `/api/v2/status`.
    LatestData,
}

/// One battery to scrape.
#[derive(Debug, Clone)]
pub struct Source {
    /// Unique within a process; becomes the `battery_name` label.
    pub name: String,
    /// Base URL of the battery (v2) or proxy.
    pub endpoint: Url,
    /// `Auth-Token` value. `None` sends no header.
    pub credential: Option<SecretString>,
}

impl Source {
    pub fn new(name: impl Into<String>, endpoint: Url, credential: Option<SecretString>) -> Self {
        Self {
            name: name.into(),
            endpoint,
            credential,
        }
    }

    /// Host part of the endpoint, with the port when one was given.
    ///
    /// Used for the `ip` info label on v2 sources.
    pub fn address(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        }
    }
}

/// Everything the [`Collector`](crate::Collector) needs besides the schema.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub sources: Vec<Source>,
    pub power_source: PowerSource,
    /// Per-request timeout applied to every upstream call.
    pub timeout: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            power_source: PowerSource::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
