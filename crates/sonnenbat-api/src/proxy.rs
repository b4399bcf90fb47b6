// sonnenBatterie-api proxy endpoints
//
// The proxy fronts a battery and re-exports its data without auth, with
// power values already converted to milliwatts.

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::client::BatteryClient;
use crate::error::Error;

/// Identity information from `/api/system`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct System {
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub wan_ip: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub software_version: Option<String>,
    #[serde(default)]
    pub hardware_version: Option<String>,
    #[serde(default)]
    pub led: Option<String>,
}

/// House consumption from `/api/consumption`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Consumption {
    #[serde(default)]
    pub current_mw: Option<f64>,
}

/// Charge state and flows from `/api/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxyStatus {
    #[serde(default)]
    pub grid_feed_in_mw: Option<f64>,
    #[serde(default)]
    pub production_mw: Option<f64>,
    #[serde(default)]
    pub charge_level: Option<f64>,
    /// `"charging"`, `"discharging"`, or anything else for idle.
    #[serde(default)]
    pub charge_mode: Option<String>,
}

impl BatteryClient {
    /// `GET {base}/api/system`
    pub async fn proxy_system(&self, base: &Url) -> Result<System, Error> {
        let url = Self::endpoint_url(base, "api/system")?;
        debug!("fetching proxy system info");
        self.get_json(url, None).await
    }

    /// `GET {base}/api/consumption`
    pub async fn proxy_consumption(&self, base: &Url) -> Result<Consumption, Error> {
        let url = Self::endpoint_url(base, "api/consumption")?;
        debug!("fetching proxy consumption");
        self.get_json(url, None).await
    }

    /// `GET {base}/api/status`
    pub async fn proxy_status(&self, base: &Url) -> Result<ProxyStatus, Error> {
        let url = Self::endpoint_url(base, "api/status")?;
        debug!("fetching proxy status");
        self.get_json(url, None).await
    }
}
