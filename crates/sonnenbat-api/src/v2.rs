// Device API v2 endpoints
//
// Talks to the battery directly. Both endpoints require the `Auth-Token`
// header when the device has token auth enabled.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::client::BatteryClient;
use crate::error::Error;

/// Internal component states nested in `/api/v2/latestdata`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IcStatus {
    #[serde(rename = "statebms", default)]
    pub state_bms: Option<String>,
    #[serde(rename = "statecorecontrolmodule", default)]
    pub state_core_control_module: Option<String>,
    #[serde(rename = "stateinverter", default)]
    pub state_inverter: Option<String>,
    #[serde(rename = "nrbatterymodules", default)]
    pub nr_battery_modules: Option<u32>,
}

/// Combined status + system snapshot from `/api/v2/latestdata`.
///
/// Power fields are in watts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestData {
    #[serde(rename = "Consumption_W", default)]
    pub consumption_w: Option<f64>,
    #[serde(rename = "FullChargeCapacity", default)]
    pub full_charge_capacity: Option<f64>,
    #[serde(rename = "GridFeedIn_W", default)]
    pub grid_feed_in_w: Option<f64>,
    #[serde(rename = "Pac_total_W", default)]
    pub pac_total_w: Option<f64>,
    #[serde(rename = "Production_W", default)]
    pub production_w: Option<f64>,
    /// Relative state of charge, percent.
    #[serde(rename = "RSOC", default)]
    pub rsoc: Option<f64>,
    /// User state of charge, percent.
    #[serde(rename = "USOC", default)]
    pub usoc: Option<f64>,
    #[serde(rename = "Timestamp", default)]
    pub timestamp: Option<String>,
    #[serde(rename = "ic_status", default)]
    pub ic_status: Option<IcStatus>,
}

/// Real-time status from `/api/v2/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    #[serde(rename = "BatteryCharging", default)]
    pub battery_charging: Option<bool>,
    #[serde(rename = "BatteryDischarging", default)]
    pub battery_discharging: Option<bool>,
    #[serde(rename = "Consumption_W", default)]
    pub consumption_w: Option<f64>,
    #[serde(rename = "GridFeedIn_W", default)]
    pub grid_feed_in_w: Option<f64>,
    #[serde(rename = "Pac_total_W", default)]
    pub pac_total_w: Option<f64>,
    #[serde(rename = "Production_W", default)]
    pub production_w: Option<f64>,
    #[serde(rename = "RSOC", default)]
    pub rsoc: Option<f64>,
    #[serde(rename = "USOC", default)]
    pub usoc: Option<f64>,
    #[serde(rename = "SystemStatus", default)]
    pub system_status: Option<String>,
    /// AC voltage, volts.
    #[serde(rename = "Uac", default)]
    pub uac: Option<f64>,
    /// Battery voltage, volts.
    #[serde(rename = "Ubat", default)]
    pub ubat: Option<f64>,
    /// AC frequency, hertz.
    #[serde(rename = "Fac", default)]
    pub fac: Option<f64>,
}

impl BatteryClient {
    /// Fetch the combined snapshot.
    ///
    /// `GET {base}/api/v2/latestdata`
    pub async fn latest_data(
        &self,
        base: &Url,
        token: Option<&SecretString>,
    ) -> Result<LatestData, Error> {
        let url = Self::endpoint_url(base, "api/v2/latestdata")?;
        debug!("fetching latest data");
        self.get_json(url, token).await
    }

    /// Fetch the real-time status.
    ///
    /// `GET {base}/api/v2/status`
    pub async fn status(
        &self,
        base: &Url,
        token: Option<&SecretString>,
    ) -> Result<Status, Error> {
        let url = Self::endpoint_url(base, "api/v2/status")?;
        debug!("fetching status");
        self.get_json(url, token).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    #[test]
    fn latest_data_decodes_vendor_field_names() {
        let data: LatestData = serde_json::from_value(json!({
            "Consumption_W": 748,
            "FullChargeCapacity": 10000,
            "GridFeedIn_W": -250.5,
            "Pac_total_W": 100,
            "Production_W": 0,
            "RSOC": 8,
            "USOC": 0,
            "Timestamp": "2025-11-29 21:00:00",
            "ic_status": {
                "statebms": "ready",
                "statecorecontrolmodule": "ongrid",
                "stateinverter": "running",
                "nrbatterymodules": 2
            }
        }))
        .unwrap();

        assert_eq!(data.rsoc, Some(8.0));
        assert_eq!(data.grid_feed_in_w, Some(-250.5));
        let ic = data.ic_status.unwrap();
        assert_eq!(ic.state_bms.as_deref(), Some("ready"));
        assert_eq!(ic.nr_battery_modules, Some(2));
    }

    #[test]
    fn status_tolerates_missing_and_unknown_fields() {
        let status: Status = serde_json::from_value(json!({
            "BatteryCharging": true,
            "Uac": 230.1,
            "SomethingNew": "ignored"
        }))
        .unwrap();

        assert_eq!(status.battery_charging, Some(true));
        assert_eq!(status.battery_discharging, None);
        assert_eq!(status.uac, Some(230.1));
        assert_eq!(status.consumption_w, None);
    }
}
