// ── API-to-domain mapping ──
//
// Merges vendor response shapes into a single `Reading`. Pure functions
// only; no I/O, no logging.

use sonnenbat_api::{Consumption, IcStatus, LatestData, ProxyStatus, Status, System};

use crate::config::{PowerSource, Source};
use crate::model::{ChargeMode, Reading, ReadingLabels};

const MILLIWATTS_PER_WATT: f64 = 1000.0;

/// Convert a watt value from the device API to milliwatts. Sign is kept.
pub fn watts_to_milliwatts(watts: f64) -> f64 {
    watts * MILLIWATTS_PER_WATT
}

/// Pick a power figure present in both v2 shapes according to `policy`,
/// falling back to the other shape when the preferred one lacks it.
fn merge(policy: PowerSource, from_status: Option<f64>, from_latest: Option<f64>) -> Option<f64> {
    match policy {
        PowerSource::Status => from_status.or(from_latest),
        PowerSource::LatestData => from_latest.or(from_status),
    }
}

fn charge_mode_from_status(status: &Status) -> Option<ChargeMode> {
    match (status.battery_charging, status.battery_discharging) {
        (None, None) => None,
        (charging, discharging) => Some(ChargeMode::from_flags(
            charging.unwrap_or(false),
            discharging.unwrap_or(false),
        )),
    }
}

/// Build a reading from the v2 API.
///
/// `latest` is mandatory. `status` is the supplementary shape; when it is
/// `None` the reading omits charging flags and electrical values.
///
/// `policy` covers the four power flows only (consumption, production,
/// grid feed-in, battery power). Charge levels (`RSOC`/`USOC`) always come
/// from `latest` and fall back to `status` only when `latest` lacks them.
pub fn reading_from_v2(
    source: &Source,
    latest: &LatestData,
    status: Option<&Status>,
    policy: PowerSource,
) -> Reading {
    let ic = latest.ic_status.clone().unwrap_or_default();
    let IcStatus {
        state_bms,
        state_core_control_module,
        state_inverter,
        nr_battery_modules,
    } = ic;

    let labels = ReadingLabels {
        battery_name: source.name.clone(),
        bms_state: state_bms.unwrap_or_default(),
        core_control_state: state_core_control_module.unwrap_or_default(),
        inverter_state: state_inverter.unwrap_or_default(),
        battery_modules: nr_battery_modules.map(|n| n.to_string()).unwrap_or_default(),
        ip: source.address(),
        ..ReadingLabels::default()
    };

    let power = |from_status: fn(&Status) -> Option<f64>, from_latest: Option<f64>| {
        merge(policy, status.and_then(from_status), from_latest).map(watts_to_milliwatts)
    };

    Reading {
        charge_level: latest.rsoc.or_else(|| status.and_then(|s| s.rsoc)),
        user_charge_level: latest.usoc.or_else(|| status.and_then(|s| s.usoc)),
        consumption_mw: power(|s| s.consumption_w, latest.consumption_w),
        production_mw: power(|s| s.production_w, latest.production_w),
        grid_feed_in_mw: power(|s| s.grid_feed_in_w, latest.grid_feed_in_w),
        battery_power_mw: power(|s| s.pac_total_w, latest.pac_total_w),
        full_charge_capacity_wh: latest.full_charge_capacity,
        ac_voltage: status.and_then(|s| s.uac),
        battery_voltage: status.and_then(|s| s.ubat),
        ac_frequency: status.and_then(|s| s.fac),
        charge_mode: status.and_then(charge_mode_from_status),
        labels,
    }
}

/// Build a reading from the proxy API.
///
/// Proxy values are already milliwatts. Without `status` the reading
/// carries consumption and identity only.
pub fn reading_from_proxy(
    source: &Source,
    system: &System,
    consumption: &Consumption,
    status: Option<&ProxyStatus>,
) -> Reading {
    let text = |value: Option<&str>| value.unwrap_or_default().to_owned();

    let labels = ReadingLabels {
        battery_name: source.name.clone(),
        model: text(system.model.as_deref()),
        mac: text(system.mac.as_deref()),
        sw_version: text(system.software_version.as_deref()),
        hw_version: text(system.hardware_version.as_deref()),
        led: text(system.led.as_deref()),
        ip: text(system.ip.as_deref()),
        wan_ip: text(system.wan_ip.as_deref()),
        ..ReadingLabels::default()
    };

    Reading {
        charge_level: status.and_then(|s| s.charge_level),
        consumption_mw: consumption.current_mw,
        production_mw: status.and_then(|s| s.production_mw),
        grid_feed_in_mw: status.and_then(|s| s.grid_feed_in_mw),
        charge_mode: status
            .and_then(|s| s.charge_mode.as_deref())
            .map(ChargeMode::from_mode),
        labels,
        ..Reading::default()
    }
}
