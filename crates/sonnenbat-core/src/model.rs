// ── Normalized domain types ──
//
// One `Reading` per successfully polled source per cycle. Every field is
// optional: a value the upstream did not report stays `None` and is never
// emitted, rather than being exported as zero.

use std::time::Duration;

use sonnenbat_api::FailureKind;

use crate::schema::{Label, MetricKind};

// ── ChargeMode ───────────────────────────────────────────────────

/// Battery direction. Charging and discharging are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ChargeMode {
    Charging,
    Discharging,
    Idle,
}

impl ChargeMode {
    /// Build from the two vendor flags. Both set resolves to `Idle`.
    pub fn from_flags(charging: bool, discharging: bool) -> Self {
        match (charging, discharging) {
            (true, false) => Self::Charging,
            (false, true) => Self::Discharging,
            _ => Self::Idle,
        }
    }

    /// Build from a proxy mode string. Anything unrecognized is `Idle`.
    pub fn from_mode(mode: &str) -> Self {
        if mode.eq_ignore_ascii_case("charging") {
            Self::Charging
        } else if mode.eq_ignore_ascii_case("discharging") {
            Self::Discharging
        } else {
            Self::Idle
        }
    }

    pub fn is_charging(self) -> bool {
        self == Self::Charging
    }

    pub fn is_discharging(self) -> bool {
        self == Self::Discharging
    }
}

// ── ReadingLabels ────────────────────────────────────────────────

/// Every label value a reading can carry. Missing upstream values are
/// empty strings, never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadingLabels {
    pub battery_name: String,
    pub bms_state: String,
    pub core_control_state: String,
    pub inverter_state: String,
    pub battery_modules: String,
    pub ip: String,
    pub model: String,
    pub mac: String,
    pub sw_version: String,
    pub hw_version: String,
    pub led: String,
    pub wan_ip: String,
}

impl ReadingLabels {
    pub fn for_source(name: &str) -> Self {
        Self {
            battery_name: name.to_owned(),
            ..Self::default()
        }
    }

    pub fn value(&self, label: Label) -> &str {
        match label {
            Label::BatteryName => &self.battery_name,
            Label::BmsState => &self.bms_state,
            Label::CoreControlState => &self.core_control_state,
            Label::InverterState => &self.inverter_state,
            Label::BatteryModules => &self.battery_modules,
            Label::Ip => &self.ip,
            Label::Model => &self.model,
            Label::Mac => &self.mac,
            Label::SwVersion => &self.sw_version,
            Label::HwVersion => &self.hw_version,
            Label::Led => &self.led,
            Label::WanIp => &self.wan_ip,
        }
    }
}

// ── Reading ──────────────────────────────────────────────────────

/// Normalized snapshot of one battery. Power values are milliwatts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reading {
    pub charge_level: Option<f64>,
    pub user_charge_level: Option<f64>,
    pub consumption_mw: Option<f64>,
    pub production_mw: Option<f64>,
    /// Negative means drawing from the grid.
    pub grid_feed_in_mw: Option<f64>,
    /// Positive means discharging.
    pub battery_power_mw: Option<f64>,
    pub full_charge_capacity_wh: Option<f64>,
    pub ac_voltage: Option<f64>,
    pub battery_voltage: Option<f64>,
    pub ac_frequency: Option<f64>,
    pub charge_mode: Option<ChargeMode>,
    pub labels: ReadingLabels,
}

impl Reading {
    /// Value for `kind`, if this reading has one.
    ///
    /// `Info` is always 1. `ScrapeSuccess` is not part of a reading.
    pub fn value(&self, kind: MetricKind) -> Option<f64> {
        match kind {
            MetricKind::ChargeLevel => self.charge_level,
            MetricKind::UserChargeLevel => self.user_charge_level,
            MetricKind::Consumption => self.consumption_mw,
            MetricKind::Production => self.production_mw,
            MetricKind::GridFeedIn => self.grid_feed_in_mw,
            MetricKind::BatteryPower => self.battery_power_mw,
            MetricKind::Charging => self.charge_mode.map(|m| flag(m.is_charging())),
            MetricKind::Discharging => self.charge_mode.map(|m| flag(m.is_discharging())),
            MetricKind::FullChargeCapacity => self.full_charge_capacity_wh,
            MetricKind::AcVoltage => self.ac_voltage,
            MetricKind::BatteryVoltage => self.battery_voltage,
            MetricKind::AcFrequency => self.ac_frequency,
            MetricKind::Info => Some(1.0),
            MetricKind::ScrapeSuccess => None,
        }
    }
}

pub(crate) fn flag(on: bool) -> f64 {
    f64::from(u8::from(on))
}

// ── Per-source outcome ───────────────────────────────────────────

/// Whether the supplementary request contributed to a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Coverage {
    Full,
    Partial,
}

/// Why a source produced no reading this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFailure {
    /// An upstream request failed.
    Fetch { kind: FailureKind, message: String },
    /// The source task ended without reporting.
    Aborted { message: String },
}

impl SourceFailure {
    /// Short machine-readable cause for logs and the status page.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Fetch { kind, .. } => (*kind).into(),
            Self::Aborted { .. } => "aborted",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Fetch { message, .. } | Self::Aborted { message } => message,
        }
    }
}

/// Result of polling one source, without the reading itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceReport {
    pub source: String,
    pub result: Result<Coverage, SourceFailure>,
    pub elapsed: Duration,
}

impl SourceReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}
