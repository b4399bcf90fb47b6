// ── Metric schema ──
//
// The fixed catalogue of metrics a process exposes. Each descriptor owns
// its ordered label list; observations are built from that list and
// nothing else, so label arity always matches the registration.

use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::config::ApiFlavor;

/// Metric name prefix shared by every exported series.
pub const METRIC_PREFIX: &str = "sonnenbatterie";

/// Every metric the exporter knows how to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum MetricKind {
    ChargeLevel,
    UserChargeLevel,
    Consumption,
    Production,
    GridFeedIn,
    BatteryPower,
    Charging,
    Discharging,
    FullChargeCapacity,
    AcVoltage,
    BatteryVoltage,
    AcFrequency,
    Info,
    ScrapeSuccess,
}

impl MetricKind {
    /// Fully-qualified Prometheus metric name.
    pub fn name(self) -> &'static str {
        match self {
            Self::ChargeLevel => "sonnenbatterie_charge_level_percent",
            Self::UserChargeLevel => "sonnenbatterie_user_charge_level_percent",
            Self::Consumption => "sonnenbatterie_consumption_mw",
            Self::Production => "sonnenbatterie_production_mw",
            Self::GridFeedIn => "sonnenbatterie_grid_feed_in_mw",
            Self::BatteryPower => "sonnenbatterie_battery_power_mw",
            Self::Charging => "sonnenbatterie_charging",
            Self::Discharging => "sonnenbatterie_discharging",
            Self::FullChargeCapacity => "sonnenbatterie_full_charge_capacity_wh",
            Self::AcVoltage => "sonnenbatterie_ac_voltage",
            Self::BatteryVoltage => "sonnenbatterie_battery_voltage",
            Self::AcFrequency => "sonnenbatterie_ac_frequency",
            Self::Info => "sonnenbatterie_info",
            Self::ScrapeSuccess => "sonnenbatterie_scrape_success",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Self::ChargeLevel => "Battery charge level in percent",
            Self::UserChargeLevel => "User-visible battery charge level in percent",
            Self::Consumption => "Current house consumption in mW",
            Self::Production => "Current solar production in mW",
            Self::GridFeedIn => "Current grid feed-in in mW (negative=consuming from grid)",
            Self::BatteryPower => "Battery power in mW (positive=discharging, negative=charging)",
            Self::Charging => "1 if the battery is charging, 0 otherwise",
            Self::Discharging => "1 if the battery is discharging, 0 otherwise",
            Self::FullChargeCapacity => "Full charge capacity in Wh",
            Self::AcVoltage => "AC voltage in V",
            Self::BatteryVoltage => "Battery voltage in V",
            Self::AcFrequency => "AC frequency in Hz",
            Self::Info => "Battery information, value is always 1",
            Self::ScrapeSuccess => "1 if the last scrape of this battery succeeded, 0 otherwise",
        }
    }
}

/// Label keys. The string form is the Prometheus label name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Label {
    BatteryName,
    BmsState,
    CoreControlState,
    InverterState,
    BatteryModules,
    Ip,
    Model,
    Mac,
    SwVersion,
    HwVersion,
    Led,
    WanIp,
}

const V2_GAUGE_LABELS: &[Label] = &[Label::BatteryName, Label::BmsState, Label::InverterState];

const V2_INFO_LABELS: &[Label] = &[
    Label::BatteryName,
    Label::BmsState,
    Label::CoreControlState,
    Label::InverterState,
    Label::BatteryModules,
    Label::Ip,
];

const PROXY_GAUGE_LABELS: &[Label] = &[Label::BatteryName, Label::Model, Label::Mac];

const PROXY_INFO_LABELS: &[Label] = &[
    Label::BatteryName,
    Label::Model,
    Label::Mac,
    Label::SwVersion,
    Label::HwVersion,
    Label::Led,
    Label::Ip,
    Label::WanIp,
];

const HEALTH_LABELS: &[Label] = &[Label::BatteryName];

/// Name, help text, and ordered label keys for one metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    pub kind: MetricKind,
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [Label],
}

impl MetricDescriptor {
    fn new(kind: MetricKind, labels: &'static [Label]) -> Self {
        Self {
            kind,
            name: kind.name(),
            help: kind.help(),
            labels,
        }
    }

    /// Label names in registration order.
    pub fn label_names(&self) -> Vec<&'static str> {
        self.labels
            .iter()
            .map(|label| <&'static str>::from(*label))
            .collect()
    }
}

/// Immutable set of descriptors for one [`ApiFlavor`].
#[derive(Debug, Clone)]
pub struct MetricSchema {
    flavor: ApiFlavor,
    descriptors: Vec<MetricDescriptor>,
}

impl MetricSchema {
    pub fn new(flavor: ApiFlavor) -> Self {
        let descriptors = MetricKind::iter()
            .filter_map(|kind| {
                labels_for(flavor, kind).map(|labels| MetricDescriptor::new(kind, labels))
            })
            .collect();
        Self {
            flavor,
            descriptors,
        }
    }

    pub fn flavor(&self) -> ApiFlavor {
        self.flavor
    }

    pub fn descriptors(&self) -> &[MetricDescriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, kind: MetricKind) -> Option<&MetricDescriptor> {
        self.descriptors.iter().find(|d| d.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Label set for `kind` under `flavor`, or `None` when the flavor does
/// not export that metric.
fn labels_for(flavor: ApiFlavor, kind: MetricKind) -> Option<&'static [Label]> {
    match (flavor, kind) {
        (_, MetricKind::ScrapeSuccess) => Some(HEALTH_LABELS),
        (ApiFlavor::V2, MetricKind::Info) => Some(V2_INFO_LABELS),
        (ApiFlavor::V2, _) => Some(V2_GAUGE_LABELS),
        (ApiFlavor::Proxy, MetricKind::Info) => Some(PROXY_INFO_LABELS),
        (
            ApiFlavor::Proxy,
            MetricKind::ChargeLevel
            | MetricKind::Consumption
            | MetricKind::Production
            | MetricKind::GridFeedIn
            | MetricKind::Charging
            | MetricKind::Discharging,
        ) => Some(PROXY_GAUGE_LABELS),
        (ApiFlavor::Proxy, _) => None,
    }
}
