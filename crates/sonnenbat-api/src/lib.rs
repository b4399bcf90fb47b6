// sonnenbat-api: Async Rust client for sonnenBatterie telemetry endpoints (v2 + proxy)

pub mod client;
pub mod error;
pub mod proxy;
pub mod transport;
pub mod v2;

pub use client::BatteryClient;
pub use error::{Error, FailureKind};
pub use proxy::{Consumption, ProxyStatus, System};
pub use transport::{DEFAULT_TIMEOUT, TransportConfig};
pub use v2::{IcStatus, LatestData, Status};
