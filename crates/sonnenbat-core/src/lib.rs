//! Collection layer between `sonnenbat-api` and the exporter binary.
//!
//! This crate owns the scrape-time logic of the exporter:
//!
//! - **[`Collector`]**: Runs one collection cycle per scrape:
//!   [`collect()`](Collector::collect) spawns one task per configured
//!   [`Source`], waits for every task, and hands back a [`ScrapeReport`].
//!   A failing battery never aborts the cycle; its failure is reported as
//!   `sonnenbatterie_scrape_success = 0`.
//!
//! - **[`MetricSchema`]**: The fixed set of metric descriptors for the
//!   configured [`ApiFlavor`]. Built once at startup and shared by `Arc`.
//!   Observations are only ever built from a descriptor's own label list.
//!
//! - **Mapper** ([`convert`]): Merges the vendor response shapes into one
//!   normalized [`Reading`], converting watts to milliwatts.
//!
//! - **[`ObservationSink`]**: Append-only, cycle-scoped buffer the source
//!   tasks write into concurrently.

pub mod collector;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod schema;
pub mod sink;

// ── Primary re-exports ──────────────────────────────────────────────
pub use collector::{Collector, ScrapeReport};
pub use config::{ApiFlavor, CollectorConfig, PowerSource, Source};
pub use error::CoreError;
pub use model::{ChargeMode, Coverage, Reading, ReadingLabels, SourceFailure, SourceReport};
pub use schema::{Label, MetricDescriptor, MetricKind, MetricSchema};
pub use sink::{Observation, ObservationSink};

pub use sonnenbat_api::FailureKind;
