// ── Collector ──
//
// One collection cycle per scrape. Every source is polled on its own task;
// the cycle finishes when all of them have reported, and a failing source
// only ever affects its own observations.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sonnenbat_api::{BatteryClient, Error, TransportConfig};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::config::{ApiFlavor, CollectorConfig, PowerSource, Source};
use crate::convert;
use crate::error::CoreError;
use crate::model::{Coverage, Reading, SourceFailure, SourceReport};
use crate::schema::{MetricDescriptor, MetricSchema};
use crate::sink::{Observation, ObservationSink};

/// Everything one cycle produced.
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    pub observations: Vec<Observation>,
    /// One entry per configured source, in configuration order.
    pub sources: Vec<SourceReport>,
    pub elapsed: Duration,
}

impl ScrapeReport {
    pub fn failed(&self) -> usize {
        self.sources.iter().filter(|s| !s.is_success()).count()
    }
}

/// Polls every configured battery. Cheaply cloneable.
#[derive(Debug, Clone)]
pub struct Collector {
    inner: Arc<CollectorInner>,
}

#[derive(Debug)]
struct CollectorInner {
    sources: Vec<Source>,
    schema: Arc<MetricSchema>,
    client: BatteryClient,
    power_source: PowerSource,
}

impl Collector {
    /// Build a collector with its own HTTP client.
    pub fn new(config: CollectorConfig, schema: Arc<MetricSchema>) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(config.timeout);
        let client = BatteryClient::new(&transport)?;
        Self::with_client(config.sources, schema, client, config.power_source)
    }

    /// Build a collector around an existing client.
    pub fn with_client(
        sources: Vec<Source>,
        schema: Arc<MetricSchema>,
        client: BatteryClient,
        power_source: PowerSource,
    ) -> Result<Self, CoreError> {
        if sources.is_empty() {
            return Err(CoreError::NoSources);
        }
        let mut seen = HashSet::new();
        for source in &sources {
            if !seen.insert(source.name.as_str()) {
                return Err(CoreError::DuplicateSource {
                    name: source.name.clone(),
                });
            }
        }

        Ok(Self {
            inner: Arc::new(CollectorInner {
                sources,
                schema,
                client,
                power_source,
            }),
        })
    }

    pub fn sources(&self) -> &[Source] {
        &self.inner.sources
    }

    pub fn schema(&self) -> &MetricSchema {
        &self.inner.schema
    }

    /// Every descriptor this collector can emit. Static for its lifetime.
    pub fn describe(&self) -> &[MetricDescriptor] {
        self.inner.schema.descriptors()
    }

    /// Run one collection cycle.
    ///
    /// Never fails: each source contributes either its metrics plus
    /// `scrape_success 1`, or `scrape_success 0` alone.
    pub async fn collect(&self) -> ScrapeReport {
        let started = Instant::now();
        let sink = Arc::new(ObservationSink::new());
        let mut tasks = JoinSet::new();

        for (index, source) in self.inner.sources.iter().enumerate() {
            let inner = Arc::clone(&self.inner);
            let sink = Arc::clone(&sink);
            let source = source.clone();
            tasks.spawn(async move { (index, poll_source(&inner, &source, &sink).await) });
        }

        let slots = join_reports(tasks, self.inner.sources.len()).await;
        let sources = settle(&self.inner, slots, &sink, started);

        let report = ScrapeReport {
            observations: sink.drain(),
            sources,
            elapsed: started.elapsed(),
        };
        debug!(
            sources = report.sources.len(),
            failed = report.failed(),
            observations = report.observations.len(),
            elapsed = ?report.elapsed,
            "collection cycle complete"
        );
        report
    }
}

/// Wait for every task, placing each report at its source index.
async fn join_reports(
    mut tasks: JoinSet<(usize, SourceReport)>,
    len: usize,
) -> Vec<Option<SourceReport>> {
    let mut slots: Vec<Option<SourceReport>> = vec![None; len];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, report)) => {
                if let Some(slot) = slots.get_mut(index) {
                    *slot = Some(report);
                }
            }
            Err(e) => error!(error = %e, "battery scrape task failed"),
        }
    }
    slots
}

/// Fill empty slots with an aborted report and a `scrape_success 0`.
fn settle(
    inner: &CollectorInner,
    slots: Vec<Option<SourceReport>>,
    sink: &ObservationSink,
    started: Instant,
) -> Vec<SourceReport> {
    inner
        .sources
        .iter()
        .zip(slots)
        .map(|(source, slot)| {
            slot.unwrap_or_else(|| {
                sink.extend(inner.schema.scrape_success(&source.name, false));
                SourceReport {
                    source: source.name.clone(),
                    result: Err(SourceFailure::Aborted {
                        message: "scrape task ended without a result".into(),
                    }),
                    elapsed: started.elapsed(),
                }
            })
        })
        .collect()
}

/// Poll one source and push its observations. Always pushes exactly one
/// `scrape_success` observation.
async fn poll_source(
    inner: &CollectorInner,
    source: &Source,
    sink: &ObservationSink,
) -> SourceReport {
    let started = Instant::now();
    let schema = &inner.schema;

    let fetched = match schema.flavor() {
        ApiFlavor::V2 => fetch_v2(&inner.client, source, inner.power_source).await,
        ApiFlavor::Proxy => fetch_proxy(&inner.client, source).await,
    };
    let elapsed = started.elapsed();

    let result = match fetched {
        Ok((reading, coverage)) => {
            let mut observations = schema.observe(&reading);
            observations.extend(schema.scrape_success(&source.name, true));
            sink.extend(observations);
            debug!(battery = %source.name, %coverage, ?elapsed, "scrape succeeded");
            Ok(coverage)
        }
        Err(e) => {
            if e.is_auth() {
                warn!(
                    battery = %source.name,
                    error = %e,
                    ?elapsed,
                    "authentication rejected, check the configured token"
                );
            } else {
                warn!(
                    battery = %source.name,
                    reason = %e.kind(),
                    error = %e,
                    ?elapsed,
                    "scrape failed"
                );
            }
            sink.extend(schema.scrape_success(&source.name, false));
            Err(SourceFailure::Fetch {
                kind: e.kind(),
                message: e.to_string(),
            })
        }
    };

    SourceReport {
        source: source.name.clone(),
        result,
        elapsed,
    }
}

async fn fetch_v2(
    client: &BatteryClient,
    source: &Source,
    power_source: PowerSource,
) -> Result<(Reading, Coverage), Error> {
    let token = source.credential.as_ref();
    let latest = client.latest_data(&source.endpoint, token).await?;

    let status = match client.status(&source.endpoint, token).await {
        Ok(status) => Some(status),
        Err(e) => {
            warn!(
                battery = %source.name,
                reason = %e.kind(),
                error = %e,
                "status unavailable, exporting partial metrics"
            );
            None
        }
    };

    let coverage = coverage_of(status.is_some());
    let reading = convert::reading_from_v2(source, &latest, status.as_ref(), power_source);
    Ok((reading, coverage))
}

async fn fetch_proxy(
    client: &BatteryClient,
    source: &Source,
) -> Result<(Reading, Coverage), Error> {
    let (system, consumption) = tokio::try_join!(
        client.proxy_system(&source.endpoint),
        client.proxy_consumption(&source.endpoint),
    )?;

    let status = match client.proxy_status(&source.endpoint).await {
        Ok(status) => Some(status),
        Err(e) => {
            warn!(
                battery = %source.name,
                reason = %e.kind(),
                error = %e,
                "proxy status unavailable, exporting partial metrics"
            );
            None
        }
    };

    let coverage = coverage_of(status.is_some());
    let reading = convert::reading_from_proxy(source, &system, &consumption, status.as_ref());
    Ok((reading, coverage))
}

fn coverage_of(supplementary: bool) -> Coverage {
    if supplementary {
        Coverage::Full
    } else {
        Coverage::Partial
    }
}
