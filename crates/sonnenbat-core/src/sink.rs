// ── Observation sink ──
//
// Cycle-scoped, append-only buffer. Source tasks push concurrently; the
// collector drains it once every task has finished.

use std::sync::{Mutex, PoisonError};

use crate::model::{Reading, ReadingLabels, flag};
use crate::schema::{Label, MetricDescriptor, MetricKind, MetricSchema};

/// One metric value with its label values in descriptor order.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    kind: MetricKind,
    name: &'static str,
    labels: &'static [Label],
    label_values: Vec<String>,
    value: f64,
}

impl Observation {
    /// Build an observation for `descriptor`, resolving every label the
    /// descriptor declares from `labels`.
    pub fn new(descriptor: &MetricDescriptor, labels: &ReadingLabels, value: f64) -> Self {
        Self {
            kind: descriptor.kind,
            name: descriptor.name,
            labels: descriptor.labels,
            label_values: descriptor
                .labels
                .iter()
                .map(|label| labels.value(*label).to_owned())
                .collect(),
            value,
        }
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    /// Value of one label, if the descriptor declares it.
    pub fn label(&self, label: Label) -> Option<&str> {
        self.labels
            .iter()
            .position(|l| *l == label)
            .and_then(|i| self.label_values.get(i))
            .map(String::as_str)
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl MetricSchema {
    /// Observations for every metric `reading` has a value for.
    pub fn observe(&self, reading: &Reading) -> Vec<Observation> {
        self.descriptors()
            .iter()
            .filter_map(|descriptor| {
                reading
                    .value(descriptor.kind)
                    .map(|value| Observation::new(descriptor, &reading.labels, value))
            })
            .collect()
    }

    /// The per-source health observation.
    pub fn scrape_success(&self, source: &str, success: bool) -> Option<Observation> {
        self.descriptor(MetricKind::ScrapeSuccess).map(|descriptor| {
            Observation::new(descriptor, &ReadingLabels::for_source(source), flag(success))
        })
    }
}

/// Thread-safe buffer of observations for one collection cycle.
#[derive(Debug, Default)]
pub struct ObservationSink {
    inner: Mutex<Vec<Observation>>,
}

impl ObservationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, observation: Observation) {
        self.lock().push(observation);
    }

    /// Append a batch under a single lock so one source's observations
    /// land together.
    pub fn extend(&self, observations: impl IntoIterator<Item = Observation>) {
        self.lock().extend(observations);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Take everything collected so far.
    pub fn drain(&self) -> Vec<Observation> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Observation>> {
        // A panicking producer cannot leave a Vec half-pushed.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
