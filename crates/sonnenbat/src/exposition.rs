// Prometheus text rendering for one scrape.
//
// A fresh registry per scrape: series from batteries that failed this
// cycle must not linger from the previous one.

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use sonnenbat_core::{MetricKind, MetricSchema, Observation};

/// Content type for the text exposition format.
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Render `observations` as Prometheus text using `schema` for metadata.
pub fn render(schema: &MetricSchema, observations: &[Observation]) -> prometheus::Result<String> {
    let registry = Registry::new();
    let mut gauges: Vec<(MetricKind, GaugeVec)> = Vec::with_capacity(schema.len());

    for descriptor in schema.descriptors() {
        let gauge = GaugeVec::new(
            Opts::new(descriptor.name, descriptor.help),
            &descriptor.label_names(),
        )?;
        registry.register(Box::new(gauge.clone()))?;
        gauges.push((descriptor.kind, gauge));
    }

    for observation in observations {
        let Some((_, gauge)) = gauges.iter().find(|(kind, _)| *kind == observation.kind()) else {
            continue;
        };
        let values: Vec<&str> = observation
            .label_values()
            .iter()
            .map(String::as_str)
            .collect();
        gauge
            .get_metric_with_label_values(&values)?
            .set(observation.value());
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
