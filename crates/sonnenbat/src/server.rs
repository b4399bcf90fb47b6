// HTTP surface: /metrics, /health, and a small index page.

use std::fmt::Write as _;
use std::net::SocketAddr;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use tracing::{error, info};

use sonnenbat_core::Collector;

use crate::error::CliError;
use crate::exposition;

#[derive(Clone)]
pub struct AppState {
    pub collector: Collector,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, collector: Collector) -> Result<(), CliError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| CliError::Bind { addr, source })?;
    info!(%addr, "listening");

    axum::serve(listener, router(AppState { collector }))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl-C");
        // Without a signal handler, run until the process is killed.
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

async fn metrics(State(state): State<AppState>) -> Response {
    let report = state.collector.collect().await;
    match exposition::render(state.collector.schema(), &report.observations) {
        Ok(body) => ([(header::CONTENT_TYPE, exposition::CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics").into_response()
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let mut rows = String::new();
    for source in state.collector.sources() {
        let _ = write!(
            rows,
            "<li>{} ({})</li>",
            escape_html(&source.name),
            escape_html(source.endpoint.as_str())
        );
    }

    Html(format!(
        "<html>\n<head><title>sonnenBatterie Exporter</title></head>\n<body>\n\
         <h1>sonnenBatterie Exporter</h1>\n\
         <p>API: {api}</p>\n\
         <ul>{rows}</ul>\n\
         <p><a href=\"/metrics\">Metrics</a></p>\n\
         </body>\n</html>\n",
        api = state.collector.schema().flavor(),
    ))
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use sonnenbat_core::{ApiFlavor, CollectorConfig, MetricSchema, PowerSource, Source};

    use super::*;

    fn app(sources: Vec<Source>) -> Router {
        let config = CollectorConfig {
            sources,
            power_source: PowerSource::Status,
            timeout: Duration::from_secs(2),
        };
        let collector =
            Collector::new(config, Arc::new(MetricSchema::new(ApiFlavor::V2))).unwrap();
        router(AppState { collector })
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_owned());
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let source = Source::new("house", Url::parse("http://127.0.0.1:1").unwrap(), None);
        let (status, _, body) = get_body(app(vec![source]), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_index_lists_sources_without_tokens() {
        let source = Source::new(
            "<house>",
            Url::parse("http://192.168.1.100").unwrap(),
            Some("super-secret".to_string().into()),
        );
        let (status, _, body) = get_body(app(vec![source]), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("&lt;house&gt;"));
        assert!(body.contains("192.168.1.100"));
        assert!(body.contains("href=\"/metrics\""));
        assert!(!body.contains("super-secret"));
    }

    #[tokio::test]
    async fn test_metrics_scrape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/latestdata"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "RSOC": 8,
                "USOC": 0,
                "Consumption_W": 748
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/status"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let house = Source::new("house", Url::parse(&server.uri()).unwrap(), None);
        let down = Source::new("garage", Url::parse("http://127.0.0.1:1").unwrap(), None);
        let (status, content_type, body) = get_body(app(vec![house, down]), "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/plain; version=0.0.4"));
        assert!(body.contains(r#"sonnenbatterie_scrape_success{battery_name="house"} 1"#));
        assert!(body.contains(r#"sonnenbatterie_scrape_success{battery_name="garage"} 0"#));
        assert!(body.contains(
            r#"sonnenbatterie_charge_level_percent{battery_name="house",bms_state="",inverter_state=""} 8"#
        ));
        assert!(body.contains(
            r#"sonnenbatterie_consumption_mw{battery_name="house",bms_state="",inverter_state=""} 748000"#
        ));
        assert!(!body.contains(r#"battery_name="garage",bms_state"#));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html(r#"a&b<"c">"#), "a&amp;b&lt;&quot;c&quot;&gt;");
    }
}
