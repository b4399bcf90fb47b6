//! Clap derive structures for the `sonnenbat` binary.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use sonnenbat_config::{Config, SourceLists};
use sonnenbat_core::{ApiFlavor, PowerSource};

/// sonnenbat -- Prometheus exporter for sonnenBatterie systems
#[derive(Debug, Parser)]
#[command(
    name = "sonnenbat",
    version,
    about = "Export sonnenBatterie telemetry as Prometheus metrics",
    long_about = "Polls one or more sonnenBatterie devices (or sonnenBatterie-api proxies)\n\
        on every scrape and serves the results at /metrics.\n\n\
        Batteries are configured with comma-separated lists, e.g.\n\
        SONNENBATTERIE_IPS=192.168.1.100,192.168.1.101 SONNENBATTERIE_NAMES=house,garage"
)]
pub struct Cli {
    // ── Sources ──────────────────────────────────────────────────────
    /// Comma-separated battery addresses (v2 API)
    #[arg(long, env = "SONNENBATTERIE_IPS", value_name = "LIST")]
    pub ips: Option<String>,

    /// Comma-separated Auth-Token values, one per address
    #[arg(
        long,
        env = "SONNENBATTERIE_TOKENS",
        value_name = "LIST",
        hide_env_values = true
    )]
    pub tokens: Option<String>,

    /// Comma-separated battery names, one per address
    #[arg(long, env = "SONNENBATTERIE_NAMES", value_name = "LIST")]
    pub names: Option<String>,

    /// Comma-separated proxy base URLs (proxy API)
    #[arg(long, env = "SONNENBATTERIE_API_URLS", value_name = "LIST")]
    pub api_urls: Option<String>,

    /// Single proxy base URL, used when --api-urls is not set
    #[arg(long, env = "SONNENBATTERIE_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    // ── Server ───────────────────────────────────────────────────────
    /// Address to listen on
    #[arg(long)]
    pub listen: Option<IpAddr>,

    /// Port to listen on [default: 9090]
    #[arg(long, short = 'p', env = "EXPORTER_PORT")]
    pub port: Option<u16>,

    // ── Collection ───────────────────────────────────────────────────
    /// Per-request timeout in seconds [default: 10]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Upstream API flavor [default: v2]
    #[arg(long, value_name = "v2|proxy")]
    pub api: Option<ApiFlavor>,

    /// Which v2 endpoint wins for power figures reported by both [default: status]
    #[arg(long, value_name = "status|latestdata")]
    pub power_source: Option<PowerSource>,

    /// Path to a TOML config file
    #[arg(long, short = 'c', env = "SONNENBAT_CONFIG")]
    pub config: Option<PathBuf>,

    // ── Logging ──────────────────────────────────────────────────────
    /// Increase verbosity (-v, -vv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

impl Cli {
    /// Apply command-line and exporter env overrides on top of `config`.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(api) = self.api {
            config.api = api;
        }
        if let Some(power_source) = self.power_source {
            config.power_source = power_source;
        }
    }

    pub fn source_lists(&self) -> SourceLists {
        SourceLists {
            ips: self.ips.clone(),
            tokens: self.tokens.clone(),
            names: self.names.clone(),
            api_urls: self.api_urls.clone().or_else(|| self.api_url.clone()),
        }
    }
}
