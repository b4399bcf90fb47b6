mod cli;
mod error;
mod exposition;
mod server;

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sonnenbat_config::{load_config, resolve_sources};
use sonnenbat_core::{Collector, MetricSchema};

use crate::cli::{Cli, LogFormat};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_format);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, format: LogFormat) {
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = load_config(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let sources = resolve_sources(&config, &cli.source_lists())?;
    let schema = Arc::new(MetricSchema::new(config.api));
    let collector = Collector::new(config.collector_config(sources), schema)?;

    info!(
        api = %config.api,
        power_source = %config.power_source,
        timeout_secs = config.timeout_secs,
        batteries = collector.sources().len(),
        "starting sonnenBatterie exporter"
    );
    for source in collector.sources() {
        info!(
            battery = %source.name,
            endpoint = %source.endpoint,
            token = source.credential.is_some(),
            "configured battery"
        );
    }

    server::serve(config.socket_addr(), collector).await
}
