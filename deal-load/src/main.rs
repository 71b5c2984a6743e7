use anyhow::Context;
use clap::Parser;
use deal_load::cli::{Cli, DEFAULT_LOG_FILTER};
use deal_load::{import_deals, install, DealScript};
use fxload::prelude::*;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    if let Some(addr) = cli.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Unable to start the Prometheus exporter")?;
        info!("Serving metrics on {addr}");
    }

    let script = DealScript::new(
        cli.url.clone(),
        cli.payload_config(),
        cli.think_time.into(),
        cli.request_timeout.into(),
    )
    .context("Invalid deal script settings")?;
    let script = install(script)?;
    info!("Targeting {}", script.url());

    let stats = import_deals().config(cli.scenario_config()).await;
    println!("{stats}");

    if cli.strict && !stats.checks_passed() {
        let failed: u64 = stats.checks.iter().map(|c| c.fails).sum();
        anyhow::bail!("{failed} check(s) failed");
    }

    Ok(())
}
