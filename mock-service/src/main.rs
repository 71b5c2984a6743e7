use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use mock_service::ServiceConfig;
use std::{net::SocketAddr, num::NonZeroU32, time::Duration};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(version, about = "Mock FX deals import service")]
struct Args {
    #[arg(long, env = "MOCK_SERVICE_ADDR", default_value = "0.0.0.0:8080")]
    addr: SocketAddr,

    /// Delay added to every import request, in milliseconds
    #[arg(long, env = "MOCK_SERVICE_DELAY_MS", default_value_t = 0)]
    delay_ms: u64,

    /// Answer `429` above this many requests per second
    #[arg(long, env = "MOCK_SERVICE_MAX_TPS")]
    max_tps: Option<NonZeroU32>,

    /// Expose Prometheus metrics on this address
    #[arg(long, env = "MOCK_SERVICE_METRICS_ADDR")]
    metrics_addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mock_service=info,tower_http=warn")),
        )
        .init();

    let args = Args::parse();

    if let Some(addr) = args.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
    }

    let config = ServiceConfig {
        delay: Duration::from_millis(args.delay_ms),
        max_tps: args.max_tps,
    };
    mock_service::run(args.addr, config).await?;
    Ok(())
}
