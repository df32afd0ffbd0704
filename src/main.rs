use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ferry::config::RelayConfig;
use ferry::observer::LogObserver;
use ferry::relay::Relay;

#[derive(Parser)]
#[command(name = "ferry")]
#[command(about = "Transparent DNS forwarding relay", long_about = None)]
struct Args {
    /// Local UDP port to listen on
    #[arg(short, long, default_value = "5353")]
    port: u16,

    /// Upstream DNS server address
    #[arg(short, long, default_value = "8.8.8.8")]
    upstream: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = RelayConfig::new(args.port, &args.upstream)?;

    let relay = Relay::new(Arc::new(LogObserver));
    relay.start(config).await?;

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    relay.stop();

    Ok(())
}
