//! Edge API gateway.
//!
//! ```text
//!                     ┌───────────────────────────────────────────────┐
//!   Client ──────────▶│ CORS / correlation id / security headers      │
//!                     │        │                                      │
//!                     │        ▼                                      │
//!                     │  upstream lookup ──▶ 404 envelope             │
//!                     │        │                                      │
//!                     │        ▼                                      │
//!                     │  auth gate (content, commentary) ──▶ 401      │
//!                     │        │                                      │
//!                     │        ▼                                      │
//!                     │  forwarder: retry ladder ──▶ 503 envelope     │──▶ identity / content / commentary
//!                     └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use edge_gateway::config::load_config;
use edge_gateway::lifecycle;
use edge_gateway::observability::init_logging;

#[derive(Parser)]
#[command(name = "edge-gateway", version, about = "Edge API gateway")]
struct Args {
    /// TOML configuration file. Environment variables override its values.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    init_logging(&config.observability.log_level);
    tracing::info!(
        bind_address = %config.listener.bind_address,
        identity = %config.upstreams.identity.base_url,
        content = %config.upstreams.content.base_url,
        commentary = %config.upstreams.commentary.base_url,
        "edge-gateway v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    lifecycle::run(config).await?;
    Ok(())
}
