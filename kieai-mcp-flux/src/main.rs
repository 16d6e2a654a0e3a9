//! kie.ai MCP FLUX Server
//!
//! MCP server for text-to-image generation with kie.ai FLUX 2 Pro.

use anyhow::Result;
use clap::Parser;
use kieai_mcp_common::server::MCP_PATH;
use kieai_mcp_common::tracing::init_tracing;
use kieai_mcp_common::{Config, McpServerBuilder, Transport, TransportArgs};
use kieai_mcp_flux::FluxServer;

/// Command-line arguments for the FLUX server.
#[derive(Parser, Debug)]
#[command(name = "kieai-mcp-flux")]
#[command(about = "MCP server for image generation using kie.ai FLUX 2 Pro")]
struct Args {
    /// Transport configuration
    #[command(flatten)]
    transport: TransportArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    tracing::info!("kieai-mcp-flux server starting...");

    let args = Args::parse();

    let config = Config::from_env()?;
    if config.has_api_key() {
        tracing::info!(base_url = %config.base_url, "Configuration loaded");
    } else {
        tracing::warn!(
            base_url = %config.base_url,
            "KIEAI_API_KEY is not set; every generation will return an empty result"
        );
    }

    let server = FluxServer::new(config);

    let transport = args.transport.into_transport();
    if let Transport::Http { port } = transport {
        tracing::info!("KIEAI MCP Server running on http://localhost:{}{}", port, MCP_PATH);
    }

    McpServerBuilder::new(server)
        .with_transport(transport)
        .run()
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
