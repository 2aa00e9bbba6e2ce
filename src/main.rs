//
// Purpose:
//
// Entry point of the Vectra investigation MCP server. It exposes Vectra AI assignment,
// note and detection workflows as tools that MCP clients (AI agents, automation
// scripts) can invoke over stdio.
//
// Workflow:
// 1. Parse CLI flags and initialize logging (tracing, to stderr; stdout carries MCP).
// 2. Load `VectraConfig` from the environment and build the `VectraClient`.
// 3. Wrap the client in `VectraToolsServer` and serve it over stdio.
// 4. Each `call_tool` request is dispatched by name, validated, forwarded to the
//    Vectra REST API and answered with a `CallToolResult`.
//
// Configuration:
// `VECTRA_BASE_URL`, `VECTRA_CLIENT_ID` and `VECTRA_CLIENT_SECRET` are required.
// Optional: `VECTRA_API_VERSION`, `VECTRA_OAUTH_TOKEN_URL`, `VECTRA_REQUEST_TIMEOUT`,
// `VERIFY_SSL`. Logging: `LOG_LEVEL`, `LOG_FORMAT` (json|text), `VECTRA_LOG_FILE`,
// `--debug` / `VECTRA_MCP_DEBUG` and `RUST_LOG`.

use clap::Parser;
use mcp_server_vectra::{LoggingConfig, VectraClient, VectraConfig, VectraToolsServer};
use rmcp::{transport::stdio, ServiceExt};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "mcp-server-vectra")]
#[command(about = "Vectra AI Investigation MCP Server")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, env = "VECTRA_MCP_DEBUG")]
    debug: bool,
    // Only stdio transport is supported
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let logging = LoggingConfig::from_env()?.with_debug(args.debug);
    logging.init()?;

    tracing::info!("Starting Vectra MCP Server...");
    if let Some(path) = &logging.file {
        tracing::info!(log_file = %path.display(), "Also logging to file");
    }

    let config = VectraConfig::from_env().inspect_err(|e| {
        tracing::error!("Configuration error: {}", e);
    })?;
    tracing::debug!(
        api_base_url = %config.api_base_url(),
        verify_ssl = %config.verify_ssl,
        "Creating Vectra client"
    );
    let client = VectraClient::new(config)?;

    let server = VectraToolsServer::new(Arc::new(client));

    tracing::info!("Using stdio transport");
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("serving error: {:?}", e);
    })?;

    service.waiting().await?;
    Ok(())
}
