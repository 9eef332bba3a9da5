mod api;
mod router;
mod state;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use crate::state::AppState;

/// HTTP front-end for one-shot stdio MCP backends.
///
/// Each `POST /call` spawns the configured backend, sends it one
/// JSON-RPC `tools/call` request, and relays its stdout back.
#[derive(Parser, Debug)]
#[command(name = "bridge-server", about = "HTTP to MCP stdio bridge")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "BRIDGE_ADDR", default_value = "0.0.0.0:8080")]
    addr: String,

    /// Command used to start the stdio MCP server (quoted string)
    #[arg(
        long,
        env = "BRIDGE_SERVER_CMD",
        default_value = "./github-mcp-server stdio"
    )]
    server_cmd: String,

    /// Timeout in seconds for each MCP request
    #[arg(long, env = "BRIDGE_TIMEOUT_SECS", default_value = "25")]
    timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args = Args::parse();

    let state = Arc::new(AppState {
        default_server_cmd: args.server_cmd.clone(),
        timeout: Duration::from_secs(args.timeout),
    });

    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&args.addr).await?;
    info!(
        "http -> mcp bridge listening on {} (server-cmd={:?})",
        args.addr, args.server_cmd
    );
    axum::serve(listener, app).await?;

    Ok(())
}
