use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use cms_mcp_runtime::config::ConfigArgs;
use cms_mcp_runtime::{McpCommands, McpServer, run as run_mcp, to_pretty_json};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod http;

#[derive(Parser)]
#[command(
    name = "cms-mcp",
    version,
    about = "Read-only MCP server for a headless CMS content API"
)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Mcp(McpCommands),
    /// Run the MCP server over HTTP (POST /mcp)
    ServeHttp {
        /// Socket address to listen on
        #[arg(long, env = "CMS_MCP_BIND", default_value = "127.0.0.1:8787")]
        bind: SocketAddr,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    // JSON logs on stderr; stdout carries the stdio protocol.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cms_mcp=info,cms_mcp_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = match cli.config.into_config() {
        Ok(config) => config,
        Err(err) => {
            let payload = json!({
                "error": err.code(),
                "message": err.to_string(),
            });
            eprintln!("{}", to_pretty_json(&payload));
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Mcp(command) => run_mcp(config, command).await,
        Commands::ServeHttp { bind } => serve_http(config, bind).await,
    };
    std::process::exit(code);
}

async fn serve_http(config: cms_mcp_runtime::config::RuntimeConfig, bind: SocketAddr) -> i32 {
    let server = Arc::new(McpServer::new(config));
    tracing::info!(
        transport = "http",
        %bind,
        base_url = %server.config().upstream.base_url,
        api_version = %server.config().upstream.api_version,
        default_domain = %server.config().default_domain,
        "MCP server starting"
    );

    let listener = match tokio::net::TcpListener::bind(bind).await {
        Ok(listener) => listener,
        Err(err) => {
            let payload = json!({
                "error": "mcp_server_error",
                "message": format!("Failed to bind {bind}: {err}"),
            });
            eprintln!("{}", to_pretty_json(&payload));
            return 1;
        }
    };

    match axum::serve(listener, http::router(server)).await {
        Ok(()) => 0,
        Err(err) => {
            tracing::error!(error = %err, "HTTP server stopped");
            1
        }
    }
}
