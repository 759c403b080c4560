use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use notes_core::config::{self, StoreConfig, DEFAULT_CONNECTION_STRING};
use notes_core::mcp::McpServer;
use notes_core::service::NotesService;
use notes_core::store;

#[derive(Parser)]
#[command(
    name = "mcp-notes",
    about = "Notes server for MCP agents, with a web front end",
    version = notes_core::VERSION,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the MCP protocol over stdin/stdout
    Mcp {
        /// Store connection string (dynamodb://[key:secret@]region/table or memory://)
        #[arg(short, long, env = "NOTES_DYNAMODB", default_value = DEFAULT_CONNECTION_STRING)]
        dynamodb: String,
    },
    /// Start the web front end
    Web {
        /// Store connection string (dynamodb://[key:secret@]region/table or memory://)
        #[arg(short, long, env = "NOTES_DYNAMODB", default_value = DEFAULT_CONNECTION_STRING)]
        dynamodb: String,
        /// HTTP port (default: $PORT or 3100)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // stdout carries protocol traffic in mcp mode
    let mcp_mode = matches!(cli.command, Commands::Mcp { .. });
    init_tracing(mcp_mode);

    // Exit explicitly: a pending stdin read would otherwise keep the runtime alive.
    std::process::exit(run(cli).await);
}

async fn run(cli: Cli) -> i32 {
    let connection_string = match &cli.command {
        Commands::Mcp { dynamodb } | Commands::Web { dynamodb, .. } => dynamodb.clone(),
    };
    let store_config = match config::load_store_config(&connection_string) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e);
            return 1;
        }
    };

    let result = match cli.command {
        Commands::Mcp { .. } => cmd_mcp(store_config).await,
        Commands::Web { port, .. } => cmd_web(store_config, port).await,
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn init_tracing(mcp_mode: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mcp_notes=info,notes_core=info"));

    if mcp_mode {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn cmd_mcp(store_config: StoreConfig) -> Result<()> {
    let store = store::open_store(&store_config).await?;
    let service = Arc::new(NotesService::new(store));
    let server = Arc::new(McpServer::new(service));

    info!("Starting MCP Notes server on stdio");
    server.run_stdio(shutdown_signal()).await
}

#[cfg(feature = "http-api")]
async fn cmd_web(store_config: StoreConfig, port: Option<u16>) -> Result<()> {
    use notes_core::web::{serve, WebState};

    let store = store::open_store(&store_config).await?;
    let state = Arc::new(WebState::new(store));
    let addr = format!("0.0.0.0:{}", config::resolve_web_port(port));

    serve(&addr, state, shutdown_signal()).await
}

#[cfg(not(feature = "http-api"))]
async fn cmd_web(_store_config: StoreConfig, _port: Option<u16>) -> Result<()> {
    anyhow::bail!("HTTP API not enabled. Rebuild with --features http-api")
}
