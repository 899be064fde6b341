//! Palaver chat server binary.
//!
//! # Usage
//!
//! ```bash
//! # Credentials from ./users.txt, default port
//! palaver-server
//!
//! # Explicit bind address and credential file
//! palaver-server --bind 0.0.0.0:12345 --users /etc/palaver/users.txt
//! ```

use clap::Parser;
use palaver_server::{Server, ServerConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Palaver chat server
#[derive(Parser, Debug)]
#[command(name = "palaver-server")]
#[command(about = "Authenticated multi-user chat server")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:12345")]
    bind: String,

    /// Path to the credential file (username:password per line)
    #[arg(short, long, default_value = "users.txt")]
    users: std::path::PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Palaver server starting");

    let config = ServerConfig { bind_address: args.bind, users_path: args.users };
    let server = Server::bind(config).await?;

    tracing::info!("Server listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}
