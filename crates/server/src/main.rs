//! Movie catalog gRPC server.
//!
//! Serves `com.jiangew.movieService.MovieService` over plaintext HTTP/2 until
//! the process receives SIGINT or SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::{MovieServer, ServerConfig, install_shutdown_hook};

/// Movie catalog server
#[derive(Parser)]
#[command(name = "movie-server")]
#[command(about = "Serves the movie catalog over gRPC", long_about = None)]
struct Cli {
    /// Interface to listen on
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 50051)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut server = MovieServer::new(ServerConfig {
        host: cli.host,
        port: cli.port,
    });

    // Handlers go in before the listener so an early signal is not lost
    install_shutdown_hook(&server).context("Failed to install signal handlers")?;
    server
        .start()
        .await
        .context("Failed to start movie server")?;

    server.await_shutdown().await?;
    info!("Bye");
    Ok(())
}
