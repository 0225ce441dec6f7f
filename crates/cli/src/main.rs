use anyhow::{Context, Result};
use clap::Parser;
use movie_client::{ClientConfig, MovieServiceClient};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Movie service client - runs the three demonstration calls
#[derive(Parser)]
#[command(name = "movie-client")]
#[command(about = "Calls the movie service in unary, blocking-stream and async-stream styles", long_about = None)]
struct Cli {
    /// Host running the movie server
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Port of the movie server
    #[arg(short, long, default_value_t = 50051)]
    port: u16,
}

// No #[tokio::main]: the client drives its own runtime and blocks this thread
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let client = MovieServiceClient::connect(&ClientConfig {
        host: cli.host,
        port: cli.port,
    })
    .context("Failed to create movie service client")?;

    let outcome = run_demos(&client);

    // Shut the channel down whether or not the demos succeeded
    if !client.shutdown() {
        warn!("Channel did not drain within the grace period");
    }
    outcome
}

fn run_demos(client: &MovieServiceClient) -> Result<()> {
    let movies = client
        .get_movie_list()
        .context("Unary ListMovies call failed")?;
    info!("unary call returned {} movies", movies.len());

    let movies = client
        .get_movies_using_stream()
        .context("Blocking GetMovies stream failed")?;
    info!("blocking stream returned {} movies", movies.len());

    let movies = client
        .get_movies_using_async_stub()
        .context("Asynchronous GetMovies stream failed")?;
    info!("asynchronous stream returned {} movies", movies.len());

    Ok(())
}
