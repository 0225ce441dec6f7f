//! Lifecycle of the movie gRPC server: start, stop, await shutdown.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tracing::info;

use movie_client::movie_service::movie_service_server::MovieServiceServer;

use crate::error::{Result, ServerError};
use crate::service::MovieServiceImpl;

/// Where the server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    /// `0` picks an ephemeral port; see [`MovieServer::local_addr`]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 50051,
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Plaintext gRPC server exposing the movie service.
pub struct MovieServer {
    config: ServerConfig,
    /// Graceful stop: no new connections, in-flight calls drain
    shutdown: CancellationToken,
    /// Forced stop: in-flight stream pauses are cut short
    interrupt: CancellationToken,
    local_addr: Option<SocketAddr>,
    serving: Option<JoinHandle<std::result::Result<(), tonic::transport::Error>>>,
}

impl MovieServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            shutdown: CancellationToken::new(),
            interrupt: CancellationToken::new(),
            local_addr: None,
            serving: None,
        }
    }

    /// Bind the listening socket and start serving in the background.
    ///
    /// Fails if the address cannot be bound or the server already runs.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        if let Some(addr) = self.local_addr {
            return Err(ServerError::AlreadyStarted(addr));
        }

        let addr = self.config.listen_addr();
        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port))
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        let service = MovieServiceServer::new(MovieServiceImpl::with_interrupt(
            self.interrupt.clone(),
        ));
        let shutdown = self.shutdown.clone();

        self.serving = Some(tokio::spawn(async move {
            Server::builder()
                .add_service(service)
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                    shutdown.cancelled().await
                })
                .await
        }));
        self.local_addr = Some(local_addr);

        info!("server started, listening on {}", local_addr);
        Ok(local_addr)
    }

    /// Address actually bound, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Token that stops the server when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Begin a graceful shutdown: stop accepting, let in-flight calls drain.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// Stop and cut in-flight streams short; they end with `Cancelled`.
    pub fn stop_now(&self) {
        self.interrupt.cancel();
        self.shutdown.cancel();
    }

    /// Wait until the server has fully stopped.
    pub async fn await_shutdown(&mut self) -> Result<()> {
        let serving = self.serving.take().ok_or(ServerError::NotStarted)?;
        serving.await??;
        info!("server stopped");
        Ok(())
    }
}

/// Stop the server behind `shutdown` once `signal` resolves.
///
/// Diagnostics go to stderr: by the time the process is exiting the
/// tracing subscriber may already be gone. The hook exits quietly if the
/// server stops for another reason first.
pub fn spawn_shutdown_hook<F>(shutdown: CancellationToken, signal: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::select! {
            _ = signal => {
                eprintln!("*** shutting down gRPC server since the process is shutting down");
                shutdown.cancel();
                eprintln!("*** server shut down");
            }
            _ = shutdown.cancelled() => {}
        }
    })
}

/// Install the shutdown hook on SIGINT / SIGTERM (Ctrl-C elsewhere).
///
/// The signal handlers are registered before this returns, so a signal
/// arriving right after it is never lost. Must be called from within a
/// tokio runtime.
pub fn install_shutdown_hook(server: &MovieServer) -> std::io::Result<JoinHandle<()>> {
    let signal = termination_signal()?;
    Ok(spawn_shutdown_hook(server.shutdown_token(), signal))
}

#[cfg(unix)]
fn termination_signal() -> std::io::Result<impl Future<Output = ()> + Send + 'static> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
    })
}

#[cfg(not(unix))]
fn termination_signal() -> std::io::Result<impl Future<Output = ()> + Send + 'static> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for Ctrl-C: {}", e);
            // Never resolve rather than shut down on a broken signal handler
            std::future::pending::<()>().await;
        }
    })
}
