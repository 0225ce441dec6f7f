//! Blocking and callback-based client for the movie service.
//!
//! The client owns one plaintext channel and a private multi-threaded runtime.
//! Blocking calls park the invoking thread on that runtime; asynchronous calls
//! are dispatched onto it and report through a [`ResponseSink`].
//!
//! Channel lifecycle: `Ready -> ShuttingDown -> Terminated`. Once shutdown has
//! started new calls are refused with `Unavailable`.

use std::time::Duration;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio_util::sync::CancellationToken;
use tokio_util::task::task_tracker::TaskTrackerToken;
use tokio_util::task::TaskTracker;
use tonic::transport::{Channel, Endpoint};
use tonic::Status;
use tracing::{debug, info, warn};

use crate::error::{channel_closed, shutting_down, ClientError, Result};
use crate::movie_service::movie_service_client::MovieServiceClient as GrpcMovieServiceClient;
use crate::sink::{CollectingSink, ResponseSink};
use crate::stream::MovieStream;
use crate::{ActorId, Movie, MovieList, DEMO_ACTOR_ID};

/// How long `shutdown` waits for in-flight calls before abandoning them.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Where the client connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 50051,
        }
    }
}

impl ClientConfig {
    /// Endpoint URI for a plaintext channel.
    pub fn uri(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Observable state of the client channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Ready,
    ShuttingDown,
    Terminated,
}

/// Client for the movie catalog service.
///
/// Share it across threads behind an `Arc`: every call takes `&self`, and
/// concurrent calls on the same channel need no extra synchronization.
///
/// Must be created, used and dropped outside of any async context.
pub struct MovieServiceClient {
    runtime: Runtime,
    client: GrpcMovieServiceClient<Channel>,
    /// Accounts for in-flight calls; closed once shutdown starts
    calls: TaskTracker,
    /// Cancelled when the channel is torn down
    teardown: CancellationToken,
    target: String,
}

impl MovieServiceClient {
    /// Build a plaintext channel to the configured address.
    ///
    /// The channel connects lazily: an unreachable server is reported by the
    /// first call, not here.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let target = config.uri();
        info!("Creating channel to movie service at {}", target);

        let runtime = Builder::new_multi_thread()
            .thread_name("movie-client")
            .enable_all()
            .build()?;

        let endpoint = Endpoint::from_shared(target.clone()).map_err(|source| {
            ClientError::InvalidAddress {
                addr: target.clone(),
                source,
            }
        })?;

        // The lazy channel spawns its connection worker onto the current runtime
        let channel = {
            let _guard = runtime.enter();
            endpoint.connect_lazy()
        };

        Ok(Self {
            runtime,
            client: GrpcMovieServiceClient::new(channel),
            calls: TaskTracker::new(),
            teardown: CancellationToken::new(),
            target,
        })
    }

    /// Address this client talks to.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn state(&self) -> ChannelState {
        if !self.calls.is_closed() {
            ChannelState::Ready
        } else if self.calls.is_empty() || self.teardown.is_cancelled() {
            ChannelState::Terminated
        } else {
            ChannelState::ShuttingDown
        }
    }

    pub(crate) fn runtime_handle(&self) -> &Handle {
        self.runtime.handle()
    }

    pub(crate) fn teardown_token(&self) -> &CancellationToken {
        &self.teardown
    }

    /// Register a new call, or refuse it if the channel is shutting down.
    fn begin_call(&self) -> std::result::Result<TaskTrackerToken, Status> {
        if self.calls.is_closed() {
            return Err(shutting_down());
        }
        Ok(self.calls.token())
    }

    /// Unary `ListMovies`. Blocks until the response or an error arrives.
    pub fn list_movies(&self, request: ActorId) -> Result<MovieList> {
        let _call = self.begin_call()?;
        let mut client = self.client.clone();
        let teardown = self.teardown.clone();

        let response = self.runtime.block_on(async move {
            tokio::select! {
                response = client.list_movies(request) => response,
                _ = teardown.cancelled() => Err(channel_closed()),
            }
        })?;
        Ok(response.into_inner())
    }

    /// Server-streaming `GetMovies` as a lazy blocking iterator.
    ///
    /// Nothing is sent until the first pull; every failure, including a
    /// refused or unreachable channel, surfaces from `next`.
    /// The iterator borrows the client, so it cannot outlive the runtime
    /// that drives it.
    pub fn get_movies(&self, request: ActorId) -> MovieStream<'_> {
        match self.begin_call() {
            Ok(call) => MovieStream::new(self, self.client.clone(), request, call),
            Err(status) => MovieStream::rejected(self, status),
        }
    }

    /// Server-streaming `GetMovies` delivered to `sink`.
    ///
    /// Returns immediately. Events arrive on the client runtime, serialized
    /// for this call, ending with exactly one `on_complete` or `on_error`.
    pub fn get_movies_async<S>(&self, request: ActorId, mut sink: S)
    where
        S: ResponseSink<Movie>,
    {
        let call = match self.begin_call() {
            Ok(call) => call,
            Err(status) => {
                self.runtime.spawn(async move { sink.on_error(status) });
                return;
            }
        };

        let mut client = self.client.clone();
        let teardown = self.teardown.clone();
        self.runtime.spawn(async move {
            let outcome = tokio::select! {
                outcome = pump_movies(&mut client, request, &mut sink) => outcome,
                _ = teardown.cancelled() => Err(channel_closed()),
            };
            match outcome {
                Ok(()) => sink.on_complete(),
                Err(status) => sink.on_error(status),
            }
            drop(call);
        });
    }

    /// Demonstration of the unary style: list and log the movies of actor 1.
    pub fn get_movie_list(&self) -> Result<Vec<Movie>> {
        info!("call list_movies() method:");
        let list = self.list_movies(ActorId { id: DEMO_ACTOR_ID })?;
        for movie in &list.movies {
            info!("{}", movie);
        }
        info!("finished!");
        Ok(list.movies)
    }

    /// Demonstration of the blocking streaming style.
    pub fn get_movies_using_stream(&self) -> Result<Vec<Movie>> {
        info!("call get_movies() method:");
        let mut movies = Vec::new();
        for movie in self.get_movies(ActorId { id: DEMO_ACTOR_ID }) {
            let movie = movie?;
            info!("{}", movie);
            movies.push(movie);
        }
        info!("finished!");
        Ok(movies)
    }

    /// Demonstration of the callback style. Does not return before the
    /// stream has completed or failed.
    pub fn get_movies_using_async_stub(&self) -> Result<Vec<Movie>> {
        info!("call get_movies() method using asynchronous stub:");
        let (sink, done) = CollectingSink::new();
        self.get_movies_async(ActorId { id: DEMO_ACTOR_ID }, sink);

        match done.blocking_recv() {
            Ok(collected) => Ok(collected?),
            Err(_) => Err(ClientError::Abandoned),
        }
    }

    /// Refuse new calls, then wait up to [`SHUTDOWN_GRACE`] for in-flight
    /// calls to finish. Calls still running after the grace window are
    /// cancelled and abandoned.
    ///
    /// Returns `true` if every call finished within the grace window.
    pub fn shutdown(&self) -> bool {
        self.calls.close();
        info!("Shutting down channel to {}", self.target);

        // The timer must be created inside the runtime
        let drained = self
            .runtime
            .block_on(async { tokio::time::timeout(SHUTDOWN_GRACE, self.calls.wait()).await })
            .is_ok();
        if !drained {
            warn!(
                "{} call(s) still in flight after {:?}, abandoning them",
                self.calls.len(),
                SHUTDOWN_GRACE
            );
        }
        self.teardown.cancel();
        drained
    }

    /// Tear the channel down at once. In-flight calls fail with `Cancelled`.
    pub fn shutdown_now(&self) {
        self.calls.close();
        debug!("Cancelling {} in-flight call(s)", self.calls.len());
        self.teardown.cancel();
    }
}

async fn pump_movies<S>(
    client: &mut GrpcMovieServiceClient<Channel>,
    request: ActorId,
    sink: &mut S,
) -> std::result::Result<(), Status>
where
    S: ResponseSink<Movie>,
{
    let mut stream = client.get_movies(request).await?.into_inner();
    while let Some(movie) = stream.message().await? {
        sink.on_message(movie);
    }
    Ok(())
}
