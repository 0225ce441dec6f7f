//! Blocking, lazy view over a `GetMovies` server stream.

use std::iter::FusedIterator;

use tokio_util::task::task_tracker::TaskTrackerToken;
use tonic::transport::Channel;
use tonic::{Status, Streaming};
use tracing::debug;

use crate::client::MovieServiceClient;
use crate::error::{channel_closed, ClientError};
use crate::movie_service::movie_service_client::MovieServiceClient as GrpcMovieServiceClient;
use crate::{ActorId, Movie};

enum StreamState {
    /// Request not sent yet; it goes out on the first pull
    Pending(GrpcMovieServiceClient<Channel>, ActorId),
    Open(Streaming<Movie>),
    /// Refused before it was sent; the status is yielded on the first pull
    Rejected(Status),
    Done,
}

type Step = (Option<Result<Movie, Status>>, StreamState);

/// Single-pass iterator over the movies of one `GetMovies` call.
///
/// Each call to `next` blocks the current thread until the next message
/// arrives or the stream ends. Once it has yielded `None` or an error it
/// stays exhausted. Tearing the channel down makes the next pull fail with
/// `Cancelled`.
///
/// Must not be driven from inside an async context.
pub struct MovieStream<'a> {
    state: StreamState,
    owner: &'a MovieServiceClient,
    call: Option<TaskTrackerToken>,
}

impl<'a> MovieStream<'a> {
    pub(crate) fn new(
        owner: &'a MovieServiceClient,
        client: GrpcMovieServiceClient<Channel>,
        request: ActorId,
        call: TaskTrackerToken,
    ) -> Self {
        Self {
            state: StreamState::Pending(client, request),
            owner,
            call: Some(call),
        }
    }

    /// A stream that fails on its first pull, for calls rejected up front.
    pub(crate) fn rejected(owner: &'a MovieServiceClient, status: Status) -> Self {
        Self {
            state: StreamState::Rejected(status),
            owner,
            call: None,
        }
    }
}

async fn advance(state: StreamState) -> Step {
    let mut stream = match state {
        StreamState::Pending(mut client, request) => {
            debug!("Opening GetMovies stream for actor {}", request.id);
            match client.get_movies(request).await {
                Ok(response) => response.into_inner(),
                Err(status) => return (Some(Err(status)), StreamState::Done),
            }
        }
        StreamState::Open(stream) => stream,
        StreamState::Rejected(status) => return (Some(Err(status)), StreamState::Done),
        StreamState::Done => return (None, StreamState::Done),
    };

    match stream.message().await {
        Ok(Some(movie)) => (Some(Ok(movie)), StreamState::Open(stream)),
        Ok(None) => (None, StreamState::Done),
        Err(status) => (Some(Err(status)), StreamState::Done),
    }
}

impl Iterator for MovieStream<'_> {
    type Item = Result<Movie, ClientError>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, StreamState::Done) {
            self.call = None;
            return None;
        }

        let state = match std::mem::replace(&mut self.state, StreamState::Done) {
            StreamState::Rejected(status) => return Some(Err(ClientError::from(status))),
            state => state,
        };
        let teardown = self.owner.teardown_token().clone();
        let (item, next_state) = self.owner.runtime_handle().block_on(async move {
            tokio::select! {
                // Teardown wins over a message that is ready at the same time
                biased;
                _ = teardown.cancelled() => (Some(Err(channel_closed())), StreamState::Done),
                step = advance(state) => step,
            }
        });

        self.state = next_state;
        if matches!(self.state, StreamState::Done) {
            // Exhausted streams no longer hold up channel shutdown
            self.call = None;
        }
        item.map(|result| result.map_err(ClientError::from))
    }
}

impl FusedIterator for MovieStream<'_> {}
