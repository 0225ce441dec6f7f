//! # Movie Service Implementation
//!
//! Handlers for the two RPCs of the movie service:
//! 1. `ListMovies` answers with the whole catalog in a single `MovieList`
//! 2. `GetMovies` streams the same catalog one movie at a time, pausing
//!    [`STREAM_PAUSE`] between consecutive movies
//!
//! The service holds no mutable state. Each call builds its own list, so
//! handlers can run on any worker without locking.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};
use tracing::{debug, warn};

use movie_client::movie_service::movie_service_server::MovieService;
use movie_client::{ActorId, Movie, MovieList};

use crate::catalog::movies_for_actor;

/// Delay between two consecutive messages of a `GetMovies` stream.
pub const STREAM_PAUSE: Duration = Duration::from_secs(1);

/// How a `GetMovies` stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Every movie was sent
    Completed,
    /// The receiving side went away; `sent` movies had been handed over
    Disconnected { sent: usize },
    /// The pause was cut short by the server; an error ended the call
    Interrupted { sent: usize },
}

/// Implementation of the generated `MovieService` trait.
#[derive(Debug, Clone, Default)]
pub struct MovieServiceImpl {
    /// Cancelled to cut in-flight stream pauses short
    interrupt: CancellationToken,
}

impl MovieServiceImpl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Service whose streams fail with `Cancelled` once `interrupt` fires.
    pub fn with_interrupt(interrupt: CancellationToken) -> Self {
        Self { interrupt }
    }
}

/// Send `movies` in order, pausing between consecutive sends.
///
/// Stops at the first sign that the call is over. After an error has been
/// sent nothing else is.
pub(crate) async fn stream_movies(
    movies: Vec<Movie>,
    tx: mpsc::Sender<Result<Movie, Status>>,
    pause: Duration,
    interrupt: CancellationToken,
) -> StreamOutcome {
    let total = movies.len();

    for (index, movie) in movies.into_iter().enumerate() {
        if tx.send(Ok(movie)).await.is_err() {
            return StreamOutcome::Disconnected { sent: index };
        }
        let sent = index + 1;
        if sent == total {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(pause) => {}
            _ = tx.closed() => return StreamOutcome::Disconnected { sent },
            _ = interrupt.cancelled() => {
                let status = Status::cancelled("stream interrupted while pausing");
                // The receiver may be gone as well; the call is over either way
                let _ = tx.send(Err(status)).await;
                return StreamOutcome::Interrupted { sent };
            }
        }
    }

    StreamOutcome::Completed
}

#[tonic::async_trait]
impl MovieService for MovieServiceImpl {
    async fn list_movies(
        &self,
        request: Request<ActorId>,
    ) -> Result<Response<MovieList>, Status> {
        let request = request.into_inner();
        debug!("ListMovies for actor {}", request.id);

        let movies = movies_for_actor(&request);
        Ok(Response::new(MovieList { movies }))
    }

    type GetMoviesStream = ReceiverStream<Result<Movie, Status>>;

    async fn get_movies(
        &self,
        request: Request<ActorId>,
    ) -> Result<Response<Self::GetMoviesStream>, Status> {
        let request = request.into_inner();
        debug!("GetMovies for actor {}", request.id);

        let movies = movies_for_actor(&request);
        let (tx, rx) = mpsc::channel(movies.len().max(1));
        let interrupt = self.interrupt.clone();
        let actor_id = request.id;

        tokio::spawn(async move {
            match stream_movies(movies, tx, STREAM_PAUSE, interrupt).await {
                StreamOutcome::Completed => {
                    debug!("GetMovies for actor {} completed", actor_id);
                }
                StreamOutcome::Disconnected { sent } => {
                    warn!(
                        "GetMovies for actor {} cancelled by the client after {} movie(s)",
                        actor_id, sent
                    );
                }
                StreamOutcome::Interrupted { sent } => {
                    warn!(
                        "GetMovies for actor {} interrupted after {} movie(s)",
                        actor_id, sent
                    );
                }
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ACTOR_NAME;
    use tokio::time::Instant;
    use tokio_stream::StreamExt;
    use tonic::Code;

    #[test]
    fn test_service_keeps_wire_name() {
        use movie_client::movie_service::movie_service_server::MovieServiceServer;
        use tonic::server::NamedService;

        assert_eq!(
            <MovieServiceServer<MovieServiceImpl> as NamedService>::NAME,
            "com.jiangew.movieService.MovieService"
        );
    }

    #[tokio::test]
    async fn test_list_movies_returns_catalog_for_actor() {
        let service = MovieServiceImpl::new();

        let response = service
            .list_movies(Request::new(ActorId { id: 9 }))
            .await
            .unwrap()
            .into_inner();

        let ids: Vec<i32> = response.movies.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        for movie in &response.movies {
            let actor = movie.actor.as_ref().unwrap();
            assert_eq!(actor.id, 9);
            assert_eq!(actor.name, ACTOR_NAME);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_movies_matches_list_movies() {
        let service = MovieServiceImpl::new();
        let request = ActorId { id: 1 };

        let list = service
            .list_movies(Request::new(request.clone()))
            .await
            .unwrap()
            .into_inner();
        let streamed: Vec<Movie> = service
            .get_movies(Request::new(request))
            .await
            .unwrap()
            .into_inner()
            .map(|item| item.unwrap())
            .collect()
            .await;

        assert_eq!(streamed, list.movies);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_movies_pauses_between_messages() {
        let service = MovieServiceImpl::new();
        let mut stream = service
            .get_movies(Request::new(ActorId { id: 1 }))
            .await
            .unwrap()
            .into_inner();

        let mut arrivals = Vec::new();
        while let Some(item) = stream.next().await {
            item.unwrap();
            arrivals.push(Instant::now());
        }

        assert_eq!(arrivals.len(), 3);
        for pair in arrivals.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= STREAM_PAUSE, "gap {:?} shorter than the pause", gap);
            assert!(gap < STREAM_PAUSE + Duration::from_millis(500));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_stops_when_receiver_goes_away() {
        let movies = movies_for_actor(&ActorId { id: 1 });
        let (tx, mut rx) = mpsc::channel(4);

        let producer = tokio::spawn(stream_movies(
            movies,
            tx,
            STREAM_PAUSE,
            CancellationToken::new(),
        ));

        let first = rx.recv().await.unwrap().unwrap();
        assert_eq!(first.id, 1);
        drop(rx);

        let outcome = producer.await.unwrap();
        assert_eq!(outcome, StreamOutcome::Disconnected { sent: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupted_pause_ends_with_single_error() {
        let movies = movies_for_actor(&ActorId { id: 1 });
        let (tx, mut rx) = mpsc::channel(4);
        let interrupt = CancellationToken::new();

        let producer = tokio::spawn(stream_movies(
            movies,
            tx,
            STREAM_PAUSE,
            interrupt.clone(),
        ));

        assert_eq!(rx.recv().await.unwrap().unwrap().id, 1);
        interrupt.cancel();

        let outcome = producer.await.unwrap();
        assert_eq!(outcome, StreamOutcome::Interrupted { sent: 1 });

        let status = rx.recv().await.unwrap().unwrap_err();
        assert_eq!(status.code(), Code::Cancelled);
        // Nothing follows the error
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_list_completes_immediately() {
        let (tx, mut rx) = mpsc::channel(1);

        let outcome = stream_movies(Vec::new(), tx, STREAM_PAUSE, CancellationToken::new()).await;

        assert_eq!(outcome, StreamOutcome::Completed);
        assert!(rx.recv().await.is_none());
    }
}
