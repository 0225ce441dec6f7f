//! Response sinks for asynchronous streaming calls.
//!
//! A sink receives the events of one server-streaming call from the client
//! runtime. For a single call the events are never delivered concurrently:
//! every `on_message` happens before the terminal event, and exactly one of
//! `on_error` / `on_complete` is delivered.

use tokio::sync::oneshot;
use tonic::Status;
use tracing::info;

use crate::Movie;

/// Receiver of the events of one streaming call.
///
/// Callbacks run on the client runtime's worker threads and must not block.
pub trait ResponseSink<T>: Send + 'static {
    /// A message arrived, in server emission order.
    fn on_message(&mut self, message: T);

    /// The call failed. Terminal; nothing follows it.
    fn on_error(&mut self, status: Status);

    /// The server ended the stream normally. Terminal; nothing follows it.
    fn on_complete(&mut self);
}

/// Outcome reported by a [`CollectingSink`] once its call terminates.
pub type Collected = std::result::Result<Vec<Movie>, Status>;

/// Sink that logs every event, keeps the streamed movies, and hands them to
/// the waiting caller through a one-shot signal on the terminal event.
pub struct CollectingSink {
    movies: Vec<Movie>,
    done: Option<oneshot::Sender<Collected>>,
}

impl CollectingSink {
    /// Create the sink together with the receiver that is released when the
    /// call terminates.
    pub fn new() -> (Self, oneshot::Receiver<Collected>) {
        let (tx, rx) = oneshot::channel();
        let sink = Self {
            movies: Vec::new(),
            done: Some(tx),
        };
        (sink, rx)
    }

    fn release(&mut self, outcome: Collected) {
        if let Some(done) = self.done.take() {
            // The waiter may have given up; nothing left to notify then
            let _ = done.send(outcome);
        }
    }
}

impl ResponseSink<Movie> for CollectingSink {
    fn on_message(&mut self, message: Movie) {
        info!("get movie: {}", message);
        self.movies.push(message);
    }

    fn on_error(&mut self, status: Status) {
        info!("failed with status: {:?}", status);
        self.release(Err(status));
    }

    fn on_complete(&mut self) {
        info!("finished!");
        let movies = std::mem::take(&mut self.movies);
        self.release(Ok(movies));
    }
}
