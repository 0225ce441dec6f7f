//! Client for the movie catalog gRPC service.
//!
//! This crate owns the service contract (the generated stub and messages from
//! `proto/movie_service.proto`) and a client that demonstrates three ways of
//! calling it:
//! - **Unary blocking**: `ListMovies` returns the whole `MovieList` at once
//! - **Streaming blocking**: `GetMovies` pulled through a lazy iterator
//! - **Streaming asynchronous**: `GetMovies` pushed into a [`ResponseSink`]
//!
//! ## Example Usage
//!
//! ```ignore
//! use movie_client::{ActorId, ClientConfig, MovieServiceClient};
//!
//! let client = MovieServiceClient::connect(&ClientConfig::default())?;
//! let list = client.list_movies(ActorId { id: 1 })?;
//! for movie in client.get_movies(ActorId { id: 1 }) {
//!     println!("{}", movie?);
//! }
//! client.shutdown();
//! ```

use std::fmt;

pub mod client;
pub mod error;
pub mod sink;
pub mod stream;

// Include the generated protobuf code. prost snake-cases the package
// segments in the file name; the wire name keeps `movieService`.
pub mod movie_service {
    tonic::include_proto!("com.jiangew.movie_service");
}

pub use client::{ChannelState, ClientConfig, MovieServiceClient, SHUTDOWN_GRACE};
pub use error::{ClientError, Result};
pub use movie_service::{Actor, ActorId, Movie, MovieList};
pub use sink::{CollectingSink, ResponseSink};
pub use stream::MovieStream;

/// Actor requested by the demonstration calls.
pub const DEMO_ACTOR_ID: i32 = 1;

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Actor {{ id: {}, name: {:?} }}", self.id, self.name)
    }
}

impl fmt::Display for Movie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Movie {{ id: {}, name: {:?}, actor: ", self.id, self.name)?;
        match &self.actor {
            Some(actor) => write!(f, "{} }}", actor),
            None => write!(f, "<none> }}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    fn sample_movie() -> Movie {
        Movie {
            id: 2,
            name: "Today is a Good Day".to_string(),
            actor: Some(Actor {
                id: 7,
                name: "Jiangew".to_string(),
            }),
        }
    }

    #[test]
    fn test_movie_display_includes_actor() {
        let text = sample_movie().to_string();

        assert_eq!(
            text,
            r#"Movie { id: 2, name: "Today is a Good Day", actor: Actor { id: 7, name: "Jiangew" } }"#
        );
    }

    #[test]
    fn test_movie_display_without_actor() {
        let movie = Movie {
            actor: None,
            ..sample_movie()
        };

        assert!(movie.to_string().ends_with("actor: <none> }"));
    }

    #[test]
    fn test_field_numbers_match_contract() {
        // Movie.actor is field 3, length-delimited: tag byte (3 << 3) | 2
        let bytes = sample_movie().encode_to_vec();
        assert_eq!(bytes[0], (1 << 3) as u8);
        assert!(bytes.contains(&((3 << 3) | 2)));

        let decoded = Movie::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, sample_movie());
    }
}
