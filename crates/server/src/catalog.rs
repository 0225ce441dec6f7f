//! The fixed catalog served for every actor.

use movie_client::{Actor, ActorId, Movie};

/// Name given to the actor of every catalog movie.
pub const ACTOR_NAME: &str = "Jiangew";

const TITLES: [(i32, &str); 3] = [
    (1, "True Love True Life"),
    (2, "Today is a Good Day"),
    (3, "One Year Ago"),
];

/// Build the canonical movie list for the requested actor.
///
/// The list is freshly built per call; ids run `1..=3` in order and every
/// movie carries a fully populated actor.
pub fn movies_for_actor(request: &ActorId) -> Vec<Movie> {
    let actor = Actor {
        id: request.id,
        name: ACTOR_NAME.to_string(),
    };

    TITLES
        .iter()
        .map(|&(id, name)| Movie {
            id,
            name: name.to_string(),
            actor: Some(actor.clone()),
        })
        .collect()
}
