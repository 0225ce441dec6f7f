//! Benchmarks for building and encoding the catalog
//!
//! Run with: cargo bench --package server

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use movie_client::{ActorId, MovieList};
use prost::Message;
use server::catalog::movies_for_actor;

fn bench_movies_for_actor(c: &mut Criterion) {
    let request = ActorId { id: 1 };

    c.bench_function("movies_for_actor", |b| {
        b.iter(|| black_box(movies_for_actor(black_box(&request))))
    });
}

fn bench_encode_movie_list(c: &mut Criterion) {
    let list = MovieList {
        movies: movies_for_actor(&ActorId { id: 1 }),
    };

    c.bench_function("encode_movie_list", |b| {
        b.iter(|| black_box(black_box(&list).encode_to_vec()))
    });
}

criterion_group!(benches, bench_movies_for_actor, bench_encode_movie_list);
criterion_main!(benches);
