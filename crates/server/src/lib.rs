//! Server crate for the movie catalog service.
//!
//! This crate contains the service implementation behind the generated
//! `MovieService` trait, the canonical catalog it serves, and the server
//! that binds it to a TCP endpoint.

pub mod catalog;
pub mod error;
pub mod server;
pub mod service;

pub use error::{Result, ServerError};
pub use server::{MovieServer, ServerConfig, install_shutdown_hook, spawn_shutdown_hook};
pub use service::{MovieServiceImpl, STREAM_PAUSE};
