/// Photofeed Service Library
///
/// A photo-feed service: users register, log in, upload image posts with
/// captions, comment, and browse a reverse-chronological feed. Feed rendering
/// is the hot path and runs through a cache-aside layer that batches per-post
/// comment lookups into a single multi-key cache fetch.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers (thin glue over the services)
/// - `models`: Data structures for users, posts, comments, feed items
/// - `services`: Identity resolver, comment aggregator, feed assembler
/// - `db`: Database access layer and repositories
/// - `session`: Cache-backed session collaborator
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Observability and metrics collection
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;
pub mod session;

pub use config::Config;
pub use error::{AppError, Result};
