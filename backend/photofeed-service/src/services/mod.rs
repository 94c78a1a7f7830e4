/// Business logic layer
///
/// - `identity`: session user id -> hydrated `User`, read-through the cache
/// - `comments`: batch comment-count/comment-list enrichment for posts
/// - `feed`: composition of enrichment plus CSRF stamping
/// - `auth`: passhash computation, credential checks, input validation
pub mod auth;
pub mod comments;
pub mod feed;
pub mod identity;

pub use comments::CommentAggregator;
pub use feed::FeedAssembler;
pub use identity::IdentityResolver;
