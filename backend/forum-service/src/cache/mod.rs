/// Post caching layer
///
/// Posts that gather enough votes are written to Redis so the detail page
/// can skip the database. The cache is optional and best-effort: failures
/// are logged and the request falls back to Postgres.
pub mod post_cache;

pub use post_cache::{CachedPost, PostCache};
