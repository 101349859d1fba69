/// Business logic layer for forum-service
///
/// - Communities: lifecycle, subscriptions and the subscription gate
/// - Posts: gated creation, cache-first detail reads
/// - Comments: gated creation, threaded listing
/// - Feed: paginated post listings
/// - Settings: community and account administration
///
/// Voting lives in `crate::vote`.
pub mod comments;
pub mod communities;
pub mod feed;
pub mod posts;
pub mod settings;

pub use comments::CommentService;
pub use communities::CommunityService;
pub use feed::{FeedQuery, FeedScope, FeedService, FeedSort};
pub use posts::{PostDetail, PostService};
pub use settings::SettingsService;
