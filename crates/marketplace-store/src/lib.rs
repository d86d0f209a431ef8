pub mod db;
pub mod password;
pub mod products;
pub mod sessions;
pub mod stories;
pub mod users;

pub use db::MarketplaceDb;
pub use products::ProductCatalog;
pub use sessions::{SessionStore, DEFAULT_SESSION_TTL};
pub use stories::StoryArchive;
pub use users::UserDirectory;

/// Listing caps for the public collections.
pub const PRODUCT_LIST_LIMIT: i64 = 100;
pub const STORY_LIST_LIMIT: i64 = 50;
