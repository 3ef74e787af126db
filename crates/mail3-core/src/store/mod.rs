pub mod avatar_cache;
pub mod feed_store;

pub use avatar_cache::{AvatarCache, AvatarChange, AvatarEntry, Claim};
pub use feed_store::{FeedStatus, FeedStore};
