pub mod avatar;
pub mod feed;
pub mod session;
pub mod time_format;

pub use avatar::{AvatarResponse, AvatarResult, PlaceholderKind, PrimitiveAddressResponse};
pub use feed::{FeedItem, FeedPage};
pub use session::{LoginInfo, NotificationPayload, RegistrationState};
pub use time_format::{format_date, format_feed_time};
