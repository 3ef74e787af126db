//! Application-wide constants
//!
//! Well-known URLs, route paths and limits shared across modules.

/// Default REST API base URL
pub const API_URL: &str = "https://api.mail3.me/api/v1";

/// Default web app origin, used to build share and notification links
pub const APP_URL: &str = "https://app.mail3.me";

/// Avatar URL the server returns for users without a custom avatar.
/// Treated the same as "no avatar".
pub const DEFAULT_AVATAR_SRC: &str = "https://mail-public.s3.amazonaws.com/users/default_avatar.png";

/// Alias suffixes the avatar service can resolve
pub const SUPPORTED_ALIAS_SUFFIXES: &[&str] = &[".eth", ".bit"];

/// Request timeout applied by the HTTP client
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

// Session cookie
pub const COOKIE_KEY: &str = "mail3_login_info";
pub const COOKIE_MAX_AGE_DAYS: i64 = 14;

// Share defaults
pub const SHARE_TEXT_MAX_CHARS: usize = 100;
pub const TWITTER_VIA: &str = "mail3dao";

pub mod routes {
    pub const HOME: &str = "/";
    pub const WHITE_LIST: &str = "/whitelist";
    pub const MESSAGE: &str = "/message";
    pub const SUBSCRIPTION_ARTICLE: &str = "/subscription-article";
    /// Public article permalink prefix
    pub const ARTICLE_PERMALINK: &str = "/p";
}
