pub mod address;
pub mod api;
pub mod avatar;
pub mod config;
pub mod constants;
pub mod feed;
pub mod models;
pub mod push;
pub mod runtime;
pub mod session;
pub mod share;
pub mod store;
pub mod tracing_setup;

pub use address::{classify, display_name, truncate_address, AddressKind};
pub use api::{ApiError, Mail3Api};
pub use avatar::AddressResolver;
pub use config::{ClientConfig, ConfigError};
pub use feed::{FeedChange, FeedError, FeedPaginator, LoadOutcome};
pub use push::{notification_open_url, PushError, PushRegistrar, TokenProvider};
pub use runtime::Mail3Runtime;
pub use session::{gate, require_session, GateDecision, Redirect};
pub use share::{ArticleShare, ShareTarget};
