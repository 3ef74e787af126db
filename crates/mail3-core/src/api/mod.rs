//! Remote API surface.
//!
//! Components depend on the narrow source traits below; [`Mail3Api`] is the
//! HTTP implementation of all of them.

mod client;

pub use client::Mail3Api;

use async_trait::async_trait;

use crate::models::{FeedPage, RegistrationState};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Two-step avatar lookup.
#[async_trait]
pub trait AvatarSource: Send + Sync {
    /// Canonical (primitive) address for an alias.
    async fn primitive_address(&self, alias: &str) -> Result<String, ApiError>;

    /// Avatar URL for a canonical address, `None` if the server has none.
    async fn avatar(&self, address: &str) -> Result<Option<String>, ApiError>;
}

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// One page of subscription messages. `None` requests the first page.
    async fn messages(&self, cursor: Option<&str>) -> Result<FeedPage, ApiError>;
}

#[async_trait]
pub trait RegistrationApi: Send + Sync {
    async fn registration_token_state(&self, token: &str) -> Result<RegistrationState, ApiError>;

    async fn update_registration_token(
        &self,
        token: &str,
        state: RegistrationState,
    ) -> Result<(), ApiError>;
}

#[async_trait]
pub trait EligibilityReporter: Send + Sync {
    async fn report_eligibility(&self, article_id: &str) -> Result<(), ApiError>;
}
