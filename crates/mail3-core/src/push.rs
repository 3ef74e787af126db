//! Push notification token lifecycle.

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::{ApiError, RegistrationApi};
use crate::constants::routes;
use crate::models::{NotificationPayload, RegistrationState};

const COMMUNITY_MESSAGE: &str = "community_message";

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("Push token provider error: {0}")]
    Provider(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Device-side source of push tokens (the messaging SDK).
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Token already stored on this device, if any. Never creates one.
    async fn current_token(&self) -> Option<String>;

    /// Stored token, or a freshly issued one.
    async fn get_token(&self) -> Result<String, PushError>;

    async fn delete_token(&self) -> Result<(), PushError>;
}

pub struct PushRegistrar {
    provider: Arc<dyn TokenProvider>,
    api: Arc<dyn RegistrationApi>,
}

impl PushRegistrar {
    pub fn new(provider: Arc<dyn TokenProvider>, api: Arc<dyn RegistrationApi>) -> Self {
        Self { provider, api }
    }

    /// Obtain the device token and make sure the server considers it active.
    pub async fn get_token(&self) -> Result<String, PushError> {
        let token = self.provider.get_token().await?;

        let state = match self.api.registration_token_state(&token).await {
            Ok(state) => state,
            Err(e) => {
                tracing::debug!(error = %e, "push: token state unavailable, treating as stale");
                RegistrationState::Stale
            }
        };

        if state == RegistrationState::Active {
            return Ok(token);
        }

        self.api
            .update_registration_token(&token, RegistrationState::Active)
            .await?;
        tracing::info!("push: registration token activated");
        Ok(token)
    }

    /// Invalidate the current token on the server, then drop it locally.
    /// Both steps are best-effort.
    pub async fn delete_token(&self) {
        if let Some(token) = self.provider.current_token().await {
            if let Err(e) = self
                .api
                .update_registration_token(&token, RegistrationState::Stale)
                .await
            {
                tracing::warn!(error = %e, "push: failed to mark token stale");
            }
        }

        if let Err(e) = self.provider.delete_token().await {
            tracing::warn!(error = %e, "push: failed to delete local token");
        }
    }
}

/// Page opened when the user clicks a notification.
pub fn notification_open_url(app_url: &str, payload: &NotificationPayload) -> String {
    let route = if payload.notification_type == COMMUNITY_MESSAGE {
        routes::SUBSCRIPTION_ARTICLE
    } else {
        routes::MESSAGE
    };
    format!(
        "{}{}/{}",
        app_url.trim_end_matches('/'),
        route,
        payload.message_id
    )
}
