use serde::{Deserialize, Serialize};

/// Login state persisted in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginInfo {
    pub address: String,
    pub jwt: String,
    pub uuid: String,
}

/// Server-side state of a push registration token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationState {
    Active,
    Stale,
}

impl RegistrationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationState::Active => "active",
            RegistrationState::Stale => "stale",
        }
    }
}

/// Data attached to a push notification by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub message_id: String,
    pub notification_type: String,
}
