use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

/// Role id the backend uses for instructors.
pub const INSTRUCTOR_ROLE_ID: i64 = 2;

/// Where and how to reach the backend.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: Url,
    pub token: Option<SecretString>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            token: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The signed-in user as the backend describes them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: i64,

    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role_id: i64,
    #[serde(default)]
    pub is_admin: bool,
}

impl AuthUser {
    pub fn is_instructor(&self) -> bool {
        self.role_id == INSTRUCTOR_ROLE_ID
    }
}

/// Context handed to every view explicitly.
#[derive(Clone, Debug)]
pub struct Session {
    pub user: AuthUser,
    /// Provider app id for live classes.
    pub conference_app_id: Option<String>,
}

impl Session {
    pub fn new(user: AuthUser) -> Self {
        Self {
            user,
            conference_app_id: None,
        }
    }

    pub fn with_conference_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.conference_app_id = Some(app_id.into());
        self
    }
}
