//! Session token storage, the login flow and the page access gate.
//!
//! The store is an injected capability so the gate and login flow never reach
//! for ambient state.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::workflows::wizard::fields::is_email_shaped;
use crate::workflows::wizard::{Notification, Severity};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const SESSION_TOKEN: &str = "mock-jwt-token";
pub const MIN_PASSWORD_LEN: usize = 6;
pub const LOGIN_PATH: &str = "/login";

/// Key-value storage holding the session token and user profile.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemorySessionStore {
    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries().insert(key.to_string(), value);
    }

    fn clear(&self) {
        self.entries().clear();
    }
}

/// Which login tab the user signed in from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Portal {
    Citizen,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Citizen,
    Admin,
}

impl Role {
    pub const fn home(self) -> &'static str {
        match self {
            Self::Citizen => "/dashboard",
            Self::Admin => "/admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Email is required")]
    MissingEmail,
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Password is required")]
    MissingPassword,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("stored user profile could not be read")]
    CorruptProfile(#[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginOutcome {
    pub user: UserProfile,
    pub token: String,
    pub redirect: &'static str,
    pub notification: Notification,
}

/// Signs users in against the mock directory after a fixed review delay.
#[derive(Debug, Clone)]
pub struct LoginService {
    delay: Duration,
}

impl LoginService {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub async fn login(
        &self,
        store: &dyn SessionStore,
        portal: Portal,
        email: &str,
        password: &str,
    ) -> Result<LoginOutcome, SessionError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(SessionError::MissingEmail);
        }
        if !is_email_shaped(email) {
            return Err(SessionError::InvalidEmail);
        }
        if password.is_empty() {
            return Err(SessionError::MissingPassword);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(SessionError::PasswordTooShort);
        }

        tokio::time::sleep(self.delay).await;

        let (name, role) = match portal {
            Portal::Citizen => ("John Doe", Role::Citizen),
            Portal::Admin => ("Admin User", Role::Admin),
        };
        let user = UserProfile {
            id: 1,
            name: name.to_string(),
            email: email.to_string(),
            role,
        };
        let profile = serde_json::to_string(&user).map_err(SessionError::CorruptProfile)?;
        store.set(TOKEN_KEY, SESSION_TOKEN.to_string());
        store.set(USER_KEY, profile);

        info!(email, role = ?role, "user signed in");
        Ok(LoginOutcome {
            user,
            token: SESSION_TOKEN.to_string(),
            redirect: role.home(),
            notification: Notification::new("Login successful!", Severity::Success),
        })
    }
}

/// The signed-in user's profile, if a readable one is stored.
pub fn current_user(store: &dyn SessionStore) -> Result<Option<UserProfile>, SessionError> {
    store
        .get(USER_KEY)
        .map(|raw| serde_json::from_str(&raw).map_err(SessionError::CorruptProfile))
        .transpose()
}

pub fn logout(store: &dyn SessionStore) -> &'static str {
    store.clear();
    debug!("session cleared");
    LOGIN_PATH
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Granted,
    RedirectToLogin,
    Denied,
}

/// Guards a page: any token gets through, admin pages also need an admin profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessGate {
    admin_only: bool,
}

impl AccessGate {
    pub const fn signed_in() -> Self {
        Self { admin_only: false }
    }

    pub const fn admin_only() -> Self {
        Self { admin_only: true }
    }

    pub fn check(&self, store: &dyn SessionStore) -> Access {
        if store.get(TOKEN_KEY).is_none() {
            return Access::RedirectToLogin;
        }
        if !self.admin_only {
            return Access::Granted;
        }
        // An unreadable profile carries no role.
        match current_user(store) {
            Ok(Some(user)) if user.role == Role::Admin => Access::Granted,
            _ => Access::Denied,
        }
    }
}
