//! Credential triple for the remote store.
//!
//! Values are opaque: nothing in this crate inspects them beyond checking
//! they are non-empty, and `Debug` output is redacted.

use crate::error::{SyncError, SyncResultOf};
use std::fmt;

/// Environment variable holding the OAuth refresh token.
pub const REFRESH_TOKEN_ENV: &str = "REFRESH_TOKEN";
/// Environment variable holding the app key (OAuth client id).
pub const APP_KEY_ENV: &str = "APP_KEY";
/// Environment variable holding the app secret (OAuth client secret).
pub const APP_SECRET_ENV: &str = "APP_SECRET";

/// Authentication material for the remote store.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    app_key: String,
    app_secret: String,
    refresh_token: String,
}

impl Credentials {
    /// Build credentials, rejecting any empty part.
    pub fn new(
        app_key: impl Into<String>,
        app_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> SyncResultOf<Self> {
        let app_key = app_key.into();
        let app_secret = app_secret.into();
        let refresh_token = refresh_token.into();

        if app_key.trim().is_empty() {
            return Err(SyncError::MissingCredentials(APP_KEY_ENV));
        }
        if app_secret.trim().is_empty() {
            return Err(SyncError::MissingCredentials(APP_SECRET_ENV));
        }
        if refresh_token.trim().is_empty() {
            return Err(SyncError::MissingCredentials(REFRESH_TOKEN_ENV));
        }

        Ok(Self {
            app_key,
            app_secret,
            refresh_token,
        })
    }

    /// Resolve credentials from command-line values, falling back to the
    /// environment for any value given as an empty string.
    pub fn resolve(app_key: &str, app_secret: &str, refresh_token: &str) -> SyncResultOf<Self> {
        Self::resolve_with(app_key, app_secret, refresh_token, |name| {
            std::env::var(name).ok()
        })
    }

    fn resolve_with<F>(
        app_key: &str,
        app_secret: &str,
        refresh_token: &str,
        lookup: F,
    ) -> SyncResultOf<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |value: &str, env: &str| {
            if value.is_empty() {
                lookup(env).unwrap_or_default()
            } else {
                value.to_string()
            }
        };

        Self::new(
            pick(app_key, APP_KEY_ENV),
            pick(app_secret, APP_SECRET_ENV),
            pick(refresh_token, REFRESH_TOKEN_ENV),
        )
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    pub fn app_secret(&self) -> &str {
        &self.app_secret
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_key", &"<redacted>")
            .field("app_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}
