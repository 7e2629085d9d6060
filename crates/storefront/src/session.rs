//! Customer session: JWT login/logout and the cached identity fields.
//!
//! The token and identity live in the key-value store under the fixed
//! session keys, so a login survives restarts the same way the cart does.

use azlan_core::CustomerId;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::instrument;

use crate::storage::{SharedStore, StorageError, keys};
use crate::woo::{WooClient, WooError};

/// Errors that can occur while managing the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Login failed: {0}")]
    Login(#[from] WooError),

    #[error("Your session has expired, please log in again")]
    Expired,
}

/// Identity cached at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: Option<CustomerId>,
    pub email: String,
    pub display_name: String,
}

pub struct Session {
    store: SharedStore,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl Session {
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Log in with email and password and remember the token and identity.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Login` on bad credentials or transport failure,
    /// `SessionError::Storage` if the session cannot be saved.
    #[instrument(skip(self, client, password))]
    pub async fn login(
        &self,
        client: &WooClient,
        email: &str,
        password: &str,
    ) -> Result<SessionUser, SessionError> {
        let response = client.login(email.trim(), password).await?;

        self.store.set(keys::AUTH_TOKEN, &response.token)?;
        match response.user_id {
            Some(id) => self.store.set(keys::USER_ID, &id.to_string())?,
            None => self.store.remove(keys::USER_ID)?,
        }
        self.store.set(keys::USER_EMAIL, &response.user_email)?;
        self.store.set(keys::USER_NAME, &response.user_display_name)?;

        tracing::info!(user_id = ?response.user_id, "customer logged in");
        Ok(SessionUser {
            id: response.user_id,
            email: response.user_email,
            display_name: response.user_display_name,
        })
    }

    /// Forget the token and identity.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if a key cannot be removed.
    pub fn logout(&self) -> Result<(), SessionError> {
        for key in keys::SESSION {
            self.store.remove(key)?;
        }
        tracing::info!("customer logged out");
        Ok(())
    }

    /// The stored token, if it has not expired.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Expired` when the token's `exp` claim is in
    /// the past, or `SessionError::Storage` if it cannot be read.
    pub fn token(&self) -> Result<Option<String>, SessionError> {
        self.token_at(Utc::now())
    }

    /// [`Session::token`] evaluated at `now`.
    ///
    /// # Errors
    ///
    /// See [`Session::token`].
    pub fn token_at(&self, now: DateTime<Utc>) -> Result<Option<String>, SessionError> {
        let Some(token) = self.store.get(keys::AUTH_TOKEN)? else {
            return Ok(None);
        };
        if jwt_expiry(&token).is_some_and(|exp| exp <= now) {
            tracing::debug!("stored token has expired");
            return Err(SessionError::Expired);
        }
        Ok(Some(token))
    }

    /// Identity cached at the last login, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the identity cannot be read.
    pub fn current_user(&self) -> Result<Option<SessionUser>, SessionError> {
        if self.store.get(keys::AUTH_TOKEN)?.is_none() {
            return Ok(None);
        }
        Ok(Some(SessionUser {
            id: self.customer_id(),
            email: self.store.get(keys::USER_EMAIL)?.unwrap_or_default(),
            display_name: self.store.get(keys::USER_NAME)?.unwrap_or_default(),
        }))
    }

    /// Whether a token is stored. Expiry is not checked here.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        matches!(self.store.get(keys::AUTH_TOKEN), Ok(Some(_)))
    }

    /// The logged-in customer's id. Orders placed without one are guest
    /// orders (`customer_id: 0`).
    #[must_use]
    pub fn customer_id(&self) -> Option<CustomerId> {
        self.store
            .get(keys::USER_ID)
            .ok()
            .flatten()
            .and_then(|id| id.trim().parse().ok())
    }
}

/// The `exp` claim of a JWT, if the token carries a readable one.
///
/// The signature is not verified; this only decides whether to bother
/// sending the token.
#[must_use]
pub fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    DateTime::from_timestamp(exp, 0)
}
