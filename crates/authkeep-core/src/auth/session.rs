use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::claims::{decode, TokenClaims};
use super::error::SessionError;
use crate::storage::{StorageError, StorageKey, TokenStorage};

/// Who is signed in, derived from the payload of the last accepted token.
///
/// Group-derived fields come from the first group only and are absent when
/// the token carries no groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentity {
    pub username: Option<String>,
    pub id: Option<i64>,
    pub description: Option<String>,
    pub role: Option<String>,
    pub permissions: Option<Vec<i64>>,
    pub token_issue_epoch: Option<i64>,
    pub token_exp_epoch: Option<i64>,
    pub token: String,
}

impl SessionIdentity {
    pub fn from_claims(token: &str, claims: &TokenClaims) -> Self {
        let group = claims.primary_group();
        Self {
            username: claims.username().map(str::to_string),
            id: group.and_then(|g| g.id),
            description: group.and_then(|g| g.description.clone()),
            role: group.and_then(|g| g.name.clone()),
            permissions: group.and_then(|g| g.permissions.clone()),
            token_issue_epoch: claims.iat,
            token_exp_epoch: claims.exp,
            token: token.to_string(),
        }
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.token_issue_epoch
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.token_exp_epoch
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }

    /// Informational only; the session store never rejects expired tokens.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().map(|exp| now >= exp).unwrap_or(false)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Seconds left before expiry, clamped at zero. `None` without an `exp` claim.
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expires_at()
            .map(|exp| (exp - Utc::now()).num_seconds().max(0))
    }

    pub fn has_permission(&self, permission: i64) -> bool {
        self.permissions
            .as_ref()
            .map(|p| p.contains(&permission))
            .unwrap_or(false)
    }
}

/// Holds the signed-in identity and persists the raw token through a
/// `TokenStorage` backend chosen by the caller.
pub struct SessionStore<S> {
    storage: S,
    identity: Option<SessionIdentity>,
}

impl<S: TokenStorage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            identity: None,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Persist the access token. Storage failures are logged, never returned.
    pub fn store_token(&self, token: &str) {
        if let Err(e) = self.storage.write(StorageKey::AccessToken, token) {
            warn!(backend = self.storage.name(), error = %e, "Could not persist access token");
        }
    }

    /// Read the persisted access token from the backend.
    pub fn read_token(&self) -> Result<Option<String>, StorageError> {
        self.storage.read(StorageKey::AccessToken)
    }

    /// Accept `token` as the current session.
    ///
    /// An empty or missing token is ignored. The token is decoded before
    /// anything is written, so a malformed token leaves both the identity and
    /// storage as they were.
    pub fn sign_in<'a>(&mut self, token: impl Into<Option<&'a str>>) -> Result<(), SessionError> {
        let token = match token.into() {
            Some(token) if !token.is_empty() => token,
            _ => {
                debug!("Ignoring sign-in without a token");
                return Ok(());
            }
        };

        let claims = decode(token)?;
        self.store_token(token);

        let identity = SessionIdentity::from_claims(token, &claims);
        info!(
            username = identity.username.as_deref().unwrap_or("<unknown>"),
            role = identity.role.as_deref().unwrap_or("<none>"),
            "Signed in"
        );
        self.identity = Some(identity);
        Ok(())
    }

    /// Drop the current identity and remove the persisted token.
    pub fn sign_out(&mut self) {
        self.identity = None;
        if let Err(e) = self.storage.delete(StorageKey::AccessToken) {
            warn!(backend = self.storage.name(), error = %e, "Could not remove access token");
        }
        info!("Signed out");
    }

    /// Rebuild the identity from the persisted token, without writing storage.
    ///
    /// Returns `Ok(false)` when no token is stored.
    pub fn restore(&mut self) -> Result<bool, SessionError> {
        let Some(token) = self.read_token()? else {
            return Ok(false);
        };
        if token.is_empty() {
            return Ok(false);
        }

        let claims = decode(&token)?;
        self.identity = Some(SessionIdentity::from_claims(&token, &claims));
        debug!(backend = self.storage.name(), "Restored session from storage");
        Ok(true)
    }

    pub fn current_session(&self) -> Option<&SessionIdentity> {
        self.identity.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }

    /// The token of the current session, if any
    pub fn token(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.token.as_str())
    }
}
