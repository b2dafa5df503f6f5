//! Bearer token cache for the IBM Cloud identity service.
//!
//! One cache slot, created lazily on first use. A cached token is served
//! until `expires_in - 60s` has elapsed, then exchanged again. Concurrent
//! refreshes may race; each stores a valid token and the last write wins.

use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::http::{body_text, send_error};
use super::secrets::ApiCredential;
use super::ProviderError;

/// Default identity endpoint.
pub const DEFAULT_IDENTITY_URL: &str = "https://iam.cloud.ibm.com/identity/token";

const API_KEY_GRANT: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Time shaved off every token lifetime.
pub const SAFETY_MARGIN: Duration = Duration::from_secs(60);

/// Longest lifetime honoured from an exchange response.
pub const MAX_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// A bearer token. Cheap to clone, redacted in `Debug`.
#[derive(Clone)]
pub struct BearerToken(Arc<SecretString>);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        let token: String = token.into();
        Self(Arc::new(SecretString::from(token)))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

/// A token and the instant after which it must not be used.
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub token: BearerToken,
    pub expires_at: Instant,
}

impl CachedToken {
    /// Build from an exchange response received at `now`.
    ///
    /// Lifetimes of 60 seconds or less produce a token that is already
    /// expired, so the next request exchanges again. Lifetimes are capped
    /// at [`MAX_LIFETIME`].
    pub fn from_lifetime(token: BearerToken, expires_in: Duration, now: Instant) -> Self {
        let lifetime = expires_in.saturating_sub(SAFETY_MARGIN).min(MAX_LIFETIME);
        Self {
            token,
            expires_at: now.checked_add(lifetime).unwrap_or(now),
        }
    }

    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Shared token cache used by every adapter that calls IBM Cloud.
pub struct TokenCache {
    client: reqwest::Client,
    identity_url: String,
    credential: Option<ApiCredential>,
    slot: RwLock<Option<CachedToken>>,
    exchanges: AtomicU64,
}

impl TokenCache {
    pub fn new(
        client: reqwest::Client,
        identity_url: impl Into<String>,
        credential: Option<ApiCredential>,
    ) -> Self {
        Self {
            client,
            identity_url: identity_url.into(),
            credential,
            slot: RwLock::new(None),
            exchanges: AtomicU64::new(0),
        }
    }

    /// Whether an API key is available.
    pub fn is_configured(&self) -> bool {
        self.credential.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Return a valid bearer token, exchanging the API key if needed.
    pub async fn get_token(&self) -> Result<BearerToken, ProviderError> {
        let credential = self
            .credential
            .as_ref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                ProviderError::NotConfigured("IBM Cloud API key is not set".to_string())
            })?;

        if let Some(token) = self.cached_at(Instant::now()) {
            return Ok(token);
        }

        let cached = self.exchange(credential).await?;
        let token = cached.token.clone();
        *self.slot.write() = Some(cached);
        Ok(token)
    }

    /// Drop the cached token so the next call exchanges again.
    pub fn reset(&self) {
        *self.slot.write() = None;
    }

    /// Number of identity exchanges performed so far.
    pub fn exchange_count(&self) -> u64 {
        self.exchanges.load(Ordering::Relaxed)
    }

    fn cached_at(&self, now: Instant) -> Option<BearerToken> {
        self.slot
            .read()
            .as_ref()
            .filter(|cached| cached.is_valid_at(now))
            .map(|cached| cached.token.clone())
    }

    async fn exchange(&self, credential: &ApiCredential) -> Result<CachedToken, ProviderError> {
        self.exchanges.fetch_add(1, Ordering::Relaxed);

        let response = self
            .client
            .post(&self.identity_url)
            .header("Accept", "application/json")
            .form(&[("grant_type", API_KEY_GRANT), ("apikey", credential.expose())])
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::AuthError {
                status: status.as_u16(),
                message: body_text(response).await,
            });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("token response: {}", e)))?;

        tracing::debug!(expires_in = body.expires_in, "Bearer token refreshed");

        Ok(CachedToken::from_lifetime(
            BearerToken::new(body.access_token),
            Duration::from_secs(body.expires_in),
            Instant::now(),
        ))
    }
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache")
            .field("identity_url", &self.identity_url)
            .field("credential", &self.credential)
            .field("cached", &self.slot.read().is_some())
            .finish()
    }
}
