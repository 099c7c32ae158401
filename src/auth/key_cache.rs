//! Process-lifetime cache for the token signing key.
//!
//! The key is loaded from a [`KeySource`] on first use and reused until it
//! expires or is explicitly invalidated. Signature mismatches invalidate it
//! only once it has reached a minimum age, so forged tokens cannot drive
//! the source.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use tokio::sync::RwLock;

use super::AuthError;

/// Where verification keys come from.
#[async_trait]
pub trait KeySource: Send + Sync + fmt::Debug {
    /// Loads the current verification key.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::KeyUnavailable`] if the key cannot be obtained.
    async fn load(&self) -> Result<DecodingKey, AuthError>;
}

/// HMAC secret held in memory.
#[derive(Clone)]
pub struct StaticSecret(Arc<[u8]>);

impl StaticSecret {
    /// Wraps a shared secret.
    #[must_use]
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self(Arc::from(secret.as_ref()))
    }
}

impl fmt::Debug for StaticSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticSecret(..)")
    }
}

#[async_trait]
impl KeySource for StaticSecret {
    async fn load(&self) -> Result<DecodingKey, AuthError> {
        if self.0.is_empty() {
            return Err(AuthError::KeyUnavailable("empty secret".to_string()));
        }
        Ok(DecodingKey::from_secret(&self.0))
    }
}

/// A loaded verification key and when it was loaded.
pub struct SigningKey {
    key: DecodingKey,
    loaded_at: Instant,
}

impl SigningKey {
    /// The decoding key.
    #[must_use]
    pub const fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.loaded_at.elapsed() < ttl
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("loaded_at", &self.loaded_at)
            .finish_non_exhaustive()
    }
}

/// Caches one [`SigningKey`] with a time-to-live.
#[derive(Debug)]
pub struct SigningKeyCache {
    source: Arc<dyn KeySource>,
    ttl: Duration,
    slot: RwLock<Option<Arc<SigningKey>>>,
}

impl SigningKeyCache {
    /// Creates an empty cache; the first [`get`](Self::get) loads the key.
    #[must_use]
    pub fn new(source: Arc<dyn KeySource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// Returns the cached key, loading it if absent or expired.
    ///
    /// # Errors
    ///
    /// Propagates [`KeySource::load`] failures.
    pub async fn get(&self) -> Result<Arc<SigningKey>, AuthError> {
        {
            let slot = self.slot.read().await;
            if let Some(key) = slot.as_ref().filter(|k| k.is_fresh(self.ttl)) {
                return Ok(Arc::clone(key));
            }
        }

        let mut slot = self.slot.write().await;
        if let Some(key) = slot.as_ref().filter(|k| k.is_fresh(self.ttl)) {
            return Ok(Arc::clone(key));
        }
        let key = Arc::new(SigningKey {
            key: self.source.load().await?,
            loaded_at: Instant::now(),
        });
        *slot = Some(Arc::clone(&key));
        tracing::debug!("signing key loaded");
        Ok(key)
    }

    /// Drops the cached key so the next [`get`](Self::get) reloads it.
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }

    /// Drops the cached key only if it was loaded at least `min_age` ago.
    /// Returns `true` when the next [`get`](Self::get) will reload.
    pub async fn invalidate_older_than(&self, min_age: Duration) -> bool {
        let mut slot = self.slot.write().await;
        match slot.as_ref() {
            Some(key) if key.loaded_at.elapsed() < min_age => false,
            _ => {
                *slot = None;
                true
            }
        }
    }
}
