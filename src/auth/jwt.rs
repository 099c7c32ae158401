//! HS256 bearer-token verification.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Validation};
use serde::Deserialize;

use super::key_cache::{SigningKey, SigningKeyCache, StaticSecret};
use super::{AuthError, TokenVerifier};
use crate::domain::UserId;

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Minimum age of the cached key before a signature mismatch may reload it.
pub const DEFAULT_RELOAD_INTERVAL: Duration = Duration::from_secs(30);

/// Verifies HS256 JWTs and yields their `sub` claim.
///
/// On a signature mismatch the signing key is reloaded, at most once per
/// reload interval, and the token is checked once more against it.
#[derive(Debug)]
pub struct JwtVerifier {
    keys: SigningKeyCache,
    validation: Validation,
    reload_interval: Duration,
}

impl JwtVerifier {
    /// Creates a verifier over a key cache.
    #[must_use]
    pub fn new(keys: SigningKeyCache) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 30;
        Self {
            keys,
            validation,
            reload_interval: DEFAULT_RELOAD_INTERVAL,
        }
    }

    /// Overrides the minimum key age for mismatch-driven reloads.
    #[must_use]
    pub const fn with_reload_interval(mut self, interval: Duration) -> Self {
        self.reload_interval = interval;
        self
    }

    /// Verifier for a static shared secret.
    #[must_use]
    pub fn hs256(secret: &str, key_ttl: Duration) -> Self {
        Self::new(SigningKeyCache::new(
            Arc::new(StaticSecret::new(secret)),
            key_ttl,
        ))
    }

    fn decode(&self, token: &str, key: &SigningKey) -> Result<Claims, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<Claims>(token, key.decoding_key(), &self.validation)
            .map(|data| data.claims)
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let key = self.keys.get().await?;
        let claims = match self.decode(token, &key) {
            Ok(claims) => claims,
            Err(e) if matches!(e.kind(), ErrorKind::InvalidSignature) => {
                if !self.keys.invalidate_older_than(self.reload_interval).await {
                    return Err(AuthError::InvalidToken(e.to_string()));
                }
                tracing::debug!("token signature mismatch, reloading signing key");
                let key = self.keys.get().await?;
                self.decode(token, &key)
                    .map_err(|e| AuthError::InvalidToken(e.to_string()))?
            }
            Err(e) => return Err(AuthError::InvalidToken(e.to_string())),
        };

        let subject = claims.sub.trim();
        if subject.is_empty() {
            return Err(AuthError::InvalidToken("empty subject".to_string()));
        }
        Ok(UserId::new(subject))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use jsonwebtoken::{DecodingKey, EncodingKey, Header};
    use serde::Serialize;

    use crate::auth::KeySource;

    #[derive(Debug, Default)]
    struct CountingSecret {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl KeySource for CountingSecret {
        async fn load(&self) -> Result<DecodingKey, AuthError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(DecodingKey::from_secret(b"league-secret"))
        }
    }

    fn counting_verifier(reload_interval: Duration) -> (Arc<CountingSecret>, JwtVerifier) {
        let source = Arc::new(CountingSecret::default());
        let cache = SigningKeyCache::new(
            Arc::clone(&source) as Arc<dyn KeySource>,
            Duration::from_secs(3600),
        );
        let verifier = JwtVerifier::new(cache).with_reload_interval(reload_interval);
        (source, verifier)
    }

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        exp: i64,
    }

    fn mint(secret: &str, sub: &str, exp_offset: i64) -> String {
        let claims = TestClaims {
            sub,
            exp: chrono::Utc::now().timestamp() + exp_offset,
        };
        let Ok(token) = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        ) else {
            panic!("encoding failed");
        };
        token
    }

    fn verifier() -> JwtVerifier {
        JwtVerifier::hs256("league-secret", Duration::from_secs(60))
    }

    #[tokio::test]
    async fn valid_token_yields_subject() {
        let token = mint("league-secret", "user-42", 600);
        let Ok(user) = verifier().verify(&token).await else {
            panic!("valid token rejected");
        };
        assert_eq!(user.as_str(), "user-42");
    }

    #[tokio::test]
    async fn wrong_secret_is_rejected() {
        let token = mint("other-secret", "user-42", 600);
        let result = verifier().verify(&token).await;
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let token = mint("league-secret", "user-42", -3600);
        let result = verifier().verify(&token).await;
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn blank_subject_is_rejected() {
        let token = mint("league-secret", "  ", 600);
        let result = verifier().verify(&token).await;
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn garbage_is_rejected() {
        let result = verifier().verify("not-a-jwt").await;
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn forged_tokens_do_not_reload_a_young_key() {
        let (source, verifier) = counting_verifier(DEFAULT_RELOAD_INTERVAL);
        let forged = mint("other-secret", "user-42", 600);
        for _ in 0..10 {
            assert!(verifier.verify(&forged).await.is_err());
        }
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);

        let genuine = mint("league-secret", "user-42", 600);
        assert!(verifier.verify(&genuine).await.is_ok());
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mismatch_reloads_a_key_past_the_interval() {
        let (source, verifier) = counting_verifier(Duration::ZERO);
        let forged = mint("other-secret", "user-42", 600);
        assert!(verifier.verify(&forged).await.is_err());
        assert_eq!(source.loads.load(Ordering::SeqCst), 2);
    }
}
