//! Invite code generation with collision probing.
//!
//! Codes are six characters drawn from an alphabet without visually
//! confusable glyphs (no `I`, `O`, `0`, `1`). Each candidate is checked
//! against the invite index before it is accepted; randomness comes from an
//! [`RngSource`] so tests can pin the candidate sequence with a seed.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::GatewayError;

/// Characters used in invite codes.
pub const INVITE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of generated invite codes.
pub const INVITE_CODE_LEN: usize = 6;

/// Candidates drawn before the collision policy applies.
pub const MAX_INVITE_ATTEMPTS: usize = 5;

/// What to do when every candidate collided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Fail with a retryable conflict.
    #[default]
    Reject,
    /// Use the last candidate anyway.
    Proceed,
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "proceed" => Ok(Self::Proceed),
            other => Err(format!("unknown invite collision policy: {other}")),
        }
    }
}

/// Supplies a fresh random generator per operation.
pub trait RngSource: Send + Sync + fmt::Debug {
    /// Returns a generator for one code allocation.
    fn rng(&self) -> StdRng;
}

/// OS-entropy seeded generators.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntropyRng;

impl RngSource for EntropyRng {
    fn rng(&self) -> StdRng {
        StdRng::from_entropy()
    }
}

/// Generators that always start from the same seed.
#[derive(Debug, Clone, Copy)]
pub struct SeededRng(pub u64);

impl RngSource for SeededRng {
    fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.0)
    }
}

/// Allocates invite codes that do not collide with existing ones.
#[derive(Debug, Clone)]
pub struct InviteCodeGenerator {
    source: Arc<dyn RngSource>,
    policy: CollisionPolicy,
    max_attempts: usize,
}

impl InviteCodeGenerator {
    /// Creates a generator with the default attempt bound.
    #[must_use]
    pub fn new(source: Arc<dyn RngSource>, policy: CollisionPolicy) -> Self {
        Self {
            source,
            policy,
            max_attempts: MAX_INVITE_ATTEMPTS,
        }
    }

    /// Draws one candidate code.
    pub fn candidate<R: rand::Rng + ?Sized>(rng: &mut R) -> String {
        (0..INVITE_CODE_LEN)
            .filter_map(|_| INVITE_ALPHABET.choose(&mut *rng))
            .map(|&b| char::from(b))
            .collect()
    }

    /// Draws candidates until `in_use` reports a free one.
    ///
    /// # Errors
    ///
    /// Propagates probe failures. Returns [`GatewayError::Conflict`] when
    /// every attempt collided and the policy is [`CollisionPolicy::Reject`].
    pub async fn generate<F, Fut>(&self, mut in_use: F) -> Result<String, GatewayError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<bool, GatewayError>>,
    {
        let mut rng = self.source.rng();
        let mut last = None;
        for attempt in 1..=self.max_attempts {
            let code = Self::candidate(&mut rng);
            if !in_use(code.clone()).await? {
                return Ok(code);
            }
            tracing::debug!(attempt, "invite code collision");
            last = Some(code);
        }

        match (self.policy, last) {
            (CollisionPolicy::Proceed, Some(code)) => {
                tracing::warn!(
                    attempts = self.max_attempts,
                    "invite code attempts exhausted, using colliding candidate"
                );
                Ok(code)
            }
            _ => Err(GatewayError::Conflict(
                "could not allocate a unique invite code, retry".to_string(),
            )),
        }
    }
}

/// Canonical form of a user-supplied invite code.
#[must_use]
pub fn normalize_invite_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn seeded(seed: u64, policy: CollisionPolicy) -> InviteCodeGenerator {
        InviteCodeGenerator::new(Arc::new(SeededRng(seed)), policy)
    }

    fn first_candidates(seed: u64, n: usize) -> Vec<String> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| InviteCodeGenerator::candidate(&mut rng)).collect()
    }

    #[test]
    fn candidates_use_unambiguous_alphabet() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let code = InviteCodeGenerator::candidate(&mut rng);
            assert_eq!(code.len(), INVITE_CODE_LEN);
            assert!(code.bytes().all(|b| INVITE_ALPHABET.contains(&b)), "{code}");
            assert!(!code.contains(['I', 'O', '0', '1']));
        }
    }

    #[tokio::test]
    async fn free_first_candidate_is_accepted() {
        let expected = first_candidates(7, 1);
        let generator = seeded(7, CollisionPolicy::Reject);
        let code = generator.generate(|_| async { Ok(false) }).await;
        let Ok(code) = code else {
            panic!("generation failed");
        };
        assert_eq!(Some(&code), expected.first());
    }

    #[tokio::test]
    async fn collisions_are_retried_deterministically() {
        let expected = first_candidates(7, 3);
        let taken: HashSet<String> = expected.iter().take(2).cloned().collect();
        let generator = seeded(7, CollisionPolicy::Reject);

        let mut probes = 0;
        let result = generator
            .generate(|code| {
                probes += 1;
                let hit = taken.contains(&code);
                async move { Ok(hit) }
            })
            .await;
        let Ok(code) = result else {
            panic!("generation failed");
        };
        assert_eq!(Some(&code), expected.get(2));
        assert_eq!(probes, 3);
    }

    #[tokio::test]
    async fn exhaustion_rejects_by_default() {
        let generator = seeded(3, CollisionPolicy::Reject);
        let mut probes = 0;
        let result = generator
            .generate(|_| {
                probes += 1;
                async { Ok(true) }
            })
            .await;
        assert!(matches!(result, Err(GatewayError::Conflict(_))));
        assert_eq!(probes, MAX_INVITE_ATTEMPTS);
    }

    #[tokio::test]
    async fn exhaustion_can_proceed_with_last_candidate() {
        let expected = first_candidates(3, MAX_INVITE_ATTEMPTS);
        let generator = seeded(3, CollisionPolicy::Proceed);
        let result = generator.generate(|_| async { Ok(true) }).await;
        let Ok(code) = result else {
            panic!("proceed policy failed");
        };
        assert_eq!(Some(&code), expected.last());
    }

    #[test]
    fn policy_parses_from_config() {
        assert_eq!("reject".parse::<CollisionPolicy>(), Ok(CollisionPolicy::Reject));
        assert_eq!(
            " Proceed ".parse::<CollisionPolicy>(),
            Ok(CollisionPolicy::Proceed)
        );
        assert!("maybe".parse::<CollisionPolicy>().is_err());
    }

    #[test]
    fn user_codes_are_normalized() {
        assert_eq!(normalize_invite_code("  abc234 "), "ABC234");
    }
}
