use bcrypt::{hash, verify};

use crate::error::AppError;

/// bcrypt hashing. Both operations are CPU-bound and run on the blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub const MIN_COST: u32 = 10;
    const MAX_COST: u32 = 31;

    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(Self::MIN_COST, Self::MAX_COST),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub async fn hash(&self, plaintext: String) -> Result<String, AppError> {
        let cost = self.cost;
        match tokio::task::spawn_blocking(move || hash(plaintext, cost)).await {
            Ok(Ok(hashed)) => Ok(hashed),
            Ok(Err(e)) => Err(AppError::internal(format!("failed to hash password: {e}"))),
            Err(e) => Err(AppError::internal(format!(
                "spawn_blocking panic during hash: {e}"
            ))),
        }
    }

    /// Any failure to verify counts as a mismatch.
    pub async fn verify(&self, plaintext: String, hashed: String) -> bool {
        tokio::task::spawn_blocking(move || verify(plaintext, &hashed))
            .await
            .map_err(|e| tracing::error!("spawn_blocking panic during verify: {}", e))
            .ok()
            .and_then(|result| {
                result
                    .map_err(|e| tracing::debug!("password verification error: {}", e))
                    .ok()
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_is_clamped_to_minimum() {
        assert_eq!(PasswordHasher::new(4).cost(), PasswordHasher::MIN_COST);
        assert_eq!(PasswordHasher::new(12).cost(), 12);
    }

    #[tokio::test]
    async fn test_hash_then_verify() {
        let hasher = PasswordHasher::new(PasswordHasher::MIN_COST);
        let hashed = hasher.hash("correct horse".to_string()).await.unwrap();
        assert_ne!(hashed, "correct horse");
        assert!(hasher.verify("correct horse".to_string(), hashed.clone()).await);
        assert!(!hasher.verify("wrong horse".to_string(), hashed).await);
    }

    #[tokio::test]
    async fn test_verify_against_garbage_hash_is_false() {
        let hasher = PasswordHasher::new(PasswordHasher::MIN_COST);
        assert!(!hasher.verify("anything".to_string(), "not-a-hash".to_string()).await);
    }
}
