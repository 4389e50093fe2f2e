//! Password hashing. bcrypt work runs on the blocking pool so login bursts
//! do not stall the async runtime.

pub use bcrypt::DEFAULT_COST;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("bcrypt failure: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

/// Hash a password with the given bcrypt cost, defaulting to
/// [`DEFAULT_COST`]. Tests pass a low cost to stay fast.
pub async fn hash_password(password: &str, cost: Option<u32>) -> Result<String, PasswordError> {
    let password = password.to_owned();
    let cost = cost.unwrap_or(DEFAULT_COST);
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

/// Check a candidate password against a stored hash. A hash bcrypt cannot
/// parse counts as a mismatch, not an error.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await?;
    Ok(outcome.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn hash_and_verify_round_trip() {
        let hash = hash_password("hunter2!", Some(TEST_COST)).await.unwrap();
        assert_ne!(hash, "hunter2!");
        assert!(verify_password("hunter2!", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let hash = hash_password("hunter2!", Some(TEST_COST)).await.unwrap();
        assert!(!verify_password("hunter3!", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_is_a_mismatch() {
        assert!(!verify_password("hunter2!", "not-a-bcrypt-hash").await.unwrap());
    }
}
