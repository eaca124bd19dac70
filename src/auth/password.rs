//! bcrypt password hashing, off the async runtime.

use crate::error::Result;

/// Salted bcrypt hash of `password` at `cost`.
pub async fn hash(password: String, cost: u32) -> Result<String> {
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hashed)
}

/// Whether `password` matches the stored `hash`.
pub async fn verify(password: String, hash: String) -> Result<bool> {
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_is_salted_and_verifies() {
        let a = hash("password1".into(), 4).await.unwrap();
        let b = hash("password1".into(), 4).await.unwrap();
        assert_ne!(a, b);
        assert!(verify("password1".into(), a).await.unwrap());
        assert!(!verify("password2".into(), b).await.unwrap());
    }
}
