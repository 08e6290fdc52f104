//! One-way salted password hashing (bcrypt), run off the async reactor.

use tokio::task::spawn_blocking;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub async fn hash_password(password: String, cost: u32) -> Result<String, PasswordError> {
    Ok(spawn_blocking(move || bcrypt::hash(password, cost)).await??)
}

/// Returns `false` for a mismatch; errors only when the stored hash is unreadable.
pub async fn verify_password(password: String, hash: String) -> Result<bool, PasswordError> {
    Ok(spawn_blocking(move || bcrypt::verify(password, &hash)).await??)
}
