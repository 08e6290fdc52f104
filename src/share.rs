//! Share-link issuance.
//!
//! A user has at most one live link. Issuing is idempotent: an existing link is
//! returned as is. New hashes are random and guarded by the store's uniqueness
//! constraints, so a collision regenerates instead of silently aliasing two users.

use uuid::Uuid;

use crate::{
    error::ApiError,
    random::{SHARE_HASH_LEN, random_string},
    repository::{Repository, SHARE_LINKS_HASH_KEY, SHARE_LINKS_USER_ID_KEY},
};

pub const MAX_HASH_ATTEMPTS: usize = 5;

/// Returns the caller's share hash, creating one if needed.
pub async fn issue(repo: &dyn Repository, user_id: Uuid) -> Result<String, ApiError> {
    issue_with(repo, user_id, || random_string(SHARE_HASH_LEN)).await
}

/// `issue` with a caller-supplied hash generator.
pub async fn issue_with<F>(
    repo: &dyn Repository,
    user_id: Uuid,
    mut next_hash: F,
) -> Result<String, ApiError>
where
    F: FnMut() -> String + Send,
{
    if let Some(existing) = repo.get_share_link_for_user(user_id).await? {
        return Ok(existing.hash);
    }

    for attempt in 1..=MAX_HASH_ATTEMPTS {
        let hash = next_hash();
        match repo.create_share_link(user_id, &hash).await {
            Ok(link) => {
                tracing::info!(%user_id, "share link created");
                return Ok(link.hash);
            }
            Err(e) if e.violates(SHARE_LINKS_HASH_KEY) => {
                tracing::warn!(attempt, "share hash collision, regenerating");
            }
            Err(e) if e.violates(SHARE_LINKS_USER_ID_KEY) => {
                // A concurrent request for the same user inserted first.
                return repo
                    .get_share_link_for_user(user_id)
                    .await?
                    .map(|link| link.hash)
                    .ok_or_else(|| {
                        ApiError::Internal("share link missing after user conflict".to_string())
                    });
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(ApiError::Internal(format!(
        "no unique share hash after {MAX_HASH_ATTEMPTS} attempts"
    )))
}

/// Removes the caller's link. Returns whether one existed.
pub async fn revoke(repo: &dyn Repository, user_id: Uuid) -> Result<bool, ApiError> {
    let removed = repo.delete_share_link(user_id).await?;
    if removed {
        tracing::info!(%user_id, "share link removed");
    }
    Ok(removed)
}
