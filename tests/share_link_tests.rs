use async_trait::async_trait;
use axum::http::StatusCode;
use second_brain::{
    InMemoryRepository,
    models::{Content, ContentItem, CreateContentRequest, OwnedContent, ShareLink, User},
    repository::{RepoResult, Repository},
    share::{self, MAX_HASH_ATTEMPTS},
};
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// In-memory store whose first per-user link lookup misses, as if another request
/// for the same user inserted its link right after the lookup.
struct LateWinnerRepository {
    inner: InMemoryRepository,
    lookup_hidden: AtomicBool,
}

impl LateWinnerRepository {
    fn new(inner: InMemoryRepository) -> Self {
        Self {
            inner,
            lookup_hidden: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Repository for LateWinnerRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        self.inner.get_user(id).await
    }
    async fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.inner.find_user_by_username(username).await
    }
    async fn create_user(&self, username: &str, password_hash: &str) -> RepoResult<User> {
        self.inner.create_user(username, password_hash).await
    }
    async fn create_content(&self, user_id: Uuid, req: CreateContentRequest) -> RepoResult<Content> {
        self.inner.create_content(user_id, req).await
    }
    async fn get_content(&self, id: Uuid) -> RepoResult<Option<Content>> {
        self.inner.get_content(id).await
    }
    async fn list_content(&self, user_id: Uuid) -> RepoResult<Vec<ContentItem>> {
        self.inner.list_content(user_id).await
    }
    async fn delete_content(&self, owned: &OwnedContent) -> RepoResult<bool> {
        self.inner.delete_content(owned).await
    }
    async fn get_share_link_for_user(&self, user_id: Uuid) -> RepoResult<Option<ShareLink>> {
        if !self.lookup_hidden.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.get_share_link_for_user(user_id).await
    }
    async fn find_share_link(&self, hash: &str) -> RepoResult<Option<ShareLink>> {
        self.inner.find_share_link(hash).await
    }
    async fn create_share_link(&self, user_id: Uuid, hash: &str) -> RepoResult<ShareLink> {
        self.inner.create_share_link(user_id, hash).await
    }
    async fn delete_share_link(&self, user_id: Uuid) -> RepoResult<bool> {
        self.inner.delete_share_link(user_id).await
    }
}

async fn repo_with_user(username: &str) -> (InMemoryRepository, Uuid) {
    let repo = InMemoryRepository::new();
    let user = repo.create_user(username, "hash").await.unwrap();
    (repo, user.id)
}

/// Generator replaying a fixed list of hashes.
fn scripted(hashes: &[&str]) -> impl FnMut() -> String + Send {
    let mut queue: Vec<String> = hashes.iter().rev().map(|h| h.to_string()).collect();
    move || queue.pop().expect("generator exhausted")
}

#[tokio::test]
async fn test_issue_creates_then_reuses() {
    let (repo, user_id) = repo_with_user("alice123").await;

    let first = share::issue(&repo, user_id).await.unwrap();
    let second = share::issue(&repo, user_id).await.unwrap();

    assert_eq!(first, second);
    let stored = repo.find_share_link(&first).await.unwrap().unwrap();
    assert_eq!(stored.user_id, user_id);
}

#[tokio::test]
async fn test_existing_link_skips_generator() {
    let (repo, user_id) = repo_with_user("alice123").await;
    repo.create_share_link(user_id, "existing00").await.unwrap();

    let hash = share::issue_with(&repo, user_id, || panic!("generator must not run"))
        .await
        .unwrap();

    assert_eq!(hash, "existing00");
}

#[tokio::test]
async fn test_hash_collision_regenerates() {
    let (repo, alice) = repo_with_user("alice123").await;
    let bob = repo.create_user("bob_456", "hash").await.unwrap().id;
    repo.create_share_link(alice, "taken00000").await.unwrap();

    let hash = share::issue_with(&repo, bob, scripted(&["taken00000", "fresh00000"]))
        .await
        .unwrap();

    assert_eq!(hash, "fresh00000");
    // Alice's link still resolves to Alice.
    let alice_link = repo.find_share_link("taken00000").await.unwrap().unwrap();
    assert_eq!(alice_link.user_id, alice);
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let (repo, alice) = repo_with_user("alice123").await;
    let bob = repo.create_user("bob_456", "hash").await.unwrap().id;
    repo.create_share_link(alice, "taken00000").await.unwrap();

    let mut calls = 0;
    let result = share::issue_with(&repo, bob, || {
        calls += 1;
        "taken00000".to_string()
    })
    .await;

    let err = result.unwrap_err();
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(calls, MAX_HASH_ATTEMPTS);
    assert!(repo.get_share_link_for_user(bob).await.unwrap().is_none());
}

#[tokio::test]
async fn test_revoke_reports_removal() {
    let (repo, user_id) = repo_with_user("alice123").await;
    let hash = share::issue(&repo, user_id).await.unwrap();

    assert!(share::revoke(&repo, user_id).await.unwrap());
    assert!(!share::revoke(&repo, user_id).await.unwrap());
    assert!(repo.find_share_link(&hash).await.unwrap().is_none());
}

#[tokio::test]
async fn test_reissue_after_revoke_gets_new_link() {
    let (repo, user_id) = repo_with_user("alice123").await;
    let first = share::issue_with(&repo, user_id, scripted(&["first00000"]))
        .await
        .unwrap();
    share::revoke(&repo, user_id).await.unwrap();

    let second = share::issue_with(&repo, user_id, scripted(&["second0000"]))
        .await
        .unwrap();

    assert_ne!(first, second);
    assert!(repo.find_share_link(&first).await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_insert_for_same_user_returns_winner() {
    let (inner, user_id) = repo_with_user("alice123").await;
    inner.create_share_link(user_id, "winner0000").await.unwrap();
    let repo = LateWinnerRepository::new(inner);

    let hash = share::issue_with(&repo, user_id, || "loser00000".to_string())
        .await
        .unwrap();

    assert_eq!(hash, "winner0000");
    assert!(repo.find_share_link("loser00000").await.unwrap().is_none());
    let stored = repo.inner.get_share_link_for_user(user_id).await.unwrap().unwrap();
    assert_eq!(stored.hash, "winner0000");
}
