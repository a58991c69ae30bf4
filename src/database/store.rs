use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::future::Future;
use std::time::Duration;

use crate::models::{Account, Profile, ProfileUpdate};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique index (email) already holds this value.
    #[error("duplicate value for unique field: {0}")]
    Duplicate(String),
    #[error("storage operation timed out")]
    Timeout,
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for credential-bearing accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    /// Fails with `Duplicate` when the email is taken; storage is left unchanged.
    async fn insert(&self, account: &Account) -> StoreResult<()>;
}

/// Persistence for display profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Profile>>;

    async fn find_by_id(&self, id: &ObjectId) -> StoreResult<Option<Profile>>;

    async fn list(&self) -> StoreResult<Vec<Profile>>;

    async fn insert(&self, profile: &Profile) -> StoreResult<()>;

    /// Returns the updated document, or `None` if nothing has this id.
    async fn update(&self, id: &ObjectId, update: &ProfileUpdate) -> StoreResult<Option<Profile>>;

    /// Returns whether a document was removed.
    async fn delete(&self, id: &ObjectId) -> StoreResult<bool>;
}

/// Bounds a storage call so a stuck backend surfaces as `Timeout`.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| StoreError::Timeout)?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slow_call_becomes_timeout() {
        let result: StoreResult<()> = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(StoreError::Timeout)));
    }

    #[tokio::test]
    async fn fast_call_passes_through() {
        let result = with_timeout(Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
