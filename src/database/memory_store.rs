// In-process backend, used when no DATABASE_URL is configured and by the tests.
// Uniqueness is checked and the insert happens under the same write lock, so
// two racing creates for one email can't both succeed.

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;
use std::sync::RwLock;

use super::store::{AccountStore, ProfileStore, StoreError, StoreResult};
use crate::models::{Account, Profile, ProfileUpdate};

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<ObjectId, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let accounts = self.accounts.read().map_err(poisoned)?;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn insert(&self, account: &Account) -> StoreResult<()> {
        let mut accounts = self.accounts.write().map_err(poisoned)?;
        if accounts.values().any(|a| a.email == account.email) {
            return Err(StoreError::Duplicate("email".to_string()));
        }
        accounts.insert(account.id, account.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<ObjectId, Profile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Profile>> {
        let profiles = self.profiles.read().map_err(poisoned)?;
        Ok(profiles.values().find(|p| p.email == email).cloned())
    }

    async fn find_by_id(&self, id: &ObjectId) -> StoreResult<Option<Profile>> {
        let profiles = self.profiles.read().map_err(poisoned)?;
        Ok(profiles.get(id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Profile>> {
        let profiles = self.profiles.read().map_err(poisoned)?;
        let mut all: Vec<Profile> = profiles.values().cloned().collect();
        all.sort_by_key(|p| p.created_at);
        Ok(all)
    }

    async fn insert(&self, profile: &Profile) -> StoreResult<()> {
        let mut profiles = self.profiles.write().map_err(poisoned)?;
        if profiles.values().any(|p| p.email == profile.email) {
            return Err(StoreError::Duplicate("email".to_string()));
        }
        profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn update(&self, id: &ObjectId, update: &ProfileUpdate) -> StoreResult<Option<Profile>> {
        let mut profiles = self.profiles.write().map_err(poisoned)?;

        if let Some(email) = &update.email {
            if profiles.values().any(|p| &p.email == email && &p.id != id) {
                return Err(StoreError::Duplicate("email".to_string()));
            }
        }

        Ok(profiles.get_mut(id).map(|profile| {
            profile.apply(update);
            profile.clone()
        }))
    }

    async fn delete(&self, id: &ObjectId) -> StoreResult<bool> {
        let mut profiles = self.profiles.write().map_err(poisoned)?;
        Ok(profiles.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::sample_signup;
    use std::sync::Arc;

    #[tokio::test]
    async fn second_account_with_same_email_is_refused() {
        let store = MemoryAccountStore::new();
        let first = Account::new(sample_signup("a@x.com", "one"));
        store.insert(&first).await.unwrap();

        let second = Account::new(sample_signup("a@x.com", "two"));
        let err = store.insert(&second).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));

        let stored = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(stored.id, first.id);
    }

    #[tokio::test]
    async fn racing_inserts_yield_exactly_one_winner() {
        let store = Arc::new(MemoryProfileStore::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let profile = Profile::new(format!("u{}", i), "same@x.com".into(), "1".into(), None);
                store.insert(&profile).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_of_missing_id_creates_nothing() {
        let store = MemoryProfileStore::new();
        let update = ProfileUpdate {
            mobile: Some("2".into()),
            ..Default::default()
        };
        let result = store.update(&ObjectId::new(), &update).await.unwrap();
        assert!(result.is_none());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_cannot_steal_another_email() {
        let store = MemoryProfileStore::new();
        let a = Profile::new("a".into(), "a@x.com".into(), "1".into(), None);
        let b = Profile::new("b".into(), "b@x.com".into(), "2".into(), None);
        store.insert(&a).await.unwrap();
        store.insert(&b).await.unwrap();

        let update = ProfileUpdate {
            email: Some("a@x.com".into()),
            ..Default::default()
        };
        let err = store.update(&b.id, &update).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert_eq!(store.find_by_id(&b.id).await.unwrap().unwrap().email, "b@x.com");
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let store = MemoryProfileStore::new();
        let profile = Profile::new("a".into(), "a@x.com".into(), "1".into(), None);
        store.insert(&profile).await.unwrap();

        assert!(store.delete(&profile.id).await.unwrap());
        assert!(!store.delete(&profile.id).await.unwrap());
    }
}
