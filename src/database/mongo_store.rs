use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::ReturnDocument;
use mongodb::Collection;

use super::store::{AccountStore, ProfileStore, StoreError, StoreResult};
use super::{MongoDB, ACCOUNTS_COLLECTION, PROFILES_COLLECTION};
use crate::models::{Account, Profile, ProfileUpdate};

const DUPLICATE_KEY_CODE: i32 = 11000;

fn map_mongo_error(err: MongoError) -> StoreError {
    if let ErrorKind::Write(WriteFailure::WriteError(write_error)) = err.kind.as_ref() {
        if write_error.code == DUPLICATE_KEY_CODE {
            return StoreError::Duplicate("email".to_string());
        }
    }
    if let ErrorKind::Command(command_error) = err.kind.as_ref() {
        if command_error.code == DUPLICATE_KEY_CODE {
            return StoreError::Duplicate("email".to_string());
        }
    }
    StoreError::Backend(err.to_string())
}

#[derive(Clone)]
pub struct MongoAccountStore {
    collection: Collection<Account>,
}

impl MongoAccountStore {
    pub fn new(db: &MongoDB) -> Self {
        Self {
            collection: db.collection::<Account>(ACCOUNTS_COLLECTION),
        }
    }
}

#[async_trait]
impl AccountStore for MongoAccountStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        self.collection
            .find_one(doc! { "email": email })
            .await
            .map_err(map_mongo_error)
    }

    async fn insert(&self, account: &Account) -> StoreResult<()> {
        self.collection
            .insert_one(account)
            .await
            .map(|_| ())
            .map_err(map_mongo_error)
    }
}

#[derive(Clone)]
pub struct MongoProfileStore {
    collection: Collection<Profile>,
}

impl MongoProfileStore {
    pub fn new(db: &MongoDB) -> Self {
        Self {
            collection: db.collection::<Profile>(PROFILES_COLLECTION),
        }
    }
}

/// Builds the `$set` document from the allow-listed fields only.
fn update_document(update: &ProfileUpdate) -> Document {
    let mut set = doc! { "updatedAt": DateTime::now() };
    if let Some(user_name) = &update.user_name {
        set.insert("userName", user_name.as_str());
    }
    if let Some(email) = &update.email {
        set.insert("email", email.as_str());
    }
    if let Some(mobile) = &update.mobile {
        set.insert("mobile", mobile.as_str());
    }
    doc! { "$set": set }
}

#[async_trait]
impl ProfileStore for MongoProfileStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Profile>> {
        self.collection
            .find_one(doc! { "email": email })
            .await
            .map_err(map_mongo_error)
    }

    async fn find_by_id(&self, id: &ObjectId) -> StoreResult<Option<Profile>> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(map_mongo_error)
    }

    async fn list(&self) -> StoreResult<Vec<Profile>> {
        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "createdAt": 1 })
            .await
            .map_err(map_mongo_error)?;

        cursor.try_collect::<Vec<Profile>>().await.map_err(map_mongo_error)
    }

    async fn insert(&self, profile: &Profile) -> StoreResult<()> {
        self.collection
            .insert_one(profile)
            .await
            .map(|_| ())
            .map_err(map_mongo_error)
    }

    async fn update(&self, id: &ObjectId, update: &ProfileUpdate) -> StoreResult<Option<Profile>> {
        self.collection
            .find_one_and_update(doc! { "_id": id }, update_document(update))
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_mongo_error)
    }

    async fn delete(&self, id: &ObjectId) -> StoreResult<bool> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id })
            .await
            .map_err(map_mongo_error)?;

        Ok(result.deleted_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_document_sets_only_allowed_fields() {
        let update = ProfileUpdate {
            mobile: Some("999".into()),
            ..Default::default()
        };
        let document = update_document(&update);
        let set = document.get_document("$set").unwrap();
        assert_eq!(set.get_str("mobile").unwrap(), "999");
        assert!(set.contains_key("updatedAt"));
        assert!(!set.contains_key("userName"));
        assert!(!set.contains_key("createdAt"));
        assert!(!set.contains_key("_id"));
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_duplicate_email_against_mongodb() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL").unwrap();
        let db = MongoDB::new(&uri).await.unwrap();
        let store = MongoProfileStore::new(&db);

        let email = format!("{}@example.test", ObjectId::new().to_hex());
        let first = Profile::new("a".into(), email.clone(), "1".into(), None);
        store.insert(&first).await.unwrap();

        let second = Profile::new("b".into(), email, "2".into(), None);
        assert!(matches!(store.insert(&second).await, Err(StoreError::Duplicate(_))));

        assert!(store.delete(&first.id).await.unwrap());
    }
}
