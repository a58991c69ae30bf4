pub mod memory_store;
pub mod mongo_store;
pub mod store;

pub use memory_store::{MemoryAccountStore, MemoryProfileStore};
pub use mongo_store::{MongoAccountStore, MongoProfileStore};
pub use store::{with_timeout, AccountStore, ProfileStore, StoreError};

use mongodb::{Client, Collection, Database};

pub const ACCOUNTS_COLLECTION: &str = "signupusers";
pub const PROFILES_COLLECTION: &str = "addusers";

const DEFAULT_DATABASE: &str = "accounts";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> mongodb::error::Result<Self> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        // Database name from the URI path, if any
        let db_name = client_options
            .default_database
            .clone()
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let client = Client::with_options(client_options)?;
        let db = client.database(&db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };

        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Unique email indexes back the one-record-per-email rule under concurrent writes.
    async fn ensure_indexes(&self) -> mongodb::error::Result<()> {
        use mongodb::bson::doc;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        for name in [ACCOUNTS_COLLECTION, PROFILES_COLLECTION] {
            let collection = self.collection::<mongodb::bson::Document>(name);

            let email_index = IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();

            collection.create_index(email_index).await?;
            log::info!("   ✅ Index ready: {}(email, unique)", name);
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }
}
