use super::error::DatabaseError;
use super::IndexCatalog;
use crate::schema::IndexSpec;
use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection, Database};
use std::time::Instant;
use tracing::debug;

/// MongoDB client implementation
///
/// Holds the driver client (which pools connections internally) and the database the
/// MedAuth collections live in.
pub struct MongoDbClient {
    client: Client,
    database: Database,
}

impl MongoDbClient {
    /// Create a client for `connection_uri` and select `database_name`.
    ///
    /// The driver connects lazily; with `verify_connection` set a `ping` is issued so
    /// that an unreachable server fails here rather than during index reconciliation.
    pub async fn connect(
        connection_uri: &str,
        database_name: &str,
        verify_connection: bool,
    ) -> Result<Self, DatabaseError> {
        let start = Instant::now();
        let client = Client::with_uri_str(connection_uri).await?;
        let database = client.database(database_name);

        if verify_connection {
            database.run_command(doc! { "ping": 1 }, None).await?;
        }

        debug!(database = %database_name, duration_ms = %start.elapsed().as_millis(), "Connected to MongoDB");
        Ok(Self { client, database })
    }

    /// The database holding the MedAuth collections.
    pub fn database(&self) -> &Database {
        &self.database
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }

    /// Close the pooled connections and wait for in-flight operations to finish.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
    }
}

#[async_trait]
impl IndexCatalog for MongoDbClient {
    async fn list_index_names(&self, collection: &str) -> Result<Vec<String>, DatabaseError> {
        Ok(self.collection(collection).list_index_names().await?)
    }

    async fn create_index(&self, collection: &str, spec: &IndexSpec) -> Result<(), DatabaseError> {
        let result = self.collection(collection).create_index(spec.to_index_model(), None).await?;
        debug!(index = %result.index_name, "Index created");
        Ok(())
    }

    async fn drop_index(&self, collection: &str, index_name: &str) -> Result<(), DatabaseError> {
        self.collection(collection).drop_index(index_name, None).await?;
        Ok(())
    }
}
