pub mod constant;
pub mod error;
pub mod mongodb;

use crate::schema::IndexSpec;
use async_trait::async_trait;
pub use error::DatabaseError;

/// Trait defining the index catalog operations the reconciler needs from a database.
///
/// Every method addresses a collection by its configured (physical) name.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IndexCatalog: Send + Sync {
    /// list_index_names - Names of the indexes currently present on a collection
    async fn list_index_names(&self, collection: &str) -> Result<Vec<String>, DatabaseError>;

    /// create_index - Create an index with the name, keys and options of `spec`
    async fn create_index(&self, collection: &str, spec: &IndexSpec) -> Result<(), DatabaseError>;

    /// drop_index - Drop an index by name
    async fn drop_index(&self, collection: &str, index_name: &str) -> Result<(), DatabaseError>;
}
