pub mod database;

pub use database::mongodb::MongoDbClient;
pub use database::{DatabaseError, IndexCatalog};
