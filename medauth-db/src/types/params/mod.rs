pub mod database;

pub use database::{CollectionNames, DatabaseArgs};
