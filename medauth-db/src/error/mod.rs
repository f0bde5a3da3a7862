use thiserror::Error;

use crate::core::client::database::DatabaseError;

/// Result type for medauth-db operations
pub type MedauthResult<T> = Result<T, MedauthError>;

/// Number of characters of a connection string kept in diagnostics
pub const URI_DIAGNOSTIC_PREFIX_LEN: usize = 50;

/// Error types for medauth-db
#[derive(Error, Debug)]
pub enum MedauthError {
    /// The initial connection could not be established. This is the only error that
    /// escapes [`crate::core::connection::ConnectionCache::get_database`].
    #[error(
        "Database connection failed: {source} (MongoDB URI, first 50 chars: {uri_prefix}...; encoded URI, first 50 \
         chars: {encoded_uri_prefix}...)"
    )]
    ConnectionFailed { source: DatabaseError, uri_prefix: String, encoded_uri_prefix: String },

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl MedauthError {
    pub fn connection_failed(source: DatabaseError, uri: &str, encoded_uri: &str) -> Self {
        Self::ConnectionFailed {
            source,
            uri_prefix: diagnostic_prefix(uri),
            encoded_uri_prefix: diagnostic_prefix(encoded_uri),
        }
    }
}

/// First [`URI_DIAGNOSTIC_PREFIX_LEN`] characters of `value`, cut on a char boundary.
pub fn diagnostic_prefix(value: &str) -> String {
    value.chars().take(URI_DIAGNOSTIC_PREFIX_LEN).collect()
}
