use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

use super::constant::{INDEX_CONFLICT_CODES, INDEX_NOT_FOUND, NAMESPACE_NOT_FOUND};

#[derive(Error, Debug)]
pub enum DatabaseError {
    /// An index with the same name or keys already exists with other options, or the
    /// existing documents violate the requested unique constraint.
    #[error("Index conflict: {0}")]
    IndexConflict(String),

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// The collection does not exist (yet).
    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Mongo error: {0}")]
    MongoError(mongodb::error::Error),
}

impl DatabaseError {
    /// Failures that mean "an index serving this purpose is already there".
    pub fn is_index_conflict(&self) -> bool {
        matches!(self, Self::IndexConflict(_))
    }

    /// Failures that mean "there is nothing to drop".
    pub fn is_missing_target(&self) -> bool {
        matches!(self, Self::IndexNotFound(_) | Self::NamespaceNotFound(_))
    }
}

/// Server error code carried by a driver error, if any.
fn server_code(err: &mongodb::error::Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command_error) => Some(command_error.code),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => Some(write_error.code),
        _ => None,
    }
}

impl From<mongodb::error::Error> for DatabaseError {
    fn from(err: mongodb::error::Error) -> Self {
        match server_code(&err) {
            Some(code) if INDEX_CONFLICT_CODES.contains(&code) => return Self::IndexConflict(err.to_string()),
            Some(INDEX_NOT_FOUND) => return Self::IndexNotFound(err.to_string()),
            Some(NAMESPACE_NOT_FOUND) => return Self::NamespaceNotFound(err.to_string()),
            _ => {}
        }

        match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::ConnectionPoolCleared { .. } => Self::Connection(err.to_string()),
            _ => Self::MongoError(err),
        }
    }
}
