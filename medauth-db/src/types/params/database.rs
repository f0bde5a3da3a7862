use std::collections::HashSet;

use serde::Serialize;
use strum::IntoEnumIterator;

use crate::cli::database::MongoDBCliArgs;
use crate::schema::LogicalCollection;
use crate::{MedauthError, MedauthResult};

pub const DEFAULT_CONNECTION_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE_NAME: &str = "medauth";

/// Physical collection name of every [`LogicalCollection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionNames {
    pub patients: String,
    pub doctors: String,
    pub otp_codes: String,
    pub user_sessions: String,
    pub pending_users: String,
}

impl CollectionNames {
    pub fn name_of(&self, collection: LogicalCollection) -> &str {
        match collection {
            LogicalCollection::Patients => &self.patients,
            LogicalCollection::Doctors => &self.doctors,
            LogicalCollection::OtpCodes => &self.otp_codes,
            LogicalCollection::UserSessions => &self.user_sessions,
            LogicalCollection::PendingUsers => &self.pending_users,
        }
    }

    /// Names must be non-empty and pairwise distinct; two logical collections sharing a
    /// physical collection would receive each other's indexes.
    pub fn validate(&self) -> MedauthResult<()> {
        let mut seen = HashSet::new();
        for collection in LogicalCollection::iter() {
            let name = self.name_of(collection);
            if name.trim().is_empty() {
                return Err(MedauthError::ConfigError(format!("collection name for {collection} is empty")));
            }
            if !seen.insert(name) {
                return Err(MedauthError::ConfigError(format!(
                    "collection name {name} is used by more than one collection"
                )));
            }
        }
        Ok(())
    }
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            patients: LogicalCollection::Patients.to_string(),
            doctors: LogicalCollection::Doctors.to_string(),
            otp_codes: LogicalCollection::OtpCodes.to_string(),
            user_sessions: LogicalCollection::UserSessions.to_string(),
            pending_users: LogicalCollection::PendingUsers.to_string(),
        }
    }
}

/// Validated MongoDB parameters
#[derive(Debug, Clone)]
pub struct DatabaseArgs {
    /// Raw connection string, as configured. Sanitized at connection time.
    pub connection_uri: String,
    pub database_name: String,
    pub collections: CollectionNames,
    pub verify_connection: bool,
}

impl DatabaseArgs {
    pub fn new(connection_uri: impl Into<String>, database_name: impl Into<String>) -> Self {
        Self {
            connection_uri: connection_uri.into(),
            database_name: database_name.into(),
            collections: CollectionNames::default(),
            verify_connection: true,
        }
    }
}

impl TryFrom<MongoDBCliArgs> for DatabaseArgs {
    type Error = MedauthError;

    fn try_from(args: MongoDBCliArgs) -> Result<Self, Self::Error> {
        if args.mongodb_uri.trim().is_empty() {
            return Err(MedauthError::ConfigError("MongoDB connection URI is empty".to_string()));
        }
        if args.database_name.trim().is_empty() {
            return Err(MedauthError::ConfigError("database name is empty".to_string()));
        }

        let collections = CollectionNames {
            patients: args.patients_collection,
            doctors: args.doctors_collection,
            otp_codes: args.otp_codes_collection,
            user_sessions: args.user_sessions_collection,
            pending_users: args.pending_users_collection,
        };
        collections.validate()?;

        Ok(Self {
            connection_uri: args.mongodb_uri,
            database_name: args.database_name,
            collections,
            verify_connection: args.verify_connection,
        })
    }
}
