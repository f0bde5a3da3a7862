use clap::Args;

use crate::types::params::database::{DEFAULT_CONNECTION_URI, DEFAULT_DATABASE_NAME};

/// Parameters used to config MongoDB.
#[derive(Debug, Clone, Args)]
pub struct MongoDBCliArgs {
    /// The connection string to the MongoDB server. Credentials may be given unencoded.
    #[arg(env = "MEDAUTH_MONGODB_URI", long, default_value = DEFAULT_CONNECTION_URI, hide_env_values = true)]
    pub mongodb_uri: String,

    /// The name of the database.
    #[arg(env = "MEDAUTH_DATABASE_NAME", long, default_value = DEFAULT_DATABASE_NAME)]
    pub database_name: String,

    /// Name of the patients collection.
    #[arg(env = "MEDAUTH_PATIENTS_COLLECTION", long, default_value = "patients")]
    pub patients_collection: String,

    /// Name of the doctors collection.
    #[arg(env = "MEDAUTH_DOCTORS_COLLECTION", long, default_value = "doctors")]
    pub doctors_collection: String,

    /// Name of the OTP codes collection.
    #[arg(env = "MEDAUTH_OTP_CODES_COLLECTION", long, default_value = "otp_codes")]
    pub otp_codes_collection: String,

    /// Name of the user sessions collection.
    #[arg(env = "MEDAUTH_USER_SESSIONS_COLLECTION", long, default_value = "user_sessions")]
    pub user_sessions_collection: String,

    /// Name of the pending sign-ups collection.
    #[arg(env = "MEDAUTH_PENDING_USERS_COLLECTION", long, default_value = "pending_users")]
    pub pending_users_collection: String,

    /// Ping the server when connecting so an unreachable server fails fast.
    #[arg(env = "MEDAUTH_VERIFY_CONNECTION", long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verify_connection: bool,
}
