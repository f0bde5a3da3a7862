use clap::{Parser, Subcommand};

pub mod database;
pub mod encoder;

use database::MongoDBCliArgs;

use crate::schema::ReconcileReport;

pub const EXIT_SUCCESS: i32 = 0;
/// Configuration or connection error.
pub const EXIT_FAILURE: i32 = 1;
/// Reconciliation finished but recorded unexpected failures.
pub const EXIT_RECONCILE_FAILURES: i32 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "medauth-db",
    about = "MedAuth database bootstrap - MongoDB index reconciliation",
    long_about = "Connects to the MedAuth MongoDB database and converges the secondary indexes of the \
    patients, doctors, otp_codes, user_sessions and pending_users collections.\n\n\
    Legacy driver-default indexes (email_1, username_1, ...) are dropped from the patients and doctors \
    collections before the canonical, explicitly named indexes are created.",
    after_help = "Examples:\n  \
    medauth-db plan --mongodb-uri 'mongodb://localhost:27017'\n  \
    medauth-db reconcile --database-name medauth --json"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drop legacy indexes and create the missing canonical ones
    Reconcile {
        #[command(flatten)]
        database: MongoDBCliArgs,

        /// Print the reconciliation report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show what `reconcile` would change, without changing anything
    Plan {
        #[command(flatten)]
        database: MongoDBCliArgs,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Exit code of a finished command: `Ok(Some(report))` for `reconcile`, `Ok(None)` for `plan`.
/// Conflicts do not affect the exit code.
pub fn exit_code<E>(result: &Result<Option<ReconcileReport>, E>) -> i32 {
    match result {
        Ok(Some(report)) if !report.is_clean() => EXIT_RECONCILE_FAILURES,
        Ok(_) => EXIT_SUCCESS,
        Err(_) => EXIT_FAILURE,
    }
}
