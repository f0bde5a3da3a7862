use clap::Parser as _;
use color_eyre::eyre::Context as _;
use dotenvy::dotenv;
use medauth_db::cli::{exit_code, Cli, Commands, EXIT_RECONCILE_FAILURES};
use medauth_db::core::client::MongoDbClient;
use medauth_db::core::connection::ConnectionCache;
use medauth_db::schema::{plan, PlannedChange, ReconcileReport, Transition};
use medauth_db::types::params::database::DatabaseArgs;
use medauth_db::utils::logging::init_logging;
use medauth_db::utils::mongo_uri::sanitize_uri;
use medauth_db::MedauthError;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    dotenv().ok();
    init_logging()?;
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Reconcile { database, json } => run_reconcile(DatabaseArgs::try_from(database)?, json).await,
        Commands::Plan { database, json } => run_plan(DatabaseArgs::try_from(database)?, json).await.map(|()| None),
    };

    let code = exit_code(&result);
    match result {
        // Returning the error from `main` exits with EXIT_FAILURE
        Err(e) => {
            error!(error = %e, error_chain = ?e, "medauth-db failed");
            Err(e)
        }
        Ok(_) if code == EXIT_RECONCILE_FAILURES => {
            warn!("Index reconciliation finished with failures");
            std::process::exit(code);
        }
        Ok(_) => Ok(()),
    }
}

/// Reconcile through the connection cache and return the report of the run.
async fn run_reconcile(args: DatabaseArgs, json: bool) -> color_eyre::Result<Option<ReconcileReport>> {
    info!(database = %args.database_name, "Reconciling MongoDB indexes");
    let mut cache = ConnectionCache::mongo(args);
    cache.get_database().await?;

    let report = cache.reconcile_report().cloned();
    if let Some(report) = &report {
        print_report(report, json)?;
    }

    cache.close().await;
    Ok(report)
}

async fn run_plan(args: DatabaseArgs, json: bool) -> color_eyre::Result<()> {
    let encoded_uri = sanitize_uri(&args.connection_uri);
    let client = MongoDbClient::connect(&encoded_uri, &args.database_name, args.verify_connection)
        .await
        .map_err(|err| MedauthError::connection_failed(err, &args.connection_uri, &encoded_uri))?;

    let changes = plan(&client, &args.collections).await;
    client.shutdown().await;

    print_plan(&changes?, json)
}

#[allow(clippy::print_stdout)]
fn print_report(report: &ReconcileReport, json: bool) -> color_eyre::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report).context("Failed to serialize reconcile report")?);
        return Ok(());
    }

    for (collection, index) in report.dropped() {
        println!("dropped  {collection}.{index}");
    }
    for (collection, index) in report.created() {
        println!("created  {collection}.{index}");
    }
    for op in report.conflicts().chain(report.failures()) {
        let index = op.index.as_deref().unwrap_or("-");
        println!("skipped  {}.{} ({:?}): {:?}", op.collection_name, index, op.kind, op.outcome);
    }

    let summary = report.summary();
    println!(
        "{} created, {} dropped, {} unchanged, {} conflicts, {} failures",
        summary.created, summary.dropped, summary.unchanged, summary.conflicts, summary.failures
    );
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_plan(changes: &[PlannedChange], json: bool) -> color_eyre::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(changes).context("Failed to serialize reconcile plan")?);
        return Ok(());
    }

    for change in changes {
        let action = match change.transition {
            Transition::Create => "create",
            Transition::Drop => "drop",
            Transition::Noop => "keep",
        };
        println!("{action:<8} {}.{}", change.collection_name, change.index);
    }
    let pending = changes.iter().filter(|change| change.transition != Transition::Noop).count();
    println!("{pending} change(s) pending");
    Ok(())
}
