//! Connection bootstrap.
//!
//! [`ConnectionCache`] is built once by the composition root and passed to whatever
//! needs the database. The first [`ConnectionCache::get_database`] call sanitizes the
//! connection string, connects, and reconciles the indexes; later calls return the same
//! handle without touching the server.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::core::client::database::{DatabaseError, IndexCatalog};
use crate::core::client::MongoDbClient;
use crate::schema::{reconcile, ReconcileReport};
use crate::types::params::database::DatabaseArgs;
use crate::utils::mongo_uri::sanitize_uri;
use crate::{MedauthError, MedauthResult};

/// Opens and closes database handles.
#[async_trait]
pub trait Connector: Send + Sync {
    type Handle: IndexCatalog + 'static;

    /// connect - Connect using an already sanitized connection string
    async fn connect(&self, connection_uri: &str, database_name: &str) -> Result<Self::Handle, DatabaseError>;

    /// disconnect - Release the handle and its connections
    async fn disconnect(&self, handle: Self::Handle);
}

/// Connector for the MongoDB driver.
#[derive(Debug, Clone, Copy)]
pub struct MongoConnector {
    pub verify_connection: bool,
}

#[async_trait]
impl Connector for MongoConnector {
    type Handle = MongoDbClient;

    async fn connect(&self, connection_uri: &str, database_name: &str) -> Result<Self::Handle, DatabaseError> {
        MongoDbClient::connect(connection_uri, database_name, self.verify_connection).await
    }

    async fn disconnect(&self, handle: Self::Handle) {
        handle.shutdown().await;
    }
}

struct Connected<H> {
    handle: H,
    report: ReconcileReport,
}

/// Lazily opened, reconciled database handle.
pub struct ConnectionCache<C: Connector = MongoConnector> {
    connector: C,
    args: DatabaseArgs,
    connected: OnceCell<Connected<C::Handle>>,
}

impl ConnectionCache<MongoConnector> {
    pub fn mongo(args: DatabaseArgs) -> Self {
        let connector = MongoConnector { verify_connection: args.verify_connection };
        Self::new(connector, args)
    }
}

impl<C: Connector> ConnectionCache<C> {
    pub fn new(connector: C, args: DatabaseArgs) -> Self {
        Self { connector, args, connected: OnceCell::new() }
    }

    /// The database handle, connecting and reconciling indexes on first use.
    ///
    /// Fails only when the connection itself cannot be established; index
    /// reconciliation problems end up in [`Self::reconcile_report`].
    pub async fn get_database(&self) -> MedauthResult<&C::Handle> {
        let connected = self.connected.get_or_try_init(|| self.open()).await?;
        Ok(&connected.handle)
    }

    /// Report of the reconciliation run of the current handle, if connected.
    pub fn reconcile_report(&self) -> Option<&ReconcileReport> {
        self.connected.get().map(|connected| &connected.report)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.initialized()
    }

    /// Release the cached handle. A no-op when nothing was opened; the next
    /// [`Self::get_database`] connects (and reconciles) again.
    pub async fn close(&mut self) {
        if let Some(connected) = self.connected.take() {
            self.connector.disconnect(connected.handle).await;
            info!(database = %self.args.database_name, "Database connection closed");
        }
    }

    async fn open(&self) -> MedauthResult<Connected<C::Handle>> {
        let connection_uri = &self.args.connection_uri;
        let encoded_uri = sanitize_uri(connection_uri);

        let handle = match self.connector.connect(&encoded_uri, &self.args.database_name).await {
            Ok(handle) => handle,
            Err(err) => {
                let err = MedauthError::connection_failed(err, connection_uri, &encoded_uri);
                error!(error = %err, "Database connection failed");
                return Err(err);
            }
        };
        info!(database = %self.args.database_name, "Connected to database, reconciling indexes");

        let report = reconcile(&handle, &self.args.collections).await;
        Ok(Connected { handle, report })
    }
}
