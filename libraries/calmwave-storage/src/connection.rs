//! Connection manager
//!
//! One pool is shared by every repository. A repository call leases a single connection
//! for its own duration; the lease hands it back when dropped, on every exit path.

use crate::config::StorageConfig;
use crate::statement::Gateway;
use crate::transaction::CatalogTransaction;
use calmwave_core::{CatalogError, Result};
use futures_util::future::BoxFuture;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Sqlite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Connect/disconnect counters shared by every clone of a manager
#[derive(Debug, Default)]
struct Counters {
    connects: AtomicU64,
    disconnects: AtomicU64,
    failed_connects: AtomicU64,
}

/// Snapshot of a manager's lease counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Leases handed out
    pub connects: u64,
    /// Leases returned
    pub disconnects: u64,
    /// Lease attempts that never produced a connection
    pub failed_connects: u64,
}

impl ConnectionStats {
    /// Leases currently held
    pub fn in_flight(&self) -> u64 {
        self.connects.saturating_sub(self.disconnects)
    }
}

/// Shared handle to the catalog database
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    pool: SqlitePool,
    counters: Arc<Counters>,
    statement_timeout: Option<Duration>,
}

impl ConnectionManager {
    /// Open the pool described by `config`.
    ///
    /// A refused or unreachable database is reported as `CatalogError::Connection`; nothing
    /// is left half-open and the caller may simply call `connect` again.
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        config.validate()?;

        tracing::info!(
            url = %config.database_url,
            legacy = %config.connection_label(),
            max_connections = config.max_connections,
            "opening catalog database"
        );

        let options = config.connect_options()?;
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect_with(options)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "could not open catalog database");
                CatalogError::connection(e.to_string())
            })?;

        Ok(Self::from_pool(pool).with_statement_timeout(config.statement_timeout()))
    }

    /// Wrap a pool the caller already owns
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            counters: Arc::new(Counters::default()),
            statement_timeout: None,
        }
    }

    #[must_use]
    pub fn with_statement_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.statement_timeout = timeout;
        self
    }

    /// Bring the schema up to date
    pub async fn migrate(&self) -> Result<()> {
        crate::run_migrations(&self.pool).await
    }

    /// Lease one connection for the duration of a call
    pub async fn acquire(&self) -> Result<ConnectionLease> {
        match self.pool.acquire().await {
            Ok(conn) => Ok(ConnectionLease {
                conn,
                _release: ReleaseGuard::connect(&self.counters),
                statement_timeout: self.statement_timeout,
            }),
            Err(e) => Err(self.failed_connect(e)),
        }
    }

    /// Lease one connection and open a transaction on it
    pub async fn begin(&self) -> Result<CatalogTransaction> {
        match self.pool.begin().await {
            Ok(tx) => Ok(CatalogTransaction::new(
                tx,
                ReleaseGuard::connect(&self.counters),
                self.statement_timeout,
            )),
            Err(e) => Err(self.failed_connect(e)),
        }
    }

    /// Run `f` inside one transaction: commit when it returns `Ok`, roll back otherwise.
    ///
    /// ```rust,no_run
    /// # use calmwave_storage::ConnectionManager;
    /// # async fn example(manager: ConnectionManager) -> calmwave_core::Result<()> {
    /// let _id = manager
    ///     .with_transaction(|tx| Box::pin(async move { tx.create_playlist("Road Trip").await }))
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn with_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: for<'t> FnOnce(&'t mut CatalogTransaction) -> BoxFuture<'t, Result<T>>,
    {
        let mut tx = self.begin().await?;

        match f(&mut tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    pub fn stats(&self) -> ConnectionStats {
        ConnectionStats {
            connects: self.counters.connects.load(Ordering::SeqCst),
            disconnects: self.counters.disconnects.load(Ordering::SeqCst),
            failed_connects: self.counters.failed_connects.load(Ordering::SeqCst),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every pooled connection. Later leases fail with `CatalogError::Connection`.
    pub async fn close(&self) {
        tracing::info!("closing catalog database");
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    fn failed_connect(&self, err: sqlx::Error) -> CatalogError {
        self.counters.failed_connects.fetch_add(1, Ordering::SeqCst);
        tracing::warn!(error = %err, "could not lease a connection");
        err.into()
    }
}

/// Counts one connect on creation and exactly one disconnect on drop
#[derive(Debug)]
pub(crate) struct ReleaseGuard {
    counters: Arc<Counters>,
}

impl ReleaseGuard {
    fn connect(counters: &Arc<Counters>) -> Self {
        counters.connects.fetch_add(1, Ordering::SeqCst);
        tracing::trace!("connection leased");
        Self {
            counters: Arc::clone(counters),
        }
    }
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.counters.disconnects.fetch_add(1, Ordering::SeqCst);
        tracing::trace!("connection released");
    }
}

/// A pooled connection held for one repository call
pub struct ConnectionLease {
    conn: PoolConnection<Sqlite>,
    _release: ReleaseGuard,
    statement_timeout: Option<Duration>,
}

impl std::fmt::Debug for ConnectionLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionLease")
            .field("statement_timeout", &self.statement_timeout)
            .finish_non_exhaustive()
    }
}

impl ConnectionLease {
    /// Statement gateway over this connection
    pub fn gateway(&mut self) -> Gateway<'_> {
        Gateway::new(&mut *self.conn, self.statement_timeout)
    }
}
