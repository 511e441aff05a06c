//! Calmwave Storage
//!
//! `SQLite` data-access layer for the Calmwave catalog: developer accounts, playlists
//! and the tracks inside them.
//!
//! # Architecture
//!
//! - **Connection Manager**: one shared pool; each call leases a connection and releases
//!   it on every exit path
//! - **Statement Gateway**: static SQL text plus bound parameters, nothing interpolated
//! - **Vertical Slicing**: `users` and `playlists` each own their queries and row mapping
//! - **Transactions**: multi-step flows run on one connection and commit as a unit
//!
//! # Example
//!
//! ```rust,no_run
//! use calmwave_storage::{ConnectionManager, CredentialHasher, PlaylistRepository, StorageConfig, UserRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StorageConfig::load(None)?;
//! let manager = ConnectionManager::connect(&config).await?;
//! manager.migrate().await?;
//!
//! let users = UserRepository::new(manager.clone(), CredentialHasher::new(config.credential_cost));
//! let playlists = PlaylistRepository::new(manager.clone());
//!
//! let road_trip = playlists.create("Road Trip").await?;
//! for user in users.list().await? {
//!     println!("{} <{}>", user.username, user.email);
//! }
//! # let _ = road_trip;
//! # Ok(())
//! # }
//! ```

mod config;
mod connection;
mod credentials;
mod session;
mod statement;
mod transaction;

// Vertical slices
pub mod playlists;
pub mod users;

pub use config::StorageConfig;
pub use connection::{ConnectionLease, ConnectionManager, ConnectionStats};
pub use credentials::{CredentialHasher, Verification};
pub use playlists::PlaylistRepository;
pub use session::Session;
pub use statement::{Executed, Gateway, Param, Statement};
pub use transaction::CatalogTransaction;
pub use users::UserRepository;

use calmwave_core::Result;
use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// This should be called once when the application starts to ensure
/// the database schema is up to date.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    tracing::debug!("catalog schema up to date");
    Ok(())
}

/// Open a pool and bring its schema up to date in one step
pub async fn open(config: &StorageConfig) -> Result<ConnectionManager> {
    let manager = ConnectionManager::connect(config).await?;
    manager.migrate().await?;
    Ok(manager)
}
