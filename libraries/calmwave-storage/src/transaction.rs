//! Multi-statement units of work
//!
//! A `CatalogTransaction` holds one leased connection with auto-commit suspended. Nothing
//! it writes is visible to other connections until `commit`; dropping it rolls back.

use crate::connection::ReleaseGuard;
use crate::credentials::CredentialHasher;
use crate::statement::Gateway;
use crate::{playlists, users};
use calmwave_core::{NewTrack, NewUser, Outcome, PlaylistId, Result, UserId};
use sqlx::{Sqlite, Transaction};
use std::time::Duration;

pub struct CatalogTransaction {
    tx: Transaction<'static, Sqlite>,
    release: ReleaseGuard,
    statement_timeout: Option<Duration>,
}

impl CatalogTransaction {
    pub(crate) fn new(
        tx: Transaction<'static, Sqlite>,
        release: ReleaseGuard,
        statement_timeout: Option<Duration>,
    ) -> Self {
        tracing::debug!("transaction started");
        Self {
            tx,
            release,
            statement_timeout,
        }
    }

    /// Statement gateway bound to this transaction
    pub fn gateway(&mut self) -> Gateway<'_> {
        Gateway::new(&mut *self.tx, self.statement_timeout)
    }

    pub async fn register_user(
        &mut self,
        hasher: &CredentialHasher,
        user: &NewUser,
    ) -> Result<UserId> {
        user.validate()?;
        let hash = hasher.hash(&user.credential).await?;
        users::insert(&mut self.gateway(), user, &hash).await
    }

    pub async fn create_playlist(&mut self, name: &str) -> Result<PlaylistId> {
        playlists::insert(&mut self.gateway(), name).await
    }

    pub async fn rename_playlist(&mut self, id: PlaylistId, name: &str) -> Result<Outcome> {
        playlists::rename(&mut self.gateway(), id, name).await
    }

    pub async fn add_track(&mut self, track: &NewTrack) -> Result<Outcome> {
        playlists::insert_track(&mut self.gateway(), track).await
    }

    /// Delete a playlist together with its tracks
    pub async fn delete_playlist(&mut self, id: PlaylistId) -> Result<Outcome> {
        playlists::delete_with_tracks(&mut self.gateway(), id).await
    }

    pub async fn commit(self) -> Result<()> {
        let Self { tx, release, .. } = self;
        tx.commit().await?;
        tracing::debug!("transaction committed");
        drop(release);
        Ok(())
    }

    pub async fn rollback(self) -> Result<()> {
        let Self { tx, release, .. } = self;
        tx.rollback().await?;
        tracing::warn!("transaction rolled back");
        drop(release);
        Ok(())
    }
}

impl std::fmt::Debug for CatalogTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogTransaction")
            .field("statement_timeout", &self.statement_timeout)
            .finish_non_exhaustive()
    }
}
