//! Playlists and their tracks

use crate::connection::ConnectionManager;
use crate::statement::{Gateway, Statement};
use calmwave_core::{CatalogError, NewTrack, Outcome, Playlist, PlaylistId, Result, Track};
use chrono::Local;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// CRUD over `playlists` and `musicas`
#[derive(Debug, Clone)]
pub struct PlaylistRepository {
    manager: ConnectionManager,
}

impl PlaylistRepository {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    /// Create an empty playlist stamped with the current time
    pub async fn create(&self, name: &str) -> Result<PlaylistId> {
        let mut lease = self.manager.acquire().await?;
        let id = insert(&mut lease.gateway(), name).await?;

        tracing::info!(playlist_id = %id, "playlist created");
        Ok(id)
    }

    pub async fn rename(&self, id: PlaylistId, name: &str) -> Result<Outcome> {
        let mut lease = self.manager.acquire().await?;
        rename(&mut lease.gateway(), id, name).await
    }

    /// Delete a playlist and every track that belongs to it, as one unit
    pub async fn delete(&self, id: PlaylistId) -> Result<Outcome> {
        let mut tx = self.manager.begin().await?;
        let outcome = delete_with_tracks(&mut tx.gateway(), id).await?;
        tx.commit().await?;

        tracing::info!(playlist_id = %id, ?outcome, "playlist delete");
        Ok(outcome)
    }

    /// Add a track; `Outcome::NotFound` when the playlist does not exist
    pub async fn add_track(&self, track: &NewTrack) -> Result<Outcome> {
        let mut lease = self.manager.acquire().await?;
        insert_track(&mut lease.gateway(), track).await
    }

    pub async fn get(&self, id: PlaylistId) -> Result<Option<Playlist>> {
        let mut lease = self.manager.acquire().await?;
        lease
            .gateway()
            .fetch_optional(&Statement::new(SELECT_PLAYLIST_BY_ID).bind(id))
            .await?
            .as_ref()
            .map(playlist_from_row)
            .transpose()
    }

    /// Every playlist once, with aggregates as stored
    pub async fn list(&self) -> Result<Vec<Playlist>> {
        let mut lease = self.manager.acquire().await?;
        let rows = lease
            .gateway()
            .fetch_all(&Statement::new(SELECT_ALL_PLAYLISTS))
            .await?;

        rows.iter().map(playlist_from_row).collect()
    }

    /// Tracks of one playlist in insertion order
    pub async fn tracks(&self, playlist_id: PlaylistId) -> Result<Vec<Track>> {
        let mut lease = self.manager.acquire().await?;
        let rows = lease
            .gateway()
            .fetch_all(&Statement::new(SELECT_TRACKS_BY_PLAYLIST).bind(playlist_id))
            .await?;

        rows.iter().map(track_from_row).collect()
    }
}

const INSERT_PLAYLIST: &str =
    "INSERT INTO playlists (nome_playlist, criacao_playlist) VALUES (?, ?)";

const RENAME_PLAYLIST: &str = "UPDATE playlists SET nome_playlist = ? WHERE id_playlist = ?";

const DELETE_PLAYLIST_TRACKS: &str = "DELETE FROM musicas WHERE playlist = ?";

const DELETE_PLAYLIST: &str = "DELETE FROM playlists WHERE id_playlist = ?";

const INSERT_TRACK: &str =
    "INSERT INTO musicas (nome_musica, artista, duracao, ano, playlist) VALUES (?, ?, ?, ?, ?)";

const SELECT_PLAYLIST_BY_ID: &str = "SELECT id_playlist, nome_playlist, qtd_musicas, tempo_duracao, criacao_playlist \
     FROM playlists WHERE id_playlist = ?";

const SELECT_ALL_PLAYLISTS: &str =
    "SELECT id_playlist, nome_playlist, qtd_musicas, tempo_duracao, criacao_playlist FROM playlists";

const SELECT_TRACKS_BY_PLAYLIST: &str = "SELECT nome_musica, artista, duracao, ano, playlist \
     FROM musicas WHERE playlist = ? ORDER BY rowid";

pub(crate) async fn insert(gateway: &mut Gateway<'_>, name: &str) -> Result<PlaylistId> {
    if name.trim().is_empty() {
        return Err(CatalogError::invalid_input("playlist name must not be empty"));
    }

    let created_at = Local::now().naive_local();
    let done = gateway
        .execute(&Statement::new(INSERT_PLAYLIST).bind(name).bind(created_at))
        .await?;

    if done.rows_affected != 1 {
        return Err(CatalogError::statement(format!(
            "playlist insert affected {} rows",
            done.rows_affected
        )));
    }

    Ok(PlaylistId::new(done.last_insert_id))
}

pub(crate) async fn rename(gateway: &mut Gateway<'_>, id: PlaylistId, name: &str) -> Result<Outcome> {
    if name.trim().is_empty() {
        return Err(CatalogError::invalid_input("playlist name must not be empty"));
    }

    let done = gateway
        .execute(&Statement::new(RENAME_PLAYLIST).bind(name).bind(id))
        .await?;

    Ok(Outcome::from_rows_affected(done.rows_affected))
}

/// Tracks first, then the playlist. Callers run this inside a transaction.
pub(crate) async fn delete_with_tracks(gateway: &mut Gateway<'_>, id: PlaylistId) -> Result<Outcome> {
    let tracks = gateway
        .execute(&Statement::new(DELETE_PLAYLIST_TRACKS).bind(id))
        .await?;
    let done = gateway
        .execute(&Statement::new(DELETE_PLAYLIST).bind(id))
        .await?;

    tracing::debug!(
        playlist_id = %id,
        tracks = tracks.rows_affected,
        "deleted playlist tracks"
    );
    Ok(Outcome::from_rows_affected(done.rows_affected))
}

pub(crate) async fn insert_track(gateway: &mut Gateway<'_>, track: &NewTrack) -> Result<Outcome> {
    let result = gateway
        .execute(
            &Statement::new(INSERT_TRACK)
                .bind(track.name.as_str())
                .bind(track.artist.as_str())
                .bind(track.duration)
                .bind(track.year)
                .bind(track.playlist_id),
        )
        .await;

    match result {
        Ok(done) => Ok(Outcome::from_rows_affected(done.rows_affected)),
        Err(CatalogError::ForeignKey(_)) => {
            tracing::debug!(playlist_id = %track.playlist_id, "track rejected: unknown playlist");
            Ok(Outcome::NotFound)
        }
        Err(e) => Err(e),
    }
}

fn playlist_from_row(row: &SqliteRow) -> Result<Playlist> {
    Ok(Playlist {
        id: row.try_get("id_playlist")?,
        name: row.try_get("nome_playlist")?,
        track_count: row.try_get("qtd_musicas")?,
        total_duration: row.try_get("tempo_duracao")?,
        created_at: row.try_get("criacao_playlist")?,
    })
}

fn track_from_row(row: &SqliteRow) -> Result<Track> {
    Ok(Track {
        name: row.try_get("nome_musica")?,
        artist: row.try_get("artista")?,
        duration: row.try_get("duracao")?,
        year: row.try_get("ano")?,
        playlist_id: row.try_get("playlist")?,
    })
}
