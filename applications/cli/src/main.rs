/// Calmwave - command-line access to the catalog database
use anyhow::{bail, Context};
use calmwave_core::{NewTrack, NewUser, Outcome, PlaylistId, Secret, UserId};
use calmwave_playback::MusicLibrary;
use calmwave_storage::{
    ConnectionManager, CredentialHasher, PlaylistRepository, Session, StorageConfig,
    UserRepository,
};
use chrono::{NaiveTime, Timelike};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "calmwave")]
#[command(about = "Manage Calmwave accounts and playlists", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the catalog schema
    Migrate,
    /// Register a new account
    AddUser {
        /// Username
        #[arg(short, long)]
        username: String,
        /// Full name
        #[arg(short = 'n', long)]
        full_name: String,
        /// Email, used to log in
        #[arg(short, long)]
        email: String,
        /// Phone number
        #[arg(long, default_value = "")]
        phone: String,
        /// Password
        #[arg(short, long, env = "CALMWAVE_PASSWORD", hide_env_values = true)]
        password: String,
        /// Developer type code
        #[arg(short = 't', long, default_value_t = 0)]
        developer_type: i32,
    },
    /// List all accounts
    ListUsers,
    /// Delete an account by id
    DeleteUser {
        /// Account id
        id: i64,
    },
    /// Check an email/password pair
    Login {
        /// Email
        #[arg(short, long)]
        email: String,
        /// Password
        #[arg(short, long, env = "CALMWAVE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an empty playlist
    CreatePlaylist {
        /// Playlist name
        name: String,
    },
    /// Rename a playlist
    RenamePlaylist {
        /// Playlist id
        id: i64,
        /// New name
        name: String,
    },
    /// Delete a playlist and its tracks
    DeletePlaylist {
        /// Playlist id
        id: i64,
    },
    /// Add a track to a playlist
    AddTrack {
        /// Playlist id
        #[arg(short, long)]
        playlist: i64,
        /// Track name
        #[arg(short, long)]
        name: String,
        /// Artist
        #[arg(short, long)]
        artist: String,
        /// Length as MM:SS or HH:MM:SS
        #[arg(short, long)]
        duration: String,
        /// Release year
        #[arg(short, long)]
        year: i32,
    },
    /// List all playlists with their track count and total length
    ListPlaylists,
    /// List the tracks of one playlist
    ListTracks {
        /// Playlist id
        playlist: i64,
    },
    /// Copy an MP3 file into the local music folder
    ImportFile {
        /// File to import
        path: PathBuf,
        /// Music folder
        #[arg(short, long, default_value = calmwave_playback::library::DEFAULT_DIRECTORY)]
        library: PathBuf,
    },
    /// List the MP3 files in the local music folder
    ListFiles {
        /// Music folder
        #[arg(short, long, default_value = calmwave_playback::library::DEFAULT_DIRECTORY)]
        library: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "calmwave_cli=info,calmwave_storage=info,calmwave_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = StorageConfig::load(cli.config.as_deref()).context("loading configuration")?;

    let command = cli.command.name();
    tracing::info!(command, database = %config.database_url, "running command");

    let result = dispatch(&config, cli.command).await;
    if let Err(e) = &result {
        tracing::error!(command, error = %e, "command failed");
    }
    result
}

async fn dispatch(config: &StorageConfig, command: Commands) -> anyhow::Result<()> {
    let command = match command {
        Commands::ImportFile { path, library } => {
            let dest = MusicLibrary::new(library).import(&path)?;
            println!("Imported {}", dest.display());
            return Ok(());
        }
        Commands::ListFiles { library } => {
            let library = MusicLibrary::new(library);
            println!("Files in {}:", library.root().display());
            for name in library.list()? {
                println!("  {name}");
            }
            return Ok(());
        }
        other => other,
    };

    if matches!(command, Commands::Migrate) {
        let manager = ConnectionManager::connect(config).await?;
        manager.migrate().await?;
        println!("Schema up to date");
        manager.close().await;
        return Ok(());
    }

    let catalog = Catalog::open(config).await?;
    let result = run(&catalog, command).await;
    catalog.manager.close().await;
    result
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Migrate => "migrate",
            Self::AddUser { .. } => "add-user",
            Self::ListUsers => "list-users",
            Self::DeleteUser { .. } => "delete-user",
            Self::Login { .. } => "login",
            Self::CreatePlaylist { .. } => "create-playlist",
            Self::RenamePlaylist { .. } => "rename-playlist",
            Self::DeletePlaylist { .. } => "delete-playlist",
            Self::AddTrack { .. } => "add-track",
            Self::ListPlaylists => "list-playlists",
            Self::ListTracks { .. } => "list-tracks",
            Self::ImportFile { .. } => "import-file",
            Self::ListFiles { .. } => "list-files",
        }
    }
}

/// Repositories sharing one pool
struct Catalog {
    manager: ConnectionManager,
    users: UserRepository,
    playlists: PlaylistRepository,
}

impl Catalog {
    async fn open(config: &StorageConfig) -> anyhow::Result<Self> {
        let manager = calmwave_storage::open(config).await?;
        let hasher = CredentialHasher::new(config.credential_cost);

        Ok(Self {
            users: UserRepository::new(manager.clone(), hasher),
            playlists: PlaylistRepository::new(manager.clone()),
            manager,
        })
    }
}

async fn run(catalog: &Catalog, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Migrate | Commands::ImportFile { .. } | Commands::ListFiles { .. } => {}
        Commands::AddUser {
            username,
            full_name,
            email,
            phone,
            password,
            developer_type,
        } => {
            let user = NewUser::new(username, full_name, phone, email)
                .with_credential(Secret::new(password))
                .with_developer_type(developer_type);
            let id = catalog.users.register(&user).await?;
            println!("Created user {id}");
        }
        Commands::ListUsers => {
            let users = catalog.users.list().await?;

            println!("Users:");
            for user in users {
                println!(
                    "  {} - {} <{}> ({}, type {})",
                    user.id, user.username, user.email, user.full_name, user.developer_type
                );
            }
        }
        Commands::DeleteUser { id } => {
            let id = UserId::new(id);
            expect_found(catalog.users.delete(id).await?, "user", id)?;
            println!("Deleted user {id}");
        }
        Commands::Login { email, password } => {
            let mut session = Session::new();
            match session
                .sign_in(&catalog.users, &email, &Secret::new(password))
                .await?
            {
                Some(id) => println!("Signed in as user {id}"),
                None => bail!("invalid email or password"),
            }
        }
        Commands::CreatePlaylist { name } => {
            let id = catalog.playlists.create(&name).await?;
            println!("Created playlist {id}");
        }
        Commands::RenamePlaylist { id, name } => {
            let id = PlaylistId::new(id);
            expect_found(catalog.playlists.rename(id, &name).await?, "playlist", id)?;
            println!("Renamed playlist {id}");
        }
        Commands::DeletePlaylist { id } => {
            let id = PlaylistId::new(id);
            expect_found(catalog.playlists.delete(id).await?, "playlist", id)?;
            println!("Deleted playlist {id}");
        }
        Commands::AddTrack {
            playlist,
            name,
            artist,
            duration,
            year,
        } => {
            let playlist = PlaylistId::new(playlist);
            let track = NewTrack::new(name, artist, parse_duration(&duration)?, year, playlist);
            expect_found(catalog.playlists.add_track(&track).await?, "playlist", playlist)?;
            println!("Added track to playlist {playlist}");
        }
        Commands::ListPlaylists => {
            let playlists = catalog.playlists.list().await?;

            println!("Playlists:");
            for playlist in playlists {
                println!(
                    "  {} - {} ({} tracks, {}, created {})",
                    playlist.id,
                    playlist.name,
                    playlist.track_count,
                    playlist.total_duration.format("%H:%M:%S"),
                    playlist.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Commands::ListTracks { playlist } => {
            let playlist = PlaylistId::new(playlist);
            if catalog.playlists.get(playlist).await?.is_none() {
                bail!("playlist {playlist} not found");
            }

            for track in catalog.playlists.tracks(playlist).await? {
                println!(
                    "  {} - {} [{}] ({})",
                    track.artist,
                    track.name,
                    format_length(track.duration),
                    track.year
                );
            }
        }
    }

    Ok(())
}

fn expect_found(outcome: Outcome, what: &str, id: impl std::fmt::Display) -> anyhow::Result<()> {
    match outcome {
        Outcome::Success => Ok(()),
        Outcome::NotFound => bail!("{what} {id} not found"),
    }
}

/// `MM:SS`, or `HH:MM:SS` once a track reaches an hour
fn format_length(length: NaiveTime) -> String {
    if length.hour() == 0 {
        length.format("%M:%S").to_string()
    } else {
        length.format("%H:%M:%S").to_string()
    }
}

/// Accepts `MM:SS` or `HH:MM:SS`
fn parse_duration(input: &str) -> anyhow::Result<NaiveTime> {
    let input = input.trim();
    let full = match input.matches(':').count() {
        1 => format!("00:{input}"),
        2 => input.to_string(),
        _ => bail!("duration must be MM:SS or HH:MM:SS, got {input:?}"),
    };

    NaiveTime::parse_from_str(&full, "%H:%M:%S")
        .with_context(|| format!("invalid duration {input:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_durations() {
        assert_eq!(
            parse_duration("3:30").unwrap(),
            NaiveTime::from_hms_opt(0, 3, 30).unwrap()
        );
        assert_eq!(
            parse_duration("01:02:03").unwrap(),
            NaiveTime::from_hms_opt(1, 2, 3).unwrap()
        );
    }

    #[test]
    fn rejects_malformed_durations() {
        assert!(parse_duration("210").is_err());
        assert!(parse_duration("3:75").is_err());
        assert!(parse_duration("1:2:3:4").is_err());
    }

    #[test]
    fn track_length_keeps_hours() {
        assert_eq!(format_length(parse_duration("3:30").unwrap()), "03:30");
        assert_eq!(format_length(parse_duration("01:02:03").unwrap()), "01:02:03");
    }

    #[test]
    fn command_names_match_subcommands() {
        let cli = Cli::try_parse_from(["calmwave", "list-tracks", "7"]).unwrap();
        assert_eq!(cli.command.name(), "list-tracks");

        let cli = Cli::try_parse_from(["calmwave", "migrate"]).unwrap();
        assert_eq!(cli.command.name(), "migrate");
    }

    #[test]
    fn file_commands_default_to_musicas() {
        let cli = Cli::try_parse_from(["calmwave", "list-files"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::ListFiles { ref library } if library == &PathBuf::from("musicas")
        ));

        let cli =
            Cli::try_parse_from(["calmwave", "import-file", "song.mp3", "-l", "/tmp/lib"]).unwrap();
        assert_eq!(cli.command.name(), "import-file");
    }

    #[test]
    fn cli_parses_add_track() {
        let cli = Cli::try_parse_from([
            "calmwave", "add-track", "-p", "4", "-n", "Highway", "-a", "Band", "-d", "3:30", "-y",
            "2020",
        ])
        .unwrap();

        assert!(matches!(
            cli.command,
            Commands::AddTrack { playlist: 4, ref name, year: 2020, .. } if name == "Highway"
        ));
    }
}
