//! Local folder of imported MP3 files

use crate::error::{PlaybackError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Folder name used when the caller does not pick one
pub const DEFAULT_DIRECTORY: &str = "musicas";

/// MP3 files copied into a single directory
#[derive(Debug, Clone)]
pub struct MusicLibrary {
    root: PathBuf,
}

impl MusicLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy `source` into the library under its own file name.
    ///
    /// The directory is created on first import. An existing file with the same name is
    /// never overwritten.
    pub fn import(&self, source: &Path) -> Result<PathBuf> {
        let file_name = source
            .file_name()
            .ok_or_else(|| PlaybackError::InvalidPath(source.display().to_string()))?;

        if !is_mp3(source) {
            return Err(PlaybackError::UnsupportedFormat(
                source.display().to_string(),
            ));
        }

        fs::create_dir_all(&self.root)?;

        let dest = self.root.join(file_name);
        let mut reader = fs::File::open(source)?;
        let mut writer = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&dest)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(PlaybackError::AlreadyImported(dest));
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = io::copy(&mut reader, &mut writer) {
            drop(writer);
            let _ = fs::remove_file(&dest);
            return Err(e.into());
        }

        tracing::info!(source = %source.display(), dest = %dest.display(), "track imported");
        Ok(dest)
    }

    /// File names of every `.mp3` in the library, any letter case, sorted.
    /// A library that was never imported into is empty.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() || !is_mp3(&entry.path()) {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }
}

impl Default for MusicLibrary {
    fn default() -> Self {
        Self::new(DEFAULT_DIRECTORY)
    }
}

fn is_mp3(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"))
}
