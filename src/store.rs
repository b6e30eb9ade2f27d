//src/store.rs
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::session::WorkoutSession;

pub const SESSION_FILE_NAME: &str = "fittrack-workout.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error accessing session file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The in-progress workout kept on disk between commands.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Session file placed next to the database.
    pub fn beside(db_path: &Path) -> Self {
        let dir = db_path.parent().unwrap_or_else(|| Path::new("."));
        Self::new(dir.join(SESSION_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the saved session. A missing file is an inactive session using
    /// `default_rest_seconds` for its timer.
    /// # Errors
    /// `StoreError` if the file exists but cannot be read or parsed.
    pub fn load(&self, default_rest_seconds: u32) -> Result<WorkoutSession, StoreError> {
        if !self.path.exists() {
            return Ok(WorkoutSession::new(default_rest_seconds));
        }
        let content = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes the session, replacing the file atomically.
    /// # Errors
    /// `StoreError` on serialization or I/O failure.
    pub fn save(&self, session: &WorkoutSession) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(session)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .and_then(|()| fs::rename(&tmp, &self.path))
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })
    }
}
