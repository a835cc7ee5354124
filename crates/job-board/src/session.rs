//! Signed-in session context.
//!
//! The token and cached user record are read once at boot, replaced on login or
//! registration, and cleared on logout. Every request builder reads the token from
//! here instead of consulting ambient storage.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which side of the board an account belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Student,
    Organization,
}

impl AccountKind {
    pub const fn label(self) -> &'static str {
        match self {
            AccountKind::Student => "student",
            AccountKind::Organization => "organization",
        }
    }
}

/// User record returned by the auth endpoints and cached alongside the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AccountKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    token: String,
    user: SessionUser,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("could not access session file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Explicit session context shared by the HTTP client and the engines.
#[derive(Debug, Default)]
pub struct SessionContext {
    path: Option<PathBuf>,
    state: RwLock<Option<StoredSession>>,
}

impl SessionContext {
    /// A session that lives only in memory; used by tests and one-off commands.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Reads the persisted session once. A missing file yields a signed-out context.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let state = match fs::read(&path) {
            Ok(bytes) => {
                let stored: StoredSession =
                    serde_json::from_slice(&bytes).map_err(|source| SessionError::Corrupt {
                        path: path.clone(),
                        source,
                    })?;
                debug!(user = %stored.user.id, "restored persisted session");
                Some(stored)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(source) => return Err(SessionError::Io { path, source }),
        };

        Ok(Self {
            path: Some(path),
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn token(&self) -> Option<String> {
        self.read(|stored| stored.token.clone())
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.read(|stored| stored.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read(|_| ()).is_some()
    }

    /// Replaces the current session and writes it through to disk when file-backed.
    pub fn establish(&self, token: String, user: SessionUser) -> Result<(), SessionError> {
        let stored = StoredSession { token, user };
        if let Some(path) = &self.path {
            let bytes = serde_json::to_vec_pretty(&stored).map_err(|source| {
                SessionError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?;
            fs::write(path, bytes).map_err(|source| SessionError::Io {
                path: path.clone(),
                source,
            })?;
        }
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Some(stored);
        Ok(())
    }

    /// Logout: forgets the in-memory session and removes the persisted copy.
    pub fn clear(&self) -> Result<(), SessionError> {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(path) = &self.path {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(SessionError::Io {
                        path: path.clone(),
                        source,
                    })
                }
            }
        }
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&StoredSession) -> T) -> Option<T> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(f)
    }
}
