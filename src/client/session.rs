use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};

use crate::auth::Role;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session file: {0}")]
    Io(#[from] io::Error),
    #[error("session encoding: {0}")]
    Json(#[from] serde_json::Error),
}

/// Session
///
/// The bearer token and role handed out by the identity provider. Persisted as a small
/// JSON file between runs; nothing else is kept on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub role: Role,
}

impl Session {
    pub fn new(token: impl Into<String>, role: Role) -> Self {
        Self {
            token: token.into(),
            role,
        }
    }

    /// Reads a persisted session. Missing, unreadable or tokenless files yield `None`.
    pub fn restore(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).ok()?;
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) if !session.token.trim().is_empty() => Some(session),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("ignoring unreadable session file {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn persist(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        fs::write(path, serde_json::to_vec(self)?)?;
        Ok(())
    }

    /// Removes the persisted session on logout. An absent file is not an error.
    pub fn clear(path: impl AsRef<Path>) -> Result<(), SessionError> {
        match fs::remove_file(path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// Value of the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}
