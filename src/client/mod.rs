//! Client side of the list-resource contract.
//!
//! `Session` carries the bearer token and role, `ApiClient` turns a resource operation
//! into an authorized request against the right role prefix, and `ListResource` keeps one
//! resource type's fetched list, search, pagination and pending dialog.

pub mod api;
pub mod list;
pub mod session;

pub use api::{ApiClient, HttpResourceApi, ResourceApi};
pub use list::{DialogError, DialogMode, ListResource, Notice, NoticeLevel, SubmitOutcome};
pub use session::{Session, SessionError};

/// ClientError
///
/// Failures of a single request. `ListResource` turns every one of these into a notice.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("not signed in")]
    NoSession,
    #[error("invalid base url: {0}")]
    InvalidUrl(String),
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Server {
        status: u16,
        message: Option<String>,
    },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ClientError {
    /// Text shown to the user: the server's own message when it sent one.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Server {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            ClientError::NoSession => "Your session has ended, please sign in again".to_string(),
            _ => fallback.to_string(),
        }
    }
}
