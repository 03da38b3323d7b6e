use std::fmt;

use async_trait::async_trait;

use crate::core::action::BackendUnavailable;
use crate::core::note::{Credentials, Note, UserId};

/// Errors that can occur inside a storage backend.
/// Never reaches the session: the gateway flattens it to `BackendUnavailable`.
#[derive(Debug)]
pub enum StoreError {
    /// Backend misconfigured (bad path, missing endpoint).
    Config(String),
    /// Network-level failure (timeout, DNS, connection refused).
    Network(String),
    /// Remote store answered with an error status.
    Api { status: u16, message: String },
    /// Response or row could not be decoded.
    Parse(String),
    /// Database or runtime failure inside the backend.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Config(msg) => write!(f, "config error: {msg}"),
            StoreError::Network(msg) => write!(f, "network error: {msg}"),
            StoreError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            StoreError::Parse(msg) => write!(f, "parse error: {msg}"),
            StoreError::Backend(msg) => write!(f, "backend error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<StoreError> for BackendUnavailable {
    fn from(err: StoreError) -> Self {
        BackendUnavailable::new(err.to_string())
    }
}

/// Persistence for users and their notes.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Returns the name of the store.
    fn name(&self) -> &str;

    /// `Ok(None)` means the credentials did not match a user.
    async fn authenticate(&self, credentials: &Credentials) -> Result<Option<UserId>, StoreError>;

    /// All notes owned by `user`, oldest first.
    async fn fetch_notes(&self, user: UserId) -> Result<Vec<Note>, StoreError>;

    async fn save_note(&self, user: UserId, note: &Note) -> Result<(), StoreError>;
}
