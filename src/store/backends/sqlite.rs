//! SQLite-backed note store.
//!
//! One file, two tables. Every call opens its own connection on the
//! blocking pool, so sessions never share a handle.
//!
//! # Invariants
//! - Connections have `foreign_keys=ON` and the schema applied.
//! - Passwords are only ever stored as salted SHA-256 digests.
//! - Notes come back in insertion order.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::core::note::{Credentials, Note, UserId};
use crate::store::provider::{NoteStore, StoreError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    password_salt TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS notes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title       TEXT NOT NULL,
    summary     TEXT NOT NULL,
    body        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_notes_user ON notes(user_id, id);
";

pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Open (or create) the database file and apply the schema.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Config(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let conn = connect(&path)?;
        conn.execute_batch(SCHEMA).map_err(|e| {
            error!("event=db_bootstrap status=error path={} error={}", path.display(), e);
            StoreError::from(e)
        })?;
        info!("event=db_open status=ok path={}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Provision an account. Fails if the username is taken.
    pub async fn add_user(&self, username: &str, secret: &str) -> Result<UserId, StoreError> {
        let username = username.trim().to_string();
        if username.is_empty() {
            return Err(StoreError::Config("username must not be empty".to_string()));
        }
        let salt = uuid::Uuid::new_v4().simple().to_string();
        let hash = digest(&salt, secret);

        self.with_connection(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO users (username, password_salt, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![username, salt, hash, now()],
            );
            match inserted {
                Ok(_) => {
                    let id = UserId(conn.last_insert_rowid());
                    info!("Provisioned user '{}' as {}", username, id);
                    Ok(id)
                }
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    Err(StoreError::Config(format!("user '{username}' already exists")))
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn with_connection<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = connect(&path)?;
            work(&conn)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("blocking task failed: {e}")))?
    }
}

fn connect(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    Ok(conn)
}

fn digest(salt: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[async_trait]
impl NoteStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<Option<UserId>, StoreError> {
        let username = credentials.identifier.clone();
        let secret = credentials.secret.clone();

        self.with_connection(move |conn| {
            let row: Option<(i64, String, String)> = conn
                .query_row(
                    "SELECT id, password_salt, password_hash FROM users WHERE username = ?1",
                    params![username],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            let Some((id, salt, stored)) = row else {
                debug!("No such user '{}'", username);
                return Ok(None);
            };
            let candidate = digest(&salt, &secret);
            if bool::from(candidate.as_bytes().ct_eq(stored.as_bytes())) {
                Ok(Some(UserId(id)))
            } else {
                debug!("Password mismatch for '{}'", username);
                Ok(None)
            }
        })
        .await
    }

    async fn fetch_notes(&self, user: UserId) -> Result<Vec<Note>, StoreError> {
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT title, summary, body FROM notes WHERE user_id = ?1 ORDER BY id ASC",
            )?;
            let notes = stmt
                .query_map(params![user.0], |row| {
                    Ok(Note::new(
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            debug!("Fetched {} notes for user {}", notes.len(), user);
            Ok(notes)
        })
        .await
    }

    async fn save_note(&self, user: UserId, note: &Note) -> Result<(), StoreError> {
        let note = note.clone();
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO notes (user_id, title, summary, body, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user.0, note.title, note.summary, note.body, now()],
            )?;
            debug!("Inserted note '{}' for user {}", note.title, user);
            Ok(())
        })
        .await
    }
}
