//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::note::{Credentials, Note, UserId};
use crate::store::{NoteStore, StoreError};

#[derive(Default)]
struct Inner {
    users: Vec<(String, String, UserId)>,
    notes: HashMap<UserId, Vec<Note>>,
    failure: Option<String>,
    stall_all: bool,
    stall_saves: bool,
    saves: usize,
}

/// In-memory store with switches for failure and never-completing calls.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(username: &str, secret: &str, id: i64) -> Self {
        let store = Self::new();
        store.add_user(username, secret, id);
        store
    }

    pub fn add_user(&self, username: &str, secret: &str, id: i64) {
        self.lock()
            .users
            .push((username.to_string(), secret.to_string(), UserId(id)));
    }

    pub fn seed(&self, user: i64, notes: Vec<Note>) {
        self.lock().notes.insert(UserId(user), notes);
    }

    /// Every call fails with `StoreError::Network(reason)`.
    pub fn fail_with(&self, reason: &str) {
        self.lock().failure = Some(reason.to_string());
    }

    /// Every call hangs forever.
    pub fn stall(&self) {
        self.lock().stall_all = true;
    }

    /// Saves hang forever; reads still answer.
    pub fn stall_saves(&self) {
        self.lock().stall_saves = true;
    }

    pub fn saved_count(&self) -> usize {
        self.lock().saves
    }

    pub fn notes_of(&self, user: i64) -> Vec<Note> {
        self.lock().notes.get(&UserId(user)).cloned().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    async fn gate(&self, is_save: bool) -> Result<(), StoreError> {
        let (stall, failure) = {
            let inner = self.lock();
            (
                inner.stall_all || (is_save && inner.stall_saves),
                inner.failure.clone(),
            )
        };
        if stall {
            std::future::pending::<()>().await;
        }
        match failure {
            Some(reason) => Err(StoreError::Network(reason)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<Option<UserId>, StoreError> {
        self.gate(false).await?;
        Ok(self
            .lock()
            .users
            .iter()
            .find(|(name, secret, _)| {
                *name == credentials.identifier && *secret == credentials.secret
            })
            .map(|(_, _, id)| *id))
    }

    async fn fetch_notes(&self, user: UserId) -> Result<Vec<Note>, StoreError> {
        self.gate(false).await?;
        Ok(self.lock().notes.get(&user).cloned().unwrap_or_default())
    }

    async fn save_note(&self, user: UserId, note: &Note) -> Result<(), StoreError> {
        self.gate(true).await?;
        let mut inner = self.lock();
        inner.saves += 1;
        inner.notes.entry(user).or_default().push(note.clone());
        Ok(())
    }
}
