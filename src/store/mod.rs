pub mod backends;
pub mod gateway;
pub mod provider;

use std::sync::Arc;

use crate::core::config::{ResolvedConfig, StoreBackend};

pub use backends::{HttpStore, SqliteStore};
pub use gateway::{CompletionSender, EffectGateway};
pub use provider::{NoteStore, StoreError};

/// Build the configured backend.
pub fn open_store(config: &ResolvedConfig) -> Result<Arc<dyn NoteStore>, StoreError> {
    match config.store {
        StoreBackend::Sqlite => Ok(Arc::new(SqliteStore::open(&config.sqlite_path)?)),
        StoreBackend::Http => {
            let endpoint = config
                .endpoint
                .clone()
                .ok_or_else(|| StoreError::Config("no endpoint configured".to_string()))?;
            Ok(Arc::new(HttpStore::new(endpoint, config.api_key.clone())?))
        }
    }
}
