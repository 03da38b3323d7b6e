//! # Effect Gateway
//!
//! Runs the effects returned by `update()` against a [`NoteStore`] and
//! feeds each outcome back to the owning session as exactly one
//! `Action::Completed`.
//!
//! ```text
//! update() ──Effect──▶ dispatch() ──spawn──▶ store call (+ timeout)
//!                                                 │
//! session loop ◀──Action::Completed{seq}──────────┘
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::core::action::{Action, BackendUnavailable, Effect, EffectResult};
use crate::store::provider::{NoteStore, StoreError};

/// Where completions for one session are delivered.
pub type CompletionSender = UnboundedSender<Action>;

/// Shared by all sessions; cheap to clone.
#[derive(Clone)]
pub struct EffectGateway {
    store: Arc<dyn NoteStore>,
    timeout: Option<Duration>,
}

impl EffectGateway {
    pub fn new(store: Arc<dyn NoteStore>, timeout: Option<Duration>) -> Self {
        Self { store, timeout }
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Launch one effect in the background.
    pub fn dispatch(&self, effect: Effect, completions: CompletionSender) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let limit = self.timeout;
        let seq = effect.seq();
        let kind = effect.kind();
        info!("Dispatching {} (seq={}) to {} store", kind, seq, store.name());

        tokio::spawn(async move {
            let result = execute(store.as_ref(), effect, limit).await;
            debug!("{} (seq={}) finished: ok={}", kind, seq, is_ok(&result));
            if completions.send(Action::Completed { seq, result }).is_err() {
                warn!("Completion for {} (seq={}) dropped: session closed", kind, seq);
            }
        })
    }

    pub fn dispatch_all(&self, effects: Vec<Effect>, completions: &CompletionSender) {
        for effect in effects {
            self.dispatch(effect, completions.clone());
        }
    }
}

async fn execute(store: &dyn NoteStore, effect: Effect, limit: Option<Duration>) -> EffectResult {
    match effect {
        Effect::Authenticate { credentials, .. } => {
            EffectResult::Auth(bounded(limit, store.authenticate(&credentials)).await)
        }
        Effect::FetchNotes { user, .. } => {
            EffectResult::Notes(bounded(limit, store.fetch_notes(user)).await)
        }
        Effect::SaveNote { user, note, .. } => {
            EffectResult::Saved(bounded(limit, store.save_note(user, &note)).await)
        }
    }
}

/// Apply the optional time limit and flatten store errors.
async fn bounded<T>(
    limit: Option<Duration>,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, BackendUnavailable> {
    let outcome = match limit {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("Store call timed out after {}s", limit.as_secs());
                return Err(BackendUnavailable::new(format!(
                    "timed out after {}s",
                    limit.as_secs()
                )));
            }
        },
        None => call.await,
    };

    outcome.map_err(|err| {
        warn!("Store call failed: {}", err);
        BackendUnavailable::from(err)
    })
}

fn is_ok(result: &EffectResult) -> bool {
    match result {
        EffectResult::Auth(r) => r.is_ok(),
        EffectResult::Notes(r) => r.is_ok(),
        EffectResult::Saved(r) => r.is_ok(),
    }
}
