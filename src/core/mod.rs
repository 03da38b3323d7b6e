//! # Core Session Logic
//!
//! Everything a session knows and every way it can change. Nothing in here
//! touches a socket, a terminal or a database.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Session (state)      │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │  • Effect (requests)    │
//!                    │                         │
//!                    │  No I/O. No UI. Pure.   │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    TUI     │      │   STORE    │      │   SERVER   │
//!     │ projector  │      │  gateway   │      │ supervisor │
//!     │ (ratatui)  │      │ (effects)  │      │ (sessions) │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `Session` struct, per-screen sub-state and the note list
//! - [`action`]: `Action`, `Effect` and the `update()` reducer
//! - [`note`]: Notes, credentials and user identities
//! - [`text_input`]: Cursor-aware text buffer
//! - [`config`]: Config file, env and CLI resolution

pub mod action;
pub mod config;
pub mod note;
pub mod state;
pub mod text_input;

pub use action::{update, Action, Effect, EffectResult, Key};
pub use note::{Credentials, Note, UserId};
pub use state::{Screen, Session};
