//! # Notes and Identities
//!
//! The handful of domain values that cross the core/store boundary.
//!
//! A `Note` has no id at this layer: it belongs to whichever user saved it,
//! and the list screen only ever sees it as part of a bulk fetch.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single note as shown in the list and detail screens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    pub summary: String,
    pub body: String,
}

impl Note {
    pub fn new(title: impl Into<String>, summary: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            body: body.into(),
        }
    }

    /// Split raw editor text into a note.
    ///
    /// Line 1 is the title, line 2 the summary, everything after is the body.
    /// No validation: an empty buffer yields an all-empty note.
    pub fn compose(text: &str) -> Self {
        let mut lines = text.split('\n');
        let title = lines.next().unwrap_or_default().to_string();
        let summary = lines.next().unwrap_or_default().to_string();
        let body = lines.collect::<Vec<_>>().join("\n");
        Self {
            title,
            summary,
            body,
        }
    }
}

/// Login form contents, held only until the authentication effect resolves.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub identifier: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Opaque user identity returned by a successful authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_splits_title_summary_body() {
        let note = Note::compose("title\nsummary\nbody-line1\nbody-line2");
        assert_eq!(note, Note::new("title", "summary", "body-line1\nbody-line2"));
    }

    #[test]
    fn test_compose_title_only() {
        assert_eq!(Note::compose("title"), Note::new("title", "", ""));
    }

    #[test]
    fn test_compose_empty_buffer_yields_empty_note() {
        assert_eq!(Note::compose(""), Note::default());
    }

    #[test]
    fn test_compose_keeps_blank_body_lines() {
        let note = Note::compose("t\ns\n\nafter blank\n");
        assert_eq!(note.body, "\nafter blank\n");
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = Credentials::new("alice", "hunter2");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("alice"));
        assert!(!printed.contains("hunter2"));
    }
}
