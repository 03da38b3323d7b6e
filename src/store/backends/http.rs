//! Remote note service over HTTP/JSON.
//!
//! Endpoints, relative to the configured base URL:
//! - `POST /auth` with `{"username", "password"}` → `{"user_id": n}`;
//!   401, 403 and 404 mean "no such user / wrong password"
//! - `GET /users/{id}/notes` → `[{"title", "summary", "body"}, ...]`
//! - `POST /users/{id}/notes` with one note

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::core::note::{Credentials, Note, UserId};
use crate::store::provider::{NoteStore, StoreError};

#[derive(Serialize, Debug)]
struct AuthRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize, Debug)]
struct AuthResponse {
    user_id: i64,
}

pub struct HttpStore {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpStore {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self, StoreError> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(StoreError::Config(format!(
                "endpoint must be an http(s) URL, got '{endpoint}'"
            )));
        }
        Ok(Self {
            endpoint,
            api_key,
            client: reqwest::Client::new(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.endpoint, path));
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {}", key)),
            None => builder,
        }
    }

    fn notes_path(user: UserId) -> String {
        format!("/users/{}/notes", user)
    }
}

/// Turn a non-2xx response into `StoreError::Api`.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    warn!("Note service error: {} - {}", status, message);
    Err(StoreError::Api { status, message })
}

#[async_trait]
impl NoteStore for HttpStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<Option<UserId>, StoreError> {
        let body = AuthRequest {
            username: &credentials.identifier,
            password: &credentials.secret,
        };
        info!("POST {}/auth for '{}'", self.endpoint, credentials.identifier);

        let response = self
            .request(reqwest::Method::POST, "/auth")
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        debug!("Auth response status: {}", response.status());
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
        ) {
            return Ok(None);
        }

        let parsed: AuthResponse = check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;
        Ok(Some(UserId(parsed.user_id)))
    }

    async fn fetch_notes(&self, user: UserId) -> Result<Vec<Note>, StoreError> {
        let response = self
            .request(reqwest::Method::GET, &Self::notes_path(user))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let notes: Vec<Note> = check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;
        debug!("Fetched {} notes for user {}", notes.len(), user);
        Ok(notes)
    }

    async fn save_note(&self, user: UserId, note: &Note) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::POST, &Self::notes_path(user))
            .json(note)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        check(response).await?;
        debug!("Saved note '{}' for user {}", note.title, user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_must_be_http() {
        assert!(matches!(
            HttpStore::new("ftp://example", None),
            Err(StoreError::Config(_))
        ));
        let store = HttpStore::new("http://localhost:8080/", None).unwrap();
        assert_eq!(store.endpoint, "http://localhost:8080");
    }

    #[test]
    fn test_notes_path() {
        assert_eq!(HttpStore::notes_path(UserId(42)), "/users/42/notes");
    }
}
