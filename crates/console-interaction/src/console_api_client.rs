//! ConsoleApiClient - REST implementation of the console backend collaborators.
//!
//! Implements [`SequenceService`] and [`NotificationService`] over HTTP.
//! Errors follow the backend convention: HTTP status plus a JSON `error` field.

use async_trait::async_trait;
use console_core::config::ConsoleConfig;
use console_core::notification::{Notification, NotificationId, NotificationService};
use console_core::sequence::{
    ActiveSequence, GeneratedSequence, SavedSequence, SequencePayload, SequenceService,
};
use console_core::{ConsoleError, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// HTTP client for the console backend.
#[derive(Clone)]
pub struct ConsoleApiClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl ConsoleApiClient {
    /// Creates a client for `base_url` (e.g. `https://console.example.com/api`).
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
        }
    }

    pub fn from_config(config: &ConsoleConfig) -> Self {
        Self::new(config.api_base_url.clone(), config.api_token.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|err| ConsoleError::transport(None, format!("{what} request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(target: "backend", "{} failed with {}", what, status);
            return Err(map_http_error(status, &body));
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = self.send(request, what).await?;
        let status = response.status();
        response.json::<T>().await.map_err(|err| {
            ConsoleError::transport(
                Some(status.as_u16()),
                format!("Failed to parse {what} response: {err}"),
            )
        })
    }
}

#[async_trait]
impl SequenceService for ConsoleApiClient {
    async fn generate_sequence(&self, ticket_id: &str) -> Result<GeneratedSequence> {
        tracing::debug!(target: "backend", "Generating sequence from ticket {}", ticket_id);
        let url = self.endpoint(&format!("tickets/{ticket_id}/generate-sequence"));
        self.send_json(self.client.post(url), "Sequence generation")
            .await
    }

    async fn save_sequence(&self, payload: &SequencePayload) -> Result<SavedSequence> {
        tracing::debug!(
            target: "backend",
            "Saving sequence '{}' from ticket {}",
            payload.sequence_key,
            payload.ticket_id
        );
        let url = self.endpoint("sequences/from-ticket");
        self.send_json(self.client.post(url).json(payload), "Sequence save")
            .await
    }

    async fn list_active_sequences(&self) -> Result<Vec<ActiveSequence>> {
        let url = self.endpoint("sequences/active");
        self.send_json(self.client.get(url), "Active sequences")
            .await
    }
}

#[async_trait]
impl NotificationService for ConsoleApiClient {
    async fn list_unread(&self) -> Result<Vec<Notification>> {
        let url = self.endpoint("notifications/unread");
        self.send_json(self.client.get(url), "Unread notifications")
            .await
    }

    async fn mark_read(&self, id: &NotificationId) -> Result<()> {
        let url = self.endpoint(&format!("notifications/{id}/read"));
        self.send(self.client.post(url), "Mark notification read")
            .await
            .map(|_| ())
    }

    async fn mark_all_read(&self) -> Result<()> {
        let url = self.endpoint("notifications/read-all");
        self.send(self.client.post(url), "Mark all notifications read")
            .await
            .map(|_| ())
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Server `error` message when the body is JSON, otherwise status and reason.
fn map_http_error(status: StatusCode, body: &str) -> ConsoleError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|wrapper| wrapper.error)
        .ok()
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status")
            )
        });

    ConsoleError::transport(Some(status.as_u16()), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_field_is_preferred() {
        let err = map_http_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"error": "Ticket 12 has no messages"}"#,
        );
        assert_eq!(
            err,
            ConsoleError::transport(Some(422), "Ticket 12 has no messages")
        );
    }

    #[test]
    fn test_non_json_body_falls_back_to_status() {
        let err = map_http_error(StatusCode::BAD_GATEWAY, "<html>upstream down</html>");
        assert_eq!(err.to_string(), "502 Bad Gateway");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_json_without_error_field_falls_back_to_status() {
        let err = map_http_error(StatusCode::NOT_FOUND, r#"{"detail": "nope"}"#);
        assert_eq!(err.to_string(), "404 Not Found");
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let client = ConsoleApiClient::new("https://console.example.com/api/", None);
        assert_eq!(client.base_url(), "https://console.example.com/api");
        assert_eq!(
            client.endpoint("/notifications/unread"),
            "https://console.example.com/api/notifications/unread"
        );
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let client = ConsoleApiClient::new("http://127.0.0.1:9", None);
        let err = client.list_unread().await.unwrap_err();
        assert!(err.is_transport());
    }
}
