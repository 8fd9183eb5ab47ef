//! Typed HTTP client for a running flashdeck service.
//!
//! There is no ambient token storage: sign-up and login hand back a [`Session`], and every
//! authenticated call takes one explicitly.
//!
//! ```ignore
//! let client = FlashdeckClient::new("http://localhost:3001")?;
//! let session = client.login("ada@example.com", "hunter22").await?;
//! let page = client.list_flashcards(&session, &ListFlashcardsQuery::default()).await?;
//! ```
//!
//! [`FlashdeckClient::generate_flashcards`] runs the generation pipeline on the caller's side:
//! one completion through `/api/smart`, then one `POST /api/flashcards` per card.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::api::models::flashcards::{
    FlashcardCreate, FlashcardListResponse, FlashcardResponse, FlashcardUpdate, FlashcardUpdateResponse, ListFlashcardsQuery,
    MessageResponse,
};
use crate::api::models::auth::{LoginResponse, SignupResponse};
use crate::chat::{ChatCompletion, ChatCompletionRequest, ChatError, ChatErrorKind};
use crate::config::GenerationConfig;
use crate::db::models::flashcards::SourceType;
use crate::generation::{
    FlashcardSink, GeneratedCard, GenerationError, GenerationReport, SinkError, build_request, cards_from_completion, save_cards,
};
use crate::types::{FlashcardId, UserId};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Tokens for one signed-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: UserId,
}

impl From<&SignupResponse> for Session {
    fn from(response: &SignupResponse) -> Self {
        Self {
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone(),
            user_id: response.user.id,
        }
    }
}

impl From<&LoginResponse> for Session {
    fn from(response: &LoginResponse) -> Self {
        Self {
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone(),
            user_id: response.user.id,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// The service answered with a non-success status
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        details: Option<Value>,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
        }
    }

    /// 401 ends a generation run, other 4xx only fail the card at hand
    fn into_sink_error(self) -> SinkError {
        let message = self.to_string();
        match self.status() {
            Some(401) => SinkError::Unauthorized { message },
            Some(status) if (400..500).contains(&status) => SinkError::Rejected { message },
            _ => SinkError::Failed { message },
        }
    }
}

impl From<ClientError> for ChatError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api {
                status,
                message,
                details,
            } => ChatError {
                kind: ChatErrorKind::Upstream,
                message,
                status: Some(status),
                code: None,
                details: details.map(|d| d.to_string()),
            },
            ClientError::Transport(e) => ChatError::transport(e.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    message: String,
    #[serde(default)]
    details: Option<Value>,
}

/// Client for the flashdeck HTTP API
#[derive(Debug, Clone)]
pub struct FlashdeckClient {
    http: reqwest::Client,
    base_url: String,
}

impl FlashdeckClient {
    /// `base_url` is the service root, e.g. `http://localhost:3001`
    pub fn new(base_url: impl Into<String>) -> reqwest::Result<Self> {
        Ok(Self::with_client(crate::http::build_client(Some(DEFAULT_TIMEOUT))?, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "flashdeck request failed");
        Err(match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => ClientError::Api {
                status: status.as_u16(),
                message: envelope.message,
                details: envelope.details,
            },
            Err(_) => ClientError::Api {
                status: status.as_u16(),
                message: fallback_message(status),
                details: (!body.is_empty()).then(|| Value::String(body)),
            },
        })
    }

    #[instrument(skip_all)]
    pub async fn signup(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let request = self
            .http
            .post(self.url("/auth/signup"))
            .json(&json!({ "email": email, "password": password }));
        let response: SignupResponse = self.send(request).await?;
        Ok(Session::from(&response))
    }

    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let request = self
            .http
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }));
        let response: LoginResponse = self.send(request).await?;
        Ok(Session::from(&response))
    }

    pub async fn list_flashcards(
        &self,
        session: &Session,
        query: &ListFlashcardsQuery,
    ) -> Result<FlashcardListResponse, ClientError> {
        let request = self
            .http
            .get(self.url("/api/flashcards"))
            .bearer_auth(&session.access_token)
            .query(query);
        self.send(request).await
    }

    pub async fn create_flashcard(&self, session: &Session, card: &FlashcardCreate) -> Result<FlashcardResponse, ClientError> {
        let request = self
            .http
            .post(self.url("/api/flashcards"))
            .bearer_auth(&session.access_token)
            .json(card);
        self.send(request).await
    }

    pub async fn get_flashcard(&self, session: &Session, id: FlashcardId) -> Result<FlashcardResponse, ClientError> {
        let request = self
            .http
            .get(self.url(&format!("/api/flashcards/{id}")))
            .bearer_auth(&session.access_token);
        self.send(request).await
    }

    pub async fn update_flashcard(
        &self,
        session: &Session,
        id: FlashcardId,
        update: &FlashcardUpdate,
    ) -> Result<FlashcardUpdateResponse, ClientError> {
        let request = self
            .http
            .patch(self.url(&format!("/api/flashcards/{id}")))
            .bearer_auth(&session.access_token)
            .json(update);
        self.send(request).await
    }

    pub async fn delete_flashcard(&self, session: &Session, id: FlashcardId) -> Result<MessageResponse, ClientError> {
        let request = self
            .http
            .delete(self.url(&format!("/api/flashcards/{id}")))
            .bearer_auth(&session.access_token);
        self.send(request).await
    }

    /// Chat completion through the service's proxy
    pub async fn smart(&self, request: &ChatCompletionRequest) -> Result<ChatCompletion, ClientError> {
        let request = self.http.post(self.url("/api/smart")).json(request);
        self.send(request).await
    }

    /// Let the service run generation and save the cards
    pub async fn generate_on_server(&self, session: &Session, notes: &str) -> Result<GenerationReport, ClientError> {
        let request = self
            .http
            .post(self.url("/api/flashcards/generate"))
            .bearer_auth(&session.access_token)
            .json(&json!({ "notes": notes }));
        self.send(request).await
    }

    /// Generate cards through `/api/smart` and save them one at a time as the session's user
    #[instrument(skip_all)]
    pub async fn generate_flashcards(
        &self,
        session: &Session,
        notes: &str,
        settings: &GenerationConfig,
    ) -> Result<GenerationReport, GenerationError> {
        let request = build_request(settings, notes)?;
        let completion = self.smart(&request).await.map_err(ChatError::from)?;
        let cards = cards_from_completion(&completion)?;

        let sink = SessionSink { client: self, session };
        Ok(save_cards(cards, &sink).await)
    }
}

fn fallback_message(status: StatusCode) -> String {
    format!("Request failed with status {}.", status.as_u16())
}

/// Saves cards over the API as one session's user
struct SessionSink<'a> {
    client: &'a FlashdeckClient,
    session: &'a Session,
}

#[async_trait]
impl FlashcardSink for SessionSink<'_> {
    async fn create_card(&self, card: &GeneratedCard) -> Result<FlashcardResponse, SinkError> {
        let create = FlashcardCreate {
            front: Some(card.front.clone()),
            back: Some(card.back.clone()),
            source_type: Some(SourceType::Ai.as_str().to_string()),
        };
        self.client
            .create_flashcard(self.session, &create)
            .await
            .map_err(ClientError::into_sink_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ItemOutcome;
    use chrono::Utc;
    use uuid::Uuid;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session() -> Session {
        Session {
            access_token: "access-123".to_string(),
            refresh_token: "refresh-456".to_string(),
            user_id: Uuid::new_v4(),
        }
    }

    fn card_body(front: &str) -> Value {
        let now = Utc::now();
        json!({
            "id": Uuid::new_v4(),
            "front": front,
            "back": "A",
            "source_type": "ai",
            "created_at": now,
            "updated_at": now,
            "deleted_at": null
        })
    }

    fn completion_body(content: &str) -> Value {
        json!({
            "id": "gen-1",
            "model": "openai/gpt-4o-mini",
            "created": 1_700_000_000,
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content }, "finish_reason": "stop" }]
        })
    }

    #[test_log::test(tokio::test)]
    async fn test_login_returns_session() {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_partial_json(json!({ "email": "ada@example.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-123",
                "refresh_token": "refresh-456",
                "user": { "id": user_id, "email": "ada@example.com" }
            })))
            .mount(&server)
            .await;

        let client = FlashdeckClient::new(server.uri()).unwrap();
        let session = client.login("ada@example.com", "hunter22").await.unwrap();

        assert_eq!(session.access_token, "access-123");
        assert_eq!(session.refresh_token, "refresh-456");
        assert_eq!(session.user_id, user_id);
    }

    #[test_log::test(tokio::test)]
    async fn test_error_envelope_is_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid email or password." })))
            .mount(&server)
            .await;

        let client = FlashdeckClient::new(server.uri()).unwrap();
        let err = client.login("ada@example.com", "wrong-password").await.unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "Invalid email or password.");
    }

    #[test_log::test(tokio::test)]
    async fn test_list_sends_bearer_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/flashcards"))
            .and(header("authorization", "Bearer access-123"))
            .and(query_param("limit", "5"))
            .and(query_param("search", "cell"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [card_body("Q")], "next_cursor": null })))
            .expect(1)
            .mount(&server)
            .await;

        let client = FlashdeckClient::new(format!("{}/", server.uri())).unwrap();
        let query = ListFlashcardsQuery {
            limit: Some("5".to_string()),
            search: Some("cell".to_string()),
            ..Default::default()
        };
        let page = client.list_flashcards(&session(), &query).await.unwrap();

        assert_eq!(page.data.len(), 1);
        assert_eq!(page.next_cursor, None);
    }

    #[test_log::test(tokio::test)]
    async fn test_non_json_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let client = FlashdeckClient::new(server.uri()).unwrap();
        let err = client.delete_flashcard(&session(), Uuid::new_v4()).await.unwrap_err();

        let ClientError::Api { status, message, details } = err else {
            panic!("expected an API error");
        };
        assert_eq!(status, 503);
        assert_eq!(message, "Request failed with status 503.");
        assert_eq!(details, Some(json!("upstream unavailable")));
    }

    #[test_log::test(tokio::test)]
    async fn test_generate_flashcards_continues_past_rejected_card() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/smart"))
            .and(body_partial_json(json!({ "model": "openai/gpt-4o-mini" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
                r#"[{"front":"Q1","back":"A"},{"front":"Q2","back":"A"},{"front":"Q3","back":"A"}]"#,
            )))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/flashcards"))
            .and(body_partial_json(json!({ "front": "Q2" })))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({ "message": "Validation failed.", "details": ["back is required"] })),
            )
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/flashcards"))
            .and(header("authorization", "Bearer access-123"))
            .and(body_partial_json(json!({ "source_type": "ai" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(card_body("Q")))
            .mount(&server)
            .await;

        let client = FlashdeckClient::new(server.uri()).unwrap();
        let report = client
            .generate_flashcards(&session(), "Some notes", &GenerationConfig::default())
            .await
            .unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(report.stop_reason, None);
        assert_eq!(
            report.items[1].outcome,
            ItemOutcome::Failed {
                reason: "Validation failed.".to_string()
            }
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_generate_flashcards_stops_on_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/smart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
                "```json\n[{\"front\":\"Q1\",\"back\":\"A\"},{\"front\":\"Q2\",\"back\":\"A\"}]\n```",
            )))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/flashcards"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Unauthorized." })))
            .expect(1)
            .mount(&server)
            .await;

        let client = FlashdeckClient::new(server.uri()).unwrap();
        let report = client
            .generate_flashcards(&session(), "Some notes", &GenerationConfig::default())
            .await
            .unwrap();

        assert_eq!(report.created, 0);
        assert_eq!(report.stop_reason.as_deref(), Some("Unauthorized."));
        assert_eq!(report.items[1].outcome, ItemOutcome::Skipped);
    }

    #[test_log::test(tokio::test)]
    async fn test_generate_flashcards_surfaces_proxy_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/smart"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "message": "Rate limited upstream",
                "status": 429,
                "code": "rate_limit",
                "details": null
            })))
            .mount(&server)
            .await;

        let client = FlashdeckClient::new(server.uri()).unwrap();
        let err = client
            .generate_flashcards(&session(), "Some notes", &GenerationConfig::default())
            .await
            .unwrap_err();

        let GenerationError::Chat(chat_err) = err else {
            panic!("expected a chat error");
        };
        assert_eq!(chat_err.status, Some(429));
        assert_eq!(chat_err.message, "Rate limited upstream");
    }

    #[test_log::test(tokio::test)]
    async fn test_generate_flashcards_rejects_empty_notes_locally() {
        let server = MockServer::start().await;
        let client = FlashdeckClient::new(server.uri()).unwrap();

        let err = client
            .generate_flashcards(&session(), "   ", &GenerationConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::EmptyNotes));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
