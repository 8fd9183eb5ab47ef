use serde::Deserialize;
use thiserror::Error;

use super::transport::TransportError;

/// Which stage of a chat completion failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    /// Bad client setup or request shape; raised before any network call
    Config,
    /// The provider could not be reached (network failure or timeout)
    Transport,
    /// The provider answered with a non-success status or an unreadable body
    Upstream,
}

/// Error surfaced by the chat completion client.
///
/// `status`, `code` and `details` are filled from the provider response when one was received.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    pub status: Option<u16>,
    pub code: Option<String>,
    pub details: Option<String>,
}

#[derive(Deserialize)]
struct ProviderErrorEnvelope {
    error: Option<ProviderErrorBody>,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    message: Option<String>,
    code: Option<serde_json::Value>,
}

impl ChatError {
    pub fn config(message: impl Into<String>) -> Self {
        Self {
            kind: ChatErrorKind::Config,
            message: message.into(),
            status: None,
            code: None,
            details: None,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ChatErrorKind::Transport,
            message: message.into(),
            status: None,
            code: None,
            details: None,
        }
    }

    /// Build an error from a final non-success response.
    ///
    /// Uses the provider's `{"error": {"message", "code"}}` envelope when present and falls back
    /// to a generic message keyed by status. A non-empty body is always kept as `details`.
    pub fn from_response(status: u16, body: &str) -> Self {
        let mut message = format!("OpenRouter request failed with status {status}.");
        let mut code = None;

        if let Ok(ProviderErrorEnvelope { error: Some(error) }) = serde_json::from_str::<ProviderErrorEnvelope>(body) {
            if let Some(provider_message) = error.message.filter(|m| !m.is_empty()) {
                message = provider_message;
            }
            code = match error.code {
                Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
                Some(serde_json::Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };
        }

        Self {
            kind: ChatErrorKind::Upstream,
            message,
            status: Some(status),
            code,
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    /// A success response whose body is not a chat completion. Carries no status so it is
    /// reported as a gateway failure rather than echoing the provider's 2xx.
    pub fn unreadable_body(body: &str) -> Self {
        Self {
            kind: ChatErrorKind::Upstream,
            message: "Failed to contact OpenRouter.".to_string(),
            status: None,
            code: None,
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    /// Whether the failure happened while talking to the provider
    pub fn is_request_error(&self) -> bool {
        self.kind != ChatErrorKind::Config
    }
}

impl From<TransportError> for ChatError {
    fn from(err: TransportError) -> Self {
        Self {
            kind: ChatErrorKind::Transport,
            message: "Failed to contact OpenRouter.".to_string(),
            status: None,
            code: None,
            details: Some(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_envelope_message_and_code() {
        let body = r#"{"error":{"message":"Rate limited upstream","code":"rate_limit"}}"#;
        let err = ChatError::from_response(429, body);

        assert_eq!(err.kind, ChatErrorKind::Upstream);
        assert_eq!(err.message, "Rate limited upstream");
        assert_eq!(err.status, Some(429));
        assert_eq!(err.code.as_deref(), Some("rate_limit"));
        assert_eq!(err.details.as_deref(), Some(body));
    }

    #[test]
    fn test_numeric_code_is_stringified() {
        let err = ChatError::from_response(402, r#"{"error":{"message":"Insufficient credits","code":402}}"#);
        assert_eq!(err.code.as_deref(), Some("402"));
    }

    #[test]
    fn test_fallback_message_for_unparseable_body() {
        let err = ChatError::from_response(502, "<html>bad gateway</html>");
        assert_eq!(err.message, "OpenRouter request failed with status 502.");
        assert_eq!(err.code, None);
        assert_eq!(err.details.as_deref(), Some("<html>bad gateway</html>"));
    }

    #[test]
    fn test_empty_body_has_no_details() {
        let err = ChatError::from_response(400, "");
        assert_eq!(err.message, "OpenRouter request failed with status 400.");
        assert_eq!(err.details, None);
    }

    #[test]
    fn test_transport_errors_are_request_errors() {
        let err = ChatError::from(TransportError::Timeout(Duration::from_millis(5)));
        assert_eq!(err.kind, ChatErrorKind::Transport);
        assert!(err.is_request_error());
        assert!(!ChatError::config("missing key").is_request_error());
    }
}
