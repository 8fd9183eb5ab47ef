//! The hosted identity service, seen through the three calls the app needs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::UserId;

/// A user record as reported by the auth provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Tokens issued for a user after sign-up or sign-in
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: AuthUser,
}

#[derive(Debug, Error)]
pub enum AuthProviderError {
    /// The provider answered and said no. `message` is whatever explanation it gave.
    #[error("auth provider rejected the request with status {status}: {}", message.as_deref().unwrap_or("no message"))]
    Rejected { status: u16, message: Option<String> },

    #[error("failed to reach auth provider: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected auth provider response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Register a new account. Providers that require email confirmation return no session, which
    /// surfaces as [`AuthProviderError::Rejected`] without a message.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthProviderError>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, AuthProviderError>;

    /// Resolve an access token to its user
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthProviderError>;
}
