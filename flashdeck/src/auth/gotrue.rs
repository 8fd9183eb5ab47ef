//! [`AuthProvider`] over a GoTrue-compatible HTTP API (Supabase Auth).
//!
//! Calls made, relative to `auth.url`:
//! - `POST /auth/v1/signup` with `{email, password}`
//! - `POST /auth/v1/token?grant_type=password` with `{email, password}`
//! - `GET /auth/v1/user` with the caller's bearer token
//!
//! Every request carries the public `apikey` header.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::provider::{AuthProvider, AuthProviderError, AuthSession, AuthUser};
use crate::config::AuthConfig;

#[derive(Clone)]
pub struct GoTrueAuthProvider {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

/// Token grant body. Sign-up returns the same shape when a session is issued immediately, and a
/// bare user object when email confirmation is pending.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    user: Option<AuthUser>,
}

impl GoTrueAuthProvider {
    pub fn new(config: &AuthConfig) -> reqwest::Result<Self> {
        Ok(Self {
            client: crate::http::build_client(Some(config.timeout))?,
            base_url: config.url.as_str().trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
        })
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("apikey", &self.anon_key)
    }

    async fn credentials_grant(&self, url: String, email: &str, password: &str) -> Result<TokenResponse, AuthProviderError> {
        let response = self
            .request(self.client.post(url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let response = ensure_success(response).await?;

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthProviderError::InvalidResponse(e.to_string()))
    }
}

/// Turn a non-2xx response into [`AuthProviderError::Rejected`], keeping the provider's message
async fn ensure_success(response: Response) -> Result<Response, AuthProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), "Auth provider rejected request");
    Err(AuthProviderError::Rejected {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// GoTrue has used several error shapes over time
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["msg", "error_description", "message", "error"]
        .iter()
        .filter_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(str::to_string)
}

fn into_session(status: u16, token: TokenResponse) -> Result<AuthSession, AuthProviderError> {
    match token {
        TokenResponse {
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
            user: Some(user),
        } => Ok(AuthSession {
            access_token,
            refresh_token,
            user,
        }),
        // Account created but no session issued (email confirmation pending)
        _ => Err(AuthProviderError::Rejected { status, message: None }),
    }
}

#[async_trait]
impl AuthProvider for GoTrueAuthProvider {
    #[instrument(skip(self, password), err)]
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthProviderError> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        let token = self.credentials_grant(url, email, password).await?;
        into_session(200, token)
    }

    #[instrument(skip(self, password), err)]
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, AuthProviderError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        let token = self.credentials_grant(url, email, password).await?;
        into_session(200, token).map_err(|_| AuthProviderError::InvalidResponse("token grant returned no session".to_string()))
    }

    #[instrument(skip_all, err)]
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthProviderError> {
        let response = self
            .request(self.client.get(format!("{}/auth/v1/user", self.base_url)))
            .bearer_auth(access_token)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        response
            .json::<AuthUser>()
            .await
            .map_err(|e| AuthProviderError::InvalidResponse(e.to_string()))
    }
}
