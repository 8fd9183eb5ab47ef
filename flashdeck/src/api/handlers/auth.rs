use crate::{
    AppState,
    api::models::auth::{Credentials, LoginResponse, LoginUser, SignupResponse, SignupUser},
    auth::AuthProviderError,
    errors::{Error, Result},
    types::abbrev_uuid,
};
use axum::{extract::State, extract::rejection::JsonRejection, http::StatusCode, response::Json};
use chrono::Utc;
use tracing::{info, instrument, warn};

const SIGNUP_FALLBACK_MESSAGE: &str = "Unable to sign up. Check email confirmation settings and try again.";

/// Register a new account with the auth provider
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = Credentials,
    tag = "authentication",
    summary = "Sign up",
    description = "Create an account and return a session. Fails when the provider requires email confirmation first.",
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 400, description = "Malformed JSON or rejected by the auth provider"),
        (status = 422, description = "Validation failed"),
    )
)]
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    let Json(credentials) = payload?;
    let credentials = credentials.validate().map_err(Error::validation)?;

    let session = state
        .auth
        .sign_up(&credentials.email, &credentials.password)
        .await
        .map_err(|e| {
            let message = match e {
                AuthProviderError::Rejected { message: Some(message), .. } => message,
                AuthProviderError::Rejected { message: None, .. } => SIGNUP_FALLBACK_MESSAGE.to_string(),
                other => {
                    warn!("Sign-up failed: {other}");
                    SIGNUP_FALLBACK_MESSAGE.to_string()
                }
            };
            Error::BadRequest { message }
        })?;

    info!("Created account {}", abbrev_uuid(&session.user.id));
    let user = SignupUser {
        id: session.user.id,
        email: session.user.email.unwrap_or(credentials.email),
        created_at: session.user.created_at.unwrap_or_else(Utc::now),
    };

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user,
            access_token: session.access_token,
            refresh_token: session.refresh_token,
        }),
    ))
}

/// Exchange email and password for a session
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = Credentials,
    tag = "authentication",
    summary = "Log in",
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Malformed JSON"),
        (status = 401, description = "Invalid email or password"),
        (status = 422, description = "Validation failed"),
    )
)]
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let Json(credentials) = payload?;
    let credentials = credentials.validate().map_err(Error::validation)?;

    let session = state
        .auth
        .sign_in_with_password(&credentials.email, &credentials.password)
        .await
        .map_err(|e| {
            if !matches!(e, AuthProviderError::Rejected { .. }) {
                warn!("Sign-in failed: {e}");
            }
            Error::Unauthenticated {
                message: Some("Invalid email or password.".to_string()),
            }
        })?;

    Ok(Json(LoginResponse {
        access_token: session.access_token,
        refresh_token: session.refresh_token,
        user: LoginUser {
            id: session.user.id,
            email: session.user.email.unwrap_or(credentials.email),
        },
    }))
}
