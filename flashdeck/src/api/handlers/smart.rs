use crate::{
    AppState,
    api::models::smart::{MAX_TOTAL_CONTENT_CHARS, SmartRequest, SmartRequestError},
    chat::ChatCompletion,
    errors::{Error, Result},
};
use axum::{extract::State, extract::rejection::JsonRejection, response::Json};
use serde_json::json;
use tracing::instrument;

/// Proxy one chat completion to OpenRouter
#[utoipa::path(
    post,
    path = "/api/smart",
    request_body = SmartRequest,
    tag = "smart",
    summary = "Chat completion",
    description = "Validate the request and forward it to the configured OpenRouter model. Upstream failures keep their status; failures without one return 502.",
    responses(
        (status = 200, description = "Normalized completion", body = ChatCompletion),
        (status = 400, description = "Malformed JSON"),
        (status = 422, description = "Validation failed or total content too large"),
        (status = 500, description = "OpenRouter API key is not configured"),
        (status = 502, description = "Failed to contact OpenRouter"),
    )
)]
#[instrument(skip_all)]
pub async fn smart_completion(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SmartRequest>, JsonRejection>,
) -> Result<Json<ChatCompletion>> {
    let Some(chat) = state.chat.as_ref() else {
        return Err(Error::Misconfigured {
            message: "OpenRouter API key is not configured.".to_string(),
        });
    };

    let Json(request) = payload?;
    let request = request.validate().map_err(|e| match e {
        SmartRequestError::Invalid(problems) => Error::validation(problems),
        SmartRequestError::TooLarge => Error::Validation {
            message: "Total message content is too large.".to_string(),
            details: Some(json!(format!("Maximum total characters allowed is {MAX_TOTAL_CONTENT_CHARS}."))),
        },
    })?;

    let completion = chat.create_chat_completion(&request).await?;
    Ok(Json(completion))
}
