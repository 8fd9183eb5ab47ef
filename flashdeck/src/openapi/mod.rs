//! OpenAPI document for the service, served at `/api-docs/openapi.json` and rendered by Scalar at
//! `/docs`.

mod extra_types;

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;
use crate::chat;
use crate::db::models::flashcards::SourceType;
use crate::generation;

/// Bearer access tokens issued by `/auth/signup` and `/auth/login`
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Access token from sign-up or login. Send it in the `Authorization` header:\n\n\
                            ```\nAuthorization: Bearer ACCESS_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "flashdeck",
        description = "Flashcards with AI-assisted generation from notes"
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::signup,
        api::handlers::auth::login,
        api::handlers::flashcards::list_flashcards,
        api::handlers::flashcards::create_flashcard,
        api::handlers::flashcards::get_flashcard,
        api::handlers::flashcards::update_flashcard,
        api::handlers::flashcards::delete_flashcard,
        api::handlers::generation::generate,
        api::handlers::smart::smart_completion,
    ),
    components(
        schemas(
            api::models::auth::Credentials,
            api::models::auth::SignupUser,
            api::models::auth::SignupResponse,
            api::models::auth::LoginUser,
            api::models::auth::LoginResponse,
            api::models::flashcards::FlashcardCreate,
            api::models::flashcards::FlashcardUpdate,
            api::models::flashcards::FlashcardResponse,
            api::models::flashcards::FlashcardUpdateResponse,
            api::models::flashcards::FlashcardListResponse,
            api::models::flashcards::MessageResponse,
            api::models::generation::GenerateRequest,
            api::models::smart::SmartRequest,
            api::models::smart::SmartMessage,
            SourceType,
            generation::GeneratedCard,
            generation::GenerationReport,
            generation::GenerationItem,
            generation::ItemOutcome,
            chat::ChatCompletion,
            chat::ChatChoice,
            chat::ChatResponseMessage,
            chat::ChatUsage,
            extra_types::ErrorResponse,
            extra_types::UpstreamErrorResponse,
        )
    ),
    tags(
        (name = "authentication", description = "Sign-up and login"),
        (name = "flashcards", description = "The caller's flashcards"),
        (name = "smart", description = "Chat completion proxy"),
    )
)]
pub struct ApiDoc;
