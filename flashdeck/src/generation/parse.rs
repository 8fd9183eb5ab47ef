//! Decoding model output into flashcard candidates.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

const FENCE: &str = "```";

/// A front/back pair produced by the model, already trimmed and non-empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GeneratedCard {
    pub front: String,
    pub back: String,
}

/// Result of decoding a model response
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedCards {
    /// At least one usable card
    Cards(Vec<GeneratedCard>),
    /// Nothing usable; `reason` is user-facing
    Invalid { reason: String },
}

impl ParsedCards {
    fn invalid(reason: &str) -> Self {
        ParsedCards::Invalid {
            reason: reason.to_string(),
        }
    }
}

/// Return the body of the first ```` ``` ```` or ```` ```json ```` block, or the trimmed input
/// when there is no complete, non-empty block.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();

    let Some(open) = trimmed.find(FENCE) else {
        return trimmed;
    };
    let mut body = &trimmed[open + FENCE.len()..];
    if body.get(..4).is_some_and(|tag| tag.eq_ignore_ascii_case("json")) {
        body = &body[4..];
    }
    let body = body.trim_start();

    match body.find(FENCE) {
        Some(close) if !body[..close].trim_end().is_empty() => body[..close].trim(),
        _ => trimmed,
    }
}

/// Decode a model response into cards.
///
/// The payload must be a JSON array. Entries that are not objects with non-blank string `front`
/// and `back` are dropped.
pub fn parse_generated_cards(content: &str) -> ParsedCards {
    let payload = strip_code_fence(content);

    let Ok(value) = serde_json::from_str::<Value>(payload) else {
        return ParsedCards::invalid("Invalid model response.");
    };
    let Value::Array(items) = value else {
        return ParsedCards::invalid("Expected a JSON array.");
    };

    let cards: Vec<GeneratedCard> = items.iter().filter_map(card_from_value).collect();
    if cards.is_empty() {
        return ParsedCards::invalid("No valid flashcards were returned.");
    }
    ParsedCards::Cards(cards)
}

fn card_from_value(item: &Value) -> Option<GeneratedCard> {
    let object = item.as_object()?;
    let field = |name: &str| {
        object
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Some(GeneratedCard {
        front: field("front")?,
        back: field("back")?,
    })
}
