//! AI-assisted flashcard generation from free-text notes.
//!
//! - [`parse`]: fence stripping and strict decoding of the model's JSON into [`GeneratedCard`]s
//! - [`pipeline`]: request building, sequential saving through a [`FlashcardSink`], and the
//!   per-card [`GenerationReport`]

pub mod parse;
pub mod pipeline;

pub use parse::{GeneratedCard, ParsedCards, parse_generated_cards, strip_code_fence};
pub use pipeline::{
    FlashcardSink, GenerationError, GenerationItem, GenerationReport, ItemOutcome, SinkError, build_request,
    cards_from_completion, generate_flashcards, save_cards,
};

pub const SYSTEM_PROMPT: &str = "You generate study flashcards. Return only valid JSON. \
Output a JSON array of objects with keys: front, back. \
Each flashcard should contain exactly one fact. \
Keep answers short and unambiguous. Avoid multi-part questions. \
Prefer definitions, relationships, cause-effect, concept-example.";
